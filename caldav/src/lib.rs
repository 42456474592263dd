// SPDX-FileCopyrightText: 2025-2026 Vesper contributors
//
// SPDX-License-Identifier: Apache-2.0

//! `CalDAV` client for pulling and pushing calendar objects on remote
//! servers (RFC 4791), with incremental collection sync (RFC 6578).

#![warn(
    trivial_casts,
    trivial_numeric_casts,
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs,
    unsafe_code,
    unstable_features,
    unused_import_braces,
    unused_qualifications,
    clippy::dbg_macro,
    clippy::pedantic
)]
#![allow(clippy::similar_names, clippy::single_match_else, clippy::match_bool)]

mod client;
mod config;
mod error;
mod http;
mod request;
mod response;
mod types;
mod xml;

pub use crate::client::CalDavClient;
pub use crate::config::{AuthMethod, CalDavConfig};
pub use crate::error::CalDavError;
pub use crate::request::{
    CalendarMultiGetRequest, CalendarQueryRequest, Prop, PropFindRequest, SyncCollectionRequest,
    TimeRange,
};
pub use crate::response::MultiStatusResponse;
pub use crate::types::{ETag, EventsFetch, Href, PutOutcome, RemoteCalendar, RemoteObject};
