// SPDX-FileCopyrightText: 2025-2026 Vesper contributors
//
// SPDX-License-Identifier: Apache-2.0

//! Vesper core: domain types, the SQLite mirror, and the sync engine that
//! reconciles it against remote `CalDAV` accounts.

#![warn(
    trivial_casts,
    trivial_numeric_casts,
    missing_debug_implementations,
    missing_docs,
    unsafe_code,
    unused_import_braces,
    unused_qualifications,
    clippy::dbg_macro,
    clippy::pedantic
)]
#![allow(clippy::similar_names, clippy::missing_errors_doc)]

mod error;
mod etag;
mod model;
mod store;
mod sync;

pub use crate::error::CoreError;
pub use crate::etag::{compute_etag, etag_matches, normalize_etag};
pub use crate::model::{Account, Calendar, Event, NewAccount};
pub use crate::store::{Accounts, Calendars, EventRef, EventWrite, Events, Store};
pub use crate::sync::{SyncEngine, SyncReport};

pub use vesper_ical::{EventData, EventPatch, EventStatus, ParsedEvent};
