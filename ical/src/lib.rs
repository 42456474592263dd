// SPDX-FileCopyrightText: 2025-2026 Vesper contributors
//
// SPDX-License-Identifier: Apache-2.0

//! Round-trip-safe iCalendar (RFC 5545) VEVENT codec.
//!
//! This crate parses, builds, and patches VEVENT calendar objects while
//! preserving every property it does not understand. It is deliberately
//! scoped to the content-line grammar: components are kept as ordered lists
//! of raw logical lines, so a patched object serializes byte-for-byte
//! identical in everything the patch did not touch.

#![warn(
    trivial_casts,
    trivial_numeric_casts,
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs,
    unsafe_code,
    unused_import_braces,
    unused_qualifications,
    clippy::dbg_macro,
    clippy::pedantic
)]
#![allow(clippy::similar_names, clippy::single_match_else)]

mod build;
mod component;
mod datetime;
mod error;
mod line;
mod parse;
mod patch;
mod status;

pub use crate::build::{EventData, build_vevent};
pub use crate::component::Component;
pub use crate::error::IcalError;
pub use crate::line::{ContentLine, escape_text, fold_line, unescape_text, unfold};
pub use crate::parse::{ParsedEvent, parse_component, parse_vevent};
pub use crate::patch::{EventPatch, update_vevent};
pub use crate::status::EventStatus;
