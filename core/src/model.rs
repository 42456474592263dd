// SPDX-FileCopyrightText: 2025-2026 Vesper contributors
//
// SPDX-License-Identifier: Apache-2.0

//! Domain types mirrored in the SQLite store.

use jiff::Timestamp;
use vesper_ical::EventStatus;

/// A remote `CalDAV` account: credentials plus sync bookkeeping.
#[derive(Debug, Clone)]
pub struct Account {
    /// Surrogate key (uuid).
    pub id: String,
    /// Absolute URL of the account's calendar home set.
    pub server_url: String,
    /// Basic-auth username.
    pub username: String,
    /// Basic-auth password.
    pub password: String,
    /// Human-readable name shown in settings.
    pub display_name: String,
    /// When the last sync pass completed.
    pub last_sync_at: Option<Timestamp>,
    /// Account-level sync token, when the server exposes one.
    pub sync_token: Option<String>,
}

/// Inputs for creating an [`Account`].
#[derive(Debug, Clone, serde::Deserialize)]
pub struct NewAccount {
    /// Absolute URL of the calendar home set.
    pub server_url: String,
    /// Basic-auth username.
    pub username: String,
    /// Basic-auth password.
    pub password: String,
    /// Display name.
    pub display_name: String,
}

/// A calendar collection, remote-backed or locally owned.
#[derive(Debug, Clone)]
pub struct Calendar {
    /// Surrogate key (uuid).
    pub id: String,
    /// Owning account; `None` for the locally-owned calendar.
    pub account_id: Option<String>,
    /// Collection URL; globally unique, doubles as the WebDAV identity.
    pub url: String,
    /// Display name.
    pub display_name: String,
    /// Calendar color, when known.
    pub color: Option<String>,
    /// Collection change tag.
    pub ctag: Option<String>,
    /// WebDAV-sync token persisted from the last incremental-capable fetch.
    pub sync_token: Option<String>,
    /// Disabled calendars are skipped by sync and hidden from range queries.
    pub enabled: bool,
    /// True for the single locally-owned calendar.
    pub is_local: bool,
}

/// One calendar object row.
///
/// `raw_ical` is the authoritative wire representation; every other content
/// field is a projection derived from it, and the store re-derives the
/// projection whenever `raw_ical` changes.
#[derive(Debug, Clone)]
pub struct Event {
    /// Surrogate key (uuid).
    pub id: String,
    /// Parent calendar.
    pub calendar_id: String,
    /// iCalendar UID; unique per calendar.
    pub uid: String,
    /// Last known content validator (server-assigned or locally computed).
    pub etag: String,
    /// Object href on its owning server.
    pub url: String,
    /// SUMMARY projection.
    pub title: String,
    /// DESCRIPTION projection.
    pub description: Option<String>,
    /// LOCATION projection.
    pub location: Option<String>,
    /// Start instant.
    pub start_at: Timestamp,
    /// End instant (exclusive DTEND boundary for all-day events).
    pub end_at: Timestamp,
    /// All-day marker.
    pub all_day: bool,
    /// STATUS projection. Cancelled events stay stored as soft state.
    pub status: EventStatus,
    /// Authoritative iCalendar text.
    pub raw_ical: String,
    /// Row creation time.
    pub created_at: Timestamp,
    /// Last row mutation time.
    pub updated_at: Timestamp,
}
