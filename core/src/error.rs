// SPDX-FileCopyrightText: 2025-2026 Vesper contributors
//
// SPDX-License-Identifier: Apache-2.0

use vesper_caldav::CalDavError;
use vesper_ical::IcalError;

/// Errors produced by the store and the sync engine.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// The referenced account does not exist.
    #[error("account not found: {0}")]
    AccountNotFound(String),

    /// The referenced calendar does not exist.
    #[error("calendar not found: {0}")]
    CalendarNotFound(String),

    /// The referenced event does not exist.
    #[error("event not found: {0}")]
    EventNotFound(String),

    /// The object changed on the server since it was last synced.
    #[error("Conflict: event was modified on the server. Please sync and try again.")]
    Conflict,

    /// Outbound push against a calendar no remote account owns.
    #[error("calendar {0} is not backed by a remote account")]
    NotRemoteBacked(String),

    /// Database error.
    #[error("store error: {0}")]
    Store(#[from] sqlx::Error),

    /// Schema migration error.
    #[error("migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    /// Remote CalDAV error.
    #[error("remote error: {0}")]
    Remote(CalDavError),

    /// iCalendar codec error.
    #[error("ical error: {0}")]
    Ical(#[from] IcalError),

    /// A stored row no longer parses (corrupt timestamp or status).
    #[error("invalid stored data: {0}")]
    InvalidData(String),
}

impl From<CalDavError> for CoreError {
    fn from(e: CalDavError) -> Self {
        if e.is_conflict() {
            Self::Conflict
        } else {
            Self::Remote(e)
        }
    }
}
