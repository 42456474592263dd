// SPDX-FileCopyrightText: 2025-2026 Vesper contributors
//
// SPDX-License-Identifier: Apache-2.0

//! Minimal VCALENDAR/VEVENT construction.

use jiff::Timestamp;

use crate::component::Component;
use crate::datetime::{format_date, format_utc};
use crate::line::escape_text;
use crate::status::EventStatus;

/// Identifies objects authored by this product.
pub const PRODID: &str = "-//Vesper//Vesper Calendar//EN";

/// Inputs for [`build_vevent`].
#[derive(Debug, Clone)]
pub struct EventData {
    /// iCalendar UID.
    pub uid: String,
    /// SUMMARY.
    pub title: String,
    /// DESCRIPTION, omitted when `None`.
    pub description: Option<String>,
    /// LOCATION, omitted when `None`.
    pub location: Option<String>,
    /// Start instant (midnight UTC for all-day events).
    pub start_at: Timestamp,
    /// End instant; exclusive DTEND boundary for all-day events.
    pub end_at: Timestamp,
    /// Emit DTSTART/DTEND as DATE values.
    pub all_day: bool,
    /// STATUS.
    pub status: EventStatus,
}

/// Builds a minimal, spec-valid calendar object around a single VEVENT.
///
/// The object carries PRODID, VERSION 2.0, and a fresh DTSTAMP. All-day
/// events are typed `VALUE=DATE`; everything else is a UTC DATE-TIME.
#[must_use]
pub fn build_vevent(data: &EventData) -> String {
    build_vevent_at(data, Timestamp::now())
}

/// [`build_vevent`] with an explicit DTSTAMP, used by tests.
#[must_use]
pub fn build_vevent_at(data: &EventData, dtstamp: Timestamp) -> String {
    let mut calendar = Component::new("VCALENDAR");
    calendar.lines.push("VERSION:2.0".to_string());
    calendar.lines.push(format!("PRODID:{PRODID}"));

    let mut event = Component::new("VEVENT");
    event.lines.push(format!("UID:{}", data.uid));
    event
        .lines
        .push(format!("DTSTAMP:{}", format_utc(dtstamp)));
    event.lines.push(dt_line("DTSTART", data.start_at, data.all_day));
    event.lines.push(dt_line("DTEND", data.end_at, data.all_day));
    event
        .lines
        .push(format!("SUMMARY:{}", escape_text(&data.title)));
    if let Some(description) = &data.description {
        event
            .lines
            .push(format!("DESCRIPTION:{}", escape_text(description)));
    }
    if let Some(location) = &data.location {
        event
            .lines
            .push(format!("LOCATION:{}", escape_text(location)));
    }
    event
        .lines
        .push(format!("STATUS:{}", data.status.as_ical()));

    calendar.children.push(event);
    calendar.serialize()
}

pub(crate) fn dt_line(name: &str, ts: Timestamp, all_day: bool) -> String {
    if all_day {
        format!("{name};VALUE=DATE:{}", format_date(ts))
    } else {
        format!("{name}:{}", format_utc(ts))
    }
}
