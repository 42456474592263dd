// SPDX-FileCopyrightText: 2025-2026 Vesper contributors
//
// SPDX-License-Identifier: Apache-2.0

//! VEVENT extraction.

use jiff::Timestamp;

use crate::component::Component;
use crate::datetime::{date_to_timestamp, parse_dt, utc_date};
use crate::error::IcalError;
use crate::status::EventStatus;

/// The denormalized projection of one VEVENT.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedEvent {
    /// iCalendar UID.
    pub uid: String,
    /// SUMMARY, unescaped. Empty when absent.
    pub title: String,
    /// DESCRIPTION, unescaped.
    pub description: Option<String>,
    /// LOCATION, unescaped.
    pub location: Option<String>,
    /// Start instant. All-day events start at midnight UTC.
    pub start_at: Timestamp,
    /// End instant. For all-day events this is the exclusive DTEND boundary
    /// (midnight after the last included day).
    pub end_at: Timestamp,
    /// True when DTSTART carried a DATE value.
    pub all_day: bool,
    /// STATUS, defaulting to confirmed.
    pub status: EventStatus,
}

/// Parses raw text into a component tree.
///
/// # Errors
///
/// Returns an error when the text is not a VCALENDAR object.
pub fn parse_component(raw: &str) -> Result<Component, IcalError> {
    Component::parse(raw)
}

/// Extracts the first VEVENT of a calendar object.
///
/// Returns `Ok(None)` when the object holds no VEVENT at all (VTODO or
/// VFREEBUSY collections are legitimate); callers treat that as "ignore",
/// not as an error.
///
/// # Errors
///
/// Returns an error for text that is not parseable iCalendar, or for a
/// VEVENT missing UID or DTSTART.
pub fn parse_vevent(raw: &str) -> Result<Option<ParsedEvent>, IcalError> {
    let calendar = Component::parse(raw)?;
    match find_vevent(&calendar) {
        Some(event) => event_from_component(event).map(Some),
        None => Ok(None),
    }
}

pub(crate) fn find_vevent(calendar: &Component) -> Option<&Component> {
    calendar.child("VEVENT")
}

pub(crate) fn event_from_component(event: &Component) -> Result<ParsedEvent, IcalError> {
    let uid = event
        .prop("UID")
        .map(|l| l.text_value())
        .filter(|v| !v.is_empty())
        .ok_or(IcalError::MissingProperty("UID"))?;

    let dtstart = event
        .prop("DTSTART")
        .ok_or(IcalError::MissingProperty("DTSTART"))?;
    let (start_at, all_day) = parse_dt(&dtstart)?;

    let end_at = match event.prop("DTEND") {
        Some(dtend) => parse_dt(&dtend)?.0,
        // DTEND is optional: all-day events span one day (exclusive end),
        // timed events are instantaneous.
        None if all_day => next_day(start_at)?,
        None => start_at,
    };

    Ok(ParsedEvent {
        uid,
        title: event.prop("SUMMARY").map(|l| l.text_value()).unwrap_or_default(),
        description: event.prop("DESCRIPTION").map(|l| l.text_value()),
        location: event.prop("LOCATION").map(|l| l.text_value()),
        start_at,
        end_at,
        all_day,
        status: event
            .prop("STATUS")
            .map(|l| EventStatus::from_ical(&l.value))
            .unwrap_or_default(),
    })
}

fn next_day(ts: Timestamp) -> Result<Timestamp, IcalError> {
    let date = utc_date(ts);
    let tomorrow = date.tomorrow().map_err(|e| IcalError::InvalidDateTime {
        value: date.to_string(),
        reason: e.to_string(),
    })?;
    date_to_timestamp(tomorrow)
}
