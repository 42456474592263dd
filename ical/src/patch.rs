// SPDX-FileCopyrightText: 2025-2026 Vesper contributors
//
// SPDX-License-Identifier: Apache-2.0

//! Partial VEVENT patching.

use jiff::Timestamp;

use crate::build::dt_line;
use crate::component::Component;
use crate::datetime::format_utc;
use crate::error::IcalError;
use crate::line::escape_text;
use crate::parse::event_from_component;
use crate::status::EventStatus;

/// A partial update. `None` always means "leave unchanged"; for clearable
/// text properties the inner `Option` distinguishes "set" from "clear", so
/// clearing a field is never conflated with not touching it.
#[derive(Debug, Clone, Default)]
pub struct EventPatch {
    /// Replace SUMMARY.
    pub title: Option<String>,
    /// Replace (`Some(Some(_))`) or remove (`Some(None)`) DESCRIPTION.
    pub description: Option<Option<String>>,
    /// Replace or remove LOCATION.
    pub location: Option<Option<String>>,
    /// Replace the start instant.
    pub start_at: Option<Timestamp>,
    /// Replace the end instant.
    pub end_at: Option<Timestamp>,
    /// Switch between all-day and timed representation.
    pub all_day: Option<bool>,
    /// Replace STATUS.
    pub status: Option<EventStatus>,
}

impl EventPatch {
    /// True when no field is set.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.location.is_none()
            && self.start_at.is_none()
            && self.end_at.is_none()
            && self.all_day.is_none()
            && self.status.is_none()
    }
}

/// Applies a partial patch to a raw calendar object.
///
/// Only patched properties are rewritten; SEQUENCE is bumped by one and
/// LAST-MODIFIED refreshed. Everything else (alarms, attendees, X-
/// properties, VTIMEZONE blocks) survives byte-for-byte in parsed form.
///
/// # Errors
///
/// Returns an error when the input is not parseable or holds no VEVENT.
pub fn update_vevent(raw: &str, patch: &EventPatch) -> Result<String, IcalError> {
    update_vevent_at(raw, patch, Timestamp::now())
}

/// [`update_vevent`] with an explicit LAST-MODIFIED instant, used by tests.
///
/// # Errors
///
/// Same as [`update_vevent`].
pub fn update_vevent_at(
    raw: &str,
    patch: &EventPatch,
    now: Timestamp,
) -> Result<String, IcalError> {
    let mut calendar = Component::parse(raw)?;
    let event = calendar
        .child_mut("VEVENT")
        .ok_or(IcalError::MissingProperty("VEVENT"))?;
    let current = event_from_component(event)?;

    if let Some(title) = &patch.title {
        event.set_prop("SUMMARY", format!("SUMMARY:{}", escape_text(title)));
    }
    apply_text(event, "DESCRIPTION", patch.description.as_ref());
    apply_text(event, "LOCATION", patch.location.as_ref());

    if patch.start_at.is_some() || patch.end_at.is_some() || patch.all_day.is_some() {
        let all_day = patch.all_day.unwrap_or(current.all_day);
        let start_at = patch.start_at.unwrap_or(current.start_at);
        let end_at = patch.end_at.unwrap_or(current.end_at);
        event.set_prop("DTSTART", dt_line("DTSTART", start_at, all_day));
        event.set_prop("DTEND", dt_line("DTEND", end_at, all_day));
    }

    if let Some(status) = patch.status {
        event.set_prop("STATUS", format!("STATUS:{}", status.as_ical()));
    }

    let sequence = event
        .prop("SEQUENCE")
        .and_then(|l| l.value.trim().parse::<u32>().ok())
        .unwrap_or(0);
    event.set_prop("SEQUENCE", format!("SEQUENCE:{}", sequence + 1));
    event.set_prop("LAST-MODIFIED", format!("LAST-MODIFIED:{}", format_utc(now)));

    Ok(calendar.serialize())
}

fn apply_text(event: &mut Component, name: &str, change: Option<&Option<String>>) {
    match change {
        None => {}
        Some(Some(value)) => {
            event.set_prop(name, format!("{name}:{}", escape_text(value)));
        }
        Some(None) => event.remove_prop(name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_vevent;

    const RAW: &str = "BEGIN:VCALENDAR\r\nVERSION:2.0\r\nPRODID:-//Acme//Cal//EN\r\nBEGIN:VEVENT\r\nUID:e1\r\nDTSTAMP:20250101T000000Z\r\nDTSTART:20250601T090000Z\r\nDTEND:20250601T093000Z\r\nSUMMARY:Standup\r\nSEQUENCE:3\r\nX-ACME-TAG:keep-me\r\nBEGIN:VALARM\r\nTRIGGER:-PT10M\r\nACTION:DISPLAY\r\nEND:VALARM\r\nEND:VEVENT\r\nEND:VCALENDAR\r\n";

    fn now() -> Timestamp {
        "2025-06-02T12:00:00Z".parse().unwrap()
    }

    #[test]
    fn patches_only_named_fields() {
        let patch = EventPatch {
            title: Some("Standup (moved)".to_string()),
            ..EventPatch::default()
        };
        let updated = update_vevent_at(RAW, &patch, now()).unwrap();

        let event = parse_vevent(&updated).unwrap().unwrap();
        assert_eq!(event.title, "Standup (moved)");
        // Untouched properties survive verbatim.
        assert!(updated.contains("DTSTART:20250601T090000Z"));
        assert!(updated.contains("DTEND:20250601T093000Z"));
        assert!(updated.contains("UID:e1"));
        assert!(updated.contains("X-ACME-TAG:keep-me"));
        assert!(updated.contains("TRIGGER:-PT10M"));
    }

    #[test]
    fn bumps_sequence_and_refreshes_last_modified() {
        let patch = EventPatch {
            title: Some("X".to_string()),
            ..EventPatch::default()
        };
        let updated = update_vevent_at(RAW, &patch, now()).unwrap();
        assert!(updated.contains("SEQUENCE:4"));
        assert!(updated.contains("LAST-MODIFIED:20250602T120000Z"));
    }

    #[test]
    fn missing_sequence_starts_at_one() {
        let raw = RAW.replace("SEQUENCE:3\r\n", "");
        let updated = update_vevent_at(&raw, &EventPatch::default(), now()).unwrap();
        assert!(updated.contains("SEQUENCE:1"));
    }

    #[test]
    fn clearing_differs_from_leaving_untouched() {
        let raw = RAW.replace(
            "SUMMARY:Standup\r\n",
            "SUMMARY:Standup\r\nDESCRIPTION:old\r\nLOCATION:Room 1\r\n",
        );

        // None leaves the property alone.
        let untouched = update_vevent_at(&raw, &EventPatch::default(), now()).unwrap();
        assert!(untouched.contains("DESCRIPTION:old"));

        // Some(None) removes it.
        let patch = EventPatch {
            description: Some(None),
            location: Some(Some("Room 2".to_string())),
            ..EventPatch::default()
        };
        let cleared = update_vevent_at(&raw, &patch, now()).unwrap();
        assert!(!cleared.contains("DESCRIPTION:old"));
        assert!(cleared.contains("LOCATION:Room 2"));
    }

    #[test]
    fn switching_to_all_day_rewrites_both_dt_lines() {
        let patch = EventPatch {
            all_day: Some(true),
            start_at: Some("2025-06-01T00:00:00Z".parse().unwrap()),
            end_at: Some("2025-06-02T00:00:00Z".parse().unwrap()),
            ..EventPatch::default()
        };
        let updated = update_vevent_at(RAW, &patch, now()).unwrap();
        assert!(updated.contains("DTSTART;VALUE=DATE:20250601"));
        assert!(updated.contains("DTEND;VALUE=DATE:20250602"));
    }

    #[test]
    fn object_without_vevent_is_an_error() {
        let raw = "BEGIN:VCALENDAR\r\nBEGIN:VTODO\r\nUID:t\r\nEND:VTODO\r\nEND:VCALENDAR\r\n";
        assert!(update_vevent_at(raw, &EventPatch::default(), now()).is_err());
    }
}
