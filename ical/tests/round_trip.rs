// SPDX-FileCopyrightText: 2025-2026 Vesper contributors
//
// SPDX-License-Identifier: Apache-2.0

//! Round-trip tests: building an object and parsing it back must reproduce
//! the same projection, and patches must preserve what they do not touch.

use vesper_ical::{
    EventData, EventPatch, EventStatus, build_vevent, parse_component, parse_vevent, update_vevent,
};

fn sample() -> EventData {
    EventData {
        uid: "42fd4c9e@vesper".to_string(),
        title: "Quarterly review; all hands".to_string(),
        description: Some("bring slides,\nand coffee".to_string()),
        location: Some("HQ, floor 3".to_string()),
        start_at: "2025-07-01T13:00:00Z".parse().unwrap(),
        end_at: "2025-07-01T15:00:00Z".parse().unwrap(),
        all_day: false,
        status: EventStatus::Tentative,
    }
}

#[test]
fn build_then_parse_reproduces_projection() {
    let data = sample();
    let raw = build_vevent(&data);
    let event = parse_vevent(&raw).unwrap().expect("VEVENT expected");

    assert_eq!(event.uid, data.uid);
    assert_eq!(event.title, data.title);
    assert_eq!(event.description, data.description);
    assert_eq!(event.location, data.location);
    assert_eq!(event.start_at, data.start_at);
    assert_eq!(event.end_at, data.end_at);
    assert_eq!(event.all_day, data.all_day);
    assert_eq!(event.status, data.status);
}

#[test]
fn build_then_parse_reproduces_all_day_projection() {
    let mut data = sample();
    data.all_day = true;
    data.start_at = "2025-07-01T00:00:00Z".parse().unwrap();
    data.end_at = "2025-07-03T00:00:00Z".parse().unwrap();
    data.description = None;
    data.location = None;

    let raw = build_vevent(&data);
    let event = parse_vevent(&raw).unwrap().expect("VEVENT expected");

    assert!(event.all_day);
    assert_eq!(event.start_at, data.start_at);
    assert_eq!(event.end_at, data.end_at);
}

#[test]
fn serialized_output_survives_reserialization() {
    let raw = build_vevent(&sample());
    let reparsed = parse_component(&raw).unwrap().serialize();
    assert_eq!(raw, reparsed);
}

#[test]
fn long_lines_fold_and_unfold_losslessly() {
    let mut data = sample();
    data.description = Some("x".repeat(400));
    let raw = build_vevent(&data);

    for physical in raw.split("\r\n") {
        assert!(physical.len() <= 75, "unfolded physical line: {physical:?}");
    }

    let event = parse_vevent(&raw).unwrap().unwrap();
    assert_eq!(event.description, data.description);
}

#[test]
fn patch_preserves_foreign_properties_in_parsed_form() {
    let raw = "BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
PRODID:-//Acme//Cal//EN\r\n\
BEGIN:VTIMEZONE\r\n\
TZID:Europe/Berlin\r\n\
BEGIN:STANDARD\r\n\
DTSTART:19701025T030000\r\n\
TZOFFSETFROM:+0200\r\n\
TZOFFSETTO:+0100\r\n\
END:STANDARD\r\n\
END:VTIMEZONE\r\n\
BEGIN:VEVENT\r\n\
UID:rt-1\r\n\
DTSTAMP:20250101T000000Z\r\n\
DTSTART:20250601T090000Z\r\n\
DTEND:20250601T100000Z\r\n\
SUMMARY:Before\r\n\
ATTENDEE;CN=\"Doe, Jane\":mailto:jane@example.com\r\n\
X-APPLE-TRAVEL-ADVISORY-BEHAVIOR:AUTOMATIC\r\n\
END:VEVENT\r\n\
END:VCALENDAR\r\n";

    let patch = EventPatch {
        title: Some("After".to_string()),
        ..EventPatch::default()
    };
    let updated = update_vevent(raw, &patch).unwrap();

    let before = parse_component(raw).unwrap();
    let after = parse_component(&updated).unwrap();

    // VTIMEZONE block untouched.
    assert_eq!(before.child("VTIMEZONE"), after.child("VTIMEZONE"));

    // Every original VEVENT line except SUMMARY/SEQUENCE/LAST-MODIFIED is
    // still present verbatim.
    let after_event = after.child("VEVENT").unwrap();
    for line in &before.child("VEVENT").unwrap().lines {
        if line.starts_with("SUMMARY") {
            continue;
        }
        assert!(
            after_event.lines.contains(line),
            "patched object lost {line:?}"
        );
    }
    assert!(after_event.lines.iter().any(|l| l == "SUMMARY:After"));
}
