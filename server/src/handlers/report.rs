// SPDX-FileCopyrightText: 2025-2026 Vesper contributors
//
// SPDX-License-Identifier: Apache-2.0

//! REPORT: calendar-query and calendar-multiget.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use jiff::Timestamp;
use jiff::civil::DateTime;
use jiff::tz::TimeZone;
use quick_xml::events::Event as XmlEvent;

use super::multistatus_response;
use crate::AppState;
use crate::error::ServerError;
use crate::xml::{DavProp, ResponseEntry, render_multistatus};

#[derive(Debug, PartialEq, Eq)]
enum ReportKind {
    Query,
    Multiget,
}

#[derive(Debug)]
struct ReportRequest {
    kind: ReportKind,
    /// Whether the prop list asked for calendar-data. Honored for queries;
    /// multiget responses always carry the data.
    want_data: bool,
    start: Option<String>,
    end: Option<String>,
    hrefs: Vec<String>,
}

/// Dispatches a REPORT body against one calendar.
pub async fn handle(
    state: &AppState,
    calendar_id: &str,
    body: &str,
) -> Result<Response, ServerError> {
    let Some(calendar) = state.store.calendars.get(calendar_id).await? else {
        return Ok(StatusCode::NOT_FOUND.into_response());
    };

    let Some(request) = parse_report(body) else {
        return Ok((StatusCode::BAD_REQUEST, "unsupported REPORT body").into_response());
    };

    let entries = match request.kind {
        ReportKind::Query => query_entries(state, &calendar.id, &request).await?,
        ReportKind::Multiget => multiget_entries(state, &calendar.id, &request).await?,
    };

    Ok(multistatus_response(render_multistatus(&entries)?))
}

async fn query_entries(
    state: &AppState,
    calendar_id: &str,
    request: &ReportRequest,
) -> Result<Vec<ResponseEntry>, ServerError> {
    let range_start = request.start.as_deref().and_then(parse_caldav_utc);
    let range_end = request.end.as_deref().and_then(parse_caldav_utc);

    let mut entries = Vec::new();
    for event in state.store.events.list_for_calendar(calendar_id).await? {
        if let Some(start) = range_start {
            if event.end_at <= start {
                continue;
            }
        }
        if let Some(end) = range_end {
            if event.start_at >= end {
                continue;
            }
        }

        let mut entry = ResponseEntry::new(super::object_href(calendar_id, &event.uid))
            .prop(DavProp::GetETag(event.etag.clone()));
        if request.want_data {
            entry = entry.prop(DavProp::CalendarData(event.raw_ical.clone()));
        }
        entries.push(entry);
    }
    Ok(entries)
}

async fn multiget_entries(
    state: &AppState,
    calendar_id: &str,
    request: &ReportRequest,
) -> Result<Vec<ResponseEntry>, ServerError> {
    let mut entries = Vec::new();
    for href in &request.hrefs {
        let Some(uid) = uid_from_href(href) else {
            continue;
        };
        // Hrefs that resolve to nothing are omitted, never an error.
        let Some(event) = state.store.events.get(calendar_id, uid).await? else {
            continue;
        };
        entries.push(
            ResponseEntry::new(super::object_href(calendar_id, &event.uid))
                .prop(DavProp::GetETag(event.etag.clone()))
                .prop(DavProp::CalendarData(event.raw_ical.clone())),
        );
    }
    Ok(entries)
}

/// Extracts the report kind, the requested props, the time-range filter,
/// and multiget hrefs. Returns `None` for bodies that are not a supported
/// calendar report.
fn parse_report(body: &str) -> Option<ReportRequest> {
    let mut reader = quick_xml::Reader::from_str(body);
    reader.config_mut().trim_text(true);

    let mut kind = None;
    let mut want_data = false;
    let mut start = None;
    let mut end = None;
    let mut hrefs = Vec::new();

    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf).ok()? {
            XmlEvent::Eof => break,
            // Hrefs carry text content, so they only appear as Start.
            XmlEvent::Start(ref e) if e.name().local_name().into_inner() == b"href" => {
                if let Ok(XmlEvent::Text(text)) = reader.read_event_into(&mut buf) {
                    if let Ok(decoded) = text.decode() {
                        if let Ok(href) = quick_xml::escape::unescape(&decoded) {
                            hrefs.push(href.into_owned());
                        }
                    }
                }
            }
            XmlEvent::Start(ref e) | XmlEvent::Empty(ref e) => {
                match e.name().local_name().into_inner() {
                    b"calendar-query" => kind = Some(ReportKind::Query),
                    b"calendar-multiget" => kind = Some(ReportKind::Multiget),
                    b"calendar-data" => want_data = true,
                    b"time-range" => {
                        for attr in e.attributes().flatten() {
                            let value = String::from_utf8_lossy(&attr.value).into_owned();
                            match attr.key.local_name().into_inner() {
                                b"start" => start = Some(value),
                                b"end" => end = Some(value),
                                _ => {}
                            }
                        }
                    }
                    _ => {}
                }
            }
            _ => {}
        }
        buf.clear();
    }

    kind.map(|kind| ReportRequest {
        kind,
        want_data,
        start,
        end,
        hrefs,
    })
}

fn parse_caldav_utc(value: &str) -> Option<Timestamp> {
    DateTime::strptime("%Y%m%dT%H%M%SZ", value)
        .ok()?
        .to_zoned(TimeZone::UTC)
        .ok()
        .map(|z| z.timestamp())
}

fn uid_from_href(href: &str) -> Option<&str> {
    href.trim_end_matches('/')
        .rsplit('/')
        .next()
        .and_then(|name| name.strip_suffix(".ics"))
        .filter(|uid| !uid.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_query_with_time_range_and_data_request() {
        let body = r#"<?xml version="1.0"?>
<C:calendar-query xmlns:D="DAV:" xmlns:C="urn:ietf:params:xml:ns:caldav">
  <D:prop><D:getetag/><C:calendar-data/></D:prop>
  <C:filter>
    <C:comp-filter name="VCALENDAR">
      <C:comp-filter name="VEVENT">
        <C:time-range start="20250601T000000Z" end="20250701T000000Z"/>
      </C:comp-filter>
    </C:comp-filter>
  </C:filter>
</C:calendar-query>"#;

        let request = parse_report(body).unwrap();
        assert_eq!(request.kind, ReportKind::Query);
        assert!(request.want_data);
        assert_eq!(request.start.as_deref(), Some("20250601T000000Z"));
        assert_eq!(request.end.as_deref(), Some("20250701T000000Z"));
    }

    #[test]
    fn parses_query_without_data_request() {
        let body = r#"<C:calendar-query xmlns:D="DAV:" xmlns:C="urn:ietf:params:xml:ns:caldav">
  <D:prop><D:getetag/></D:prop>
  <C:filter><C:comp-filter name="VCALENDAR"/></C:filter>
</C:calendar-query>"#;

        let request = parse_report(body).unwrap();
        assert!(!request.want_data);
        assert_eq!(request.start, None);
    }

    #[test]
    fn parses_multiget_hrefs() {
        let body = r#"<C:calendar-multiget xmlns:D="DAV:" xmlns:C="urn:ietf:params:xml:ns:caldav">
  <D:prop><D:getetag/><C:calendar-data/></D:prop>
  <D:href>/api/caldav/calendars/c1/a.ics</D:href>
  <D:href>/api/caldav/calendars/c1/b.ics</D:href>
</C:calendar-multiget>"#;

        let request = parse_report(body).unwrap();
        assert_eq!(request.kind, ReportKind::Multiget);
        assert_eq!(request.hrefs.len(), 2);
    }

    #[test]
    fn rejects_unknown_report_bodies() {
        assert!(parse_report("<D:sync-collection xmlns:D=\"DAV:\"/>").is_none());
        assert!(parse_report("not xml at all").is_none());
    }
}
