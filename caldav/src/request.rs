// SPDX-FileCopyrightText: 2025-2026 Vesper contributors
//
// SPDX-License-Identifier: Apache-2.0

//! Request body builders for `CalDAV` operations.

use std::io::Cursor;

use quick_xml::Writer;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};

use crate::error::CalDavError;
use crate::xml::ns;

/// PROPFIND request builder.
#[derive(Debug)]
pub struct PropFindRequest {
    props: Vec<Prop>,
}

/// Properties to request in PROPFIND.
#[derive(Debug, Clone, Copy)]
pub enum Prop {
    /// Display name.
    DisplayName,
    /// Resource type.
    ResourceType,
    /// `ETag`.
    GetETag,
    /// Collection change tag (calendarserver ns).
    GetCTag,
    /// Calendar color (apple ns).
    CalendarColor,
    /// WebDAV-sync token.
    SyncToken,
    /// Supported calendar components.
    SupportedCalendarComponents,
}

impl Prop {
    const fn name(self) -> &'static str {
        match self {
            Self::DisplayName => "displayname",
            Self::ResourceType => "resourcetype",
            Self::GetETag => "getetag",
            Self::GetCTag => "getctag",
            Self::CalendarColor => "calendar-color",
            Self::SyncToken => "sync-token",
            Self::SupportedCalendarComponents => "supported-calendar-component-set",
        }
    }

    /// Element prefix; namespaces are declared on the root element.
    const fn prefix(self) -> &'static str {
        match self {
            Self::DisplayName | Self::ResourceType | Self::GetETag | Self::SyncToken => "D",
            Self::GetCTag => "CS",
            Self::CalendarColor => "ICAL",
            Self::SupportedCalendarComponents => "C",
        }
    }
}

impl PropFindRequest {
    /// Creates a new PROPFIND request.
    #[must_use]
    pub fn new() -> Self {
        Self { props: Vec::new() }
    }

    /// The property set used when listing calendar collections.
    #[must_use]
    pub fn for_calendars() -> Self {
        let mut req = Self::new();
        req.add_property(Prop::DisplayName)
            .add_property(Prop::ResourceType)
            .add_property(Prop::GetCTag)
            .add_property(Prop::CalendarColor)
            .add_property(Prop::SyncToken);
        req
    }

    /// Adds a property to the request.
    pub fn add_property(&mut self, prop: Prop) -> &mut Self {
        self.props.push(prop);
        self
    }

    /// Builds the XML body for the PROPFIND request.
    ///
    /// # Errors
    ///
    /// Returns an error if XML building fails.
    pub fn build(&self) -> Result<String, CalDavError> {
        let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);

        let mut propfind = BytesStart::new("D:propfind");
        propfind.push_attribute(("xmlns:D", ns::DAV));
        propfind.push_attribute(("xmlns:C", ns::CALDAV));
        propfind.push_attribute(("xmlns:CS", ns::CALENDARSERVER));
        propfind.push_attribute(("xmlns:ICAL", ns::APPLE));
        writer.write_event(Event::Start(propfind))?;

        writer.write_event(Event::Start(BytesStart::new("D:prop")))?;
        for prop in &self.props {
            let tag = format!("{}:{}", prop.prefix(), prop.name());
            writer.write_event(Event::Empty(BytesStart::new(tag)))?;
        }
        writer.write_event(Event::End(BytesEnd::new("D:prop")))?;

        writer.write_event(Event::End(BytesEnd::new("D:propfind")))?;

        into_string(writer)
    }
}

impl Default for PropFindRequest {
    fn default() -> Self {
        Self::new()
    }
}

/// Time range filter for calendar queries.
#[derive(Debug, Clone)]
pub struct TimeRange {
    /// Start date/time (UTC, `YYYYMMDDTHHMMSSZ`).
    pub start: String,
    /// End date/time.
    pub end: Option<String>,
}

/// calendar-query REPORT builder, filtered to VEVENT components.
#[derive(Debug, Default)]
pub struct CalendarQueryRequest {
    time_range: Option<TimeRange>,
}

impl CalendarQueryRequest {
    /// Creates a new calendar query request.
    #[must_use]
    pub const fn new() -> Self {
        Self { time_range: None }
    }

    /// Sets the time range filter.
    #[must_use]
    pub fn time_range(mut self, start: String, end: Option<String>) -> Self {
        self.time_range = Some(TimeRange { start, end });
        self
    }

    /// Builds the XML body for the calendar query request.
    ///
    /// # Errors
    ///
    /// Returns an error if XML building fails.
    pub fn build(&self) -> Result<String, CalDavError> {
        let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);

        let mut query = BytesStart::new("C:calendar-query");
        query.push_attribute(("xmlns:D", ns::DAV));
        query.push_attribute(("xmlns:C", ns::CALDAV));
        writer.write_event(Event::Start(query))?;

        write_etag_and_data_props(&mut writer)?;

        writer.write_event(Event::Start(BytesStart::new("C:filter")))?;

        let mut vcalendar = BytesStart::new("C:comp-filter");
        vcalendar.push_attribute(("name", "VCALENDAR"));
        writer.write_event(Event::Start(vcalendar))?;

        let mut vevent = BytesStart::new("C:comp-filter");
        vevent.push_attribute(("name", "VEVENT"));
        match &self.time_range {
            Some(tr) => {
                writer.write_event(Event::Start(vevent))?;
                let mut time_range = BytesStart::new("C:time-range");
                time_range.push_attribute(("start", tr.start.as_str()));
                if let Some(end) = &tr.end {
                    time_range.push_attribute(("end", end.as_str()));
                }
                writer.write_event(Event::Empty(time_range))?;
                writer.write_event(Event::End(BytesEnd::new("C:comp-filter")))?;
            }
            None => writer.write_event(Event::Empty(vevent))?,
        }

        writer.write_event(Event::End(BytesEnd::new("C:comp-filter")))?;
        writer.write_event(Event::End(BytesEnd::new("C:filter")))?;
        writer.write_event(Event::End(BytesEnd::new("C:calendar-query")))?;

        into_string(writer)
    }
}

/// calendar-multiget REPORT builder.
#[derive(Debug, Default)]
pub struct CalendarMultiGetRequest {
    hrefs: Vec<String>,
}

impl CalendarMultiGetRequest {
    /// Creates a new calendar multiget request.
    #[must_use]
    pub fn new() -> Self {
        Self { hrefs: Vec::new() }
    }

    /// Adds an href to the request.
    pub fn add_href(&mut self, href: String) -> &mut Self {
        self.hrefs.push(href);
        self
    }

    /// Builds the XML body for the calendar multiget request.
    ///
    /// # Errors
    ///
    /// Returns an error if XML building fails.
    pub fn build(&self) -> Result<String, CalDavError> {
        let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);

        let mut multiget = BytesStart::new("C:calendar-multiget");
        multiget.push_attribute(("xmlns:D", ns::DAV));
        multiget.push_attribute(("xmlns:C", ns::CALDAV));
        writer.write_event(Event::Start(multiget))?;

        write_etag_and_data_props(&mut writer)?;

        for href in &self.hrefs {
            writer.write_event(Event::Start(BytesStart::new("D:href")))?;
            writer.write_event(Event::Text(BytesText::new(href.as_str())))?;
            writer.write_event(Event::End(BytesEnd::new("D:href")))?;
        }

        writer.write_event(Event::End(BytesEnd::new("C:calendar-multiget")))?;

        into_string(writer)
    }
}

/// sync-collection REPORT builder (RFC 6578).
#[derive(Debug)]
pub struct SyncCollectionRequest {
    token: String,
}

impl SyncCollectionRequest {
    /// Creates a request carrying the previously persisted token.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    /// Builds the XML body for the sync-collection request.
    ///
    /// # Errors
    ///
    /// Returns an error if XML building fails.
    pub fn build(&self) -> Result<String, CalDavError> {
        let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);

        let mut sync = BytesStart::new("D:sync-collection");
        sync.push_attribute(("xmlns:D", ns::DAV));
        sync.push_attribute(("xmlns:C", ns::CALDAV));
        writer.write_event(Event::Start(sync))?;

        writer.write_event(Event::Start(BytesStart::new("D:sync-token")))?;
        writer.write_event(Event::Text(BytesText::new(&self.token)))?;
        writer.write_event(Event::End(BytesEnd::new("D:sync-token")))?;

        writer.write_event(Event::Start(BytesStart::new("D:sync-level")))?;
        writer.write_event(Event::Text(BytesText::new("1")))?;
        writer.write_event(Event::End(BytesEnd::new("D:sync-level")))?;

        write_etag_and_data_props(&mut writer)?;

        writer.write_event(Event::End(BytesEnd::new("D:sync-collection")))?;

        into_string(writer)
    }
}

fn write_etag_and_data_props(
    writer: &mut Writer<Cursor<Vec<u8>>>,
) -> Result<(), CalDavError> {
    writer.write_event(Event::Start(BytesStart::new("D:prop")))?;
    writer.write_event(Event::Empty(BytesStart::new("D:getetag")))?;
    writer.write_event(Event::Empty(BytesStart::new("C:calendar-data")))?;
    writer.write_event(Event::End(BytesEnd::new("D:prop")))?;
    Ok(())
}

fn into_string(writer: Writer<Cursor<Vec<u8>>>) -> Result<String, CalDavError> {
    let bytes = writer.into_inner().into_inner();
    String::from_utf8(bytes).map_err(|e| CalDavError::Xml(format!("UTF-8 error: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn propfind_declares_extension_namespaces() {
        let body = PropFindRequest::for_calendars().build().unwrap();
        assert!(body.contains("xmlns:CS=\"http://calendarserver.org/ns/\""));
        assert!(body.contains("<CS:getctag/>"));
        assert!(body.contains("<ICAL:calendar-color/>"));
        assert!(body.contains("<D:sync-token/>"));
    }

    #[test]
    fn query_without_range_uses_empty_vevent_filter() {
        let body = CalendarQueryRequest::new().build().unwrap();
        assert!(body.contains(r#"<C:comp-filter name="VEVENT"/>"#));
        assert!(body.contains("<C:calendar-data/>"));
    }

    #[test]
    fn query_with_range_nests_time_range() {
        let body = CalendarQueryRequest::new()
            .time_range("20250601T000000Z".to_string(), Some("20250701T000000Z".to_string()))
            .build()
            .unwrap();
        assert!(body.contains(r#"<C:time-range start="20250601T000000Z" end="20250701T000000Z"/>"#));
    }

    #[test]
    fn sync_collection_carries_token_and_level() {
        let body = SyncCollectionRequest::new("http://example.com/sync/42")
            .build()
            .unwrap();
        assert!(body.contains("<D:sync-token>http://example.com/sync/42</D:sync-token>"));
        assert!(body.contains("<D:sync-level>1</D:sync-level>"));
    }

    #[test]
    fn multiget_lists_every_href() {
        let mut req = CalendarMultiGetRequest::new();
        req.add_href("/cal/a.ics".to_string())
            .add_href("/cal/b.ics".to_string());
        let body = req.build().unwrap();
        assert!(body.contains("<D:href>/cal/a.ics</D:href>"));
        assert!(body.contains("<D:href>/cal/b.ics</D:href>"));
    }
}
