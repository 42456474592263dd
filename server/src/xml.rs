// SPDX-FileCopyrightText: 2025-2026 Vesper contributors
//
// SPDX-License-Identifier: Apache-2.0

//! Multistatus document assembly.

use std::io::Cursor;

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use crate::error::ServerError;

/// XML namespaces served in DAV responses.
pub mod ns {
    /// `WebDAV` namespace.
    pub const DAV: &str = "DAV:";
    /// `CalDAV` namespace.
    pub const CALDAV: &str = "urn:ietf:params:xml:ns:caldav";
    /// CalendarServer extensions (getctag).
    pub const CALENDARSERVER: &str = "http://calendarserver.org/ns/";
    /// Apple iCal extensions (calendar-color).
    pub const APPLE: &str = "http://apple.com/ns/ical/";
}

/// One property inside a 200-status propstat.
#[derive(Debug, Clone)]
pub enum DavProp {
    /// `resourcetype` with optional calendar/principal markers.
    ResourceType {
        /// Emit `<C:calendar/>`.
        calendar: bool,
        /// Emit `<D:principal/>`.
        principal: bool,
    },
    /// `displayname`.
    DisplayName(String),
    /// `CS:getctag`.
    GetCTag(String),
    /// `ICAL:calendar-color`.
    CalendarColor(String),
    /// `getetag`.
    GetETag(String),
    /// `getcontenttype`.
    GetContentType(String),
    /// `C:calendar-data` with the raw iCalendar text.
    CalendarData(String),
    /// `current-user-principal` href.
    CurrentUserPrincipal(String),
    /// `C:calendar-home-set` href.
    CalendarHomeSet(String),
    /// `C:supported-calendar-component-set` advertising VEVENT.
    SupportedComponentsVEvent,
}

/// One `<D:response>` entry.
#[derive(Debug, Clone)]
pub struct ResponseEntry {
    /// Resource href.
    pub href: String,
    /// Properties reported with status 200.
    pub props: Vec<DavProp>,
}

impl ResponseEntry {
    /// New entry for a resource.
    #[must_use]
    pub fn new(href: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            props: Vec::new(),
        }
    }

    /// Adds a property.
    #[must_use]
    pub fn prop(mut self, prop: DavProp) -> Self {
        self.props.push(prop);
        self
    }
}

/// Renders a 207 multistatus document.
pub fn render_multistatus(entries: &[ResponseEntry]) -> Result<String, ServerError> {
    let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;

    let mut multistatus = BytesStart::new("D:multistatus");
    multistatus.push_attribute(("xmlns:D", ns::DAV));
    multistatus.push_attribute(("xmlns:C", ns::CALDAV));
    multistatus.push_attribute(("xmlns:CS", ns::CALENDARSERVER));
    multistatus.push_attribute(("xmlns:ICAL", ns::APPLE));
    writer.write_event(Event::Start(multistatus))?;

    for entry in entries {
        writer.write_event(Event::Start(BytesStart::new("D:response")))?;
        write_text_element(&mut writer, "D:href", &entry.href)?;

        writer.write_event(Event::Start(BytesStart::new("D:propstat")))?;
        writer.write_event(Event::Start(BytesStart::new("D:prop")))?;
        for prop in &entry.props {
            write_prop(&mut writer, prop)?;
        }
        writer.write_event(Event::End(BytesEnd::new("D:prop")))?;
        write_text_element(&mut writer, "D:status", "HTTP/1.1 200 OK")?;
        writer.write_event(Event::End(BytesEnd::new("D:propstat")))?;

        writer.write_event(Event::End(BytesEnd::new("D:response")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("D:multistatus")))?;

    let bytes = writer.into_inner().into_inner();
    String::from_utf8(bytes).map_err(|e| ServerError::Xml(format!("UTF-8 error: {e}")))
}

fn write_prop(
    writer: &mut Writer<Cursor<Vec<u8>>>,
    prop: &DavProp,
) -> Result<(), ServerError> {
    match prop {
        DavProp::ResourceType {
            calendar,
            principal,
        } => {
            writer.write_event(Event::Start(BytesStart::new("D:resourcetype")))?;
            writer.write_event(Event::Empty(BytesStart::new("D:collection")))?;
            if *calendar {
                writer.write_event(Event::Empty(BytesStart::new("C:calendar")))?;
            }
            if *principal {
                writer.write_event(Event::Empty(BytesStart::new("D:principal")))?;
            }
            writer.write_event(Event::End(BytesEnd::new("D:resourcetype")))?;
        }
        DavProp::DisplayName(name) => write_text_element(writer, "D:displayname", name)?,
        DavProp::GetCTag(ctag) => write_text_element(writer, "CS:getctag", ctag)?,
        DavProp::CalendarColor(color) => {
            write_text_element(writer, "ICAL:calendar-color", color)?;
        }
        DavProp::GetETag(etag) => write_text_element(writer, "D:getetag", etag)?,
        DavProp::GetContentType(ct) => write_text_element(writer, "D:getcontenttype", ct)?,
        DavProp::CalendarData(data) => write_text_element(writer, "C:calendar-data", data)?,
        DavProp::CurrentUserPrincipal(href) => {
            writer.write_event(Event::Start(BytesStart::new("D:current-user-principal")))?;
            write_text_element(writer, "D:href", href)?;
            writer.write_event(Event::End(BytesEnd::new("D:current-user-principal")))?;
        }
        DavProp::CalendarHomeSet(href) => {
            writer.write_event(Event::Start(BytesStart::new("C:calendar-home-set")))?;
            write_text_element(writer, "D:href", href)?;
            writer.write_event(Event::End(BytesEnd::new("C:calendar-home-set")))?;
        }
        DavProp::SupportedComponentsVEvent => {
            writer.write_event(Event::Start(BytesStart::new(
                "C:supported-calendar-component-set",
            )))?;
            let mut comp = BytesStart::new("C:comp");
            comp.push_attribute(("name", "VEVENT"));
            writer.write_event(Event::Empty(comp))?;
            writer.write_event(Event::End(BytesEnd::new(
                "C:supported-calendar-component-set",
            )))?;
        }
    }
    Ok(())
}

fn write_text_element(
    writer: &mut Writer<Cursor<Vec<u8>>>,
    tag: &str,
    text: &str,
) -> Result<(), ServerError> {
    writer.write_event(Event::Start(BytesStart::new(tag)))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(tag)))?;
    Ok(())
}
