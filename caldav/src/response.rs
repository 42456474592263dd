// SPDX-FileCopyrightText: 2025-2026 Vesper contributors
//
// SPDX-License-Identifier: Apache-2.0

//! Multistatus response parsing.

use quick_xml::events::{BytesText, Event};

use crate::error::CalDavError;
use crate::types::{ETag, Href, RemoteCalendar, RemoteObject};

/// Decodes and unescapes the textual content of a text event.
///
/// quick-xml emits `Text` events with their XML entities still escaped, so
/// decode the bytes and then unescape to recover the original value.
fn text_value(text: &BytesText) -> Result<String, CalDavError> {
    let decoded = text.decode().map_err(quick_xml::Error::from)?;
    Ok(quick_xml::escape::unescape(&decoded)
        .map_err(quick_xml::Error::from)?
        .into_owned())
}

/// `WebDAV` multistatus response.
#[derive(Debug, Clone, Default)]
pub struct MultiStatusResponse {
    /// The response items.
    pub responses: Vec<ResponseItem>,
    /// Document-level sync token (direct child of multistatus, RFC 6578).
    pub sync_token: Option<String>,
}

/// Individual response in multistatus.
#[derive(Debug, Clone)]
pub struct ResponseItem {
    pub href: Href,
    pub prop_stats: Vec<PropStat>,
    /// Top-level status; sync-collection marks removals with 404 here.
    pub status: Option<String>,
}

/// Property stat with status and value.
#[derive(Debug, Clone)]
pub struct PropStat {
    pub props: Properties,
    pub status: String,
}

/// WebDAV/CalDAV properties.
#[derive(Debug, Clone, Default)]
pub struct Properties {
    pub display_name: Option<String>,
    pub get_etag: Option<ETag>,
    pub get_ctag: Option<String>,
    pub calendar_color: Option<String>,
    pub calendar_data: Option<String>,
    pub sync_token: Option<String>,
    pub is_calendar: bool,
    pub is_collection: bool,
}

impl MultiStatusResponse {
    /// Parses a multistatus response from XML.
    ///
    /// # Errors
    ///
    /// Returns an error if XML parsing fails.
    #[allow(clippy::too_many_lines)]
    pub fn from_xml(xml: &str) -> Result<Self, CalDavError> {
        let mut reader = quick_xml::Reader::from_str(xml);
        reader.config_mut().trim_text(true);
        reader.config_mut().check_end_names = true;

        let mut parsed = Self::default();
        let mut current_response: Option<ResponseItem> = None;
        let mut current_prop_stats: Vec<PropStat> = Vec::new();
        let mut current_props = Properties::default();
        let mut in_prop = false;
        let mut in_response = false;
        let mut in_propstat = false;

        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::End(ref e) if e.name().local_name().into_inner() == b"multistatus" => break,
                Event::Eof => break,

                Event::Start(ref e) => match e.name().local_name().into_inner() {
                    b"response" => {
                        in_response = true;
                        current_response = Some(ResponseItem {
                            href: Href::new(String::new()),
                            prop_stats: Vec::new(),
                            status: None,
                        });
                    }
                    b"href" if in_response => {
                        if let Event::Text(text) = reader.read_event_into(&mut buf)? {
                            let href = text_value(&text)?;
                            if let Some(resp) = &mut current_response {
                                // sync-collection removals repeat the href
                                // element; the first one wins.
                                if resp.href.as_str().is_empty() {
                                    resp.href = Href::new(href);
                                }
                            }
                        }
                    }
                    b"propstat" if in_response => {
                        in_propstat = true;
                        current_props = Properties::default();
                    }

                    b"prop" => in_prop = true,

                    b"displayname" if in_prop => {
                        if let Event::Text(text) = reader.read_event_into(&mut buf)? {
                            current_props.display_name = Some(text_value(&text)?);
                        }
                    }
                    b"resourcetype" if in_prop => {
                        current_props.is_collection = true;
                        loop {
                            match reader.read_event_into(&mut buf)? {
                                Event::End(ref e)
                                    if e.name().local_name().into_inner() == b"resourcetype" =>
                                {
                                    break;
                                }
                                Event::Start(ref e) | Event::Empty(ref e) => {
                                    if e.name().local_name().into_inner() == b"calendar" {
                                        current_props.is_calendar = true;
                                    }
                                }
                                Event::Eof => {
                                    return Err(CalDavError::Xml("Unexpected EOF".to_string()));
                                }
                                _ => {}
                            }
                        }
                    }
                    b"getetag" if in_prop => {
                        if let Event::Text(text) = reader.read_event_into(&mut buf)? {
                            current_props.get_etag = Some(ETag::new(text_value(&text)?));
                        }
                    }
                    b"getctag" if in_prop => {
                        if let Event::Text(text) = reader.read_event_into(&mut buf)? {
                            current_props.get_ctag = Some(text_value(&text)?);
                        }
                    }
                    b"calendar-color" if in_prop => {
                        if let Event::Text(text) = reader.read_event_into(&mut buf)? {
                            current_props.calendar_color = Some(text_value(&text)?);
                        }
                    }
                    b"calendar-data" if in_prop => {
                        if let Event::Text(text) = reader.read_event_into(&mut buf)? {
                            current_props.calendar_data = Some(text_value(&text)?);
                        }
                    }
                    b"sync-token" => {
                        if let Event::Text(text) = reader.read_event_into(&mut buf)? {
                            let token = text_value(&text)?;
                            if in_prop {
                                current_props.sync_token = Some(token);
                            } else if !in_response {
                                parsed.sync_token = Some(token);
                            }
                        }
                    }
                    b"status" => {
                        if let Event::Text(text) = reader.read_event_into(&mut buf)? {
                            let status = text_value(&text)?;
                            if in_propstat {
                                current_prop_stats.push(PropStat {
                                    props: current_props.clone(),
                                    status,
                                });
                            } else if let Some(resp) = &mut current_response {
                                resp.status = Some(status);
                            }
                        }
                    }
                    _ => {}
                },
                Event::End(ref e) => match e.name().local_name().into_inner() {
                    b"response" if in_response => {
                        in_response = false;
                        if let Some(mut resp) = current_response.take() {
                            resp.prop_stats.clone_from(&current_prop_stats);
                            current_prop_stats.clear();
                            parsed.responses.push(resp);
                        }
                    }
                    b"propstat" if in_propstat => in_propstat = false,
                    b"prop" => in_prop = false,
                    _ => {}
                },
                _ => {}
            }
            buf.clear();
        }

        Ok(parsed)
    }

    /// Collects calendar collections (responses whose resourcetype carries
    /// `<calendar/>`).
    #[must_use]
    pub fn into_collections(self) -> Vec<RemoteCalendar> {
        let mut collections = Vec::new();

        for response in self.responses {
            for prop_stat in &response.prop_stats {
                if !prop_stat.status.contains("200") {
                    continue;
                }
                if prop_stat.props.is_calendar && prop_stat.props.is_collection {
                    let mut collection = RemoteCalendar::new(response.href.clone());
                    collection
                        .display_name
                        .clone_from(&prop_stat.props.display_name);
                    collection.color.clone_from(&prop_stat.props.calendar_color);
                    collection.ctag.clone_from(&prop_stat.props.get_ctag);
                    collection
                        .sync_token
                        .clone_from(&prop_stat.props.sync_token);
                    collections.push(collection);
                }
            }
        }

        collections
    }

    /// Splits the responses into present objects and removed hrefs.
    ///
    /// An object is "present" when a 200 propstat carries calendar-data or
    /// at least an etag; a response whose own status is 404 is a removal
    /// notice (sync-collection delta).
    #[must_use]
    pub fn into_objects(self) -> (Vec<RemoteObject>, Vec<Href>) {
        let mut objects = Vec::new();
        let mut removed = Vec::new();

        for response in self.responses {
            if response
                .status
                .as_deref()
                .is_some_and(|s| s.contains("404"))
            {
                removed.push(response.href);
                continue;
            }

            for prop_stat in &response.prop_stats {
                if !prop_stat.status.contains("200") {
                    continue;
                }
                if prop_stat.props.calendar_data.is_some() || prop_stat.props.get_etag.is_some() {
                    objects.push(RemoteObject {
                        href: response.href.clone(),
                        etag: prop_stat
                            .props
                            .get_etag
                            .clone()
                            .unwrap_or_else(|| ETag::new(String::new())),
                        data: prop_stat.props.calendar_data.clone().unwrap_or_default(),
                    });
                    break;
                }
            }
        }

        (objects, removed)
    }
}
