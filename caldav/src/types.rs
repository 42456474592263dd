// SPDX-FileCopyrightText: 2025-2026 Vesper contributors
//
// SPDX-License-Identifier: Apache-2.0

use std::fmt;
use std::ops::Deref;

/// Calendar resource href (path).
///
/// A `Href` is the path of a resource on a `CalDAV` server, such as
/// `/calendars/user/personal/event1.ics`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Href(String);

impl Href {
    /// Creates a new `Href` from a string.
    #[must_use]
    pub const fn new(href: String) -> Self {
        Self(href)
    }

    /// Returns the inner string value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Deref for Href {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<str> for Href {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Href {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for Href {
    fn from(href: String) -> Self {
        Self(href)
    }
}

impl From<&str> for Href {
    fn from(href: &str) -> Self {
        Self(href.to_string())
    }
}

/// Entity tag for optimistic concurrency and change detection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ETag(String);

impl ETag {
    /// Creates a new `ETag` from a string.
    #[must_use]
    pub const fn new(etag: String) -> Self {
        Self(etag)
    }

    /// Returns the inner string value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Deref for ETag {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<str> for ETag {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ETag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for ETag {
    fn from(etag: String) -> Self {
        Self(etag)
    }
}

impl From<&str> for ETag {
    fn from(etag: &str) -> Self {
        Self(etag.to_string())
    }
}

/// A calendar collection as discovered on the remote server.
#[derive(Debug, Clone)]
pub struct RemoteCalendar {
    /// The href of the collection.
    pub href: Href,
    /// Display name, when the server exposes one.
    pub display_name: Option<String>,
    /// Calendar color (apple ns), when exposed.
    pub color: Option<String>,
    /// Collection change tag.
    pub ctag: Option<String>,
    /// WebDAV-sync token, when the server supports RFC 6578.
    pub sync_token: Option<String>,
}

impl RemoteCalendar {
    /// Creates a calendar with only its href known.
    #[must_use]
    pub const fn new(href: Href) -> Self {
        Self {
            href,
            display_name: None,
            color: None,
            ctag: None,
            sync_token: None,
        }
    }
}

/// One calendar object as fetched from the remote server.
///
/// `data` is the raw iCalendar text; interpreting it is the caller's
/// concern.
#[derive(Debug, Clone)]
pub struct RemoteObject {
    /// The href of the object.
    pub href: Href,
    /// The entity tag reported by the server.
    pub etag: ETag,
    /// Raw iCalendar payload.
    pub data: String,
}

/// Result of pushing a new object: the exact payload that went over the
/// wire plus the server-assigned `ETag`, when the server reported one.
#[derive(Debug, Clone)]
pub struct PutOutcome {
    /// The serialized iCalendar body that was sent.
    pub ical: String,
    /// Server-assigned validator.
    pub etag: Option<ETag>,
}

/// Result of fetching a calendar's objects.
#[derive(Debug, Clone, Default)]
pub struct EventsFetch {
    /// New or changed objects (every object, for a full fetch).
    pub objects: Vec<RemoteObject>,
    /// Hrefs reported deleted. Only incremental fetches populate this.
    pub removed: Vec<Href>,
    /// Token to persist for the next incremental fetch.
    pub sync_token: Option<String>,
    /// Whether this fetch was an incremental delta. Deletion inference from
    /// the observed object set is only sound when this is `false`.
    pub incremental: bool,
}
