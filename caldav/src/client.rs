// SPDX-FileCopyrightText: 2025-2026 Vesper contributors
//
// SPDX-License-Identifier: Apache-2.0

//! `CalDAV` client operations.

use std::sync::Arc;

use reqwest::Method;
use vesper_ical::{EventData, build_vevent};

use crate::config::CalDavConfig;
use crate::error::CalDavError;
use crate::http::HttpClient;
use crate::request::{
    CalendarMultiGetRequest, CalendarQueryRequest, PropFindRequest, SyncCollectionRequest,
};
use crate::response::MultiStatusResponse;
use crate::types::{ETag, EventsFetch, Href, PutOutcome, RemoteCalendar, RemoteObject};

/// `CalDAV` client for one remote account.
///
/// Each operation is a single authenticated HTTP exchange; the client keeps
/// no per-connection protocol state beyond the connection pool.
#[derive(Debug, Clone)]
pub struct CalDavClient {
    http: Arc<HttpClient>,
    base: reqwest::Url,
}

impl CalDavClient {
    /// Creates a new `CalDAV` client.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is unparseable or HTTP client
    /// initialization fails.
    pub fn new(config: CalDavConfig) -> Result<Self, CalDavError> {
        let base = reqwest::Url::parse(&config.base_url)
            .map_err(|e| CalDavError::Config(format!("invalid base URL: {e}")))?;
        let http = HttpClient::new(config)?;
        Ok(Self {
            http: Arc::new(http),
            base,
        })
    }

    /// Lists the account's calendar collections (Depth-1 PROPFIND on the
    /// calendar home).
    ///
    /// # Errors
    ///
    /// Returns an error if the PROPFIND fails.
    pub async fn fetch_calendars(&self) -> Result<Vec<RemoteCalendar>, CalDavError> {
        let url = self.base.clone();
        let body = PropFindRequest::for_calendars().build()?;

        let resp = self
            .http
            .execute(
                self.http
                    .build_request(HttpClient::propfind()?, url.as_str())
                    .header("Content-Type", "application/xml; charset=utf-8")
                    .header("Depth", "1")
                    .body(body),
            )
            .await?;

        let xml = resp.text().await?;
        Ok(MultiStatusResponse::from_xml(&xml)?.into_collections())
    }

    /// Fetches a calendar's objects.
    ///
    /// With a sync token this attempts an incremental sync-collection
    /// REPORT; a token the server no longer accepts is a soft failure that
    /// falls back to the full fetch. The returned
    /// [`EventsFetch::incremental`] flag reports what actually happened;
    /// callers must key deletion inference off it, not off whether they
    /// passed a token.
    ///
    /// # Errors
    ///
    /// Returns an error when the remote call fails for any reason other
    /// than token invalidation.
    pub async fn fetch_events(
        &self,
        calendar_href: &Href,
        sync_token: Option<&str>,
    ) -> Result<EventsFetch, CalDavError> {
        if let Some(token) = sync_token {
            match self.sync_collection(calendar_href, token).await {
                Ok(fetch) => return Ok(fetch),
                Err(e) if e.is_invalid_sync_token() => {
                    tracing::warn!(
                        href = %calendar_href,
                        error = %e,
                        "sync token rejected by server, falling back to full fetch"
                    );
                }
                Err(e) => return Err(e),
            }
        }
        self.full_fetch(calendar_href).await
    }

    /// Creates a new calendar object from event data.
    ///
    /// Frames the payload itself and sends `If-None-Match: *` so an
    /// existing object is never clobbered. The outcome carries the exact
    /// body that was pushed, for callers mirroring it locally.
    ///
    /// # Errors
    ///
    /// Returns an error if creation fails; an existing object surfaces as
    /// a precondition failure.
    pub async fn create_event(
        &self,
        href: &Href,
        data: &EventData,
    ) -> Result<PutOutcome, CalDavError> {
        let url = self.full_url(href)?;
        let ical = build_vevent(data);

        let resp = self
            .http
            .execute(HttpClient::if_none_match_any(
                self.http
                    .build_request(Method::PUT, url.as_str())
                    .header("Content-Type", "text/calendar; charset=utf-8")
                    .body(ical.clone()),
            ))
            .await?;

        Ok(PutOutcome {
            ical,
            etag: HttpClient::extract_etag(&resp),
        })
    }

    /// Updates an existing calendar object, conditional on its `ETag`.
    ///
    /// # Errors
    ///
    /// Returns [`CalDavError::PreconditionFailed`] when the object changed
    /// on the server since the `ETag` was recorded.
    pub async fn update_event(
        &self,
        href: &Href,
        etag: &ETag,
        ical: &str,
    ) -> Result<Option<ETag>, CalDavError> {
        let url = self.full_url(href)?;

        let resp = self
            .http
            .execute(HttpClient::if_match(
                self.http
                    .build_request(Method::PUT, url.as_str())
                    .header("Content-Type", "text/calendar; charset=utf-8")
                    .body(ical.to_string()),
                etag,
            ))
            .await?;

        Ok(HttpClient::extract_etag(&resp))
    }

    /// Deletes a calendar object, conditionally when an `ETag` is given.
    ///
    /// A 404 is treated as success: the object is already gone.
    ///
    /// # Errors
    ///
    /// Returns an error if deletion fails, including a precondition
    /// failure for a stale `ETag`.
    pub async fn delete_event(
        &self,
        href: &Href,
        etag: Option<&ETag>,
    ) -> Result<(), CalDavError> {
        let url = self.full_url(href)?;

        let mut req = self.http.build_request(Method::DELETE, url.as_str());
        if let Some(etag) = etag {
            req = HttpClient::if_match(req, etag);
        }

        match self.http.execute(req).await {
            Ok(_) | Err(CalDavError::Status { status: 404, .. }) => Ok(()),
            Err(e) => Err(e),
        }
    }

    async fn sync_collection(
        &self,
        calendar_href: &Href,
        token: &str,
    ) -> Result<EventsFetch, CalDavError> {
        let url = self.full_url(calendar_href)?;
        let body = SyncCollectionRequest::new(token).build()?;

        let resp = self
            .http
            .execute(
                self.http
                    .build_request(HttpClient::report()?, url.as_str())
                    .header("Content-Type", "application/xml; charset=utf-8")
                    .body(body),
            )
            .await?;

        let xml = resp.text().await?;
        let parsed = MultiStatusResponse::from_xml(&xml)?;
        let sync_token = parsed.sync_token.clone();
        let (objects, removed) = parsed.into_objects();

        let objects = self
            .fill_missing_data(calendar_href, strip_collection(objects, calendar_href))
            .await?;
        let removed = removed
            .into_iter()
            .filter(|href| !is_collection_href(href, calendar_href))
            .collect();

        Ok(EventsFetch {
            objects,
            removed,
            sync_token,
            incremental: true,
        })
    }

    async fn full_fetch(&self, calendar_href: &Href) -> Result<EventsFetch, CalDavError> {
        let url = self.full_url(calendar_href)?;
        let body = CalendarQueryRequest::new().build()?;

        let resp = self
            .http
            .execute(
                self.http
                    .build_request(HttpClient::report()?, url.as_str())
                    .header("Content-Type", "application/xml; charset=utf-8")
                    .header("Depth", "1")
                    .body(body),
            )
            .await?;

        let xml = resp.text().await?;
        let (objects, _) = MultiStatusResponse::from_xml(&xml)?.into_objects();
        let objects = self
            .fill_missing_data(calendar_href, strip_collection(objects, calendar_href))
            .await?;

        // Pick up a token for the next run. Failure here only costs the next
        // sync a full fetch, so it is logged and swallowed.
        let sync_token = match self.fetch_sync_token(calendar_href).await {
            Ok(token) => token,
            Err(e) => {
                tracing::debug!(href = %calendar_href, error = %e, "no sync token after full fetch");
                None
            }
        };

        Ok(EventsFetch {
            objects,
            removed: Vec::new(),
            sync_token,
            incremental: false,
        })
    }

    /// Multigets calendar-data for objects a report listed etag-only.
    async fn fill_missing_data(
        &self,
        calendar_href: &Href,
        objects: Vec<RemoteObject>,
    ) -> Result<Vec<RemoteObject>, CalDavError> {
        let missing: Vec<Href> = objects
            .iter()
            .filter(|o| o.data.is_empty())
            .map(|o| o.href.clone())
            .collect();
        if missing.is_empty() {
            return Ok(objects);
        }

        let url = self.full_url(calendar_href)?;
        let mut multiget = CalendarMultiGetRequest::new();
        for href in &missing {
            multiget.add_href(href.as_str().to_string());
        }
        let body = multiget.build()?;

        let resp = self
            .http
            .execute(
                self.http
                    .build_request(HttpClient::report()?, url.as_str())
                    .header("Content-Type", "application/xml; charset=utf-8")
                    .body(body),
            )
            .await?;

        let xml = resp.text().await?;
        let (fetched, _) = MultiStatusResponse::from_xml(&xml)?.into_objects();

        let mut objects = objects;
        for object in &mut objects {
            if !object.data.is_empty() {
                continue;
            }
            if let Some(full) = fetched.iter().find(|f| f.href == object.href) {
                object.data.clone_from(&full.data);
                if !full.etag.as_str().is_empty() {
                    object.etag = full.etag.clone();
                }
            }
        }
        // Hrefs the multiget did not resolve stay empty; callers skip them.
        Ok(objects)
    }

    async fn fetch_sync_token(
        &self,
        calendar_href: &Href,
    ) -> Result<Option<String>, CalDavError> {
        let url = self.full_url(calendar_href)?;
        let mut propfind = PropFindRequest::new();
        propfind.add_property(crate::request::Prop::SyncToken);
        let body = propfind.build()?;

        let resp = self
            .http
            .execute(
                self.http
                    .build_request(HttpClient::propfind()?, url.as_str())
                    .header("Content-Type", "application/xml; charset=utf-8")
                    .header("Depth", "0")
                    .body(body),
            )
            .await?;

        let xml = resp.text().await?;
        let parsed = MultiStatusResponse::from_xml(&xml)?;
        Ok(parsed.responses.into_iter().find_map(|r| {
            r.prop_stats
                .into_iter()
                .find(|p| p.status.contains("200"))
                .and_then(|p| p.props.sync_token)
        }))
    }

    fn full_url(&self, href: &Href) -> Result<reqwest::Url, CalDavError> {
        self.base
            .join(href.as_str())
            .map_err(|e| CalDavError::Config(format!("invalid href {href}: {e}")))
    }
}

/// Drops the collection's own entry, which some servers include in report
/// results.
fn strip_collection(objects: Vec<RemoteObject>, calendar_href: &Href) -> Vec<RemoteObject> {
    objects
        .into_iter()
        .filter(|o| !is_collection_href(&o.href, calendar_href))
        .collect()
}

fn is_collection_href(href: &Href, calendar_href: &Href) -> bool {
    href.as_str().trim_end_matches('/') == calendar_href.as_str().trim_end_matches('/')
}
