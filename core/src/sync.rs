// SPDX-FileCopyrightText: 2025-2026 Vesper contributors
//
// SPDX-License-Identifier: Apache-2.0

//! The sync engine: pulls remote accounts into the local mirror and pushes
//! local edits of remote-backed events back out.
//!
//! A pass over one account is sequential: the store is a single-writer
//! embedded database, so calendars are reconciled one at a time. Callers
//! must not overlap two passes on the same account; the engine holds no
//! internal lock.

use std::collections::HashMap;

use jiff::Timestamp;
use vesper_caldav::{CalDavClient, CalDavConfig, ETag, EventsFetch, Href, RemoteCalendar};
use vesper_ical::{EventData, EventPatch, parse_vevent, update_vevent};

use crate::error::CoreError;
use crate::etag::compute_etag;
use crate::model::{Account, Calendar, Event};
use crate::store::{EventWrite, Store};

/// Aggregate outcome of one sync invocation.
#[derive(Debug, Clone, Default)]
pub struct SyncReport {
    /// Number of events inserted or updated.
    pub synced: usize,
    /// Per-calendar (or per-account) failures, accumulated without aborting
    /// the rest of the pass.
    pub errors: Vec<String>,
}

impl SyncReport {
    fn absorb(&mut self, other: Self) {
        self.synced += other.synced;
        self.errors.extend(other.errors);
    }
}

/// Reconciles the local mirror against remote `CalDAV` accounts.
#[derive(Debug, Clone)]
pub struct SyncEngine {
    store: Store,
}

impl SyncEngine {
    /// Creates an engine over the given store.
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    /// The underlying store.
    #[must_use]
    pub const fn store(&self) -> &Store {
        &self.store
    }

    /// Syncs one account: calendar discovery, per-calendar event
    /// reconciliation, sync-token and last-sync bookkeeping.
    ///
    /// A single calendar's failure is recorded in the report and does not
    /// stop the remaining calendars. An unknown account or a failed
    /// calendar listing fails the whole pass.
    #[tracing::instrument(skip(self))]
    pub async fn sync_account(&self, account_id: &str) -> Result<SyncReport, CoreError> {
        let account = self
            .store
            .accounts
            .get(account_id)
            .await?
            .ok_or_else(|| CoreError::AccountNotFound(account_id.to_string()))?;
        let client = client_for(&account)?;

        let remote_calendars = client.fetch_calendars().await?;
        self.reconcile_calendar_list(&account, &remote_calendars)
            .await?;

        let mut report = SyncReport::default();
        for calendar in self.store.calendars.list_for_account(&account.id).await? {
            if !calendar.enabled {
                continue;
            }
            match self.sync_calendar(&client, &calendar).await {
                Ok(synced) => report.synced += synced,
                Err(e) => {
                    tracing::warn!(calendar = %calendar.display_name, error = %e, "calendar sync failed");
                    report
                        .errors
                        .push(format!("{}: {e}", calendar.display_name));
                }
            }
        }

        self.store
            .accounts
            .update_sync_meta(&account.id, Timestamp::now(), None)
            .await?;

        tracing::info!(
            synced = report.synced,
            errors = report.errors.len(),
            "account sync finished"
        );
        Ok(report)
    }

    /// Syncs every account; one account's fatal error becomes a report
    /// entry and does not stop the others.
    pub async fn sync_all_accounts(&self) -> Result<SyncReport, CoreError> {
        let mut report = SyncReport::default();
        for account in self.store.accounts.list().await? {
            match self.sync_account(&account.id).await {
                Ok(r) => report.absorb(r),
                Err(e) => report.errors.push(format!("{}: {e}", account.display_name)),
            }
        }
        Ok(report)
    }

    /// Fire-and-forget sync for opportunistic triggers (page loads, timers).
    /// Failures are logged and never propagate to the foreground.
    pub async fn sync_account_best_effort(&self, account_id: &str) {
        if let Err(e) = self.sync_account(account_id).await {
            tracing::warn!(account_id, error = %e, "best-effort sync failed");
        }
    }

    /// Diffs the remote calendar list against local calendars by URL:
    /// matching ones are updated in place, new ones inserted, and local
    /// calendars whose URL disappeared remotely are deleted (cascading to
    /// their events).
    async fn reconcile_calendar_list(
        &self,
        account: &Account,
        remote: &[RemoteCalendar],
    ) -> Result<(), CoreError> {
        let local = self.store.calendars.list_for_account(&account.id).await?;
        let by_url: HashMap<&str, &Calendar> =
            local.iter().map(|c| (c.url.as_str(), c)).collect();

        for rc in remote {
            let display_name = rc.display_name.as_deref().unwrap_or("Calendar");
            match by_url.get(rc.href.as_str()) {
                Some(existing) => {
                    self.store
                        .calendars
                        .update_remote_meta(
                            &existing.id,
                            display_name,
                            rc.color.as_deref(),
                            rc.ctag.as_deref(),
                        )
                        .await?;
                }
                None => {
                    tracing::debug!(url = %rc.href, "discovered new remote calendar");
                    self.store
                        .calendars
                        .insert_remote(
                            &account.id,
                            rc.href.as_str(),
                            display_name,
                            rc.color.as_deref(),
                            rc.ctag.as_deref(),
                        )
                        .await?;
                }
            }
        }

        for calendar in &local {
            if !remote.iter().any(|rc| rc.href.as_str() == calendar.url) {
                tracing::debug!(url = %calendar.url, "remote calendar disappeared, deleting");
                self.store.calendars.delete(&calendar.id).await?;
            }
        }

        Ok(())
    }

    /// Reconciles one calendar's events. Returns the number of upserts.
    async fn sync_calendar(
        &self,
        client: &CalDavClient,
        calendar: &Calendar,
    ) -> Result<usize, CoreError> {
        let fetch = client
            .fetch_events(
                &Href::from(calendar.url.as_str()),
                calendar.sync_token.as_deref(),
            )
            .await?;

        let existing = self.store.events.refs(&calendar.id).await?;
        let etag_by_uid: HashMap<&str, &str> = existing
            .iter()
            .map(|r| (r.uid.as_str(), r.etag.as_str()))
            .collect();

        let mut synced = 0;
        let mut observed: Vec<String> = Vec::new();

        for object in &fetch.objects {
            if object.data.is_empty() {
                tracing::debug!(href = %object.href, "object without calendar-data, skipping");
                continue;
            }
            let parsed = match parse_vevent(&object.data) {
                Ok(Some(parsed)) => parsed,
                // Non-VEVENT objects legitimately live in the collection.
                Ok(None) => continue,
                Err(e) => {
                    tracing::debug!(href = %object.href, error = %e, "unparsable object, skipping");
                    continue;
                }
            };

            let etag = if object.etag.as_str().is_empty() {
                compute_etag(&object.data)
            } else {
                object.etag.as_str().to_string()
            };

            observed.push(parsed.uid.clone());
            if etag_by_uid.get(parsed.uid.as_str()) == Some(&etag.as_str()) {
                continue;
            }

            self.store
                .events
                .upsert(&EventWrite {
                    calendar_id: &calendar.id,
                    uid: &parsed.uid,
                    etag: &etag,
                    url: object.href.as_str(),
                    raw_ical: &object.data,
                    parsed: &parsed,
                })
                .await?;
            synced += 1;
        }

        self.apply_removals(calendar, &existing, &fetch).await?;

        // Deletion inference is keyed off what the fetch actually was, not
        // off whether a token existed beforehand: a delta response does not
        // enumerate the full remote state, so absence from it proves
        // nothing, while a token that fell back to a full fetch must still
        // reconcile deletions.
        if !fetch.incremental {
            let removed = self
                .store
                .events
                .delete_missing(&calendar.id, &observed)
                .await?;
            if removed > 0 {
                tracing::debug!(removed, calendar = %calendar.display_name, "full-sync reconciliation removed events");
            }
        }

        if let Some(token) = &fetch.sync_token {
            self.store
                .calendars
                .set_sync_token(&calendar.id, Some(token.as_str()))
                .await?;
        }

        Ok(synced)
    }

    /// Applies explicit removal notices from an incremental response.
    async fn apply_removals(
        &self,
        calendar: &Calendar,
        existing: &[crate::store::EventRef],
        fetch: &EventsFetch,
    ) -> Result<(), CoreError> {
        for href in &fetch.removed {
            let uid = existing
                .iter()
                .find(|r| r.url == href.as_str())
                .map(|r| r.uid.clone())
                .or_else(|| uid_from_href(href.as_str()));
            if let Some(uid) = uid {
                self.store.events.delete(&calendar.id, &uid).await?;
            }
        }
        Ok(())
    }

    /// Pushes a brand-new event to a remote-backed calendar and mirrors it
    /// locally.
    pub async fn push_create(
        &self,
        calendar_id: &str,
        data: EventData,
    ) -> Result<Event, CoreError> {
        let (calendar, account) = self.remote_backed(calendar_id).await?;
        let client = client_for(&account)?;

        let href = object_href(&calendar.url, &data.uid);
        let outcome = client.create_event(&Href::from(href.as_str()), &data).await?;

        let etag = outcome
            .etag
            .map_or_else(|| compute_etag(&outcome.ical), |e| e.as_str().to_string());
        self.mirror(&calendar, &data.uid, &etag, &href, &outcome.ical)
            .await
    }

    /// Applies a partial patch to a remote-backed event: patches the raw
    /// object, pushes it conditionally on the stored `ETag`, and mirrors
    /// the result. A 412 surfaces as [`CoreError::Conflict`] and changes
    /// nothing locally.
    pub async fn push_update(
        &self,
        calendar_id: &str,
        uid: &str,
        patch: &EventPatch,
    ) -> Result<Event, CoreError> {
        let (calendar, account) = self.remote_backed(calendar_id).await?;
        let client = client_for(&account)?;

        let event = self
            .store
            .events
            .get(calendar_id, uid)
            .await?
            .ok_or_else(|| CoreError::EventNotFound(uid.to_string()))?;

        let updated = update_vevent(&event.raw_ical, patch)?;
        let new_etag = client
            .update_event(
                &Href::from(event.url.as_str()),
                &ETag::from(event.etag.as_str()),
                &updated,
            )
            .await?;

        let etag = new_etag.map_or_else(|| compute_etag(&updated), |e| e.as_str().to_string());
        self.mirror(&calendar, uid, &etag, &event.url, &updated).await
    }

    /// Deletes a remote-backed event, conditionally on the stored `ETag`,
    /// then removes the local row.
    pub async fn push_delete(&self, calendar_id: &str, uid: &str) -> Result<(), CoreError> {
        let (_, account) = self.remote_backed(calendar_id).await?;
        let client = client_for(&account)?;

        let event = self
            .store
            .events
            .get(calendar_id, uid)
            .await?
            .ok_or_else(|| CoreError::EventNotFound(uid.to_string()))?;

        client
            .delete_event(
                &Href::from(event.url.as_str()),
                Some(&ETag::from(event.etag.as_str())),
            )
            .await?;
        self.store.events.delete(calendar_id, uid).await?;
        Ok(())
    }

    async fn remote_backed(&self, calendar_id: &str) -> Result<(Calendar, Account), CoreError> {
        let calendar = self
            .store
            .calendars
            .get(calendar_id)
            .await?
            .ok_or_else(|| CoreError::CalendarNotFound(calendar_id.to_string()))?;
        let account_id = calendar
            .account_id
            .clone()
            .ok_or_else(|| CoreError::NotRemoteBacked(calendar_id.to_string()))?;
        let account = self
            .store
            .accounts
            .get(&account_id)
            .await?
            .ok_or(CoreError::AccountNotFound(account_id))?;
        Ok((calendar, account))
    }

    async fn mirror(
        &self,
        calendar: &Calendar,
        uid: &str,
        etag: &str,
        url: &str,
        raw_ical: &str,
    ) -> Result<Event, CoreError> {
        let parsed = parse_vevent(raw_ical)?
            .ok_or(vesper_ical::IcalError::MissingProperty("VEVENT"))?;
        self.store
            .events
            .upsert(&EventWrite {
                calendar_id: &calendar.id,
                uid,
                etag,
                url,
                raw_ical,
                parsed: &parsed,
            })
            .await?;
        self.store
            .events
            .get(&calendar.id, uid)
            .await?
            .ok_or_else(|| CoreError::EventNotFound(uid.to_string()))
    }
}

fn client_for(account: &Account) -> Result<CalDavClient, CoreError> {
    let config = CalDavConfig::basic(&account.server_url, &account.username, &account.password);
    CalDavClient::new(config).map_err(CoreError::from)
}

fn object_href(calendar_url: &str, uid: &str) -> String {
    format!("{}{uid}.ics", ensure_trailing_slash(calendar_url))
}

fn ensure_trailing_slash(url: &str) -> String {
    if url.ends_with('/') {
        url.to_string()
    } else {
        format!("{url}/")
    }
}

/// Last path segment without the `.ics` suffix.
fn uid_from_href(href: &str) -> Option<String> {
    href.trim_end_matches('/')
        .rsplit('/')
        .next()
        .and_then(|name| name.strip_suffix(".ics"))
        .filter(|uid| !uid.is_empty())
        .map(ToString::to_string)
}
