// SPDX-FileCopyrightText: 2025-2026 Vesper contributors
//
// SPDX-License-Identifier: Apache-2.0

//! Typed CRUD over the SQLite mirror.
//!
//! `Store` owns the pool and exposes one sub-store per entity. Individual
//! operations are single statements or short transactions; nothing holds a
//! transaction across an await on the network.

mod accounts;
mod calendars;
mod events;

use std::path::PathBuf;

use jiff::Timestamp;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

use crate::error::CoreError;

pub use self::accounts::Accounts;
pub use self::calendars::Calendars;
pub use self::events::{EventRef, EventWrite, Events};

/// Handle to the local database.
#[derive(Debug, Clone)]
pub struct Store {
    pool: sqlx::SqlitePool,

    /// Account rows.
    pub accounts: Accounts,
    /// Calendar rows.
    pub calendars: Calendars,
    /// Event rows.
    pub events: Events,
}

impl Store {
    /// Opens a SQLite database and runs migrations.
    ///
    /// `path` of `None` opens an in-memory database (tests). In-memory
    /// databases are pinned to a single pooled connection, otherwise each
    /// connection would see its own empty database.
    pub async fn open(path: Option<PathBuf>) -> Result<Self, CoreError> {
        let (options, max_connections) = match path {
            Some(path) => {
                tracing::info!(path = %path.display(), "opening SQLite database");
                let options = SqliteConnectOptions::new()
                    .filename(path)
                    .create_if_missing(true)
                    .foreign_keys(true);
                (options, 5)
            }
            None => {
                tracing::debug!("opening in-memory SQLite database");
                let options = SqliteConnectOptions::new()
                    .in_memory(true)
                    .foreign_keys(true);
                (options, 1)
            }
        };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self {
            accounts: Accounts::new(pool.clone()),
            calendars: Calendars::new(pool.clone()),
            events: Events::new(pool.clone()),
            pool,
        })
    }

    /// Writes an event and bumps its parent calendar's ctag in one
    /// transaction. Returns `true` when the event did not exist before.
    pub async fn put_event(&self, write: &EventWrite<'_>) -> Result<bool, CoreError> {
        let mut tx = self.pool.begin().await?;

        let existing: Option<(String,)> =
            sqlx::query_as("SELECT id FROM events WHERE calendar_id = ? AND uid = ?")
                .bind(write.calendar_id)
                .bind(write.uid)
                .fetch_optional(&mut *tx)
                .await?;

        events::upsert_in(&mut tx, write).await?;
        calendars::bump_ctag_in(&mut tx, write.calendar_id).await?;

        tx.commit().await?;
        Ok(existing.is_none())
    }

    /// Deletes an event and bumps its parent calendar's ctag. Returns
    /// `false` when no such event existed.
    pub async fn delete_event(&self, calendar_id: &str, uid: &str) -> Result<bool, CoreError> {
        let mut tx = self.pool.begin().await?;

        let deleted = sqlx::query("DELETE FROM events WHERE calendar_id = ? AND uid = ?")
            .bind(calendar_id)
            .bind(uid)
            .execute(&mut *tx)
            .await?
            .rows_affected()
            > 0;

        if deleted {
            calendars::bump_ctag_in(&mut tx, calendar_id).await?;
        }

        tx.commit().await?;
        Ok(deleted)
    }

    /// Closes the pool.
    pub async fn close(self) {
        self.pool.close().await;
    }
}

pub(crate) fn format_ts(ts: Timestamp) -> String {
    ts.to_string()
}

pub(crate) fn parse_ts(raw: &str) -> Result<Timestamp, CoreError> {
    raw.parse()
        .map_err(|e| CoreError::InvalidData(format!("timestamp {raw:?}: {e}")))
}

#[cfg(test)]
mod tests {
    use vesper_ical::{EventStatus, ParsedEvent};

    use super::*;

    async fn store() -> Store {
        Store::open(None).await.expect("in-memory store")
    }

    fn parsed(uid: &str, title: &str) -> ParsedEvent {
        ParsedEvent {
            uid: uid.to_string(),
            title: title.to_string(),
            description: None,
            location: None,
            start_at: "2025-06-01T09:00:00Z".parse().unwrap(),
            end_at: "2025-06-01T09:30:00Z".parse().unwrap(),
            all_day: false,
            status: EventStatus::Confirmed,
        }
    }

    #[tokio::test]
    async fn put_event_reports_created_and_bumps_ctag() {
        let store = store().await;
        let cal = store.calendars.ensure_local().await.unwrap();
        let before = cal.ctag.clone();

        let event = parsed("e1", "One");
        let created = store
            .put_event(&EventWrite {
                calendar_id: &cal.id,
                uid: "e1",
                etag: "\"a\"",
                url: "/api/caldav/calendars/x/e1.ics",
                raw_ical: "BEGIN:VCALENDAR\r\nEND:VCALENDAR\r\n",
                parsed: &event,
            })
            .await
            .unwrap();
        assert!(created);

        let cal = store.calendars.get(&cal.id).await.unwrap().unwrap();
        assert_ne!(cal.ctag, before);

        let again = store
            .put_event(&EventWrite {
                calendar_id: &cal.id,
                uid: "e1",
                etag: "\"b\"",
                url: "/api/caldav/calendars/x/e1.ics",
                raw_ical: "BEGIN:VCALENDAR\r\nEND:VCALENDAR\r\n",
                parsed: &parsed("e1", "One again"),
            })
            .await
            .unwrap();
        assert!(!again);

        let stored = store.events.get(&cal.id, "e1").await.unwrap().unwrap();
        assert_eq!(stored.title, "One again");
        assert_eq!(stored.etag, "\"b\"");
    }

    #[tokio::test]
    async fn delete_event_is_idempotent() {
        let store = store().await;
        let cal = store.calendars.ensure_local().await.unwrap();

        assert!(!store.delete_event(&cal.id, "ghost").await.unwrap());

        let event = parsed("e1", "One");
        store
            .put_event(&EventWrite {
                calendar_id: &cal.id,
                uid: "e1",
                etag: "\"a\"",
                url: "/x/e1.ics",
                raw_ical: "BEGIN:VCALENDAR\r\nEND:VCALENDAR\r\n",
                parsed: &event,
            })
            .await
            .unwrap();

        assert!(store.delete_event(&cal.id, "e1").await.unwrap());
        assert!(store.events.get(&cal.id, "e1").await.unwrap().is_none());
    }
}
