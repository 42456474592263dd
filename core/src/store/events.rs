// SPDX-FileCopyrightText: 2025-2026 Vesper contributors
//
// SPDX-License-Identifier: Apache-2.0

use jiff::Timestamp;
use sqlx::{Sqlite, SqlitePool, Transaction};
use uuid::Uuid;
use vesper_ical::ParsedEvent;

use super::{format_ts, parse_ts};
use crate::error::CoreError;
use crate::model::Event;

const COLUMNS: &str = "id, calendar_id, uid, etag, url, title, description, location, \
     start_at, end_at, all_day, status, raw_ical, created_at, updated_at";

/// One event write: the authoritative text plus its freshly derived
/// projection. Constructing this type is the only way to touch `raw_ical`,
/// so the projection can never drift from it.
#[derive(Debug, Clone, Copy)]
pub struct EventWrite<'a> {
    /// Parent calendar id.
    pub calendar_id: &'a str,
    /// iCalendar UID.
    pub uid: &'a str,
    /// Content validator to store.
    pub etag: &'a str,
    /// Object href.
    pub url: &'a str,
    /// Authoritative iCalendar text.
    pub raw_ical: &'a str,
    /// Projection derived from `raw_ical` by the caller in the same unit of
    /// work.
    pub parsed: &'a ParsedEvent,
}

/// Lightweight per-calendar event listing used for sync diffing.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct EventRef {
    /// iCalendar UID.
    pub uid: String,
    /// Stored validator.
    pub etag: String,
    /// Stored href.
    pub url: String,
}

/// Events sub-store.
#[derive(Debug, Clone)]
pub struct Events {
    pool: SqlitePool,
}

impl Events {
    pub(crate) fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Inserts or updates by `(calendar_id, uid)`, re-deriving the
    /// projection columns from the write's parsed event.
    pub async fn upsert(&self, write: &EventWrite<'_>) -> Result<(), CoreError> {
        upsert_with(&self.pool, write).await
    }

    /// Fetches one event by calendar and UID.
    pub async fn get(&self, calendar_id: &str, uid: &str) -> Result<Option<Event>, CoreError> {
        let row: Option<EventRow> = sqlx::query_as(&format!(
            "SELECT {COLUMNS} FROM events WHERE calendar_id = ? AND uid = ?"
        ))
        .bind(calendar_id)
        .bind(uid)
        .fetch_optional(&self.pool)
        .await?;
        row.map(EventRow::into_event).transpose()
    }

    /// Lists a calendar's events ordered by start.
    pub async fn list_for_calendar(&self, calendar_id: &str) -> Result<Vec<Event>, CoreError> {
        let rows: Vec<EventRow> = sqlx::query_as(&format!(
            "SELECT {COLUMNS} FROM events WHERE calendar_id = ? ORDER BY start_at ASC"
        ))
        .bind(calendar_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(EventRow::into_event).collect()
    }

    /// UID/etag/url triples for sync diffing.
    pub async fn refs(&self, calendar_id: &str) -> Result<Vec<EventRef>, CoreError> {
        Ok(
            sqlx::query_as("SELECT uid, etag, url FROM events WHERE calendar_id = ?")
                .bind(calendar_id)
                .fetch_all(&self.pool)
                .await?,
        )
    }

    /// Deletes one event without touching the calendar ctag (sync path).
    pub async fn delete(&self, calendar_id: &str, uid: &str) -> Result<bool, CoreError> {
        let result = sqlx::query("DELETE FROM events WHERE calendar_id = ? AND uid = ?")
            .bind(calendar_id)
            .bind(uid)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Full-sync reconciliation: deletes every event of the calendar whose
    /// UID is not in `keep`. Returns the number of rows removed.
    pub async fn delete_missing(
        &self,
        calendar_id: &str,
        keep: &[String],
    ) -> Result<u64, CoreError> {
        if keep.is_empty() {
            let result = sqlx::query("DELETE FROM events WHERE calendar_id = ?")
                .bind(calendar_id)
                .execute(&self.pool)
                .await?;
            return Ok(result.rows_affected());
        }

        let placeholders = vec!["?"; keep.len()].join(", ");
        let sql = format!(
            "DELETE FROM events WHERE calendar_id = ? AND uid NOT IN ({placeholders})"
        );
        let mut query = sqlx::query(&sql).bind(calendar_id);
        for uid in keep {
            query = query.bind(uid);
        }
        let result = query.execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    /// Events of enabled calendars overlapping `[start, end)`, the calendar
    /// UI's range query.
    pub async fn by_date_range(
        &self,
        start: Timestamp,
        end: Timestamp,
    ) -> Result<Vec<Event>, CoreError> {
        let rows: Vec<EventRow> = sqlx::query_as(&format!(
            "SELECT e.{columns} FROM events e \
             JOIN calendars c ON c.id = e.calendar_id \
             WHERE c.enabled = 1 AND e.start_at < ? AND e.end_at > ? \
             ORDER BY e.start_at ASC",
            columns = COLUMNS.replace(", ", ", e.")
        ))
        .bind(format_ts(end))
        .bind(format_ts(start))
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(EventRow::into_event).collect()
    }
}

pub(crate) async fn upsert_in(
    tx: &mut Transaction<'_, Sqlite>,
    write: &EventWrite<'_>,
) -> Result<(), CoreError> {
    upsert_with(&mut **tx, write).await
}

async fn upsert_with<'e, E>(executor: E, write: &EventWrite<'_>) -> Result<(), CoreError>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    const SQL: &str = "\
INSERT INTO events (id, calendar_id, uid, etag, url, title, description, location,
                    start_at, end_at, all_day, status, raw_ical, created_at, updated_at)
VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
ON CONFLICT(calendar_id, uid) DO UPDATE SET
    etag        = excluded.etag,
    url         = excluded.url,
    title       = excluded.title,
    description = excluded.description,
    location    = excluded.location,
    start_at    = excluded.start_at,
    end_at      = excluded.end_at,
    all_day     = excluded.all_day,
    status      = excluded.status,
    raw_ical    = excluded.raw_ical,
    updated_at  = excluded.updated_at;
";

    let now = format_ts(Timestamp::now());
    sqlx::query(SQL)
        .bind(Uuid::new_v4().to_string())
        .bind(write.calendar_id)
        .bind(write.uid)
        .bind(write.etag)
        .bind(write.url)
        .bind(&write.parsed.title)
        .bind(&write.parsed.description)
        .bind(&write.parsed.location)
        .bind(format_ts(write.parsed.start_at))
        .bind(format_ts(write.parsed.end_at))
        .bind(write.parsed.all_day)
        .bind(write.parsed.status.to_string())
        .bind(write.raw_ical)
        .bind(&now)
        .bind(&now)
        .execute(executor)
        .await?;
    Ok(())
}

#[derive(Debug, sqlx::FromRow)]
struct EventRow {
    id: String,
    calendar_id: String,
    uid: String,
    etag: String,
    url: String,
    title: String,
    description: Option<String>,
    location: Option<String>,
    start_at: String,
    end_at: String,
    all_day: bool,
    status: String,
    raw_ical: String,
    created_at: String,
    updated_at: String,
}

impl EventRow {
    fn into_event(self) -> Result<Event, CoreError> {
        Ok(Event {
            status: self
                .status
                .parse()
                .map_err(|_| CoreError::InvalidData(format!("status {:?}", self.status)))?,
            start_at: parse_ts(&self.start_at)?,
            end_at: parse_ts(&self.end_at)?,
            created_at: parse_ts(&self.created_at)?,
            updated_at: parse_ts(&self.updated_at)?,
            id: self.id,
            calendar_id: self.calendar_id,
            uid: self.uid,
            etag: self.etag,
            url: self.url,
            title: self.title,
            description: self.description,
            location: self.location,
            all_day: self.all_day,
            raw_ical: self.raw_ical,
        })
    }
}

#[cfg(test)]
mod tests {
    use vesper_ical::EventStatus;

    use crate::store::Store;

    use super::*;

    async fn seeded() -> (Store, String) {
        let store = Store::open(None).await.unwrap();
        let calendar = store.calendars.ensure_local().await.unwrap();
        (store, calendar.id)
    }

    fn parsed(uid: &str, start: &str, end: &str) -> ParsedEvent {
        ParsedEvent {
            uid: uid.to_string(),
            title: format!("Event {uid}"),
            description: None,
            location: None,
            start_at: start.parse().unwrap(),
            end_at: end.parse().unwrap(),
            all_day: false,
            status: EventStatus::Confirmed,
        }
    }

    async fn put(store: &Store, calendar_id: &str, event: &ParsedEvent) {
        store
            .events
            .upsert(&EventWrite {
                calendar_id,
                uid: &event.uid,
                etag: "\"e\"",
                url: &format!("/cal/{}.ics", event.uid),
                raw_ical: "BEGIN:VCALENDAR\r\nEND:VCALENDAR\r\n",
                parsed: event,
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn upsert_updates_projection_in_place() {
        let (store, cal) = seeded().await;
        put(&store, &cal, &parsed("e1", "2025-06-01T09:00:00Z", "2025-06-01T10:00:00Z")).await;

        let mut changed = parsed("e1", "2025-06-01T09:00:00Z", "2025-06-01T10:00:00Z");
        changed.title = "Renamed".to_string();
        put(&store, &cal, &changed).await;

        let events = store.events.list_for_calendar(&cal).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].title, "Renamed");
    }

    #[tokio::test]
    async fn delete_missing_keeps_listed_uids() {
        let (store, cal) = seeded().await;
        put(&store, &cal, &parsed("a", "2025-06-01T09:00:00Z", "2025-06-01T10:00:00Z")).await;
        put(&store, &cal, &parsed("b", "2025-06-02T09:00:00Z", "2025-06-02T10:00:00Z")).await;

        let removed = store
            .events
            .delete_missing(&cal, &["a".to_string()])
            .await
            .unwrap();
        assert_eq!(removed, 1);

        let refs = store.events.refs(&cal).await.unwrap();
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].uid, "a");
    }

    #[tokio::test]
    async fn delete_missing_with_empty_keep_clears_calendar() {
        let (store, cal) = seeded().await;
        put(&store, &cal, &parsed("a", "2025-06-01T09:00:00Z", "2025-06-01T10:00:00Z")).await;

        let removed = store.events.delete_missing(&cal, &[]).await.unwrap();
        assert_eq!(removed, 1);
        assert!(store.events.refs(&cal).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn by_date_range_uses_overlap_semantics() {
        let (store, cal) = seeded().await;
        put(&store, &cal, &parsed("in", "2025-06-10T09:00:00Z", "2025-06-10T10:00:00Z")).await;
        put(&store, &cal, &parsed("before", "2025-06-01T09:00:00Z", "2025-06-01T10:00:00Z")).await;
        put(&store, &cal, &parsed("spans", "2025-06-09T00:00:00Z", "2025-06-12T00:00:00Z")).await;

        let events = store
            .events
            .by_date_range(
                "2025-06-10T00:00:00Z".parse().unwrap(),
                "2025-06-11T00:00:00Z".parse().unwrap(),
            )
            .await
            .unwrap();

        let uids: Vec<&str> = events.iter().map(|e| e.uid.as_str()).collect();
        assert_eq!(uids, vec!["spans", "in"]);
    }

    #[tokio::test]
    async fn disabled_calendars_are_hidden_from_range_queries() {
        let (store, cal) = seeded().await;
        put(&store, &cal, &parsed("e", "2025-06-10T09:00:00Z", "2025-06-10T10:00:00Z")).await;
        store.calendars.set_enabled(&cal, false).await.unwrap();

        let events = store
            .events
            .by_date_range(
                "2025-06-01T00:00:00Z".parse().unwrap(),
                "2025-07-01T00:00:00Z".parse().unwrap(),
            )
            .await
            .unwrap();
        assert!(events.is_empty());
    }
}
