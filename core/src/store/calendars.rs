// SPDX-FileCopyrightText: 2025-2026 Vesper contributors
//
// SPDX-License-Identifier: Apache-2.0

use jiff::Timestamp;
use sqlx::{Sqlite, SqlitePool, Transaction};
use uuid::Uuid;

use super::format_ts;
use crate::error::CoreError;
use crate::model::Calendar;

const COLUMNS: &str =
    "id, account_id, url, display_name, color, ctag, sync_token, enabled, is_local";

/// Calendars sub-store.
#[derive(Debug, Clone)]
pub struct Calendars {
    pool: SqlitePool,
}

impl Calendars {
    pub(crate) fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Inserts a remote-backed calendar discovered during sync.
    pub async fn insert_remote(
        &self,
        account_id: &str,
        url: &str,
        display_name: &str,
        color: Option<&str>,
        ctag: Option<&str>,
    ) -> Result<Calendar, CoreError> {
        let calendar = Calendar {
            id: Uuid::new_v4().to_string(),
            account_id: Some(account_id.to_string()),
            url: url.to_string(),
            display_name: display_name.to_string(),
            color: color.map(ToString::to_string),
            ctag: ctag.map(ToString::to_string),
            sync_token: None,
            enabled: true,
            is_local: false,
        };

        sqlx::query(
            "INSERT INTO calendars (id, account_id, url, display_name, color, ctag, enabled, is_local) \
             VALUES (?, ?, ?, ?, ?, ?, 1, 0)",
        )
        .bind(&calendar.id)
        .bind(&calendar.account_id)
        .bind(&calendar.url)
        .bind(&calendar.display_name)
        .bind(&calendar.color)
        .bind(&calendar.ctag)
        .execute(&self.pool)
        .await?;

        Ok(calendar)
    }

    /// Fetches a calendar by id.
    pub async fn get(&self, id: &str) -> Result<Option<Calendar>, CoreError> {
        let row: Option<CalendarRow> =
            sqlx::query_as(&format!("SELECT {COLUMNS} FROM calendars WHERE id = ?"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(CalendarRow::into_calendar))
    }

    /// Fetches a calendar by its collection URL.
    pub async fn get_by_url(&self, url: &str) -> Result<Option<Calendar>, CoreError> {
        let row: Option<CalendarRow> =
            sqlx::query_as(&format!("SELECT {COLUMNS} FROM calendars WHERE url = ?"))
                .bind(url)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(CalendarRow::into_calendar))
    }

    /// Lists the calendars of one account.
    pub async fn list_for_account(&self, account_id: &str) -> Result<Vec<Calendar>, CoreError> {
        let rows: Vec<CalendarRow> = sqlx::query_as(&format!(
            "SELECT {COLUMNS} FROM calendars WHERE account_id = ? ORDER BY display_name ASC"
        ))
        .bind(account_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(CalendarRow::into_calendar).collect())
    }

    /// Lists every calendar.
    pub async fn list(&self) -> Result<Vec<Calendar>, CoreError> {
        let rows: Vec<CalendarRow> = sqlx::query_as(&format!(
            "SELECT {COLUMNS} FROM calendars ORDER BY display_name ASC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(CalendarRow::into_calendar).collect())
    }

    /// Updates the remote-derived metadata after calendar discovery.
    pub async fn update_remote_meta(
        &self,
        id: &str,
        display_name: &str,
        color: Option<&str>,
        ctag: Option<&str>,
    ) -> Result<(), CoreError> {
        sqlx::query("UPDATE calendars SET display_name = ?, color = ?, ctag = ? WHERE id = ?")
            .bind(display_name)
            .bind(color)
            .bind(ctag)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Persists the sync token returned by the server.
    pub async fn set_sync_token(&self, id: &str, token: Option<&str>) -> Result<(), CoreError> {
        sqlx::query("UPDATE calendars SET sync_token = ? WHERE id = ?")
            .bind(token)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Enables or disables a calendar for sync and range queries.
    pub async fn set_enabled(&self, id: &str, enabled: bool) -> Result<(), CoreError> {
        sqlx::query("UPDATE calendars SET enabled = ? WHERE id = ?")
            .bind(enabled)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Sets the collection change tag to the current instant.
    pub async fn bump_ctag(&self, id: &str) -> Result<(), CoreError> {
        sqlx::query("UPDATE calendars SET ctag = ? WHERE id = ?")
            .bind(format_ts(Timestamp::now()))
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Deletes a calendar; its events cascade.
    pub async fn delete(&self, id: &str) -> Result<bool, CoreError> {
        let result = sqlx::query("DELETE FROM calendars WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Idempotent get-or-create of the single locally-owned calendar.
    ///
    /// Guarded by the partial unique index on `is_local = 1`: a concurrent
    /// create loses the insert race and reads the winner's row.
    pub async fn ensure_local(&self) -> Result<Calendar, CoreError> {
        if let Some(calendar) = self.get_local().await? {
            return Ok(calendar);
        }

        let id = Uuid::new_v4().to_string();
        let url = format!("/api/caldav/calendars/{id}/");
        sqlx::query(
            "INSERT INTO calendars (id, account_id, url, display_name, ctag, enabled, is_local) \
             VALUES (?, NULL, ?, 'Local', ?, 1, 1) \
             ON CONFLICT DO NOTHING",
        )
        .bind(&id)
        .bind(&url)
        .bind(format_ts(Timestamp::now()))
        .execute(&self.pool)
        .await?;

        self.get_local()
            .await?
            .ok_or_else(|| CoreError::CalendarNotFound("local".to_string()))
    }

    /// The locally-owned calendar, when it exists.
    pub async fn get_local(&self) -> Result<Option<Calendar>, CoreError> {
        let row: Option<CalendarRow> =
            sqlx::query_as(&format!("SELECT {COLUMNS} FROM calendars WHERE is_local = 1"))
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(CalendarRow::into_calendar))
    }
}

pub(crate) async fn bump_ctag_in(
    tx: &mut Transaction<'_, Sqlite>,
    id: &str,
) -> Result<(), CoreError> {
    sqlx::query("UPDATE calendars SET ctag = ? WHERE id = ?")
        .bind(format_ts(Timestamp::now()))
        .bind(id)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

#[derive(Debug, sqlx::FromRow)]
struct CalendarRow {
    id: String,
    account_id: Option<String>,
    url: String,
    display_name: String,
    color: Option<String>,
    ctag: Option<String>,
    sync_token: Option<String>,
    enabled: bool,
    is_local: bool,
}

impl CalendarRow {
    fn into_calendar(self) -> Calendar {
        Calendar {
            id: self.id,
            account_id: self.account_id,
            url: self.url,
            display_name: self.display_name,
            color: self.color,
            ctag: self.ctag,
            sync_token: self.sync_token,
            enabled: self.enabled,
            is_local: self.is_local,
        }
    }
}
