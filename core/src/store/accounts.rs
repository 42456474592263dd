// SPDX-FileCopyrightText: 2025-2026 Vesper contributors
//
// SPDX-License-Identifier: Apache-2.0

use jiff::Timestamp;
use sqlx::SqlitePool;
use uuid::Uuid;

use super::{format_ts, parse_ts};
use crate::error::CoreError;
use crate::model::{Account, NewAccount};

/// Accounts sub-store.
#[derive(Debug, Clone)]
pub struct Accounts {
    pool: SqlitePool,
}

impl Accounts {
    pub(crate) fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Inserts a new account and returns it.
    pub async fn insert(&self, new: NewAccount) -> Result<Account, CoreError> {
        let account = Account {
            id: Uuid::new_v4().to_string(),
            server_url: new.server_url,
            username: new.username,
            password: new.password,
            display_name: new.display_name,
            last_sync_at: None,
            sync_token: None,
        };

        sqlx::query(
            "INSERT INTO accounts (id, server_url, username, password, display_name) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&account.id)
        .bind(&account.server_url)
        .bind(&account.username)
        .bind(&account.password)
        .bind(&account.display_name)
        .execute(&self.pool)
        .await?;

        Ok(account)
    }

    /// Fetches an account by id.
    pub async fn get(&self, id: &str) -> Result<Option<Account>, CoreError> {
        let row: Option<AccountRow> = sqlx::query_as(
            "SELECT id, server_url, username, password, display_name, last_sync_at, sync_token \
             FROM accounts WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(AccountRow::into_account).transpose()
    }

    /// Lists every account.
    pub async fn list(&self) -> Result<Vec<Account>, CoreError> {
        let rows: Vec<AccountRow> = sqlx::query_as(
            "SELECT id, server_url, username, password, display_name, last_sync_at, sync_token \
             FROM accounts ORDER BY display_name ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(AccountRow::into_account).collect()
    }

    /// Updates credentials and display name.
    pub async fn update(&self, account: &Account) -> Result<(), CoreError> {
        sqlx::query(
            "UPDATE accounts SET server_url = ?, username = ?, password = ?, display_name = ? \
             WHERE id = ?",
        )
        .bind(&account.server_url)
        .bind(&account.username)
        .bind(&account.password)
        .bind(&account.display_name)
        .bind(&account.id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Records a completed sync pass.
    pub async fn update_sync_meta(
        &self,
        id: &str,
        last_sync_at: Timestamp,
        sync_token: Option<&str>,
    ) -> Result<(), CoreError> {
        sqlx::query(
            "UPDATE accounts SET last_sync_at = ?, sync_token = COALESCE(?, sync_token) \
             WHERE id = ?",
        )
        .bind(format_ts(last_sync_at))
        .bind(sync_token)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Deletes an account; its calendars and their events cascade.
    pub async fn delete(&self, id: &str) -> Result<bool, CoreError> {
        let result = sqlx::query("DELETE FROM accounts WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[derive(Debug, sqlx::FromRow)]
struct AccountRow {
    id: String,
    server_url: String,
    username: String,
    password: String,
    display_name: String,
    last_sync_at: Option<String>,
    sync_token: Option<String>,
}

impl AccountRow {
    fn into_account(self) -> Result<Account, CoreError> {
        Ok(Account {
            id: self.id,
            server_url: self.server_url,
            username: self.username,
            password: self.password,
            display_name: self.display_name,
            last_sync_at: self.last_sync_at.as_deref().map(parse_ts).transpose()?,
            sync_token: self.sync_token,
        })
    }
}
