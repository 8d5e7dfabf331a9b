//! API key quota bookkeeping.
//!
//! The key pool is the only writer of this table; everything here is plain
//! storage with no rotation logic.

use crate::error::DatabaseError;
use crate::{Error, Result};

use super::{ApiKeyRow, Database};

impl Database {
    /// Get an API key record by its key value
    pub async fn find_api_key(&self, key_value: &str) -> Result<Option<ApiKeyRow>> {
        let row = sqlx::query_as::<_, ApiKeyRow>(
            r#"
            SELECT id, key_value, quota_used, quota_limit, epoch_day, created_at
            FROM api_keys
            WHERE key_value = ?
            "#,
        )
        .bind(key_value)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to find API key: {}",
                e
            )))
        })?;

        Ok(row)
    }

    /// Create an API key record with zero usage
    pub async fn create_api_key(
        &self,
        key_value: &str,
        quota_limit: i64,
        epoch_day: &str,
    ) -> Result<()> {
        let now = chrono::Utc::now().timestamp();

        sqlx::query(
            r#"
            INSERT INTO api_keys (key_value, quota_used, quota_limit, epoch_day, created_at)
            VALUES (?, 0, ?, ?, ?)
            "#,
        )
        .bind(key_value)
        .bind(quota_limit)
        .bind(epoch_day)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to create API key: {}",
                e
            )))
        })?;

        Ok(())
    }

    /// Add `cost` units to a key's usage counter
    pub async fn increment_api_key_quota(&self, key_value: &str, cost: i64) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE api_keys
            SET quota_used = quota_used + ?
            WHERE key_value = ?
            "#,
        )
        .bind(cost)
        .bind(key_value)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to increment API key quota: {}",
                e
            )))
        })?;

        Ok(())
    }

    /// Reset a key's usage counter for a new quota epoch
    pub async fn reset_api_key_quota(&self, key_value: &str, epoch_day: &str) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE api_keys
            SET quota_used = 0, epoch_day = ?
            WHERE key_value = ?
            "#,
        )
        .bind(epoch_day)
        .bind(key_value)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to reset API key quota: {}",
                e
            )))
        })?;

        Ok(())
    }

    /// Pin a key's usage to its limit
    ///
    /// Used when the upstream reports quota exhaustion even though local
    /// bookkeeping still shows headroom.
    pub async fn exhaust_api_key(&self, key_value: &str) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE api_keys
            SET quota_used = quota_limit
            WHERE key_value = ? AND quota_used < quota_limit
            "#,
        )
        .bind(key_value)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to exhaust API key: {}",
                e
            )))
        })?;

        Ok(())
    }

    /// List all API key records in pool order of creation
    pub async fn list_api_keys(&self) -> Result<Vec<ApiKeyRow>> {
        let rows = sqlx::query_as::<_, ApiKeyRow>(
            r#"
            SELECT id, key_value, quota_used, quota_limit, epoch_day, created_at
            FROM api_keys
            ORDER BY id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to list API keys: {}",
                e
            )))
        })?;

        Ok(rows)
    }
}
