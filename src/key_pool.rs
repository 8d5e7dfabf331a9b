//! Quota-aware API key rotation
//!
//! The pool owns the rotation cursor and all quota bookkeeping behind one
//! lock. Callers only ever see three operations: [`KeyPool::acquire`],
//! [`KeyPool::record_usage`], and [`KeyPool::mark_exhausted`]; the cursor
//! itself is never exposed.
//!
//! Quota state lives in the `api_keys` table so that usage survives process
//! restarts. Quota epochs are UTC calendar days, matching the upstream API's
//! daily quota window: a key row stamped with a stale day is reset to zero
//! usage before its exhaustion state is evaluated.

use crate::db::{ApiKeyRow, Database};
use crate::error::{DatabaseError, Error, Result};
use crate::types::KeyQuotaStatus;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Masked suffix of an API key, safe for logs and API responses
pub(crate) fn key_hint(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    let start = chars.len().saturating_sub(4);
    chars[start..].iter().collect()
}

/// The UTC calendar day used as the current quota epoch
fn current_epoch_day() -> String {
    chrono::Utc::now().format("%Y-%m-%d").to_string()
}

/// Rotating pool of rate-limited API keys
///
/// The key list is fixed at startup. Key rows are created lazily in the store
/// on first use with zero usage.
pub struct KeyPool {
    /// Database handle backing the quota counters
    db: Arc<Database>,

    /// Ordered key values, fixed for the process lifetime
    keys: Vec<String>,

    /// Quota units granted to each key per epoch
    quota_limit: i64,

    /// Rotation cursor; advances (mod pool size) only on exhaustion.
    /// The lock is held across the quota reads of an acquire attempt so that
    /// cursor movement and quota evaluation are one atomic step.
    cursor: Mutex<usize>,
}

impl KeyPool {
    /// Create a new key pool over the given ordered key values
    pub fn new(db: Arc<Database>, keys: Vec<String>, quota_limit: i64) -> Self {
        Self {
            db,
            keys,
            quota_limit,
            cursor: Mutex::new(0),
        }
    }

    /// Number of keys in the pool
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether the pool has no keys at all
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Select the next usable key
    ///
    /// Returns the key at the current cursor if it has quota left; otherwise
    /// advances the cursor and retries, up to pool-size attempts. After a
    /// full cycle with no usable key, fails with
    /// [`Error::AllKeysExhausted`].
    pub async fn acquire(&self) -> Result<String> {
        let mut cursor = self.cursor.lock().await;
        let pool_size = self.keys.len();

        for attempt in 0..pool_size {
            let key = &self.keys[*cursor];
            let row = self.load_or_create(key).await?;
            let row = self.apply_epoch_reset(row).await?;

            if row.is_exhausted() {
                debug!(
                    key_hint = %key_hint(key),
                    attempt,
                    quota_used = row.quota_used,
                    quota_limit = row.quota_limit,
                    "API key exhausted, advancing rotation cursor"
                );
                *cursor = (*cursor + 1) % pool_size;
                continue;
            }

            return Ok(key.clone());
        }

        warn!(
            pool_size,
            "Every API key is exhausted after a full rotation cycle"
        );
        Err(Error::AllKeysExhausted {
            attempts: pool_size,
        })
    }

    /// Record quota consumption against a key
    ///
    /// Must be called exactly once per successful upstream call that consumed
    /// quota.
    pub async fn record_usage(&self, key: &str, cost: i64) -> Result<()> {
        self.db.increment_api_key_quota(key, cost).await
    }

    /// Handle an upstream quota-exhaustion response for a key
    ///
    /// The upstream can declare a key exhausted while local bookkeeping still
    /// shows headroom (other consumers of the same key, clock skew at the
    /// quota boundary). Pin the key's usage to its limit and advance the
    /// cursor so the next acquire rotates past it.
    pub async fn mark_exhausted(&self, key: &str) -> Result<()> {
        let mut cursor = self.cursor.lock().await;

        // Ensure the row exists before pinning; the key may never have been
        // recorded locally if the quota was consumed elsewhere.
        self.load_or_create(key).await?;
        self.db.exhaust_api_key(key).await?;

        if !self.keys.is_empty() {
            *cursor = (*cursor + 1) % self.keys.len();
        }

        info!(
            key_hint = %key_hint(key),
            "Upstream reported quota exhaustion, rotated to next API key"
        );
        Ok(())
    }

    /// Quota status for every configured key, in pool order
    ///
    /// Keys that have never been used appear with zero usage. Key values are
    /// masked.
    pub async fn usage_report(&self) -> Result<Vec<KeyQuotaStatus>> {
        let mut statuses = Vec::with_capacity(self.keys.len());

        for key in &self.keys {
            let status = match self.db.find_api_key(key).await? {
                Some(row) => KeyQuotaStatus {
                    key_hint: key_hint(key),
                    quota_used: row.quota_used,
                    quota_limit: row.quota_limit,
                    exhausted: row.is_exhausted(),
                },
                None => KeyQuotaStatus {
                    key_hint: key_hint(key),
                    quota_used: 0,
                    quota_limit: self.quota_limit,
                    exhausted: false,
                },
            };
            statuses.push(status);
        }

        Ok(statuses)
    }

    /// Load a key row, creating it lazily with zero usage on first use
    async fn load_or_create(&self, key: &str) -> Result<ApiKeyRow> {
        if let Some(row) = self.db.find_api_key(key).await? {
            return Ok(row);
        }

        debug!(key_hint = %key_hint(key), "Creating quota record for API key");
        self.db
            .create_api_key(key, self.quota_limit, &current_epoch_day())
            .await?;

        self.db.find_api_key(key).await?.ok_or_else(|| {
            Error::Database(DatabaseError::NotFound(format!(
                "API key …{} vanished after creation",
                key_hint(key)
            )))
        })
    }

    /// Reset a key row whose quota epoch has rolled over
    async fn apply_epoch_reset(&self, row: ApiKeyRow) -> Result<ApiKeyRow> {
        let today = current_epoch_day();
        if row.epoch_day == today {
            return Ok(row);
        }

        debug!(
            key_hint = %key_hint(&row.key_value),
            previous_epoch = %row.epoch_day,
            "Quota epoch rolled over, resetting usage"
        );
        self.db.reset_api_key_quota(&row.key_value, &today).await?;

        Ok(ApiKeyRow {
            quota_used: 0,
            epoch_day: today,
            ..row
        })
    }
}
