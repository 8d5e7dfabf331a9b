//! Core types and events for tubefeed

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Summary of one completed fetch run
///
/// A fetch run is one search → details → save cycle triggered by the
/// scheduler (or manually via the API). Runs are ephemeral: the summary is
/// logged, broadcast as an event, and kept in memory as "last run" state, but
/// never persisted.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FetchRun {
    /// When the run started
    pub started_at: DateTime<Utc>,

    /// When the run finished
    pub finished_at: DateTime<Utc>,

    /// Search query the run was executed with
    pub query: String,

    /// Number of detail records fetched from the upstream API
    pub items_fetched: usize,

    /// Number of records upserted successfully
    pub items_saved: usize,

    /// Number of records that failed to persist
    pub items_failed: usize,
}

/// Why a single item in a batch failed to save
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The raw record could not be mapped to the storage schema
    Mapping,
    /// The storage layer rejected the write
    Storage,
}

/// A single failed item within a batch save
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ItemFailure {
    /// Upstream video id of the failing item (may be empty when the id itself
    /// was the problem)
    pub video_id: String,

    /// Why this item failed
    pub kind: FailureKind,

    /// Human-readable failure description
    pub error: String,
}

/// Aggregate result of a batch save
///
/// Per-item failures are collected here rather than aborting the batch; a
/// failure at index *k* never prevents items *k+1..n* from being attempted.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct BatchReport {
    /// Number of items upserted successfully
    pub saved: usize,

    /// Number of items that failed
    pub failed: usize,

    /// Details for each failed item, in batch order
    pub failures: Vec<ItemFailure>,
}

/// Snapshot of the fetch pipeline state, as served by the status endpoint
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FetchStatus {
    /// Whether a fetch run is currently in flight
    pub running: bool,

    /// Summary of the most recent successful run, if any
    pub last_run: Option<FetchRun>,

    /// Description of the most recent run failure, if the last run failed
    pub last_error: Option<String>,
}

/// Quota status for a single API key, with the key value masked
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct KeyQuotaStatus {
    /// Masked suffix of the key value (never the full key)
    pub key_hint: String,

    /// Units consumed in the current quota epoch
    pub quota_used: i64,

    /// Units available per quota epoch
    pub quota_limit: i64,

    /// Whether the key is currently exhausted
    pub exhausted: bool,
}

/// Events broadcast by the aggregator
///
/// Consumers subscribe via [`crate::VideoAggregator::subscribe`]; the API
/// server re-emits these over the `/events` SSE stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// A fetch run has started
    FetchRunStarted {
        /// Search query driving the run
        query: String,
    },

    /// A fetch run completed (possibly with per-item failures)
    FetchRunCompleted {
        /// Summary of the completed run
        run: FetchRun,
    },

    /// A fetch run failed before producing a summary
    FetchRunFailed {
        /// Search query driving the run
        query: String,
        /// Failure description
        error: String,
    },

    /// A video record was created or updated
    VideoSaved {
        /// Upstream video id
        video_id: String,
        /// Video title
        title: String,
    },

    /// A single video record failed to persist; the batch continued
    VideoSaveFailed {
        /// Upstream video id
        video_id: String,
        /// Failure description
        error: String,
    },

    /// The aggregator is shutting down
    Shutdown,
}
