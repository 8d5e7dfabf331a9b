//! Core aggregator implementation split into focused submodules.
//!
//! The `VideoAggregator` struct and its methods are organized by domain:
//! - [`fetch`] - Fetch run execution (search → details → save)
//! - [`lifecycle`] - Startup and shutdown coordination

mod fetch;
mod lifecycle;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;

use crate::config::Config;
use crate::db::Database;
use crate::error::Result;
use crate::key_pool::KeyPool;
use crate::types::{Event, FetchRun};
use crate::writer::UpsertWriter;
use crate::youtube::{VideoSource, YouTubeClient};
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use tokio::sync::{RwLock, broadcast};
use tokio_util::sync::CancellationToken;

/// Fetch run state: the mutual-exclusion flag and last-run bookkeeping
#[derive(Clone)]
pub(crate) struct FetchState {
    /// True while a fetch run is in flight; overlapping runs are refused
    pub(crate) running: Arc<AtomicBool>,

    /// Summary of the most recent successful run
    pub(crate) last_run: Arc<RwLock<Option<FetchRun>>>,

    /// Description of the most recent run failure
    pub(crate) last_error: Arc<RwLock<Option<String>>>,
}

impl FetchState {
    fn new() -> Self {
        Self {
            running: Arc::new(AtomicBool::new(false)),
            last_run: Arc::new(RwLock::new(None)),
            last_error: Arc::new(RwLock::new(None)),
        }
    }
}

/// Main aggregator instance (cloneable - all fields are Arc-wrapped)
///
/// Owns the database, the API key pool, the upstream client, and the upsert
/// writer. Constructed once at startup; the scheduler and the API server hold
/// references to the same instance.
#[derive(Clone)]
pub struct VideoAggregator {
    /// Database instance for persistence (wrapped in Arc for sharing across tasks)
    /// Public for integration tests and API handlers to query stored videos
    pub db: Arc<Database>,

    /// Configuration (wrapped in Arc for sharing across tasks)
    pub(crate) config: Arc<Config>,

    /// API key pool with rotation cursor and quota counters
    pub(crate) key_pool: Arc<KeyPool>,

    /// Upstream metadata source (trait object for pluggable implementations)
    pub(crate) source: Arc<dyn VideoSource>,

    /// Upsert writer for fetched records
    pub(crate) writer: UpsertWriter,

    /// Event broadcast channel sender (multiple subscribers supported)
    pub(crate) event_tx: broadcast::Sender<Event>,

    /// Fetch run state (mutual-exclusion flag + last-run info)
    pub(crate) fetch_state: FetchState,

    /// Cancellation token observed by background tasks for graceful shutdown
    pub(crate) shutdown_token: CancellationToken,
}

impl VideoAggregator {
    /// Create a new aggregator backed by the real YouTube Data API
    ///
    /// This initializes all core components:
    /// - Opens/creates the SQLite database and runs migrations
    /// - Builds the API key pool over the configured keys
    /// - Builds the HTTP client for the upstream API
    /// - Sets up the event broadcast channel
    pub async fn new(config: Config) -> Result<Self> {
        let db = Arc::new(Database::new(&config.persistence.database_path).await?);

        let key_pool = Arc::new(KeyPool::new(
            db.clone(),
            config.youtube.api_keys.clone(),
            config.youtube.quota_limit,
        ));

        let client = YouTubeClient::new(&config, key_pool.clone())?;

        Self::build(config, db, key_pool, Arc::new(client))
    }

    /// Create an aggregator with a custom upstream source
    ///
    /// Useful for embedding against a different metadata backend and for
    /// testing with scripted sources. The key pool is still constructed (it
    /// backs the quota status endpoint) but only consulted if the source
    /// uses it.
    pub async fn with_source(config: Config, source: Arc<dyn VideoSource>) -> Result<Self> {
        let db = Arc::new(Database::new(&config.persistence.database_path).await?);

        let key_pool = Arc::new(KeyPool::new(
            db.clone(),
            config.youtube.api_keys.clone(),
            config.youtube.quota_limit,
        ));

        Self::build(config, db, key_pool, source)
    }

    fn build(
        config: Config,
        db: Arc<Database>,
        key_pool: Arc<KeyPool>,
        source: Arc<dyn VideoSource>,
    ) -> Result<Self> {
        // Create broadcast channel with buffer size of 1000 events
        // This allows multiple subscribers to receive all events independently
        let (event_tx, _rx) = broadcast::channel(1000);

        let writer = UpsertWriter::new(db.clone(), event_tx.clone());

        tracing::info!(
            keys = key_pool.len(),
            query = %config.fetch.search_query,
            interval = ?config.fetch.fetch_interval,
            "Video aggregator initialized"
        );

        Ok(Self {
            db,
            config: Arc::new(config),
            key_pool,
            source,
            writer,
            event_tx,
            fetch_state: FetchState::new(),
            shutdown_token: CancellationToken::new(),
        })
    }

    /// Subscribe to aggregator events
    ///
    /// Multiple subscribers are supported. Each subscriber receives all events
    /// independently. Events are buffered, but if a subscriber falls behind by
    /// more than 1000 events, it will receive a `RecvError::Lagged` error.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Get the current configuration
    ///
    /// The configuration is wrapped in an Arc, so this is a cheap clone.
    pub fn get_config(&self) -> Arc<Config> {
        Arc::clone(&self.config)
    }

    /// Quota status for every configured API key, with values masked
    pub async fn key_usage(&self) -> Result<Vec<crate::types::KeyQuotaStatus>> {
        self.key_pool.usage_report().await
    }

    /// Emit an event to all subscribers
    ///
    /// If there are no active subscribers, the event is silently dropped
    /// (ok() converts Err to None), so processing continues even when no one
    /// is listening.
    pub(crate) fn emit_event(&self, event: Event) {
        self.event_tx.send(event).ok();
    }

    /// The cancellation token background tasks watch for shutdown
    pub(crate) fn shutdown_token(&self) -> &CancellationToken {
        &self.shutdown_token
    }

    /// Spawn the recurring fetch scheduler in a background task
    ///
    /// One run per configured interval; a tick that fires while a run is
    /// still in flight is skipped.
    pub fn spawn_fetch_scheduler(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let scheduler = crate::fetch_scheduler::FetchScheduler::new(self.clone());
        tokio::spawn(scheduler.run())
    }

    /// Spawn the REST API server in a background task
    ///
    /// The server runs concurrently with fetch processing and listens on the
    /// configured bind address (default: 127.0.0.1:7979).
    pub fn spawn_api_server(self: &Arc<Self>) -> tokio::task::JoinHandle<Result<()>> {
        let aggregator = self.clone();
        let config = self.config.clone();

        tokio::spawn(async move { crate::api::start_api_server(aggregator, config).await })
    }
}
