//! Recurring fetch scheduling
//!
//! This module provides the background task that triggers one fetch run per
//! configured interval. Runs never overlap: a tick that fires while the
//! previous run is still in flight is skipped outright rather than queued.
//!
//! # Features
//!
//! - Fixed-interval ticking with missed-tick skipping
//! - Skip-on-overlap (no queued ticks, no concurrent runs)
//! - Graceful shutdown via the aggregator's cancellation token
//! - Run failures logged with context, never fatal to the loop
//!
//! # Example
//!
//! ```no_run
//! use tubefeed::{VideoAggregator, Config};
//! use tubefeed::fetch_scheduler::FetchScheduler;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::from_env()?;
//! let aggregator = Arc::new(VideoAggregator::new(config).await?);
//!
//! let scheduler = FetchScheduler::new(aggregator.clone());
//!
//! // Run scheduler (blocks until shutdown)
//! tokio::spawn(async move {
//!     scheduler.run().await;
//! });
//! # Ok(())
//! # }
//! ```

use crate::VideoAggregator;
use crate::error::Error;
use std::sync::Arc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

/// Scheduler that triggers fetch runs on a fixed interval
///
/// The interval and search query come from static configuration and are not
/// adjustable while running. The scheduler itself holds no run state; mutual
/// exclusion lives in the aggregator so manual API triggers and scheduled
/// ticks contend for the same flag.
pub struct FetchScheduler {
    /// Reference to the aggregator for run execution and shutdown status
    aggregator: Arc<VideoAggregator>,
}

impl FetchScheduler {
    /// Creates a new fetch scheduler
    pub fn new(aggregator: Arc<VideoAggregator>) -> Self {
        Self { aggregator }
    }

    /// Starts the scheduler loop
    ///
    /// The loop will:
    /// 1. Wait for the next interval tick (or exit on shutdown)
    /// 2. Trigger one fetch run
    /// 3. Log the outcome; a failed run never crashes the loop — the next
    ///    tick starts a fresh attempt
    pub async fn run(self) {
        let config = self.aggregator.get_config();
        let query = config.fetch.search_query.clone();

        info!(
            interval = ?config.fetch.fetch_interval,
            %query,
            "Fetch scheduler started"
        );

        let mut interval = tokio::time::interval(config.fetch.fetch_interval);
        // A tick delayed past its slot realigns instead of bursting
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = self.aggregator.shutdown_token().cancelled() => {
                    info!("Fetch scheduler shutting down");
                    break;
                }
                _ = interval.tick() => {}
            }

            match self.aggregator.run_fetch_once().await {
                Ok(run) => {
                    info!(
                        items_fetched = run.items_fetched,
                        items_saved = run.items_saved,
                        items_failed = run.items_failed,
                        "Scheduled fetch run complete"
                    );
                }
                // Overlap: the previous run is still going, this tick is a no-op
                Err(Error::FetchInProgress) => {
                    debug!("Previous fetch run still in flight, skipping tick");
                }
                Err(Error::ShuttingDown) => {
                    info!("Fetch scheduler shutting down");
                    break;
                }
                Err(e) => {
                    error!(error = %e, %query, "Scheduled fetch run failed");
                }
            }
        }

        info!("Fetch scheduler stopped");
    }
}
