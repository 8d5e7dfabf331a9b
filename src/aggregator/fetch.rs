//! Fetch run execution: search → details → per-item save.

use crate::error::{Error, Result};
use crate::types::{Event, FetchRun, FetchStatus};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info};

use super::VideoAggregator;

/// Resets the running flag when a fetch run exits, on every path
struct RunningGuard {
    flag: Arc<AtomicBool>,
}

impl Drop for RunningGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

impl VideoAggregator {
    /// Whether a fetch run is currently in flight
    pub fn is_fetch_running(&self) -> bool {
        self.fetch_state.running.load(Ordering::SeqCst)
    }

    /// Snapshot of the fetch pipeline state
    pub async fn fetch_status(&self) -> FetchStatus {
        FetchStatus {
            running: self.is_fetch_running(),
            last_run: self.fetch_state.last_run.read().await.clone(),
            last_error: self.fetch_state.last_error.read().await.clone(),
        }
    }

    /// Execute one complete fetch run
    ///
    /// Runs are mutually exclusive: if one is already in flight, this fails
    /// immediately with [`Error::FetchInProgress`] instead of queueing. The
    /// whole run is bounded by the configured deadline; on expiry it fails
    /// with [`Error::FetchTimeout`] and the service returns to idle.
    ///
    /// The run summary is retained as "last run" state and broadcast as an
    /// event; failures are recorded the same way and propagated to the
    /// caller (the scheduler logs them and waits for the next tick).
    pub async fn run_fetch_once(&self) -> Result<FetchRun> {
        if self.shutdown_token.is_cancelled() {
            return Err(Error::ShuttingDown);
        }

        // Mutual exclusion: exactly one winner per overlap
        if self
            .fetch_state
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(Error::FetchInProgress);
        }
        let _guard = RunningGuard {
            flag: self.fetch_state.running.clone(),
        };

        let query = self.config.fetch.search_query.clone();
        let started_at = Utc::now();
        info!(%query, "Fetch run started");
        self.emit_event(Event::FetchRunStarted {
            query: query.clone(),
        });

        let timeout = self.config.fetch.run_timeout;
        let outcome = match tokio::time::timeout(timeout, self.execute_run(&query, started_at)).await
        {
            Ok(result) => result,
            Err(_) => Err(Error::FetchTimeout {
                timeout_secs: timeout.as_secs(),
            }),
        };

        match outcome {
            Ok(run) => {
                info!(
                    items_fetched = run.items_fetched,
                    items_saved = run.items_saved,
                    items_failed = run.items_failed,
                    "Fetch run complete"
                );
                *self.fetch_state.last_run.write().await = Some(run.clone());
                *self.fetch_state.last_error.write().await = None;
                self.emit_event(Event::FetchRunCompleted { run: run.clone() });
                Ok(run)
            }
            Err(e) => {
                *self.fetch_state.last_error.write().await = Some(e.to_string());
                self.emit_event(Event::FetchRunFailed {
                    query,
                    error: e.to_string(),
                });
                Err(e)
            }
        }
    }

    /// The body of a fetch run: search, extract ids, fetch details, save
    async fn execute_run(&self, query: &str, started_at: DateTime<Utc>) -> Result<FetchRun> {
        let results = self.source.search(query, None).await?;

        // Keep upstream order; drop results without a video id
        let ids: Vec<String> = results
            .into_iter()
            .filter_map(|result| result.id.video_id)
            .filter(|id| !id.is_empty())
            .collect();
        debug!(candidates = ids.len(), "Search returned candidate videos");

        let details = self.source.video_details(&ids).await?;

        let report = self.writer.save_batch(&details).await?;

        Ok(FetchRun {
            started_at,
            finished_at: Utc::now(),
            query: query.to_string(),
            items_fetched: details.len(),
            items_saved: report.saved,
            items_failed: report.failed,
        })
    }
}
