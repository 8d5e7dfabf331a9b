//! Shutdown coordination.

use crate::error::Result;
use crate::types::Event;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

use super::VideoAggregator;

impl VideoAggregator {
    /// Whether shutdown has been initiated
    pub fn is_shutting_down(&self) -> bool {
        self.shutdown_token.is_cancelled()
    }

    /// Gracefully shut down the aggregator
    ///
    /// Cancels the shutdown token (stopping the fetch scheduler), waits
    /// briefly for an in-flight fetch run to drain, then closes the database
    /// pool. New fetch runs are refused once the token is cancelled.
    pub async fn shutdown(&self) -> Result<()> {
        info!("Shutting down video aggregator");
        self.shutdown_token.cancel();
        self.emit_event(Event::Shutdown);

        // Give an in-flight run a short grace period to finish its writes
        let mut waited = Duration::ZERO;
        let grace = Duration::from_secs(5);
        while self.is_fetch_running() && waited < grace {
            sleep(Duration::from_millis(100)).await;
            waited += Duration::from_millis(100);
        }
        if self.is_fetch_running() {
            warn!("Fetch run still in flight after grace period, closing anyway");
        }

        self.db.close().await;
        info!("Video aggregator stopped");
        Ok(())
    }
}
