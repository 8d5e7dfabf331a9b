//! # tubefeed
//!
//! Backend library for recurring YouTube video metadata aggregation.
//!
//! ## Design Philosophy
//!
//! tubefeed is designed to be:
//! - **Quota-aware** - API calls are spread across a pool of rate-limited keys
//! - **Idempotent** - fetched records upsert by upstream video id, last write wins
//! - **Library-first** - No CLI or UI, purely a Rust crate for embedding
//! - **Event-driven** - Consumers subscribe to events, no polling required
//!
//! ## Quick Start
//!
//! ```no_run
//! use tubefeed::{VideoAggregator, Config};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // YOUTUBE_API_KEYS, SEARCH_QUERY, FETCH_INTERVAL_SECONDS, ...
//!     let config = Config::from_env()?;
//!
//!     let aggregator = Arc::new(VideoAggregator::new(config).await?);
//!
//!     // Recurring fetch runs and the REST API run as background tasks
//!     aggregator.spawn_fetch_scheduler();
//!     aggregator.spawn_api_server();
//!
//!     // Subscribe to events
//!     let mut events = aggregator.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Event: {:?}", event);
//!         }
//!     });
//!
//!     // Block until SIGTERM/SIGINT, then shut down gracefully
//!     tubefeed::run_with_shutdown(aggregator).await?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Core aggregator implementation (decomposed into focused submodules)
pub mod aggregator;
/// REST API module
pub mod api;
/// Configuration types
pub mod config;
/// Database persistence layer
pub mod db;
/// Error types
pub mod error;
/// Recurring fetch scheduling
pub mod fetch_scheduler;
/// Quota-aware API key rotation
pub mod key_pool;
/// Core types and events
pub mod types;
/// Idempotent video persistence
pub mod writer;
/// YouTube Data API client
pub mod youtube;

// Re-export commonly used types
pub use aggregator::VideoAggregator;
pub use config::Config;
pub use db::Database;
pub use error::{ApiError, DatabaseError, Error, ErrorDetail, Result, ToHttpStatus};
pub use fetch_scheduler::FetchScheduler;
pub use key_pool::KeyPool;
pub use types::{BatchReport, Event, FetchRun, FetchStatus, ItemFailure, KeyQuotaStatus};
pub use writer::UpsertWriter;
pub use youtube::{VideoSource, YouTubeClient};

/// Helper function to run the aggregator with graceful signal handling.
///
/// Waits for a termination signal and then calls the aggregator's
/// `shutdown()` method.
///
/// - **Unix:** listens for SIGTERM and SIGINT, with fallbacks if signal registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
///
/// # Example
///
/// ```no_run
/// use tubefeed::{VideoAggregator, Config, run_with_shutdown};
/// use std::sync::Arc;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = Config::from_env()?;
///     let aggregator = Arc::new(VideoAggregator::new(config).await?);
///
///     // Run with automatic signal handling
///     run_with_shutdown(aggregator).await?;
///
///     Ok(())
/// }
/// ```
pub async fn run_with_shutdown(aggregator: std::sync::Arc<VideoAggregator>) -> Result<()> {
    wait_for_signal().await;
    aggregator.shutdown().await
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Set up signal handlers - these may fail in restricted environments (containers, tests)
    let sigterm_result = signal(SignalKind::terminate());
    let sigint_result = signal(SignalKind::interrupt());

    match (sigterm_result, sigint_result) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM signal");
                }
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT signal (Ctrl+C)");
                }
            }
        }
        (Err(e), _) => {
            tracing::warn!(error = %e, "Could not register SIGTERM handler, waiting for SIGINT only");
            if let Ok(mut sigint) = signal(SignalKind::interrupt()) {
                sigint.recv().await;
                tracing::info!("Received SIGINT signal (Ctrl+C)");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
        (_, Err(e)) => {
            tracing::warn!(error = %e, "Could not register SIGINT handler, waiting for SIGTERM only");
            if let Ok(mut sigterm) = signal(SignalKind::terminate()) {
                sigterm.recv().await;
                tracing::info!("Received SIGTERM signal");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received Ctrl+C signal");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
        }
    }
}
