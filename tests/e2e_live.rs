//! End-to-end tests against the real YouTube Data API
//!
//! These tests issue real API calls using keys from .env and consume quota.
//! All tests are marked #[ignore] to prevent running in normal CI.
//!
//! # Running the tests
//!
//! ```bash
//! # Run all live E2E tests
//! cargo test --features live-tests --test e2e_live -- --ignored --nocapture
//! ```
//!
//! # Required environment variables (.env file)
//!
//! - `YOUTUBE_API_KEYS` - Comma-separated YouTube Data API keys

#![cfg(feature = "live-tests")]

use serial_test::serial;
use std::sync::Arc;
use tubefeed::{Config, VideoAggregator};

fn has_live_credentials() -> bool {
    dotenvy::dotenv().ok();
    std::env::var("YOUTUBE_API_KEYS")
        .map(|keys| !keys.trim().is_empty())
        .unwrap_or(false)
}

async fn create_live_aggregator() -> (Arc<VideoAggregator>, tempfile::TempDir) {
    dotenvy::dotenv().ok();
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");

    let mut config = Config::from_env().expect("Failed to load config from env");
    config.persistence.database_path = temp_dir.path().join("live.db");

    let aggregator = VideoAggregator::new(config)
        .await
        .expect("Failed to create aggregator");
    (Arc::new(aggregator), temp_dir)
}

/// One full fetch run against the real API: search, details, store
#[tokio::test]
#[ignore]
#[serial]
async fn live_fetch_run_stores_videos() {
    if !has_live_credentials() {
        eprintln!("Skipping: YOUTUBE_API_KEYS not found in .env");
        return;
    }

    let (aggregator, _temp_dir) = create_live_aggregator().await;

    let run = aggregator
        .run_fetch_once()
        .await
        .expect("Live fetch run should succeed");

    println!(
        "Fetched {} videos, saved {}, failed {}",
        run.items_fetched, run.items_saved, run.items_failed
    );

    // The default query ("official music video") always has recent uploads
    assert!(run.items_fetched > 0, "expected at least one search result");
    assert_eq!(run.items_failed, 0, "no per-item failures expected");

    let stats = aggregator.db.video_stats().await.unwrap();
    assert_eq!(stats.total_videos as usize, run.items_saved);

    aggregator.shutdown().await.ok();
}

/// Quota usage is billed against the key that served the calls
#[tokio::test]
#[ignore]
#[serial]
async fn live_fetch_run_records_quota_usage() {
    if !has_live_credentials() {
        eprintln!("Skipping: YOUTUBE_API_KEYS not found in .env");
        return;
    }

    let (aggregator, _temp_dir) = create_live_aggregator().await;

    aggregator
        .run_fetch_once()
        .await
        .expect("Live fetch run should succeed");

    let report = aggregator.key_usage().await.unwrap();
    let total_used: i64 = report.iter().map(|key| key.quota_used).sum();

    // One search (100 units) plus one detail batch (1 unit)
    assert!(
        total_used >= 101,
        "expected at least 101 quota units recorded, got {total_used}"
    );

    aggregator.shutdown().await.ok();
}
