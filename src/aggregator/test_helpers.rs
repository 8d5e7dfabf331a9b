//! Shared helpers for aggregator and API tests.

use super::VideoAggregator;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::youtube::{
    SearchResult, SearchResultId, VideoDetails, VideoSnippet, VideoSource, VideoStatistics,
};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tempfile::TempDir;

/// Scripted upstream source for tests
///
/// Serves a fixed set of detail records, optionally after a delay or as a
/// search failure, and counts calls so tests can assert how often each path
/// was exercised.
pub(crate) struct FakeSource {
    /// Records served by search (as ids) and by video_details (as records)
    pub items: Vec<VideoDetails>,
    /// Artificial latency applied to the search call
    pub delay: Duration,
    /// When set, search fails with AllKeysExhausted
    pub fail_search: bool,
    /// Number of search calls observed
    pub search_calls: AtomicUsize,
    /// Number of video_details calls observed
    pub details_calls: AtomicUsize,
}

impl FakeSource {
    pub fn with_items(items: Vec<VideoDetails>) -> Self {
        Self {
            items,
            delay: Duration::ZERO,
            fail_search: false,
            search_calls: AtomicUsize::new(0),
            details_calls: AtomicUsize::new(0),
        }
    }

    pub fn slow(items: Vec<VideoDetails>, delay: Duration) -> Self {
        Self {
            delay,
            ..Self::with_items(items)
        }
    }

    pub fn failing() -> Self {
        Self {
            fail_search: true,
            ..Self::with_items(vec![])
        }
    }
}

#[async_trait]
impl VideoSource for FakeSource {
    async fn search(
        &self,
        _query: &str,
        _published_after: Option<DateTime<Utc>>,
    ) -> Result<Vec<SearchResult>> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        if self.delay > Duration::ZERO {
            tokio::time::sleep(self.delay).await;
        }
        if self.fail_search {
            return Err(Error::AllKeysExhausted { attempts: 2 });
        }
        Ok(self
            .items
            .iter()
            .map(|details| SearchResult {
                id: SearchResultId {
                    video_id: Some(details.id.clone()),
                },
                snippet: details.snippet.clone(),
            })
            .collect())
    }

    async fn video_details(&self, ids: &[String]) -> Result<Vec<VideoDetails>> {
        self.details_calls.fetch_add(1, Ordering::SeqCst);
        if ids.is_empty() {
            return Ok(vec![]);
        }
        Ok(self
            .items
            .iter()
            .filter(|details| ids.contains(&details.id))
            .cloned()
            .collect())
    }
}

/// A detail record with sensible defaults
pub(crate) fn sample_details(id: &str) -> VideoDetails {
    VideoDetails {
        id: id.to_string(),
        snippet: VideoSnippet {
            title: format!("Title {id}"),
            description: "a test description".to_string(),
            published_at: Some(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()),
            channel_id: "UC-test".to_string(),
            channel_title: "Test Channel".to_string(),
            ..VideoSnippet::default()
        },
        statistics: Some(VideoStatistics {
            view_count: Some("100".to_string()),
            like_count: Some("10".to_string()),
            comment_count: Some("1".to_string()),
            duration: Some(120),
        }),
    }
}

/// Create a test aggregator over a scripted source and a scratch database
pub(crate) async fn create_test_aggregator_with(
    source: Arc<FakeSource>,
) -> (Arc<VideoAggregator>, TempDir) {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");

    let mut config = Config::default();
    config.persistence.database_path = temp_dir.path().join("test.db");
    config.youtube.api_keys = vec!["test-key-1".to_string(), "test-key-2".to_string()];
    config.fetch.fetch_interval = Duration::from_millis(50);

    let aggregator = VideoAggregator::with_source(config, source)
        .await
        .expect("Failed to create aggregator");

    (Arc::new(aggregator), temp_dir)
}

/// Create a test aggregator with two ready-made videos
pub(crate) async fn create_test_aggregator() -> (Arc<VideoAggregator>, TempDir) {
    let source = Arc::new(FakeSource::with_items(vec![
        sample_details("v1"),
        sample_details("v2"),
    ]));
    create_test_aggregator_with(source).await
}
