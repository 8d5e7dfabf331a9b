//! Idempotent video persistence
//!
//! Maps raw detail records to the storage schema and upserts them keyed on
//! the upstream video id. A failure on one item is captured, logged, and
//! attributed to that item; the batch always continues with the next item.

use crate::db::{Database, NewVideo};
use crate::error::{DatabaseError, Error, Result};
use crate::types::{BatchReport, Event, FailureKind, ItemFailure};
use crate::youtube::{VideoDetails, VideoStatistics};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// Writes fetched video metadata into the store
///
/// Cloning is cheap; the writer only holds an Arc database handle and the
/// event channel sender.
#[derive(Clone)]
pub struct UpsertWriter {
    /// Database handle for persistence
    db: Arc<Database>,

    /// Event broadcast channel for per-item save notifications
    event_tx: broadcast::Sender<Event>,
}

/// Parse a string-encoded counter, defaulting to zero when absent or malformed
fn parse_count(raw: Option<&str>) -> i64 {
    raw.and_then(|s| s.parse().ok()).unwrap_or(0)
}

impl UpsertWriter {
    /// Create a new writer
    pub fn new(db: Arc<Database>, event_tx: broadcast::Sender<Event>) -> Self {
        Self { db, event_tx }
    }

    /// Map a raw detail record to a storage row
    ///
    /// Missing optional fields (statistics, publication time) default to
    /// zero rather than failing; only a missing video id rejects the record.
    pub fn map_video(details: &VideoDetails) -> Result<NewVideo> {
        let video_id = details.id.trim();
        if video_id.is_empty() {
            return Err(Error::InvalidVideo(
                "detail record has no video id".to_string(),
            ));
        }

        let snippet = &details.snippet;
        let stats = details.statistics.clone().unwrap_or_else(VideoStatistics::default);

        Ok(NewVideo {
            video_id: video_id.to_string(),
            title: snippet.title.clone(),
            video_url: format!("https://www.youtube.com/watch?v={video_id}"),
            description: snippet.description.clone(),
            published_at: snippet.published_at.map(|t| t.timestamp()).unwrap_or(0),
            channel_id: snippet.channel_id.clone(),
            channel_title: snippet.channel_title.clone(),
            thumbnails: serde_json::to_string(&snippet.thumbnails).ok(),
            view_count: parse_count(stats.view_count.as_deref()),
            like_count: parse_count(stats.like_count.as_deref()),
            comment_count: parse_count(stats.comment_count.as_deref()),
            duration_seconds: stats.duration.unwrap_or(0),
        })
    }

    /// Map and upsert a single record
    pub async fn save(&self, details: &VideoDetails) -> Result<()> {
        let video = Self::map_video(details)?;
        self.db.upsert_video(&video).await?;
        self.emit_saved(&video);
        Ok(())
    }

    /// Map and upsert a batch of records, tolerating per-item failures
    ///
    /// Items are processed in the order received. A failing item is counted
    /// and recorded in the report; the remaining items are still attempted.
    ///
    /// # Errors
    /// Fails only when the whole batch is affected: every item hit a storage
    /// error, which signals the store itself is unavailable. Mapping-only
    /// failures never abort the batch.
    pub async fn save_batch(&self, items: &[VideoDetails]) -> Result<BatchReport> {
        let mut report = BatchReport::default();
        let mut storage_failures = 0usize;

        for details in items {
            let video = match Self::map_video(details) {
                Ok(video) => video,
                Err(e) => {
                    warn!(
                        video_id = %details.id,
                        error = %e,
                        "Skipping unmappable video record"
                    );
                    self.record_failure(&mut report, details, FailureKind::Mapping, &e);
                    continue;
                }
            };

            match self.db.upsert_video(&video).await {
                Ok(()) => {
                    debug!(video_id = %video.video_id, "Video saved");
                    report.saved += 1;
                    self.emit_saved(&video);
                }
                Err(e) => {
                    warn!(
                        video_id = %video.video_id,
                        error = %e,
                        "Failed to save video, continuing with batch"
                    );
                    storage_failures += 1;
                    self.record_failure(&mut report, details, FailureKind::Storage, &e);
                }
            }
        }

        if !items.is_empty() && storage_failures == items.len() {
            return Err(Error::Database(DatabaseError::QueryFailed(format!(
                "every item in a batch of {} failed to persist",
                items.len()
            ))));
        }

        Ok(report)
    }

    fn record_failure(
        &self,
        report: &mut BatchReport,
        details: &VideoDetails,
        kind: FailureKind,
        error: &Error,
    ) {
        report.failed += 1;
        report.failures.push(ItemFailure {
            video_id: details.id.clone(),
            kind,
            error: error.to_string(),
        });
        // send() fails when no one is subscribed, which is fine
        self.event_tx
            .send(Event::VideoSaveFailed {
                video_id: details.id.clone(),
                error: error.to_string(),
            })
            .ok();
    }

    fn emit_saved(&self, video: &NewVideo) {
        self.event_tx
            .send(Event::VideoSaved {
                video_id: video.video_id.clone(),
                title: video.title.clone(),
            })
            .ok();
    }
}
