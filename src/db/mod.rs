//! Database layer for tubefeed
//!
//! Handles SQLite persistence for video records and API key quota state.
//!
//! ## Submodules
//!
//! Methods on [`Database`] are organized by domain:
//! - [`migrations`] — Database lifecycle, schema migrations
//! - [`videos`] — Video upsert, listing, search, stats
//! - [`api_keys`] — API key quota bookkeeping

use sqlx::{FromRow, sqlite::SqlitePool};

mod api_keys;
mod migrations;
mod videos;

/// New video record to be upserted into the database
#[derive(Debug, Clone)]
pub struct NewVideo {
    /// Upstream video id (identity; unique in storage)
    pub video_id: String,
    /// Video title
    pub title: String,
    /// Watch URL derived from the video id
    pub video_url: String,
    /// Video description
    pub description: String,
    /// Publication time as Unix timestamp
    pub published_at: i64,
    /// Upstream channel id
    pub channel_id: String,
    /// Channel display name
    pub channel_title: String,
    /// Thumbnail variants as a JSON object
    pub thumbnails: Option<String>,
    /// View count (0 when the upstream omits it)
    pub view_count: i64,
    /// Like count (0 when the upstream omits it)
    pub like_count: i64,
    /// Comment count (0 when the upstream omits it)
    pub comment_count: i64,
    /// Duration in seconds (0 when the upstream omits it)
    pub duration_seconds: i64,
}

/// Video record from database
#[derive(Debug, Clone, FromRow)]
pub struct VideoRow {
    /// Unique database ID
    pub id: i64,
    /// Upstream video id
    pub video_id: String,
    /// Video title
    pub title: String,
    /// Watch URL
    pub video_url: String,
    /// Video description
    pub description: String,
    /// Publication time as Unix timestamp
    pub published_at: i64,
    /// Upstream channel id
    pub channel_id: String,
    /// Channel display name
    pub channel_title: String,
    /// Thumbnail variants as a JSON object
    pub thumbnails: Option<String>,
    /// View count
    pub view_count: i64,
    /// Like count
    pub like_count: i64,
    /// Comment count
    pub comment_count: i64,
    /// Duration in seconds
    pub duration_seconds: i64,
    /// Unix timestamp when the row was first inserted
    pub created_at: i64,
    /// Unix timestamp of the last upsert
    pub updated_at: i64,
}

/// API key quota record from database
#[derive(Debug, Clone, FromRow)]
pub struct ApiKeyRow {
    /// Unique database ID
    pub id: i64,
    /// The key value itself
    pub key_value: String,
    /// Quota units consumed in the current epoch
    pub quota_used: i64,
    /// Quota units available per epoch
    pub quota_limit: i64,
    /// UTC date (YYYY-MM-DD) of the current quota epoch
    pub epoch_day: String,
    /// Unix timestamp when the key row was created
    pub created_at: i64,
}

impl ApiKeyRow {
    /// Whether this key has no quota left in the current epoch
    pub fn is_exhausted(&self) -> bool {
        self.quota_used >= self.quota_limit
    }
}

/// Filters for video listing queries
#[derive(Debug, Clone, Default)]
pub struct VideoFilter {
    /// Only videos from this channel
    pub channel_id: Option<String>,
    /// Only videos published at or after this Unix timestamp
    pub published_from: Option<i64>,
    /// Only videos published at or before this Unix timestamp
    pub published_to: Option<i64>,
}

/// Sort column for video listing
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize, utoipa::ToSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum VideoSort {
    /// Sort by publication time (default)
    #[default]
    PublishedAt,
    /// Sort by title
    Title,
    /// Sort by view count
    ViewCount,
}

impl VideoSort {
    /// The column name this sort maps to
    pub fn column(&self) -> &'static str {
        match self {
            VideoSort::PublishedAt => "published_at",
            VideoSort::Title => "title",
            VideoSort::ViewCount => "view_count",
        }
    }
}

/// Sort column for stored-text search
///
/// `Relevance` is accepted for compatibility with the read API but falls back
/// to recency ordering; no ranking is computed.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize, utoipa::ToSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum SearchSort {
    /// Relevance (falls back to publication time, newest first)
    #[default]
    Relevance,
    /// Sort by publication time
    PublishedAt,
    /// Sort by view count
    ViewCount,
}

/// Sort direction
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize, utoipa::ToSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    /// Ascending
    Asc,
    /// Descending (default)
    #[default]
    Desc,
}

impl SortOrder {
    /// SQL keyword for this direction
    pub fn sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Aggregate statistics over the stored videos
#[derive(Debug, Clone)]
pub struct VideoStats {
    /// Total number of stored videos
    pub total_videos: i64,
    /// Number of distinct channels
    pub total_channels: i64,
    /// Most recent publication timestamp, if any videos are stored
    pub latest_published_at: Option<i64>,
    /// Oldest publication timestamp, if any videos are stored
    pub oldest_published_at: Option<i64>,
}

/// Database handle for tubefeed
pub struct Database {
    pool: SqlitePool,
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
