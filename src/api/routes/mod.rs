//! Route handlers for the REST API
//!
//! Handlers are organized by domain:
//! - [`videos`] — Listing, lookup, stats
//! - [`search`] — Stored-text search
//! - [`fetch`] — Fetch run status and manual triggering
//! - [`keys`] — API key quota monitoring
//! - [`system`] — Health, events, OpenAPI, shutdown

use crate::db::{SearchSort, SortOrder, VideoRow, VideoSort};
use chrono::{SecondsFormat, TimeZone};
use serde::{Deserialize, Serialize};

mod fetch;
mod keys;
mod search;
mod system;
mod videos;

// Re-export all handlers so `routes::function_name` continues to work
pub use fetch::*;
pub use keys::*;
pub use search::*;
pub use system::*;
pub use videos::*;

/// Render a Unix timestamp as RFC 3339 (empty string for out-of-range values)
pub(crate) fn format_timestamp(ts: i64) -> String {
    chrono::Utc
        .timestamp_opt(ts, 0)
        .single()
        .map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true))
        .unwrap_or_default()
}

// ============================================================================
// Query/Request Types (shared across handlers)
// ============================================================================

/// Query parameters for GET /videos
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct VideoListQuery {
    /// Page number, 1-based (default: 1)
    pub page: Option<i64>,
    /// Page size (default: 20, max: 100)
    pub limit: Option<i64>,
    /// Sort column (default: published_at)
    pub sort_by: Option<VideoSort>,
    /// Sort direction (default: desc)
    pub sort_order: Option<SortOrder>,
    /// Only videos from this channel
    pub channel_id: Option<String>,
    /// Only videos published at or after this RFC 3339 timestamp
    pub date_from: Option<String>,
    /// Only videos published at or before this RFC 3339 timestamp
    pub date_to: Option<String>,
}

/// Request body for POST /search
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct SearchRequest {
    /// Search text, 1-100 characters; terms are whitespace-split and ANDed
    pub query: String,
    /// Page number, 1-based (default: 1)
    #[serde(default)]
    pub page: Option<i64>,
    /// Page size (default: 20, max: 100)
    #[serde(default)]
    pub limit: Option<i64>,
    /// Sort column; "relevance" falls back to recency (default: relevance)
    #[serde(default)]
    pub sort_by: Option<SearchSort>,
    /// Sort direction (default: desc)
    #[serde(default)]
    pub sort_order: Option<SortOrder>,
}

// ============================================================================
// Response Types
// ============================================================================

/// A stored video as served by the API
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct VideoSummary {
    /// Database row id
    pub id: i64,
    /// Upstream video id
    pub video_id: String,
    /// Video title
    pub title: String,
    /// Watch URL
    pub video_url: String,
    /// Video description
    pub description: String,
    /// Publication time (RFC 3339)
    pub published_at: String,
    /// Upstream channel id
    pub channel_id: String,
    /// Channel display name
    pub channel_title: String,
    /// Thumbnail variants
    #[schema(value_type = Object)]
    pub thumbnails: Option<serde_json::Value>,
    /// View count
    pub view_count: i64,
    /// Like count
    pub like_count: i64,
    /// Comment count
    pub comment_count: i64,
    /// Duration in seconds
    pub duration_seconds: i64,
    /// First-seen time (RFC 3339)
    pub created_at: String,
    /// Last-update time (RFC 3339)
    pub updated_at: String,
}

impl From<VideoRow> for VideoSummary {
    fn from(row: VideoRow) -> Self {
        let thumbnails = row
            .thumbnails
            .as_deref()
            .and_then(|raw| serde_json::from_str(raw).ok());

        Self {
            id: row.id,
            video_id: row.video_id,
            title: row.title,
            video_url: row.video_url,
            description: row.description,
            published_at: format_timestamp(row.published_at),
            channel_id: row.channel_id,
            channel_title: row.channel_title,
            thumbnails,
            view_count: row.view_count,
            like_count: row.like_count,
            comment_count: row.comment_count,
            duration_seconds: row.duration_seconds,
            created_at: format_timestamp(row.created_at),
            updated_at: format_timestamp(row.updated_at),
        }
    }
}

/// Pagination envelope for list responses
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct Pagination {
    /// Current page, 1-based
    pub page: i64,
    /// Page size
    pub limit: i64,
    /// Total number of matching records
    pub total: i64,
    /// Total number of pages
    pub total_pages: i64,
    /// Whether a next page exists
    pub has_next: bool,
    /// Whether a previous page exists
    pub has_prev: bool,
}

impl Pagination {
    /// Compute the envelope from page, limit, and total count
    pub fn new(page: i64, limit: i64, total: i64) -> Self {
        let total_pages = if total == 0 { 0 } else { (total + limit - 1) / limit };
        Self {
            page,
            limit,
            total,
            total_pages,
            has_next: page < total_pages,
            has_prev: page > 1,
        }
    }
}

/// Response for GET /videos
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct VideoListResponse {
    /// Videos on this page
    pub videos: Vec<VideoSummary>,
    /// Pagination envelope
    pub pagination: Pagination,
}

/// Search metadata attached to search responses
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct SearchMeta {
    /// The query as received
    pub search_query: String,
    /// Number of whitespace-split terms
    pub search_terms: usize,
    /// Total number of matching records
    pub total_matches: i64,
}

/// Response for POST /search
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct SearchResultsResponse {
    /// Matching videos on this page
    pub videos: Vec<VideoSummary>,
    /// Pagination envelope
    pub pagination: Pagination,
    /// Search metadata
    pub meta: SearchMeta,
}

/// Publication date range of the stored videos
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct DateRange {
    /// Most recent publication time (RFC 3339)
    pub latest: Option<String>,
    /// Oldest publication time (RFC 3339)
    pub oldest: Option<String>,
}

/// Response for GET /videos/stats
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct StatsResponse {
    /// Total number of stored videos
    pub total_videos: i64,
    /// Number of distinct channels
    pub total_channels: i64,
    /// Publication date range
    pub date_range: DateRange,
}
