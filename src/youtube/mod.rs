//! YouTube Data API client
//!
//! This module issues the two upstream calls the fetch pipeline needs —
//! search-by-query and batch video details — using keys obtained from the
//! [`KeyPool`]. A search call that fails with the upstream `quotaExceeded`
//! reason rotates to the next key and retries, up to pool-size attempts. Any
//! other upstream error fails immediately without touching the rotation
//! cursor.
//!
//! The upstream seam is the [`VideoSource`] trait so the fetch pipeline can
//! run against scripted sources in tests.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::key_pool::{KeyPool, key_hint};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Upstream source of video metadata
///
/// Implemented by [`YouTubeClient`] for the real API and by scripted fakes in
/// tests.
#[async_trait]
pub trait VideoSource: Send + Sync {
    /// Search for recent videos matching a query
    ///
    /// `published_after` defaults to the configured lookback window when
    /// unset. Results come back in upstream order (most recent first).
    async fn search(
        &self,
        query: &str,
        published_after: Option<DateTime<Utc>>,
    ) -> Result<Vec<SearchResult>>;

    /// Fetch snippet and statistics for a batch of video ids
    ///
    /// Returns an empty list without issuing a call when `ids` is empty.
    async fn video_details(&self, ids: &[String]) -> Result<Vec<VideoDetails>>;
}

// ---------------------------------------------------------------------------
// Wire types (upstream JSON shapes)
// ---------------------------------------------------------------------------

/// Response body of the search call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    /// Search result items
    #[serde(default)]
    pub items: Vec<SearchResult>,
}

/// One item of a search response
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchResult {
    /// Compound id object carrying the video id
    #[serde(default)]
    pub id: SearchResultId,

    /// Snippet metadata
    #[serde(default)]
    pub snippet: VideoSnippet,
}

/// Compound id of a search result
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResultId {
    /// The video id; absent for non-video results
    #[serde(default)]
    pub video_id: Option<String>,
}

/// Snippet metadata shared by search results and detail records
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoSnippet {
    /// Video title
    #[serde(default)]
    pub title: String,

    /// Video description
    #[serde(default)]
    pub description: String,

    /// Publication time
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,

    /// Upstream channel id
    #[serde(default)]
    pub channel_id: String,

    /// Channel display name
    #[serde(default)]
    pub channel_title: String,

    /// Thumbnail variants
    #[serde(default)]
    pub thumbnails: ThumbnailSet,
}

/// Thumbnail variants by size
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ThumbnailSet {
    /// Default (smallest) thumbnail
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Thumbnail>,

    /// Medium thumbnail
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medium: Option<Thumbnail>,

    /// High-resolution thumbnail
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub high: Option<Thumbnail>,
}

/// A single thumbnail variant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Thumbnail {
    /// Image URL
    pub url: String,

    /// Image width in pixels
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,

    /// Image height in pixels
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

/// Response body of the video detail call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetailsResponse {
    /// Detail items
    #[serde(default)]
    pub items: Vec<VideoDetails>,
}

/// One item of a detail response
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VideoDetails {
    /// The video id (plain string here, unlike search results)
    #[serde(default)]
    pub id: String,

    /// Snippet metadata
    #[serde(default)]
    pub snippet: VideoSnippet,

    /// Statistics; absent when the upstream hides them
    #[serde(default)]
    pub statistics: Option<VideoStatistics>,
}

/// Video statistics
///
/// The upstream encodes counters as strings; missing fields stay `None` and
/// default to zero at mapping time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoStatistics {
    /// View count
    #[serde(default)]
    pub view_count: Option<String>,

    /// Like count
    #[serde(default)]
    pub like_count: Option<String>,

    /// Comment count
    #[serde(default)]
    pub comment_count: Option<String>,

    /// Duration in seconds, when the upstream includes it
    #[serde(default)]
    pub duration: Option<i64>,
}

/// Structured upstream error body
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorPayload,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorPayload {
    #[serde(default)]
    message: String,
    #[serde(default)]
    errors: Vec<ErrorItem>,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorItem {
    #[serde(default)]
    reason: Option<String>,
}

/// Parsed upstream failure: (is quota exhaustion, reason code, message)
fn parse_error_body(status: u16, body: &str) -> (bool, Option<String>, String) {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) => {
            let quota = parsed
                .error
                .errors
                .iter()
                .any(|e| e.reason.as_deref() == Some("quotaExceeded"));
            let reason = parsed.error.errors.iter().find_map(|e| e.reason.clone());
            let message = if parsed.error.message.is_empty() {
                format!("upstream returned HTTP {status}")
            } else {
                parsed.error.message
            };
            (quota, reason, message)
        }
        Err(_) => (false, None, format!("upstream returned HTTP {status}")),
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Client for the YouTube Data API v3
pub struct YouTubeClient {
    /// HTTP client for upstream calls
    http: reqwest::Client,

    /// API base URL (override-able for testing)
    base_url: Url,

    /// Key pool providing rotation and quota bookkeeping
    key_pool: Arc<KeyPool>,

    /// Quota cost of one search call
    search_cost: i64,

    /// Quota cost of one detail-batch call
    details_cost: i64,

    /// Page size for search calls
    max_results: u32,

    /// Default lookback window for `publishedAfter`
    published_within: Duration,
}

impl YouTubeClient {
    /// Create a new client from configuration
    ///
    /// # Errors
    /// Returns a configuration error when no API keys are configured, the
    /// base URL does not parse, or the HTTP client cannot be built.
    pub fn new(config: &Config, key_pool: Arc<KeyPool>) -> Result<Self> {
        if config.youtube.api_keys.is_empty() {
            return Err(Error::Config {
                message: "at least one YouTube API key is required".to_string(),
                key: Some("api_keys".to_string()),
            });
        }

        let base_url = Url::parse(&config.youtube.api_base_url).map_err(|e| Error::Config {
            message: format!("invalid API base URL: {e}"),
            key: Some("api_base_url".to_string()),
        })?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("tubefeed")
            .build()
            .map_err(|e| Error::Config {
                message: format!("failed to create HTTP client: {e}"),
                key: None,
            })?;

        Ok(Self {
            http,
            base_url,
            key_pool,
            search_cost: config.youtube.search_cost,
            details_cost: config.youtube.details_cost,
            max_results: config.youtube.max_results,
            published_within: config.fetch.published_within,
        })
    }

    /// Build the URL for an API endpoint under the base URL
    fn endpoint(&self, name: &str) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| Error::Config {
                message: "API base URL cannot be a base".to_string(),
                key: Some("api_base_url".to_string()),
            })?
            .push(name);
        Ok(url)
    }
}

#[async_trait]
impl VideoSource for YouTubeClient {
    async fn search(
        &self,
        query: &str,
        published_after: Option<DateTime<Utc>>,
    ) -> Result<Vec<SearchResult>> {
        let published_after = published_after.unwrap_or_else(|| {
            Utc::now()
                - chrono::Duration::from_std(self.published_within)
                    .unwrap_or_else(|_| chrono::Duration::hours(24))
        });
        let published_after = published_after.to_rfc3339_opts(SecondsFormat::Secs, true);
        let max_results = self.max_results.to_string();

        let pool_size = self.key_pool.len();
        let mut attempts = 0;

        while attempts < pool_size {
            let key = self.key_pool.acquire().await?;

            let response = self
                .http
                .get(self.endpoint("search")?)
                .query(&[
                    ("part", "snippet"),
                    ("type", "video"),
                    ("order", "date"),
                    ("maxResults", max_results.as_str()),
                    ("q", query),
                    ("publishedAfter", published_after.as_str()),
                    ("key", key.as_str()),
                ])
                .send()
                .await?;

            let status = response.status();
            if status.is_success() {
                let body: SearchResponse = response.json().await?;
                self.key_pool.record_usage(&key, self.search_cost).await?;
                debug!(
                    query,
                    items = body.items.len(),
                    key_hint = %key_hint(&key),
                    "Search call succeeded"
                );
                return Ok(body.items);
            }

            let text = response.text().await.unwrap_or_default();
            let (quota_exceeded, reason, message) = parse_error_body(status.as_u16(), &text);

            if quota_exceeded {
                warn!(
                    key_hint = %key_hint(&key),
                    attempt = attempts + 1,
                    "Quota exceeded for API key, switching"
                );
                self.key_pool.mark_exhausted(&key).await?;
                attempts += 1;
                continue;
            }

            // Non-quota failures never advance the rotation cursor
            return Err(Error::YouTubeApi {
                status: status.as_u16(),
                reason,
                message,
            });
        }

        Err(Error::AllKeysExhausted { attempts })
    }

    async fn video_details(&self, ids: &[String]) -> Result<Vec<VideoDetails>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        // No rotation retry here: the detail cost is small, so exhaustion on
        // this path means the pool is already drained and needs operator
        // attention.
        let key = self.key_pool.acquire().await?;
        let id_list = ids.join(",");

        let response = self
            .http
            .get(self.endpoint("videos")?)
            .query(&[
                ("part", "snippet,statistics"),
                ("id", id_list.as_str()),
                ("key", key.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            let body: DetailsResponse = response.json().await?;
            self.key_pool.record_usage(&key, self.details_cost).await?;
            debug!(
                requested = ids.len(),
                returned = body.items.len(),
                key_hint = %key_hint(&key),
                "Detail call succeeded"
            );
            return Ok(body.items);
        }

        let text = response.text().await.unwrap_or_default();
        let (quota_exceeded, reason, message) = parse_error_body(status.as_u16(), &text);

        if quota_exceeded {
            return Err(Error::QuotaExceeded {
                key_hint: key_hint(&key),
            });
        }

        Err(Error::YouTubeApi {
            status: status.as_u16(),
            reason,
            message,
        })
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
