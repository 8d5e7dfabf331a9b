//! Configuration types for tubefeed

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, path::PathBuf, time::Duration};
use utoipa::ToSchema;

/// YouTube Data API access configuration (key pool, quota accounting)
///
/// Groups settings related to how calls to the upstream metadata API are
/// authorized and billed against per-key quotas.
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct YouTubeConfig {
    /// Ordered pool of API keys (at least one required; fixed at startup)
    #[serde(default)]
    pub api_keys: Vec<String>,

    /// Base URL of the YouTube Data API (override for testing)
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Quota units available per key per epoch (default: 10000, the upstream daily quota)
    #[serde(default = "default_quota_limit")]
    pub quota_limit: i64,

    /// Quota units consumed by one search call (default: 100)
    #[serde(default = "default_search_cost")]
    pub search_cost: i64,

    /// Quota units consumed by one detail-batch call (default: 1)
    #[serde(default = "default_details_cost")]
    pub details_cost: i64,

    /// Page size for search calls (default: 50, the upstream maximum)
    #[serde(default = "default_max_results")]
    pub max_results: u32,
}

impl Default for YouTubeConfig {
    fn default() -> Self {
        Self {
            api_keys: vec![],
            api_base_url: default_api_base_url(),
            quota_limit: default_quota_limit(),
            search_cost: default_search_cost(),
            details_cost: default_details_cost(),
            max_results: default_max_results(),
        }
    }
}

/// Fetch run behavior configuration (query, cadence, deadlines)
///
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct FetchConfig {
    /// Search query driving every fetch run (default: "official music video")
    #[serde(default = "default_search_query")]
    pub search_query: String,

    /// Interval between scheduled fetch runs (default: 10 seconds)
    #[serde(default = "default_fetch_interval", with = "duration_serde")]
    pub fetch_interval: Duration,

    /// How far back the default `publishedAfter` window reaches (default: 24 hours)
    #[serde(default = "default_published_within", with = "duration_serde")]
    pub published_within: Duration,

    /// Hard deadline for a single fetch run (default: 300 seconds)
    ///
    /// A run that exceeds the deadline fails cleanly and the scheduler
    /// returns to idle; a stuck upstream call can never pin the service in
    /// the running state.
    #[serde(default = "default_run_timeout", with = "duration_serde")]
    pub run_timeout: Duration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            search_query: default_search_query(),
            fetch_interval: default_fetch_interval(),
            published_within: default_published_within(),
            run_timeout: default_run_timeout(),
        }
    }
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct PersistenceConfig {
    /// Database path (default: "tubefeed.db")
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

/// API and external server integration configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct ServerIntegrationConfig {
    /// REST API configuration
    #[serde(default)]
    pub api: ApiConfig,
}

/// REST API configuration
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiConfig {
    /// Address to bind to (default: 127.0.0.1:7979)
    #[serde(default = "default_bind_address")]
    pub bind_address: SocketAddr,

    /// Optional API key for authentication
    #[serde(default)]
    pub api_key: Option<String>,

    /// Enable CORS for browser access (default: true)
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// Allowed CORS origins (default: ["*"])
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    /// Enable Swagger UI at /swagger-ui (default: true)
    #[serde(default = "default_true")]
    pub swagger_ui: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            api_key: None,
            cors_enabled: true,
            cors_origins: default_cors_origins(),
            swagger_ui: true,
        }
    }
}

/// Main configuration for the video aggregator
///
/// Fields are organized into logical sub-configs:
/// - [`youtube`](YouTubeConfig) — key pool, quota costs, API endpoint
/// - [`fetch`](FetchConfig) — query, cadence, per-run deadline
/// - [`persistence`](PersistenceConfig) — database path
/// - [`server`](ServerIntegrationConfig) — REST API settings
///
/// Sub-config fields are flattened for a flat JSON/TOML serialization format.
/// Configuration is loaded once at startup and immutable for the process
/// lifetime.
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct Config {
    /// YouTube Data API access settings
    #[serde(flatten)]
    pub youtube: YouTubeConfig,

    /// Fetch run behavior settings
    #[serde(flatten)]
    pub fetch: FetchConfig,

    /// Data storage settings
    #[serde(default)]
    pub persistence: PersistenceConfig,

    /// API server settings
    #[serde(flatten)]
    pub server: ServerIntegrationConfig,
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Recognized variables:
    /// - `YOUTUBE_API_KEYS` — comma-separated list of API keys (required)
    /// - `SEARCH_QUERY` — search query (default: "official music video")
    /// - `FETCH_INTERVAL_SECONDS` — seconds between fetch runs (default: 10)
    /// - `QUOTA_LIMIT` — quota units per key per epoch (default: 10000)
    /// - `DATABASE_PATH` — SQLite database path (default: "tubefeed.db")
    /// - `BIND_ADDRESS` — API bind address (default: "127.0.0.1:7979")
    ///
    /// # Errors
    /// Returns a configuration error when `YOUTUBE_API_KEYS` is missing or
    /// empty, or when a numeric/address variable fails to parse.
    pub fn from_env() -> Result<Self> {
        let mut config = Config::default();

        let raw_keys = std::env::var("YOUTUBE_API_KEYS").map_err(|_| Error::Config {
            message: "YOUTUBE_API_KEYS must be set".to_string(),
            key: Some("YOUTUBE_API_KEYS".to_string()),
        })?;
        config.youtube.api_keys = raw_keys
            .split(',')
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
            .collect();
        if config.youtube.api_keys.is_empty() {
            return Err(Error::Config {
                message: "YOUTUBE_API_KEYS contains no usable keys".to_string(),
                key: Some("YOUTUBE_API_KEYS".to_string()),
            });
        }

        if let Ok(query) = std::env::var("SEARCH_QUERY") {
            config.fetch.search_query = query;
        }

        if let Ok(raw) = std::env::var("FETCH_INTERVAL_SECONDS") {
            let secs: u64 = raw.parse().map_err(|_| Error::Config {
                message: format!("FETCH_INTERVAL_SECONDS is not a valid integer: {raw}"),
                key: Some("FETCH_INTERVAL_SECONDS".to_string()),
            })?;
            config.fetch.fetch_interval = Duration::from_secs(secs);
        }

        if let Ok(raw) = std::env::var("QUOTA_LIMIT") {
            config.youtube.quota_limit = raw.parse().map_err(|_| Error::Config {
                message: format!("QUOTA_LIMIT is not a valid integer: {raw}"),
                key: Some("QUOTA_LIMIT".to_string()),
            })?;
        }

        if let Ok(path) = std::env::var("DATABASE_PATH") {
            config.persistence.database_path = PathBuf::from(path);
        }

        if let Ok(raw) = std::env::var("BIND_ADDRESS") {
            config.server.api.bind_address = raw.parse().map_err(|_| Error::Config {
                message: format!("BIND_ADDRESS is not a valid socket address: {raw}"),
                key: Some("BIND_ADDRESS".to_string()),
            })?;
        }

        Ok(config)
    }
}

// Default value functions

fn default_api_base_url() -> String {
    "https://www.googleapis.com/youtube/v3".to_string()
}

fn default_quota_limit() -> i64 {
    10_000
}

fn default_search_cost() -> i64 {
    100
}

fn default_details_cost() -> i64 {
    1
}

fn default_max_results() -> u32 {
    50
}

fn default_search_query() -> String {
    "official music video".to_string()
}

fn default_fetch_interval() -> Duration {
    Duration::from_secs(10)
}

fn default_published_within() -> Duration {
    Duration::from_secs(24 * 60 * 60) // 24 hours
}

fn default_run_timeout() -> Duration {
    Duration::from_secs(300) // 5 minutes
}

fn default_database_path() -> PathBuf {
    PathBuf::from("tubefeed.db")
}

fn default_bind_address() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 7979))
}

fn default_cors_origins() -> Vec<String> {
    vec!["*".into()]
}

fn default_true() -> bool {
    true
}

// Duration serialization helper
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
