//! Error types for tubefeed
//!
//! This module provides error handling for the library, including:
//! - Domain-specific error types (quota, upstream API, database, fetch run)
//! - HTTP status code mapping for API integration
//! - Structured error responses with machine-readable error codes

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Result type alias for tubefeed operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for tubefeed
///
/// This is the primary error type used throughout the library. Each variant includes
/// contextual information to help diagnose issues.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "api_keys")
        key: Option<String>,
    },

    /// Database operation failed
    #[error("database error: {0}")]
    Database(#[from] DatabaseError),

    /// SQLx database error
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// A single API key has no quota left for the current epoch
    #[error("quota exceeded for API key …{key_hint}")]
    QuotaExceeded {
        /// Masked suffix of the exhausted key
        key_hint: String,
    },

    /// Every configured API key is exhausted after a full rotation cycle
    #[error("all {attempts} API keys exhausted due to quota limits")]
    AllKeysExhausted {
        /// Number of keys tried before giving up
        attempts: usize,
    },

    /// Non-quota error reported by the YouTube Data API
    #[error("YouTube API error (HTTP {status}): {message}")]
    YouTubeApi {
        /// HTTP status returned by the upstream API
        status: u16,
        /// Nested reason code from the error body, when present
        reason: Option<String>,
        /// Upstream error message
        message: String,
    },

    /// Network error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A fetched record cannot be mapped to the storage schema
    #[error("invalid video record: {0}")]
    InvalidVideo(String),

    /// Resource not found
    #[error("not found: {0}")]
    NotFound(String),

    /// A fetch run is already in flight; overlapping runs are never started
    #[error("a fetch run is already in progress")]
    FetchInProgress,

    /// The per-run deadline elapsed before the fetch run finished
    #[error("fetch run timed out after {timeout_secs}s")]
    FetchTimeout {
        /// Configured run deadline in seconds
        timeout_secs: u64,
    },

    /// Shutdown in progress
    #[error("shutdown in progress")]
    ShuttingDown,

    /// API server error
    #[error("API server error: {0}")]
    ApiServerError(String),
}

/// Database-related errors
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Failed to connect to database
    #[error("failed to connect to database: {0}")]
    ConnectionFailed(String),

    /// Failed to run migrations
    #[error("failed to run migrations: {0}")]
    MigrationFailed(String),

    /// Query failed
    #[error("query failed: {0}")]
    QueryFailed(String),

    /// Record not found
    #[error("record not found: {0}")]
    NotFound(String),
}

/// API error response format
///
/// This structure is returned by API endpoints when an error occurs.
/// It follows a standard format with machine-readable error codes,
/// human-readable messages, and optional contextual details.
///
/// # Example JSON Response
///
/// ```json
/// {
///   "error": {
///     "code": "all_keys_exhausted",
///     "message": "all 2 API keys exhausted due to quota limits",
///     "details": {
///       "attempts": 2
///     }
///   }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// The error details
    pub error: ErrorDetail,
}

/// Detailed error information for API responses
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "not_found", "all_keys_exhausted")
    pub code: String,

    /// Human-readable error message
    pub message: String,

    /// Optional additional context about the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    /// Create a new API error with code and message
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }

    /// Create an API error with additional details
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                details: Some(details),
            },
        }
    }

    /// Create a "not found" error
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::new("not_found", format!("{} not found", resource.into()))
    }

    /// Create a "validation error" error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new("validation_error", message)
    }

    /// Create an "internal server error"
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new("internal_error", message)
    }
}

/// Convert errors to HTTP status codes for API responses
///
/// This trait maps domain errors to appropriate HTTP status codes.
pub trait ToHttpStatus {
    /// Get the HTTP status code for this error
    fn status_code(&self) -> u16;

    /// Get the machine-readable error code
    fn error_code(&self) -> &str;
}

impl ToHttpStatus for Error {
    fn status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - Client error (invalid input)
            Error::Config { .. } => 400,

            // 404 Not Found
            Error::NotFound(_) => 404,

            // 422 Unprocessable Entity - Semantic errors
            Error::InvalidVideo(_) => 422,

            // 409 Conflict - a run is already in flight
            Error::FetchInProgress => 409,

            // 429 Too Many Requests - a single key out of quota
            Error::QuotaExceeded { .. } => 429,

            // 500 Internal Server Error - Server-side issues
            Error::Database(_) => 500,
            Error::Sqlx(_) => 500,
            Error::Serialization(_) => 500,
            Error::Io(_) => 500,
            Error::ApiServerError(_) => 500,

            // 502 Bad Gateway - External service errors
            Error::YouTubeApi { .. } => 502,
            Error::Network(_) => 502,

            // 503 Service Unavailable
            Error::AllKeysExhausted { .. } => 503,
            Error::ShuttingDown => 503,

            // 504 Gateway Timeout - per-run deadline hit
            Error::FetchTimeout { .. } => 504,
        }
    }

    fn error_code(&self) -> &str {
        match self {
            Error::Config { .. } => "config_error",
            Error::Database(_) => "database_error",
            Error::Sqlx(_) => "database_error",
            Error::QuotaExceeded { .. } => "quota_exceeded",
            Error::AllKeysExhausted { .. } => "all_keys_exhausted",
            Error::YouTubeApi { .. } => "youtube_api_error",
            Error::Network(_) => "network_error",
            Error::Serialization(_) => "serialization_error",
            Error::Io(_) => "io_error",
            Error::InvalidVideo(_) => "invalid_video",
            Error::NotFound(_) => "not_found",
            Error::FetchInProgress => "fetch_in_progress",
            Error::FetchTimeout { .. } => "fetch_timeout",
            Error::ShuttingDown => "shutting_down",
            Error::ApiServerError(_) => "api_server_error",
        }
    }
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        let code = error.error_code().to_string();
        let message = error.to_string();

        // Add contextual details for specific error types
        let details = match &error {
            Error::QuotaExceeded { key_hint } => Some(serde_json::json!({
                "key_hint": key_hint,
            })),
            Error::AllKeysExhausted { attempts } => Some(serde_json::json!({
                "attempts": attempts,
            })),
            Error::YouTubeApi { status, reason, .. } => Some(serde_json::json!({
                "upstream_status": status,
                "reason": reason,
            })),
            Error::FetchTimeout { timeout_secs } => Some(serde_json::json!({
                "timeout_secs": timeout_secs,
            })),
            _ => None,
        };

        ApiError {
            error: ErrorDetail {
                code,
                message,
                details,
            },
        }
    }
}
