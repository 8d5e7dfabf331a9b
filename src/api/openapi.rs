//! OpenAPI documentation and schema generation
//!
//! This module defines the OpenAPI specification for the tubefeed REST API
//! using utoipa for compile-time spec generation.

use utoipa::{
    Modify, OpenApi,
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
};

/// OpenAPI documentation for the tubefeed REST API
///
/// The spec can be accessed via:
/// - `/openapi.json` - JSON format OpenAPI specification
/// - `/swagger-ui` - Interactive Swagger UI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "tubefeed REST API",
        version = "0.1.0",
        description = "REST API over aggregated YouTube video metadata: listing, search, stats, and fetch pipeline control",
        contact(
            name = "tubefeed",
            url = "https://github.com/tubefeed-dev/tubefeed"
        ),
        license(
            name = "MIT OR Apache-2.0"
        )
    ),
    servers(
        (url = "http://localhost:7979", description = "Local development server")
    ),
    paths(
        // Videos
        crate::api::routes::list_videos,
        crate::api::routes::get_video,
        crate::api::routes::video_stats,

        // Search
        crate::api::routes::search_videos,

        // Fetch pipeline
        crate::api::routes::fetch_status,
        crate::api::routes::trigger_fetch,
        crate::api::routes::list_keys,

        // System
        crate::api::routes::health_check,
        crate::api::routes::openapi_spec,
        crate::api::routes::event_stream,
        crate::api::routes::shutdown,
    ),
    components(schemas(
        // Core types from types.rs
        crate::types::FetchRun,
        crate::types::FetchStatus,
        crate::types::KeyQuotaStatus,
        crate::types::BatchReport,
        crate::types::ItemFailure,
        crate::types::FailureKind,

        // Error envelope
        crate::error::ApiError,
        crate::error::ErrorDetail,

        // Config types from config.rs
        crate::config::Config,
        crate::config::YouTubeConfig,
        crate::config::FetchConfig,
        crate::config::PersistenceConfig,
        crate::config::ServerIntegrationConfig,
        crate::config::ApiConfig,

        // Storage ordering enums
        crate::db::VideoSort,
        crate::db::SearchSort,
        crate::db::SortOrder,

        // Request/response types from routes
        crate::api::routes::VideoListQuery,
        crate::api::routes::SearchRequest,
        crate::api::routes::VideoSummary,
        crate::api::routes::Pagination,
        crate::api::routes::VideoListResponse,
        crate::api::routes::SearchMeta,
        crate::api::routes::SearchResultsResponse,
        crate::api::routes::DateRange,
        crate::api::routes::StatsResponse,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "videos", description = "Stored video listing and lookup"),
        (name = "search", description = "Stored-text search"),
        (name = "fetch", description = "Fetch pipeline status and control"),
        (name = "keys", description = "API key quota monitoring"),
        (name = "system", description = "Health, events, and lifecycle")
    )
)]
pub struct ApiDoc;

/// Registers the optional X-Api-Key security scheme
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "api_key",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new("X-Api-Key"))),
            );
        }
    }
}
