//! REST API server module
//!
//! Provides an OpenAPI-documented REST API over the stored video records and
//! the fetch pipeline: paginated listing, single-video lookup, stored-text
//! search, aggregate stats, fetch status/trigger, and key quota monitoring.

use crate::{Config, Result, VideoAggregator};
use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{get, post},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod auth;
pub mod error_response;
pub mod openapi;
pub mod routes;
pub mod state;

pub use openapi::ApiDoc;
pub use state::AppState;

/// Create the API router with all route definitions
///
/// # Routes
///
/// ## Videos
/// - `GET /videos` - Paginated video listing with filters and sorting
/// - `GET /videos/stats` - Aggregate statistics
/// - `GET /videos/:id` - Get single video by row id or upstream video id
///
/// ## Search
/// - `POST /search` - Substring search over stored title/description/channel
///
/// ## Fetch pipeline
/// - `GET /fetch/status` - Fetch run state and last-run summary
/// - `POST /fetch/run` - Trigger a fetch run now (409 while one is in flight)
/// - `GET /keys` - Per-key quota status (masked key values)
///
/// ## System
/// - `GET /health` - Health check
/// - `GET /openapi.json` - OpenAPI specification
/// - `GET /swagger-ui` - Interactive Swagger UI documentation (if enabled)
/// - `GET /events` - Server-sent events stream
/// - `POST /shutdown` - Graceful shutdown
pub fn create_router(aggregator: Arc<VideoAggregator>, config: Arc<Config>) -> Router {
    let state = AppState::new(aggregator, config.clone());

    // Build the router with all routes
    let router = Router::new()
        // Videos
        .route("/videos", get(routes::list_videos))
        .route("/videos/stats", get(routes::video_stats))
        .route("/videos/:id", get(routes::get_video))
        // Search
        .route("/search", post(routes::search_videos))
        // Fetch pipeline
        .route("/fetch/status", get(routes::fetch_status))
        .route("/fetch/run", post(routes::trigger_fetch))
        .route("/keys", get(routes::list_keys))
        // System
        .route("/health", get(routes::health_check))
        .route("/openapi.json", get(routes::openapi_spec))
        .route("/events", get(routes::event_stream))
        .route("/shutdown", post(routes::shutdown));

    // Merge Swagger UI routes if enabled in config (before applying state)
    // Note: SwaggerUi will use the existing /openapi.json endpoint we already defined
    let router = if config.server.api.swagger_ui {
        router.merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()))
    } else {
        router
    };

    // Add state to all routes
    let router = router.with_state(state);

    // Apply authentication middleware if API key is configured
    let router = if config.server.api.api_key.is_some() {
        router.layer(middleware::from_fn_with_state(
            config.server.api.api_key.clone(),
            auth::require_api_key,
        ))
    } else {
        router
    };

    // Apply CORS middleware if enabled in config
    if config.server.api.cors_enabled {
        let cors = build_cors_layer(&config.server.api.cors_origins);
        router.layer(cors)
    } else {
        router
    }
}

/// Build a CORS layer based on configured origins
///
/// Supports "*" for any origin; an empty list also allows all origins for
/// local development.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let allow_any = origins.iter().any(|o| o == "*");

    if allow_any || origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let allowed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(AllowOrigin::list(allowed))
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

/// Start the API server on the configured bind address.
///
/// Creates a TCP listener, binds it to the configured address, and serves the
/// API router until shutdown.
///
/// # Example
///
/// ```no_run
/// use tubefeed::{VideoAggregator, Config};
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = Arc::new(Config::from_env()?);
/// let aggregator = Arc::new(VideoAggregator::new((*config).clone()).await?);
///
/// // Start API server (blocks until shutdown)
/// tubefeed::api::start_api_server(aggregator, config).await?;
/// # Ok(())
/// # }
/// ```
pub async fn start_api_server(
    aggregator: Arc<VideoAggregator>,
    config: Arc<Config>,
) -> Result<()> {
    let bind_address = config.server.api.bind_address;

    tracing::info!(
        address = %bind_address,
        "Starting API server"
    );

    let app = create_router(aggregator, config);

    let listener = TcpListener::bind(bind_address)
        .await
        .map_err(crate::error::Error::Io)?;

    tracing::info!(
        address = %bind_address,
        "API server listening"
    );

    axum::serve(listener, app)
        .await
        .map_err(|e| crate::error::Error::ApiServerError(e.to_string()))?;

    tracing::info!("API server stopped");
    Ok(())
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
