//! Fetch pipeline handlers: status and manual triggering.

use crate::api::AppState;
use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};

/// GET /fetch/status - Fetch pipeline state and last-run summary
#[utoipa::path(
    get,
    path = "/fetch/status",
    tag = "fetch",
    responses(
        (status = 200, description = "Fetch pipeline status", body = crate::types::FetchStatus)
    )
)]
pub async fn fetch_status(State(state): State<AppState>) -> impl IntoResponse {
    let status = state.aggregator.fetch_status().await;
    (StatusCode::OK, Json(status))
}

/// POST /fetch/run - Trigger a fetch run now
///
/// Runs the complete search → details → save cycle and returns the run
/// summary. Refused with 409 while another run is in flight; the scheduler
/// and manual triggers contend for the same mutual-exclusion flag.
#[utoipa::path(
    post,
    path = "/fetch/run",
    tag = "fetch",
    responses(
        (status = 200, description = "Completed run summary", body = crate::types::FetchRun),
        (status = 409, description = "A fetch run is already in progress", body = crate::error::ApiError),
        (status = 502, description = "Upstream API failure", body = crate::error::ApiError),
        (status = 503, description = "All API keys exhausted", body = crate::error::ApiError),
        (status = 504, description = "Run deadline exceeded", body = crate::error::ApiError)
    )
)]
pub async fn trigger_fetch(State(state): State<AppState>) -> Response {
    match state.aggregator.run_fetch_once().await {
        Ok(run) => (StatusCode::OK, Json(run)).into_response(),
        Err(e) => e.into_response(),
    }
}
