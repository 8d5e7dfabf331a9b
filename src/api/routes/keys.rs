//! API key quota monitoring handler.

use crate::api::AppState;
use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};

/// GET /keys - Quota status for every configured API key
///
/// Key values are masked to a short suffix; full keys never leave the
/// process.
#[utoipa::path(
    get,
    path = "/keys",
    tag = "keys",
    responses(
        (status = 200, description = "Per-key quota status", body = Vec<crate::types::KeyQuotaStatus>),
        (status = 500, description = "Internal server error", body = crate::error::ApiError)
    )
)]
pub async fn list_keys(State(state): State<AppState>) -> Response {
    match state.aggregator.key_usage().await {
        Ok(keys) => (StatusCode::OK, Json(keys)).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to load key quota status");
            e.into_response()
        }
    }
}
