//! Stored-text search handler.

use super::{Pagination, SearchMeta, SearchRequest, SearchResultsResponse, VideoSummary};
use crate::api::AppState;
use crate::error::ApiError;
use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};

/// POST /search - Substring search over stored title, description, and channel title
///
/// Terms are whitespace-split from the query and all must match
/// (case-insensitive). A `sort_by` of "relevance" orders by publication time,
/// newest first.
#[utoipa::path(
    post,
    path = "/search",
    tag = "search",
    request_body = SearchRequest,
    responses(
        (status = 200, description = "Search results", body = SearchResultsResponse),
        (status = 400, description = "Invalid search request", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    )
)]
pub async fn search_videos(
    State(state): State<AppState>,
    Json(request): Json<SearchRequest>,
) -> Response {
    let query_text = request.query.trim().to_string();
    if query_text.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiError::validation("query must not be empty")),
        )
            .into_response();
    }
    if query_text.chars().count() > 100 {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiError::validation("query must be at most 100 characters")),
        )
            .into_response();
    }

    let terms: Vec<String> = query_text
        .to_lowercase()
        .split_whitespace()
        .map(String::from)
        .collect();

    let page = request.page.unwrap_or(1).max(1);
    let limit = request.limit.unwrap_or(20).clamp(1, 100);
    let sort = request.sort_by.unwrap_or_default();
    let order = request.sort_order.unwrap_or_default();

    let total = match state.aggregator.db.count_search_videos(&terms).await {
        Ok(total) => total,
        Err(e) => {
            tracing::error!(error = %e, "Failed to count search results");
            return e.into_response();
        }
    };

    let rows = match state
        .aggregator
        .db
        .search_videos(&terms, sort, order, limit, (page - 1) * limit)
        .await
    {
        Ok(rows) => rows,
        Err(e) => {
            tracing::error!(error = %e, "Failed to search videos");
            return e.into_response();
        }
    };

    let response = SearchResultsResponse {
        videos: rows.into_iter().map(VideoSummary::from).collect(),
        pagination: Pagination::new(page, limit, total),
        meta: SearchMeta {
            search_query: query_text,
            search_terms: terms.len(),
            total_matches: total,
        },
    };
    (StatusCode::OK, Json(response)).into_response()
}
