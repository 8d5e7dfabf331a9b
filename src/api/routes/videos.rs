//! Video listing, lookup, and stats handlers.

use super::{
    DateRange, Pagination, StatsResponse, VideoListQuery, VideoListResponse, VideoSummary,
    format_timestamp,
};
use crate::api::AppState;
use crate::db::VideoFilter;
use crate::error::ApiError;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};

/// Parse an RFC 3339 query parameter into a Unix timestamp
fn parse_rfc3339(raw: &str) -> Option<i64> {
    chrono::DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|t| t.timestamp())
}

/// GET /videos - Paginated video listing
#[utoipa::path(
    get,
    path = "/videos",
    tag = "videos",
    params(
        ("page" = Option<i64>, Query, description = "Page number, 1-based"),
        ("limit" = Option<i64>, Query, description = "Page size (max 100)"),
        ("sort_by" = Option<String>, Query, description = "Sort column: published_at, title, or view_count"),
        ("sort_order" = Option<String>, Query, description = "Sort direction: asc or desc"),
        ("channel_id" = Option<String>, Query, description = "Filter by channel id"),
        ("date_from" = Option<String>, Query, description = "Only videos published at or after this RFC 3339 timestamp"),
        ("date_to" = Option<String>, Query, description = "Only videos published at or before this RFC 3339 timestamp")
    ),
    responses(
        (status = 200, description = "Paginated video list", body = VideoListResponse),
        (status = 400, description = "Invalid query parameters", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    )
)]
pub async fn list_videos(
    State(state): State<AppState>,
    Query(query): Query<VideoListQuery>,
) -> Response {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(20).clamp(1, 100);

    let published_from = match query.date_from.as_deref() {
        Some(raw) => match parse_rfc3339(raw) {
            Some(ts) => Some(ts),
            None => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(ApiError::validation(format!(
                        "date_from is not a valid RFC 3339 timestamp: {raw}"
                    ))),
                )
                    .into_response();
            }
        },
        None => None,
    };
    let published_to = match query.date_to.as_deref() {
        Some(raw) => match parse_rfc3339(raw) {
            Some(ts) => Some(ts),
            None => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(ApiError::validation(format!(
                        "date_to is not a valid RFC 3339 timestamp: {raw}"
                    ))),
                )
                    .into_response();
            }
        },
        None => None,
    };

    let filter = VideoFilter {
        channel_id: query.channel_id.clone(),
        published_from,
        published_to,
    };
    let sort = query.sort_by.unwrap_or_default();
    let order = query.sort_order.unwrap_or_default();

    let total = match state.aggregator.db.count_videos(&filter).await {
        Ok(total) => total,
        Err(e) => {
            tracing::error!(error = %e, "Failed to count videos");
            return e.into_response();
        }
    };

    let rows = match state
        .aggregator
        .db
        .list_videos(&filter, sort, order, limit, (page - 1) * limit)
        .await
    {
        Ok(rows) => rows,
        Err(e) => {
            tracing::error!(error = %e, "Failed to list videos");
            return e.into_response();
        }
    };

    let response = VideoListResponse {
        videos: rows.into_iter().map(VideoSummary::from).collect(),
        pagination: Pagination::new(page, limit, total),
    };
    (StatusCode::OK, Json(response)).into_response()
}

/// GET /videos/:id - Get a single video by row id or upstream video id
#[utoipa::path(
    get,
    path = "/videos/{id}",
    tag = "videos",
    params(
        ("id" = String, Path, description = "Database row id or upstream video id")
    ),
    responses(
        (status = 200, description = "The video", body = VideoSummary),
        (status = 404, description = "Video not found", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    )
)]
pub async fn get_video(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    // Numeric ids are tried as row ids first, then as upstream video ids
    let by_row_id = match id.parse::<i64>() {
        Ok(row_id) => match state.aggregator.db.get_video(row_id).await {
            Ok(row) => row,
            Err(e) => return e.into_response(),
        },
        Err(_) => None,
    };

    let row = match by_row_id {
        Some(row) => Some(row),
        None => match state.aggregator.db.get_video_by_video_id(&id).await {
            Ok(row) => row,
            Err(e) => return e.into_response(),
        },
    };

    match row {
        Some(row) => (StatusCode::OK, Json(VideoSummary::from(row))).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(ApiError::not_found(format!("Video {id}"))),
        )
            .into_response(),
    }
}

/// GET /videos/stats - Aggregate statistics over the stored videos
#[utoipa::path(
    get,
    path = "/videos/stats",
    tag = "videos",
    responses(
        (status = 200, description = "Aggregate statistics", body = StatsResponse),
        (status = 500, description = "Internal server error", body = ApiError)
    )
)]
pub async fn video_stats(State(state): State<AppState>) -> Response {
    match state.aggregator.db.video_stats().await {
        Ok(stats) => {
            let response = StatsResponse {
                total_videos: stats.total_videos,
                total_channels: stats.total_channels,
                date_range: DateRange {
                    latest: stats.latest_published_at.map(format_timestamp),
                    oldest: stats.oldest_published_at.map(format_timestamp),
                },
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to compute video stats");
            e.into_response()
        }
    }
}
