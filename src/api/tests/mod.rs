use super::*;
use crate::VideoAggregator;
use crate::aggregator::test_helpers::{
    FakeSource, create_test_aggregator, create_test_aggregator_with, sample_details,
};
use crate::db::NewVideo;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt; // for oneshot

mod system;

/// Helper to create a router over a test aggregator
async fn test_app() -> (Router, Arc<VideoAggregator>, tempfile::TempDir) {
    let (aggregator, temp_dir) = create_test_aggregator().await;
    let app = create_router(aggregator.clone(), aggregator.get_config());
    (app, aggregator, temp_dir)
}

/// Build a GET request
fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

/// Build a POST request with a JSON body
fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Read a response body as JSON
async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

/// Insert a video row directly, bypassing the fetch pipeline
async fn seed_video(
    aggregator: &VideoAggregator,
    id: &str,
    title: &str,
    channel_id: &str,
    published_at: i64,
    view_count: i64,
) {
    aggregator
        .db
        .upsert_video(&NewVideo {
            video_id: id.to_string(),
            title: title.to_string(),
            video_url: format!("https://www.youtube.com/watch?v={id}"),
            description: String::new(),
            published_at,
            channel_id: channel_id.to_string(),
            channel_title: format!("Channel {channel_id}"),
            thumbnails: None,
            view_count,
            like_count: 0,
            comment_count: 0,
            duration_seconds: 0,
        })
        .await
        .unwrap();
}

#[tokio::test]
async fn test_api_server_spawns() {
    let (aggregator, _temp_dir) = create_test_aggregator().await;

    // Use a random available port for testing
    let mut config = (*aggregator.get_config()).clone();
    config.server.api.bind_address = "127.0.0.1:0".parse().unwrap();
    let config = Arc::new(config);

    let api_handle = tokio::spawn({
        let aggregator = aggregator.clone();
        let config = config.clone();
        async move { start_api_server(aggregator, config).await }
    });

    // Give it a moment to start
    tokio::time::sleep(Duration::from_millis(100)).await;

    api_handle.abort();
}

#[tokio::test]
async fn test_cors_enabled() {
    let (aggregator, _temp_dir) = create_test_aggregator().await;

    let mut config = (*aggregator.get_config()).clone();
    config.server.api.cors_enabled = true;
    config.server.api.cors_origins = vec!["*".to_string()];
    let config = Arc::new(config);

    let app = create_router(aggregator, config);

    let request = Request::builder()
        .uri("/health")
        .header("Origin", "http://localhost:3000")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response.headers().contains_key("access-control-allow-origin"),
        "CORS header should be present when CORS is enabled"
    );
}

#[tokio::test]
async fn test_authentication_with_api_key() {
    let (aggregator, _temp_dir) = create_test_aggregator().await;

    let mut config = (*aggregator.get_config()).clone();
    config.server.api.api_key = Some("test-secret-key".to_string());
    let config = Arc::new(config);

    let app = create_router(aggregator, config);

    // Request without API key should return 401
    let response = app
        .clone()
        .oneshot(get("/health"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Request with valid API key should succeed
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/health")
                .header("X-Api-Key", "test-secret-key")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Request with invalid API key should return 401
    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .header("X-Api-Key", "wrong-key")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_authentication_disabled_by_default() {
    let (app, _aggregator, _temp_dir) = test_app().await;

    let response = app.oneshot(get("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}
