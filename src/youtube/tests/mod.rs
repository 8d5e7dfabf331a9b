use super::*;
use crate::db::Database;
use serde_json::json;
use tempfile::NamedTempFile;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn setup_client(
    base_url: &str,
    keys: &[&str],
    quota_limit: i64,
) -> (YouTubeClient, Arc<KeyPool>, Arc<Database>, NamedTempFile) {
    let temp_file = NamedTempFile::new().unwrap();
    let db = Arc::new(Database::new(temp_file.path()).await.unwrap());
    let key_pool = Arc::new(KeyPool::new(
        db.clone(),
        keys.iter().map(|k| k.to_string()).collect(),
        quota_limit,
    ));

    let mut config = Config::default();
    config.youtube.api_keys = keys.iter().map(|k| k.to_string()).collect();
    config.youtube.api_base_url = base_url.to_string();
    config.youtube.quota_limit = quota_limit;

    let client = YouTubeClient::new(&config, key_pool.clone()).unwrap();
    (client, key_pool, db, temp_file)
}

fn search_body() -> serde_json::Value {
    json!({
        "items": [
            {
                "id": { "kind": "youtube#video", "videoId": "vid-1" },
                "snippet": {
                    "title": "First Video",
                    "description": "a description",
                    "publishedAt": "2024-05-01T12:00:00Z",
                    "channelId": "UC-1",
                    "channelTitle": "Channel One",
                    "thumbnails": {
                        "default": { "url": "https://i.ytimg.com/1.jpg", "width": 120, "height": 90 }
                    }
                }
            },
            {
                // Non-video result: no videoId
                "id": { "kind": "youtube#channel" },
                "snippet": { "title": "A channel" }
            }
        ]
    })
}

fn quota_error_body() -> serde_json::Value {
    json!({
        "error": {
            "code": 403,
            "message": "The request cannot be completed because you have exceeded your quota.",
            "errors": [
                { "domain": "youtube.quota", "reason": "quotaExceeded", "message": "quota" }
            ]
        }
    })
}

#[tokio::test]
async fn search_success_returns_items_and_records_usage() {
    let server = MockServer::start().await;
    let (client, _pool, db, _temp) = setup_client(&server.uri(), &["key-1"], 10_000).await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("part", "snippet"))
        .and(query_param("type", "video"))
        .and(query_param("order", "date"))
        .and(query_param("maxResults", "50"))
        .and(query_param("q", "official music video"))
        .and(query_param("key", "key-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_body()))
        .expect(1)
        .mount(&server)
        .await;

    let items = client.search("official music video", None).await.unwrap();

    assert_eq!(items.len(), 2);
    assert_eq!(items[0].id.video_id.as_deref(), Some("vid-1"));
    assert_eq!(items[0].snippet.title, "First Video");
    assert!(items[1].id.video_id.is_none(), "channel result has no videoId");

    // Search consumed exactly one search-cost unit
    let row = db.find_api_key("key-1").await.unwrap().unwrap();
    assert_eq!(row.quota_used, 100);
}

#[tokio::test]
async fn search_honors_explicit_published_after() {
    let server = MockServer::start().await;
    let (client, _pool, _db, _temp) = setup_client(&server.uri(), &["key-1"], 10_000).await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("publishedAfter", "2024-01-01T00:00:00Z"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "items": [] })))
        .expect(1)
        .mount(&server)
        .await;

    let after = chrono::DateTime::parse_from_rfc3339("2024-01-01T00:00:00Z")
        .unwrap()
        .with_timezone(&Utc);
    let items = client.search("anything", Some(after)).await.unwrap();

    assert!(items.is_empty(), "empty result list is a success, not an error");
}

#[tokio::test]
async fn search_rotates_to_next_key_on_quota_exceeded() {
    let server = MockServer::start().await;
    let (client, _pool, db, _temp) = setup_client(&server.uri(), &["key-1", "key-2"], 10_000).await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("key", "key-1"))
        .respond_with(ResponseTemplate::new(403).set_body_json(quota_error_body()))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("key", "key-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_body()))
        .expect(1)
        .mount(&server)
        .await;

    let items = client.search("query", None).await.unwrap();
    assert_eq!(items.len(), 2);

    // The rejected key is pinned to its limit; the succeeding key is billed
    let first = db.find_api_key("key-1").await.unwrap().unwrap();
    assert!(first.is_exhausted());
    let second = db.find_api_key("key-2").await.unwrap().unwrap();
    assert_eq!(second.quota_used, 100);
}

#[tokio::test]
async fn search_fails_when_every_key_is_rejected() {
    let server = MockServer::start().await;
    let (client, _pool, _db, _temp) = setup_client(&server.uri(), &["key-1", "key-2"], 10_000).await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(403).set_body_json(quota_error_body()))
        .expect(2)
        .mount(&server)
        .await;

    match client.search("query", None).await {
        Err(Error::AllKeysExhausted { attempts }) => assert_eq!(attempts, 2),
        other => panic!("expected AllKeysExhausted, got {other:?}"),
    }
}

#[tokio::test]
async fn search_non_quota_error_propagates_without_rotation() {
    let server = MockServer::start().await;
    let (client, key_pool, db, _temp) = setup_client(&server.uri(), &["key-1", "key-2"], 10_000).await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {
                "code": 400,
                "message": "Invalid value for parameter q",
                "errors": [ { "reason": "invalidParameter" } ]
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    match client.search("query", None).await {
        Err(Error::YouTubeApi { status, reason, .. }) => {
            assert_eq!(status, 400);
            assert_eq!(reason.as_deref(), Some("invalidParameter"));
        }
        other => panic!("expected YouTubeApi error, got {other:?}"),
    }

    // The rotation cursor must not have advanced and nothing was billed
    assert_eq!(key_pool.acquire().await.unwrap(), "key-1");
    let row = db.find_api_key("key-1").await.unwrap().unwrap();
    assert_eq!(row.quota_used, 0);
}

#[tokio::test]
async fn second_search_on_single_exhausted_key_fails() {
    let server = MockServer::start().await;
    // Pool of one key whose limit equals one search
    let (client, _pool, db, _temp) = setup_client(&server.uri(), &["k1"], 100).await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "items": [] })))
        .expect(1)
        .mount(&server)
        .await;

    client.search("official music video", None).await.unwrap();
    let row = db.find_api_key("k1").await.unwrap().unwrap();
    assert_eq!(row.quota_used, 100);

    // Pool size 1, already exhausted: acquisition fails before any HTTP call
    match client.search("official music video", None).await {
        Err(Error::AllKeysExhausted { attempts }) => assert_eq!(attempts, 1),
        other => panic!("expected AllKeysExhausted, got {other:?}"),
    }
}

#[tokio::test]
async fn details_with_empty_ids_issues_no_call() {
    let server = MockServer::start().await;
    let (client, _pool, db, _temp) = setup_client(&server.uri(), &["key-1"], 10_000).await;

    // No mocks mounted: any HTTP call would 404 and fail the test below
    let items = client.video_details(&[]).await.unwrap();

    assert!(items.is_empty());
    // Not even a key acquisition happened
    assert!(db.find_api_key("key-1").await.unwrap().is_none());
}

#[tokio::test]
async fn details_success_parses_statistics_and_records_usage() {
    let server = MockServer::start().await;
    let (client, _pool, db, _temp) = setup_client(&server.uri(), &["key-1"], 10_000).await;

    Mock::given(method("GET"))
        .and(path("/videos"))
        .and(query_param("part", "snippet,statistics"))
        .and(query_param("id", "vid-1,vid-2"))
        .and(query_param("key", "key-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                {
                    "id": "vid-1",
                    "snippet": {
                        "title": "First Video",
                        "publishedAt": "2024-05-01T12:00:00Z",
                        "channelId": "UC-1",
                        "channelTitle": "Channel One"
                    },
                    "statistics": { "viewCount": "12345", "likeCount": "678" }
                },
                {
                    "id": "vid-2",
                    "snippet": { "title": "No Stats" }
                }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let ids = vec!["vid-1".to_string(), "vid-2".to_string()];
    let items = client.video_details(&ids).await.unwrap();

    assert_eq!(items.len(), 2);
    let stats = items[0].statistics.as_ref().unwrap();
    assert_eq!(stats.view_count.as_deref(), Some("12345"));
    assert_eq!(stats.like_count.as_deref(), Some("678"));
    assert!(items[1].statistics.is_none());

    // The detail batch costs a single unit
    let row = db.find_api_key("key-1").await.unwrap().unwrap();
    assert_eq!(row.quota_used, 1);
}

#[tokio::test]
async fn details_quota_exceeded_propagates_without_rotation() {
    let server = MockServer::start().await;
    let (client, key_pool, _db, _temp) = setup_client(&server.uri(), &["key-1", "key-2"], 10_000).await;

    Mock::given(method("GET"))
        .and(path("/videos"))
        .respond_with(ResponseTemplate::new(403).set_body_json(quota_error_body()))
        .expect(1)
        .mount(&server)
        .await;

    let ids = vec!["vid-1".to_string()];
    match client.video_details(&ids).await {
        Err(Error::QuotaExceeded { key_hint }) => assert_eq!(key_hint, "ey-1"),
        other => panic!("expected QuotaExceeded, got {other:?}"),
    }

    // Detail calls never rotate: the cursor still points at the first key
    assert_eq!(key_pool.acquire().await.unwrap(), "key-1");
}

#[tokio::test]
async fn client_requires_at_least_one_key() {
    let temp_file = NamedTempFile::new().unwrap();
    let db = Arc::new(Database::new(temp_file.path()).await.unwrap());
    let key_pool = Arc::new(KeyPool::new(db, vec![], 100));

    let config = Config::default();
    let result = YouTubeClient::new(&config, key_pool);

    match result {
        Err(Error::Config { key, .. }) => assert_eq!(key.as_deref(), Some("api_keys")),
        other => panic!("expected Config error, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn search_response_tolerates_missing_fields() {
    let body = r#"{"items":[{"id":{},"snippet":{"title":"t"}},{}]}"#;
    let parsed: SearchResponse = serde_json::from_str(body).unwrap();

    assert_eq!(parsed.items.len(), 2);
    assert!(parsed.items[0].id.video_id.is_none());
    assert_eq!(parsed.items[0].snippet.title, "t");
    assert!(parsed.items[1].snippet.published_at.is_none());
}

#[test]
fn error_body_detects_quota_reason() {
    let body = r#"{"error":{"code":403,"message":"quota","errors":[{"reason":"quotaExceeded"}]}}"#;
    let (quota, reason, message) = parse_error_body(403, body);

    assert!(quota);
    assert_eq!(reason.as_deref(), Some("quotaExceeded"));
    assert_eq!(message, "quota");
}

#[test]
fn error_body_non_quota_reason_is_not_quota() {
    let body = r#"{"error":{"code":400,"message":"bad","errors":[{"reason":"invalidParameter"}]}}"#;
    let (quota, reason, _message) = parse_error_body(400, body);

    assert!(!quota);
    assert_eq!(reason.as_deref(), Some("invalidParameter"));
}

#[test]
fn unparseable_error_body_falls_back_to_status() {
    let (quota, reason, message) = parse_error_body(500, "<html>oops</html>");

    assert!(!quota);
    assert!(reason.is_none());
    assert_eq!(message, "upstream returned HTTP 500");
}
