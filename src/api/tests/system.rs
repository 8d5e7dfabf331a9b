use super::*;

#[tokio::test]
async fn test_health_endpoint() {
    let (app, _aggregator, _temp_dir) = test_app().await;

    let response = app.oneshot(get("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_openapi_json_endpoint() {
    let (app, _aggregator, _temp_dir) = test_app().await;

    let response = app.oneshot(get("/openapi.json")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;

    // Required OpenAPI top-level fields
    assert!(json.get("openapi").is_some(), "Should have 'openapi' field");
    assert!(json.get("info").is_some(), "Should have 'info' field");
    assert!(json.get("paths").is_some(), "Should have 'paths' field");

    let openapi_version = json["openapi"].as_str().unwrap();
    assert!(openapi_version.starts_with("3."), "Should be OpenAPI 3.x");
    assert_eq!(json["info"]["title"], "tubefeed REST API");
}

#[tokio::test]
async fn openapi_documents_all_key_endpoints() {
    let (app, _aggregator, _temp_dir) = test_app().await;

    let response = app.oneshot(get("/openapi.json")).await.unwrap();
    let json = body_json(response).await;
    let paths = json["paths"].as_object().unwrap();

    let expected_paths = vec![
        "/videos",
        "/videos/{id}",
        "/videos/stats",
        "/search",
        "/fetch/status",
        "/fetch/run",
        "/keys",
        "/health",
        "/openapi.json",
        "/events",
        "/shutdown",
    ];

    for expected_path in &expected_paths {
        assert!(
            paths.contains_key(*expected_path),
            "OpenAPI spec must contain path: {}",
            expected_path
        );
    }

    // Every documented operation must declare responses
    for (path, path_item) in paths {
        for (method, operation) in path_item.as_object().unwrap() {
            if !["get", "post", "put", "patch", "delete"].contains(&method.as_str()) {
                continue;
            }
            assert!(
                operation.get("responses").is_some(),
                "{} {} must have 'responses' field",
                method.to_uppercase(),
                path
            );
        }
    }
}

#[tokio::test]
async fn openapi_defines_core_schemas_and_security() {
    let (app, _aggregator, _temp_dir) = test_app().await;

    let response = app.oneshot(get("/openapi.json")).await.unwrap();
    let json = body_json(response).await;

    let schemas = json["components"]["schemas"].as_object().unwrap();
    for expected in [
        "FetchRun",
        "FetchStatus",
        "KeyQuotaStatus",
        "VideoSummary",
        "VideoListResponse",
        "SearchRequest",
        "SearchResultsResponse",
        "StatsResponse",
        "ApiError",
        "Config",
    ] {
        assert!(
            schemas.contains_key(expected),
            "OpenAPI spec should contain schema: {}",
            expected
        );
    }

    let security_schemes = json["components"]["securitySchemes"].as_object().unwrap();
    assert!(
        security_schemes.contains_key("api_key"),
        "API key security scheme not defined"
    );
}

#[tokio::test]
async fn test_swagger_ui_enabled() {
    let (aggregator, _temp_dir) = create_test_aggregator().await;

    let mut config = (*aggregator.get_config()).clone();
    config.server.api.swagger_ui = true;
    let config = Arc::new(config);

    let app = create_router(aggregator, config);

    let response = app.oneshot(get("/swagger-ui/")).await.unwrap();

    assert_eq!(
        response.status(),
        StatusCode::OK,
        "Swagger UI should be accessible when enabled"
    );
}

#[tokio::test]
async fn test_swagger_ui_disabled() {
    let (aggregator, _temp_dir) = create_test_aggregator().await;

    let mut config = (*aggregator.get_config()).clone();
    config.server.api.swagger_ui = false;
    let config = Arc::new(config);

    let app = create_router(aggregator, config);

    let response = app.oneshot(get("/swagger-ui/")).await.unwrap();

    assert_eq!(
        response.status(),
        StatusCode::NOT_FOUND,
        "Swagger UI should not be accessible when disabled"
    );
}
