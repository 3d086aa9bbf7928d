mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::{test_config, TestApp, API};

#[tokio::test]
async fn healthchecker_is_live() {
    let app = TestApp::new().await;

    let response = app.get("/healthchecker").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, json!({"message": "The API is LIVE!!"}));
}

#[tokio::test]
async fn items_echo_path_and_query() {
    let app = TestApp::new().await;

    let response = app.get("/items/5?q=somequery").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, json!({"item_id": 5, "q": "somequery"}));

    let without_query = app.get("/items/7").await;
    assert_eq!(without_query.body, json!({"item_id": 7, "q": null}));

    let invalid = app.get("/items/seven").await;
    assert_eq!(invalid.status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn readiness_reports_components() {
    let app = TestApp::new().await;

    let response = app.get("/health/ready").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "ok");
    assert_eq!(response.body["database"], "up");
    assert_eq!(response.body["redis"], "disabled");
}

#[tokio::test]
async fn readiness_fails_when_database_is_closed() {
    let app = TestApp::new().await;
    app.state.db.close().await;

    let response = app.get("/health/ready").await;
    assert_eq!(response.status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(response.body["database"], "down");
}

#[tokio::test]
async fn metrics_disabled_returns_not_found() {
    let app = TestApp::new().await;

    let response = app.get("/metrics").await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn request_id_is_generated_and_echoed() {
    let app = TestApp::new().await;

    let generated = app.get("/healthchecker").await;
    let id = generated.headers["x-request-id"].to_str().unwrap();
    assert_eq!(id.len(), 36);

    let echoed = app.get_with("/healthchecker", "x-request-id", "abc-123").await;
    assert_eq!(echoed.headers["x-request-id"], "abc-123");
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let app = TestApp::new().await;

    let response = app.get(&format!("{API}/nothing-here")).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn custom_root_path_mounts_api() {
    let mut config = test_config();
    config.api.root_path = "/v2/".to_string();
    let app = TestApp::with_config(config).await;

    assert_eq!(app.get("/v2/actors").await.status, StatusCode::OK);
    assert_eq!(app.get(&format!("{API}/actors")).await.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn empty_root_path_serves_api_at_root() {
    let mut config = test_config();
    config.api.root_path = "/".to_string();
    let app = TestApp::with_config(config).await;

    assert_eq!(app.get("/actors").await.status, StatusCode::OK);
}
