//! Prometheus exposition. Kept in its own binary because the recorder is
//! process global.

mod common;

use axum::http::StatusCode;
use serde_json::json;

use axum_base::observability::metrics;
use common::{test_config, TestApp, API};

#[tokio::test]
async fn metrics_endpoint_renders_counters() {
    assert!(metrics::init_metrics().is_some());

    let mut config = test_config();
    config.observability.metrics_enabled = true;
    let app = TestApp::with_config(config).await;

    app.get("/healthchecker").await;
    app.post_json(&format!("{API}/actors"), json!({"name": "Brad Pitt", "age": 60}))
        .await;
    app.post_json(&format!("{API}/movies"), json!({"title": "Se7en"}))
        .await;

    let response = app.get("/metrics").await;
    assert_eq!(response.status, StatusCode::OK);

    let body = response.body.as_str().unwrap();
    assert!(body.contains("http_requests_total"));
    assert!(body.contains("route=\"/healthchecker\""));
    assert!(body.contains("route=\"/api/v1/actors\""));
    assert!(body.contains("actor_creation_counter"));
    assert!(body.contains("movie_creation_counter"));
}
