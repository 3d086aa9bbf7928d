mod common;

use axum::http::StatusCode;

use common::{test_config, TestApp, API};

async fn app_with_user_limit(limit: u32) -> TestApp {
    let mut config = test_config();
    config.rate_limit.user_requests_per_minute = limit;
    TestApp::with_config(config).await
}

#[tokio::test]
async fn user_limit_rejects_after_threshold() {
    let app = app_with_user_limit(2).await;
    let uri = format!("{API}/actors");

    for _ in 0..2 {
        let response = app.get_with(&uri, "x-user", "alice").await;
        assert_eq!(response.status, StatusCode::OK);
    }

    let limited = app.get_with(&uri, "x-user", "alice").await;
    assert_eq!(limited.status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(limited.body["detail"], "User Rate Limit Exceeded");
    assert_eq!(limited.headers["x-rate-limit"], "2");

    let retry_after: u64 = limited.headers["retry-after"]
        .to_str()
        .unwrap()
        .parse()
        .unwrap();
    assert!((1..=60).contains(&retry_after));
}

#[tokio::test]
async fn users_are_limited_independently() {
    let app = app_with_user_limit(1).await;
    let uri = format!("{API}/actors");

    assert_eq!(app.get_with(&uri, "x-user", "alice").await.status, StatusCode::OK);
    assert_eq!(app.get_with(&uri, "x-user", "bob").await.status, StatusCode::OK);
    assert_eq!(
        app.get_with(&uri, "x-user", "alice").await.status,
        StatusCode::TOO_MANY_REQUESTS
    );
}

#[tokio::test]
async fn requests_without_user_header_pass() {
    let app = app_with_user_limit(1).await;

    for _ in 0..5 {
        assert_eq!(app.get(&format!("{API}/actors")).await.status, StatusCode::OK);
    }
}

#[tokio::test]
async fn root_routes_are_not_user_limited() {
    let app = app_with_user_limit(1).await;

    for _ in 0..3 {
        let response = app.get_with("/healthchecker", "x-user", "alice").await;
        assert_eq!(response.status, StatusCode::OK);
    }
}

#[tokio::test]
async fn user_limit_can_be_disabled() {
    let mut config = test_config();
    config.rate_limit.user_enabled = false;
    config.rate_limit.user_requests_per_minute = 1;
    let app = TestApp::with_config(config).await;

    for _ in 0..3 {
        let response = app.get_with(&format!("{API}/actors"), "x-user", "alice").await;
        assert_eq!(response.status, StatusCode::OK);
    }
}

#[tokio::test]
async fn ip_limit_uses_token_bucket() {
    let mut config = test_config();
    config.rate_limit.ip_enabled = true;
    let app = TestApp::with_config(config).await;

    assert_eq!(app.get("/healthchecker").await.status, StatusCode::OK);
    assert_eq!(app.get("/healthchecker").await.status, StatusCode::OK);

    let limited = app.get("/healthchecker").await;
    assert_eq!(limited.status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(limited.body["detail"], "Rate limit exceeded: 2 per 5 seconds");
}
