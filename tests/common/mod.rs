//! Shared utilities for integration tests.
//!
//! Every [`TestApp`] owns a private in-memory SQLite database, so tests can
//! run in parallel without external services.

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;
use tower_http::normalize_path::NormalizePath;

use axum_base::config::AppConfig;
use axum_base::db::models::NewUser;
use axum_base::db::Database;
use axum_base::http::{build_app, AppState};
use axum_base::security::hash_password;

pub const API: &str = "/api/v1";

/// Configuration with exporters and the global metrics recorder disabled.
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.telemetry.enabled = false;
    config.observability.metrics_enabled = false;
    config.auth.secret_key = "integration-test-secret".to_string();
    config
}

/// Response status, headers and JSON body (`Null` when empty).
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

pub struct TestApp {
    pub app: NormalizePath<Router>,
    pub state: AppState,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_config(test_config()).await
    }

    pub async fn with_config(config: AppConfig) -> Self {
        let db = Database::connect(&config.database).await.unwrap();
        db.init_schema().await.unwrap();
        let state = AppState::new(config, db, None).unwrap();
        Self {
            app: build_app(state.clone()),
            state,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        self.send(Request::get(uri).body(Body::empty()).unwrap()).await
    }

    pub async fn get_with(&self, uri: &str, name: &str, value: &str) -> TestResponse {
        self.send(
            Request::get(uri)
                .header(name, value)
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    pub async fn post_json(&self, uri: &str, body: Value) -> TestResponse {
        self.json(Method::POST, uri, body).await
    }

    pub async fn json(&self, method: Method, uri: &str, body: Value) -> TestResponse {
        self.send(
            Request::builder()
                .method(method)
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    pub async fn put(&self, uri: &str) -> TestResponse {
        self.send(
            Request::builder()
                .method(Method::PUT)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    pub async fn post_form(&self, uri: &str, form: &str) -> TestResponse {
        self.send(
            Request::post(uri)
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(form.to_string()))
                .unwrap(),
        )
        .await
    }

    pub async fn create_actor(&self, name: &str, age: i64) -> i64 {
        let response = self
            .post_json(
                &format!("{API}/actors"),
                serde_json::json!({ "name": name, "age": age }),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED);
        response.body["id"].as_i64().unwrap()
    }

    /// Insert a user directly, bypassing the registration endpoint.
    pub async fn insert_user(&self, username: &str, password: &str, disabled: bool) {
        self.state
            .db
            .users()
            .create(&NewUser {
                name: format!("{username} name"),
                username: username.to_string(),
                email: format!("{username}@example.com"),
                password_hash: hash_password(password).unwrap(),
                disabled,
            })
            .await
            .unwrap();
    }

    pub async fn login(&self, username: &str, password: &str) -> TestResponse {
        self.post_form(
            &format!("{API}/auth/token"),
            &format!("username={username}&password={password}"),
        )
        .await
    }

    pub async fn token_for(&self, username: &str, password: &str) -> String {
        let response = self.login(username, password).await;
        assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
        response.body["access_token"].as_str().unwrap().to_string()
    }
}
