//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with root, health and API routes
//! - Wire up middleware (tracing, request ID, limits, rate limiting, metrics)
//! - Bind server to listener and stop on the shutdown signal

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::{MatchedPath, Request},
    http::{HeaderValue, Method},
    middleware::{self, Next},
    response::Response,
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::Layer;
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    normalize_path::{NormalizePath, NormalizePathLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::api;
use crate::cache::RedisCache;
use crate::config::AppConfig;
use crate::db::Database;
use crate::health;
use crate::http::request::{make_request_span, propagate_request_id_layer, set_request_id_layer};
use crate::observability::metrics;
use crate::security::jwt::{AuthError, TokenService};
use crate::security::rate_limit::{ip_rate_limit_middleware, IpRateLimiter};
use crate::security::user_rate_limit::{build_user_limiter, UserRateLimiter};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: Database,
    pub tokens: Arc<TokenService>,
    pub redis: Option<RedisCache>,
    pub user_limiter: Arc<UserRateLimiter>,
    pub ip_limiter: Option<Arc<IpRateLimiter>>,
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(config: AppConfig, db: Database, redis: Option<RedisCache>) -> Result<Self, AuthError> {
        let tokens = Arc::new(TokenService::from_config(&config.auth)?);
        let user_limiter = Arc::new(build_user_limiter(
            redis.as_ref(),
            config.rate_limit.user_requests_per_minute,
        ));
        let ip_limiter = config
            .rate_limit
            .ip_enabled
            .then(|| Arc::new(IpRateLimiter::from_config(&config.rate_limit)));
        let metrics = if config.observability.metrics_enabled {
            metrics::handle()
        } else {
            None
        };

        Ok(Self {
            config: Arc::new(config),
            db,
            tokens,
            redis,
            user_limiter,
            ip_limiter,
            metrics,
        })
    }
}

/// Build the complete application service.
///
/// Layers added later wrap the earlier ones, so the request passes them
/// bottom to top: trailing-slash normalisation runs first.
#[allow(deprecated)]
pub fn build_app(state: AppState) -> NormalizePath<Router> {
    let config = state.config.clone();

    let root = Router::new()
        .merge(api::root::router())
        .merge(health::router());

    let api_routes = api::router(state.clone());
    let router = match config.api.root_path.trim_end_matches('/') {
        "" => root.merge(api_routes),
        prefix => root.nest(prefix, api_routes),
    };

    let mut router = router.with_state(state.clone());

    if let Some(limiter) = state.ip_limiter.clone() {
        router = router.layer(middleware::from_fn_with_state(limiter, ip_rate_limit_middleware));
    }

    router = router
        .layer(middleware::from_fn(track_metrics))
        .layer(RequestBodyLimitLayer::new(config.security.max_body_size))
        .layer(TimeoutLayer::new(Duration::from_secs(config.server.request_timeout_secs)));

    if let Some(cors) = cors_layer(&config.security.cors_origins) {
        router = router.layer(cors);
    }

    let router = router
        .layer(propagate_request_id_layer())
        .layer(TraceLayer::new_for_http().make_span_with(make_request_span))
        .layer(set_request_id_layer());

    NormalizePathLayer::trim_trailing_slash().layer(router)
}

fn cors_layer(origins: &[String]) -> Option<CorsLayer> {
    if origins.is_empty() {
        return None;
    }

    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers(Any);

    if origins.iter().any(|o| o == "*") {
        return Some(layer.allow_origin(Any));
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    Some(layer.allow_origin(allowed))
}

async fn track_metrics(request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_owned())
        .unwrap_or_else(|| "unmatched".to_owned());

    let response = next.run(request).await;
    metrics::record_request(&method, response.status().as_u16(), &route, start);
    response
}

/// HTTP server for the application.
pub struct HttpServer {
    app: NormalizePath<Router>,
}

impl HttpServer {
    pub fn new(state: AppState) -> Self {
        Self { app: build_app(state) }
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let app = axum::ServiceExt::<Request>::into_make_service_with_connect_info::<SocketAddr>(self.app);

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("HTTP server draining connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cors_disabled_without_origins() {
        assert!(cors_layer(&[]).is_none());
        assert!(cors_layer(&["*".to_string()]).is_some());
        assert!(cors_layer(&["http://localhost:3000".to_string()]).is_some());
    }
}
