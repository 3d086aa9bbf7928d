//! Per-IP rate limiting with token buckets.
//!
//! Each client IP owns a bucket holding `ip_requests` tokens that refills
//! over `ip_window_secs`. Disabled unless `rate_limit.ip_enabled` is set.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use dashmap::DashMap;

use crate::config::RateLimitConfig;
use crate::http::response::AppError;
use crate::observability::metrics;

/// Bucket count above which idle buckets are dropped.
const SWEEP_THRESHOLD: usize = 10_000;

/// A simple token bucket rate limiter.
struct TokenBucket {
    tokens: f64,
    last_update: Instant,
}

impl TokenBucket {
    fn new(capacity: f64, now: Instant) -> Self {
        Self {
            tokens: capacity,
            last_update: now,
        }
    }

    fn try_acquire(&mut self, capacity: f64, refill_rate: f64, now: Instant) -> bool {
        let elapsed = now.saturating_duration_since(self.last_update).as_secs_f64();

        // Refill tokens
        self.tokens = (self.tokens + elapsed * refill_rate).min(capacity);
        self.last_update = now;

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

/// State for the per-IP limiter.
pub struct IpRateLimiter {
    buckets: DashMap<String, TokenBucket>,
    sweep_threshold: usize,
    capacity: f64,
    refill_rate: f64,
    requests: u32,
    window_secs: u64,
}

impl IpRateLimiter {
    pub fn new(requests: u32, window_secs: u64) -> Self {
        let capacity = f64::from(requests.max(1));
        Self {
            buckets: DashMap::new(),
            sweep_threshold: SWEEP_THRESHOLD,
            capacity,
            refill_rate: capacity / window_secs.max(1) as f64,
            requests,
            window_secs,
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(config.ip_requests, config.ip_window_secs)
    }

    /// Take one token for `key`, returning false when the bucket is empty.
    pub fn check(&self, key: &str) -> bool {
        self.check_at(key, Instant::now())
    }

    fn check_at(&self, key: &str, now: Instant) -> bool {
        if self.buckets.len() > self.sweep_threshold {
            self.sweep(now);
        }

        let mut bucket = self
            .buckets
            .entry(key.to_string())
            .or_insert_with(|| TokenBucket::new(self.capacity, now));

        bucket.try_acquire(self.capacity, self.refill_rate, now)
    }

    /// Drop buckets untouched for a full window. They would be full again,
    /// which is what a fresh bucket holds.
    fn sweep(&self, now: Instant) {
        let window = Duration::from_secs(self.window_secs.max(1));
        self.buckets
            .retain(|_, bucket| now.saturating_duration_since(bucket.last_update) < window);
    }

    /// Number of tracked clients.
    pub fn tracked_clients(&self) -> usize {
        self.buckets.len()
    }

    fn describe(&self) -> String {
        format!(
            "Rate limit exceeded: {} per {} second{}",
            self.requests,
            self.window_secs,
            if self.window_secs == 1 { "" } else { "s" }
        )
    }
}

/// Middleware rejecting clients that exhaust their bucket.
pub async fn ip_rate_limit_middleware(
    State(limiter): State<Arc<IpRateLimiter>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let key = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string());

    if limiter.check(&key) {
        next.run(request).await
    } else {
        tracing::warn!(client = %key, "Rate limit exceeded");
        metrics::record_rate_limited("ip_limit");
        AppError::RateLimited(limiter.describe()).into_response()
    }
}
