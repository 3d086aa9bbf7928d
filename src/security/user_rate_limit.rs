//! Per-user fixed-window rate limiting.
//!
//! Users are identified by a request header (default `x-user`). Each user gets
//! one counter per clock minute under the key
//! `rate_limit_<sha256(user)>_<YYYY-MM-DDTHH:MM>`; the counter expires one
//! minute after its first hit.
//!
//! # Design Decisions
//! - Backends sit behind one async trait (Redis or in-process `DashMap`)
//! - Backend failures let the request through and log a warning
//! - Requests without the header are not limited

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    extract::State,
    http::{HeaderValue, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Duration, Timelike, Utc};
use dashmap::DashMap;
use sha2::{Digest, Sha256};

use crate::cache::{CacheError, RedisCache};
use crate::http::response::AppError;
use crate::http::server::AppState;
use crate::observability::metrics;

/// Entries kept by the memory backend before expired windows are swept.
const SWEEP_THRESHOLD: usize = 10_000;

/// Storage for per-window counters.
#[async_trait]
pub trait RateLimitStore: Send + Sync {
    /// Count one hit on `key` and return the updated count.
    async fn hit(&self, key: &str, now: DateTime<Utc>) -> Result<u64, CacheError>;

    /// Backend name for logs.
    fn name(&self) -> &'static str;
}

/// Counters kept in Redis (`INCR` + `EXPIREAT`).
pub struct RedisStore {
    cache: RedisCache,
}

impl RedisStore {
    pub fn new(cache: RedisCache) -> Self {
        Self { cache }
    }
}

#[async_trait]
impl RateLimitStore for RedisStore {
    async fn hit(&self, key: &str, now: DateTime<Utc>) -> Result<u64, CacheError> {
        let expire_at = (now + Duration::minutes(1)).timestamp();
        self.cache.incr_expiring(key, expire_at).await
    }

    fn name(&self) -> &'static str {
        "redis"
    }
}

/// Counters kept in process memory.
#[derive(Default)]
pub struct MemoryStore {
    counters: DashMap<String, (u64, DateTime<Utc>)>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.counters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counters.is_empty()
    }
}

#[async_trait]
impl RateLimitStore for MemoryStore {
    async fn hit(&self, key: &str, now: DateTime<Utc>) -> Result<u64, CacheError> {
        if self.counters.len() > SWEEP_THRESHOLD {
            self.counters.retain(|_, (_, expires)| *expires > now);
        }

        let mut entry = self
            .counters
            .entry(key.to_string())
            .or_insert((0, now + Duration::minutes(1)));
        if entry.1 <= now {
            *entry = (0, now + Duration::minutes(1));
        }
        entry.0 += 1;
        Ok(entry.0)
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

/// Counter key for `user` in the minute containing `now`.
pub fn rate_limit_key(user: &str, now: DateTime<Utc>) -> String {
    let digest = Sha256::digest(user.as_bytes());
    let hex: String = digest.iter().map(|b| format!("{:02x}", b)).collect();
    format!("rate_limit_{}_{}", hex, now.format("%Y-%m-%dT%H:%M"))
}

/// Outcome of a limiter check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allowed { count: u64 },
    Limited { retry_after: u32, limit: u32 },
}

/// Per-user limiter bound to a store.
pub struct UserRateLimiter {
    store: Arc<dyn RateLimitStore>,
    limit: u32,
}

impl UserRateLimiter {
    pub fn new(store: Arc<dyn RateLimitStore>, limit: u32) -> Self {
        Self { store, limit }
    }

    /// Limiter backed by process memory.
    pub fn in_memory(limit: u32) -> Self {
        Self::new(Arc::new(MemoryStore::new()), limit)
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn backend(&self) -> &'static str {
        self.store.name()
    }

    /// Count a request from `user` at `now`.
    pub async fn check(&self, user: &str, now: DateTime<Utc>) -> Result<Decision, CacheError> {
        let key = rate_limit_key(user, now);
        let count = self.store.hit(&key, now).await?;
        tracing::debug!(user = %user, count, backend = self.backend(), "User rate limit hit");

        if count > u64::from(self.limit) {
            Ok(Decision::Limited {
                retry_after: 60 - now.second(),
                limit: self.limit,
            })
        } else {
            Ok(Decision::Allowed { count })
        }
    }
}

/// Limiter using Redis when available, process memory otherwise.
pub fn build_user_limiter(redis: Option<&RedisCache>, limit: u32) -> UserRateLimiter {
    match redis {
        Some(cache) => UserRateLimiter::new(Arc::new(RedisStore::new(cache.clone())), limit),
        None => {
            tracing::warn!("Redis not configured, user rate limits are kept in memory");
            UserRateLimiter::in_memory(limit)
        }
    }
}

/// Middleware enforcing the per-user limit on API routes.
pub async fn user_rate_limit_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let header = &state.config.rate_limit.user_header;
    let user = request
        .headers()
        .get(header.as_str())
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);

    let Some(user) = user else {
        return next.run(request).await;
    };

    match state.user_limiter.check(&user, Utc::now()).await {
        Ok(Decision::Allowed { .. }) => next.run(request).await,
        Ok(Decision::Limited { retry_after, limit }) => {
            tracing::warn!(user = %user, limit, "User rate limit exceeded");
            metrics::record_rate_limited("user_limit");

            let mut response = AppError::RateLimited("User Rate Limit Exceeded".into()).into_response();
            let headers = response.headers_mut();
            headers.insert("retry-after", HeaderValue::from(retry_after));
            headers.insert("x-rate-limit", HeaderValue::from(limit));
            response
        }
        Err(e) => {
            tracing::warn!(error = %e, "Rate limit backend failed, allowing request");
            next.run(request).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 17, h, m, s).unwrap()
    }

    #[test]
    fn key_hashes_user_and_truncates_to_minute() {
        let key = rate_limit_key("alice", at(10, 30, 45));
        assert_eq!(
            key,
            "rate_limit_2bd806c97f0e00af1a1fc3328fa763a9269723c8db8fac4f93af71db186d6e90_2024-05-17T10:30"
        );
        assert_eq!(key, rate_limit_key("alice", at(10, 30, 0)));
        assert_ne!(key, rate_limit_key("alice", at(10, 31, 0)));
    }

    #[tokio::test]
    async fn limits_after_threshold_within_a_minute() {
        let limiter = UserRateLimiter::in_memory(2);
        let now = at(12, 0, 20);

        assert_eq!(limiter.check("bob", now).await.unwrap(), Decision::Allowed { count: 1 });
        assert_eq!(limiter.check("bob", now).await.unwrap(), Decision::Allowed { count: 2 });
        assert_eq!(
            limiter.check("bob", now).await.unwrap(),
            Decision::Limited {
                retry_after: 40,
                limit: 2
            }
        );
        // Other users and the next minute start fresh.
        assert_eq!(limiter.check("carol", now).await.unwrap(), Decision::Allowed { count: 1 });
        assert_eq!(
            limiter.check("bob", at(12, 1, 0)).await.unwrap(),
            Decision::Allowed { count: 1 }
        );
    }

    #[tokio::test]
    async fn memory_store_resets_expired_entries() {
        let store = MemoryStore::new();
        assert_eq!(store.hit("k", at(8, 0, 0)).await.unwrap(), 1);
        assert_eq!(store.hit("k", at(8, 0, 59)).await.unwrap(), 2);
        assert_eq!(store.hit("k", at(8, 1, 0)).await.unwrap(), 1);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn falls_back_to_memory_without_redis() {
        let limiter = build_user_limiter(None, 5);
        assert_eq!(limiter.backend(), "memory");
        assert_eq!(limiter.limit(), 5);
    }
}
