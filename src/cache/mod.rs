//! Redis connection.
//!
//! # Responsibilities
//! - Open a reconnecting connection manager for the configured URL
//! - Readiness probe (`PING`)
//! - Expiring counters for the user rate limiter
//!
//! # Design Decisions
//! - The connect attempt is bounded so an unreachable Redis never blocks startup

use std::time::Duration;

use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use thiserror::Error;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Timed out connecting to Redis after {0:?}")]
    Timeout(Duration),
}

/// Shared Redis handle; clones share the underlying connection.
#[derive(Clone)]
pub struct RedisCache {
    manager: ConnectionManager,
}

impl RedisCache {
    /// Connect to `url` (e.g. `redis://localhost:6379`).
    pub async fn connect(url: &str) -> Result<Self, CacheError> {
        let client = redis::Client::open(url)?;
        let manager = tokio::time::timeout(CONNECT_TIMEOUT, ConnectionManager::new(client))
            .await
            .map_err(|_| CacheError::Timeout(CONNECT_TIMEOUT))??;

        tracing::info!("Redis connection ready");
        Ok(Self { manager })
    }

    pub async fn ping(&self) -> Result<(), CacheError> {
        let mut conn = self.manager.clone();
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }

    /// Increment `key`, setting its expiry to `expire_at` (unix seconds) on the first hit.
    pub async fn incr_expiring(&self, key: &str, expire_at: i64) -> Result<u64, CacheError> {
        let mut conn = self.manager.clone();
        let count: u64 = conn.incr(key, 1u64).await?;
        if count == 1 {
            let _: () = conn.expire_at(key, expire_at).await?;
        }
        Ok(count)
    }
}
