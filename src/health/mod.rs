//! Readiness checks.
//!
//! # Data Flow
//! ```text
//! GET /health/ready
//!     → database ping (SELECT 1)
//!     → redis PING (when configured)
//!     → 200 if the database answers, 503 otherwise
//! ```
//!
//! # Design Decisions
//! - Redis is reported but never fails readiness; the user limiter falls
//!   back to memory and fails open

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::{Deserialize, Serialize};

use crate::http::server::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentStatus {
    Up,
    Down,
    Disabled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Readiness {
    pub status: String,
    pub database: ComponentStatus,
    pub redis: ComponentStatus,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/health/ready", get(readiness))
}

/// Probe every backing service.
pub async fn check(state: &AppState) -> Readiness {
    let database = match state.db.ping().await {
        Ok(()) => ComponentStatus::Up,
        Err(e) => {
            tracing::warn!(error = %e, "Database readiness probe failed");
            ComponentStatus::Down
        }
    };

    let redis = match &state.redis {
        None => ComponentStatus::Disabled,
        Some(cache) => match cache.ping().await {
            Ok(()) => ComponentStatus::Up,
            Err(e) => {
                tracing::warn!(error = %e, "Redis readiness probe failed");
                ComponentStatus::Down
            }
        },
    };

    let status = match (database, redis) {
        (ComponentStatus::Down, _) => "unavailable",
        (_, ComponentStatus::Down) => "degraded",
        _ => "ok",
    };

    Readiness {
        status: status.to_string(),
        database,
        redis,
    }
}

async fn readiness(State(state): State<AppState>) -> (StatusCode, Json<Readiness>) {
    let readiness = check(&state).await;
    let code = if readiness.database == ComponentStatus::Down {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    };
    (code, Json(readiness))
}
