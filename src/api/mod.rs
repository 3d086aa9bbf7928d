//! Public HTTP API.
//!
//! # Data Flow
//! ```text
//! {root_path}/...
//!     → user_rate_limit middleware (x-user header)
//!     → resource handlers (actors, addresses, movies, users, auth)
//!     → db repositories
//!     → schemas.rs response bodies
//! ```
//!
//! Root routes (`/healthchecker`, `/items/{id}`, `/metrics`) live in
//! [`root`] and are not rate limited per user.

pub mod actors;
pub mod addresses;
pub mod auth;
pub mod movies;
pub mod root;
pub mod schemas;
pub mod users;

use axum::{middleware, Router};

use crate::http::server::AppState;
use crate::security::user_rate_limit::user_rate_limit_middleware;

/// Resource routes, relative to the API root path.
pub fn router(state: AppState) -> Router<AppState> {
    let router = Router::new()
        .merge(actors::router())
        .merge(addresses::router())
        .merge(movies::router())
        .merge(users::router())
        .merge(auth::router());

    if state.config.rate_limit.user_enabled {
        router.layer(middleware::from_fn_with_state(state, user_rate_limit_middleware))
    } else {
        router
    }
}
