//! Typed queries per table.
//!
//! Repositories borrow the pool from [`Database`](crate::db::Database) and
//! return [`DatabaseError`](crate::db::DatabaseError). Placeholders use the
//! `$N` form, which both supported backends accept.

mod actors;
mod addresses;
mod movies;
mod users;

pub use actors::Actors;
pub use addresses::Addresses;
pub use movies::Movies;
pub use users::Users;

use sqlx::AnyPool;

use crate::db::DatabaseError;

async fn count(pool: &AnyPool, table: &str) -> Result<i64, DatabaseError> {
    let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
        .fetch_one(pool)
        .await?;
    Ok(total)
}

async fn exists(pool: &AnyPool, table: &str, id: i64) -> Result<bool, DatabaseError> {
    let found: Option<i64> = sqlx::query_scalar(&format!("SELECT id FROM {} WHERE id = $1", table))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(found.is_some())
}
