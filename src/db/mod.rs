//! Relational storage subsystem.
//!
//! # Data Flow
//! ```text
//! DatabaseConfig
//!     → Database::connect (sqlx AnyPool, Postgres or SQLite)
//!     → init_schema (schema + tables from schema.rs registry)
//!     → repos/* (typed queries per table)
//!     → migrations.rs (versioned SQL, sqlx migrator)
//! ```
//!
//! # Design Decisions
//! - One pool type for every backend; the driver is picked by URL scheme
//! - In-memory SQLite keeps a single connection so all queries see one database
//! - On Postgres every pooled connection pins `search_path` to the configured schema

pub mod migrations;
pub mod models;
pub mod repos;
pub mod schema;
pub mod seed;

use std::str::FromStr;
use std::sync::Once;

use sqlx::any::{AnyConnectOptions, AnyPoolOptions};
use sqlx::{AnyPool, ConnectOptions, Executor};
use thiserror::Error;

use crate::config::DatabaseConfig;
use crate::db::repos::{Actors, Addresses, Movies, Users};
use crate::db::schema::{Dialect, TABLES};

static INSTALL_DRIVERS: Once = Once::new();

/// Errors raised by the storage layer.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// A referenced row does not exist.
    #[error("{entity} not found")]
    NotFound { entity: &'static str },

    /// A uniqueness constraint would be violated.
    #[error("{0}")]
    Conflict(String),

    /// Driver or pool failure.
    #[error("Database error: {0}")]
    Sqlx(#[from] sqlx::Error),
}

impl DatabaseError {
    pub fn not_found(entity: &'static str) -> Self {
        DatabaseError::NotFound { entity }
    }
}

/// Quote an identifier for use in DDL.
fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// Shared handle to the relational database.
#[derive(Clone)]
pub struct Database {
    pool: AnyPool,
    config: DatabaseConfig,
}

impl Database {
    /// Open a pool for the configured URL.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, DatabaseError> {
        INSTALL_DRIVERS.call_once(sqlx::any::install_default_drivers);

        let mut options = AnyConnectOptions::from_str(&config.url)?;
        if !config.debug {
            options = options.disable_statement_logging();
        }

        let mut pool_options = AnyPoolOptions::new().max_connections(config.max_connections);
        if config.is_in_memory() {
            pool_options = pool_options
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
        }

        if let Some(schema) = config.effective_schema() {
            let statement = format!("SET search_path TO {}", quote_ident(schema));
            pool_options = pool_options.after_connect(move |conn, _meta| {
                let statement = statement.clone();
                Box::pin(async move {
                    conn.execute(statement.as_str()).await?;
                    Ok(())
                })
            });
        }

        let pool = pool_options.connect_with(options).await?;

        tracing::info!(
            dialect = config.dialect_name(),
            schema = config.effective_schema().unwrap_or("-"),
            max_connections = config.max_connections,
            "Database pool ready"
        );

        Ok(Self {
            pool,
            config: config.clone(),
        })
    }

    /// Create the schema (where supported) if missing.
    pub async fn ensure_schema(&self) -> Result<(), DatabaseError> {
        if let Some(schema) = self.config.effective_schema() {
            let statement = format!("CREATE SCHEMA IF NOT EXISTS {}", quote_ident(schema));
            self.pool.execute(statement.as_str()).await?;
        }
        Ok(())
    }

    /// Create the schema and every registered table that does not exist yet.
    pub async fn init_schema(&self) -> Result<(), DatabaseError> {
        self.ensure_schema().await?;
        let dialect = self.dialect();
        for table in TABLES {
            let statement = table.create_sql(dialect, true);
            self.pool.execute(statement.as_str()).await?;
        }
        tracing::info!(tables = TABLES.len(), "Database schema initialized");
        Ok(())
    }

    /// Cheap round trip used by readiness probes.
    pub async fn ping(&self) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    pub fn dialect(&self) -> Dialect {
        Dialect::from_url(&self.config.url)
    }

    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    pub fn pool(&self) -> &AnyPool {
        &self.pool
    }

    pub fn actors(&self) -> Actors<'_> {
        Actors::new(&self.pool)
    }

    pub fn movies(&self) -> Movies<'_> {
        Movies::new(&self.pool)
    }

    pub fn addresses(&self) -> Addresses<'_> {
        Addresses::new(&self.pool)
    }

    pub fn users(&self) -> Users<'_> {
        Users::new(&self.pool)
    }

    /// Close every pooled connection.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// Fresh in-memory database with every table created.
    pub async fn memory_db() -> Database {
        let db = Database::connect(&DatabaseConfig::default())
            .await
            .expect("in-memory database");
        db.init_schema().await.expect("schema");
        db
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotes_identifiers() {
        assert_eq!(quote_ident("myapp"), "\"myapp\"");
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
    }

    #[tokio::test]
    async fn in_memory_database_is_shared_across_queries() {
        let db = test_support::memory_db().await;
        db.ping().await.unwrap();
        // Tables created by init_schema are visible to later queries.
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM actor")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(total, 0);
    }

    #[tokio::test]
    async fn init_schema_is_idempotent() {
        let db = test_support::memory_db().await;
        db.init_schema().await.unwrap();
    }
}
