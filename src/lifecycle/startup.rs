//! Startup orchestration.
//!
//! # Responsibilities
//! - Initialize telemetry, logging and metrics from the loaded configuration
//! - Connect the database (creating the schema when configured) and Redis
//! - Bind the listener and hand everything to the HTTP server
//!
//! # Design Decisions
//! - Fail fast on database and listener errors
//! - Telemetry and Redis are optional: failures are logged and the service
//!   starts without them
//! - Listener binds last (traffic only when ready)

use std::net::SocketAddr;

use tokio::net::TcpListener;

use crate::cache::RedisCache;
use crate::config::{AppConfig, RedisConfig};
use crate::db::{Database, DatabaseError};
use crate::http::server::{AppState, HttpServer};
use crate::lifecycle::shutdown::Shutdown;
use crate::observability::{init_logging, metrics, LogGuard, Telemetry};
use crate::security::jwt::AuthError;

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("database: {0}")]
    Database(#[from] DatabaseError),

    #[error("auth: {0}")]
    Auth(#[from] AuthError),

    #[error("listener: {0}")]
    Io(#[from] std::io::Error),
}

/// A fully initialized service, bound but not yet serving.
pub struct Application {
    state: AppState,
    listener: TcpListener,
    telemetry: Option<Telemetry>,
    _log_guard: LogGuard,
}

impl Application {
    pub async fn build(config: AppConfig) -> Result<Self, StartupError> {
        let (telemetry, telemetry_error) = match Telemetry::init(&config.telemetry) {
            Ok(telemetry) => (telemetry, None),
            Err(e) => (None, Some(e)),
        };
        let log_guard = init_logging(&config.observability, telemetry.as_ref());
        if let Some(e) = telemetry_error {
            tracing::error!(error = %e, "Telemetry export disabled");
        }

        tracing::info!(
            version = env!("CARGO_PKG_VERSION"),
            database = config.database.dialect_name(),
            root_path = %config.api.root_path,
            "axum-base starting"
        );

        if config.auth.uses_placeholder_secret() {
            tracing::warn!("auth.secret_key is the built-in placeholder; set APP_SECRET_KEY");
        }

        if config.observability.metrics_enabled {
            metrics::init_metrics();
        }

        let db = Database::connect(&config.database).await?;
        if config.database.auto_create {
            db.init_schema().await?;
        }

        let redis = connect_redis(&config.redis).await;

        let listener = TcpListener::bind(config.server.socket_address()).await?;
        tracing::info!(address = %listener.local_addr()?, "Listening for connections");

        let state = AppState::new(config, db, redis)?;

        Ok(Self {
            state,
            listener,
            telemetry,
            _log_guard: log_guard,
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Serve until `shutdown` fires, then release the pool and flush telemetry.
    pub async fn run(self, shutdown: Shutdown) -> Result<(), StartupError> {
        let Application {
            state,
            listener,
            telemetry,
            _log_guard,
        } = self;

        let result = HttpServer::new(state.clone())
            .run(listener, shutdown.subscribe())
            .await;

        state.db.close().await;
        if let Some(telemetry) = telemetry {
            let _ = tokio::task::spawn_blocking(move || telemetry.shutdown()).await;
        }

        tracing::info!("Shutdown complete");
        result.map_err(Into::into)
    }
}

async fn connect_redis(config: &RedisConfig) -> Option<RedisCache> {
    let url = config.url.as_deref()?;
    match RedisCache::connect(url).await {
        Ok(cache) => {
            tracing::info!("Connected to Redis");
            Some(cache)
        }
        Err(e) => {
            tracing::warn!(error = %e, "Redis unavailable, continuing without it");
            None
        }
    }
}
