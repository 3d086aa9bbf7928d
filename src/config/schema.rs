//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! All types derive Serde traits so the same tree can be read from TOML,
//! environment variables, or serialized back out by the CLI.

use serde::{Deserialize, Serialize};

/// Root configuration for the service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Listener configuration (bind address, port, timeouts).
    pub server: ServerConfig,

    /// Public API surface (root path, pagination).
    pub api: ApiConfig,

    /// Relational database settings.
    pub database: DatabaseConfig,

    /// Redis connection settings.
    pub redis: RedisConfig,

    /// Token issuing settings.
    pub auth: AuthConfig,

    /// Rate limiting configuration.
    pub rate_limit: RateLimitConfig,

    /// Logging and metrics settings.
    pub observability: ObservabilityConfig,

    /// OTLP export settings.
    pub telemetry: TelemetryConfig,

    /// Request hardening.
    pub security: SecurityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface to bind (e.g., "0.0.0.0").
    pub bind_address: String,

    /// TCP port for the HTTP listener.
    pub port: u16,

    /// Request timeout (total time for request/response) in seconds.
    pub request_timeout_secs: u64,
}

impl ServerConfig {
    /// `host:port` pair for the listener.
    pub fn socket_address(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 8000,
            request_timeout_secs: 30,
        }
    }
}

/// API surface configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Prefix all resource routes are mounted under.
    pub root_path: String,

    /// Human readable service title, reported by the root endpoints.
    pub title: String,

    /// Page size used when the client does not send one.
    pub default_page_size: u32,

    /// Largest page size a client may request.
    pub max_page_size: u32,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            root_path: "/api/v1".to_string(),
            title: "Base code for axum projects".to_string(),
            default_page_size: 10,
            max_page_size: 100,
        }
    }
}

/// Relational database configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Driver-qualified connection string (`postgres://…`, `sqlite:…`).
    pub url: String,

    /// Schema used on servers that support schemas. Ignored for SQLite.
    pub schema: String,

    /// Log every statement at INFO instead of DEBUG.
    pub debug: bool,

    /// Upper bound of pooled connections.
    pub max_connections: u32,

    /// Create missing schema and tables at startup.
    pub auto_create: bool,

    /// Directory with versioned migrations. Defaults to `migrations/<dialect>`.
    pub migrations_dir: Option<String>,
}

impl DatabaseConfig {
    /// Returns true when the URL points at SQLite.
    pub fn is_sqlite(&self) -> bool {
        self.url.starts_with("sqlite:")
    }

    /// Returns true for `sqlite::memory:` style URLs.
    pub fn is_in_memory(&self) -> bool {
        self.is_sqlite() && self.url.contains(":memory:")
    }

    /// Schema to create and search, `None` where schemas are unsupported.
    pub fn effective_schema(&self) -> Option<&str> {
        if self.is_sqlite() || self.schema.is_empty() {
            None
        } else {
            Some(&self.schema)
        }
    }

    /// Name of the SQL dialect used to pick DDL and migration folders.
    pub fn dialect_name(&self) -> &'static str {
        if self.is_sqlite() {
            "sqlite"
        } else {
            "postgres"
        }
    }

    /// Directory holding versioned migrations for this database.
    pub fn migrations_path(&self) -> String {
        self.migrations_dir
            .clone()
            .unwrap_or_else(|| format!("migrations/{}", self.dialect_name()))
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite::memory:".to_string(),
            schema: "myapp".to_string(),
            debug: false,
            max_connections: 10,
            auto_create: true,
            migrations_dir: None,
        }
    }
}

/// Redis configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RedisConfig {
    /// Connection URL (e.g., "redis://localhost:6379"). Unset disables Redis.
    pub url: Option<String>,
}

/// Access token configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// HMAC secret used to sign access tokens.
    pub secret_key: String,

    /// JWT signing algorithm name (HS256, HS384, HS512).
    pub algorithm: String,

    /// Access token lifetime in minutes.
    pub access_token_expire_minutes: i64,
}

/// Secret shipped as the default; never valid for a real deployment.
pub const PLACEHOLDER_SECRET_KEY: &str = "CHANGE_ME_IN_PRODUCTION";

impl AuthConfig {
    /// True while the built-in placeholder secret is still configured.
    pub fn uses_placeholder_secret(&self) -> bool {
        self.secret_key == PLACEHOLDER_SECRET_KEY
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            secret_key: PLACEHOLDER_SECRET_KEY.to_string(),
            algorithm: "HS256".to_string(),
            access_token_expire_minutes: 30,
        }
    }
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Enable the per-user limiter on API routes.
    pub user_enabled: bool,

    /// Requests a single user may make per clock minute.
    pub user_requests_per_minute: u32,

    /// Header carrying the user identity.
    pub user_header: String,

    /// Enable the per-IP token bucket.
    pub ip_enabled: bool,

    /// Requests allowed per IP within `ip_window_secs`.
    pub ip_requests: u32,

    /// Window length for the per-IP limit in seconds.
    pub ip_window_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            user_enabled: true,
            user_requests_per_minute: 10,
            user_header: "x-user".to_string(),
            ip_enabled: false,
            ip_requests: 2,
            ip_window_secs: 5,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Directory for JSON log files. Unset disables file logging.
    pub log_dir: Option<String>,

    /// Base name of the rolling log file.
    pub log_file_name: String,

    /// Emit console logs as JSON instead of human readable lines.
    pub json_console: bool,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_dir: None,
            log_file_name: "app.log".to_string(),
            json_console: false,
            metrics_enabled: true,
        }
    }
}

/// OpenTelemetry export configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Export spans and logs over OTLP.
    pub enabled: bool,

    /// Mirrors `OTEL_SDK_DISABLED`; wins over `enabled`.
    pub sdk_disabled: bool,

    /// Collector base URL without port.
    pub collector_url: String,

    /// OTLP gRPC port of the collector.
    pub collector_grpc_port: u16,

    /// `service.name` resource attribute.
    pub service_name: String,

    /// `service.instance.id` resource attribute. Empty generates a UUID per process.
    pub instance_id: String,
}

impl TelemetryConfig {
    /// Returns true when exporters should be installed.
    pub fn is_active(&self) -> bool {
        self.enabled && !self.sdk_disabled
    }

    /// OTLP gRPC endpoint of the collector.
    pub fn endpoint(&self) -> String {
        format!(
            "{}:{}",
            self.collector_url.trim_end_matches('/'),
            self.collector_grpc_port
        )
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            sdk_disabled: false,
            collector_url: "http://localhost".to_string(),
            collector_grpc_port: 4317,
            service_name: "axum-base".to_string(),
            instance_id: String::new(),
        }
    }
}

/// Security hardening configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Maximum body size in bytes.
    pub max_body_size: usize,
    /// Origins allowed by CORS. Empty disables the CORS layer.
    pub cors_origins: Vec<String>,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_body_size: 2 * 1024 * 1024, // 2MB
            cors_origins: Vec::new(),
        }
    }
}
