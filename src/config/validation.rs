//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, page sizes, token lifetime)
//! - Check URLs carry a scheme the service can talk to
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::fmt;

use url::Url;

use crate::config::schema::AppConfig;

const DATABASE_SCHEMES: &[&str] = &["postgres", "postgresql", "sqlite"];
const REDIS_SCHEMES: &[&str] = &["redis", "rediss"];
const JWT_ALGORITHMS: &[&str] = &["HS256", "HS384", "HS512"];
const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// A single semantic problem in a loaded configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: &'static str,
    /// Human readable description.
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a configuration, collecting every problem found.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.server.request_timeout_secs == 0 {
        errors.push(ValidationError::new(
            "server.request_timeout_secs",
            "must be greater than zero",
        ));
    }

    let root = &config.api.root_path;
    if !root.is_empty() && !root.starts_with('/') {
        errors.push(ValidationError::new(
            "api.root_path",
            format!("'{}' must start with '/'", root),
        ));
    }
    if config.api.max_page_size == 0 {
        errors.push(ValidationError::new(
            "api.max_page_size",
            "must be greater than zero",
        ));
    }
    if config.api.default_page_size == 0 || config.api.default_page_size > config.api.max_page_size
    {
        errors.push(ValidationError::new(
            "api.default_page_size",
            format!("must be between 1 and {}", config.api.max_page_size),
        ));
    }

    match Url::parse(&config.database.url) {
        Ok(url) if DATABASE_SCHEMES.contains(&url.scheme()) => {}
        Ok(url) => errors.push(ValidationError::new(
            "database.url",
            format!("unsupported scheme '{}'", url.scheme()),
        )),
        Err(e) => errors.push(ValidationError::new(
            "database.url",
            format!("invalid URL: {}", e),
        )),
    }
    if config.database.max_connections == 0 {
        errors.push(ValidationError::new(
            "database.max_connections",
            "must be greater than zero",
        ));
    }

    if let Some(redis_url) = &config.redis.url {
        match Url::parse(redis_url) {
            Ok(url) if REDIS_SCHEMES.contains(&url.scheme()) => {}
            Ok(url) => errors.push(ValidationError::new(
                "redis.url",
                format!("unsupported scheme '{}'", url.scheme()),
            )),
            Err(e) => errors.push(ValidationError::new(
                "redis.url",
                format!("invalid URL: {}", e),
            )),
        }
    }

    if config.auth.secret_key.trim().is_empty() {
        errors.push(ValidationError::new("auth.secret_key", "must not be empty"));
    }
    if !JWT_ALGORITHMS.contains(&config.auth.algorithm.as_str()) {
        errors.push(ValidationError::new(
            "auth.algorithm",
            format!(
                "'{}' is not one of {}",
                config.auth.algorithm,
                JWT_ALGORITHMS.join(", ")
            ),
        ));
    }
    if config.auth.access_token_expire_minutes <= 0 {
        errors.push(ValidationError::new(
            "auth.access_token_expire_minutes",
            "must be greater than zero",
        ));
    }

    if config.rate_limit.user_requests_per_minute == 0 {
        errors.push(ValidationError::new(
            "rate_limit.user_requests_per_minute",
            "must be greater than zero",
        ));
    }
    if config.rate_limit.user_header.trim().is_empty() {
        errors.push(ValidationError::new(
            "rate_limit.user_header",
            "must not be empty",
        ));
    }
    if config.rate_limit.ip_enabled
        && (config.rate_limit.ip_requests == 0 || config.rate_limit.ip_window_secs == 0)
    {
        errors.push(ValidationError::new(
            "rate_limit.ip_requests",
            "requests and window must be greater than zero when the IP limiter is enabled",
        ));
    }

    let level = config.observability.log_level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ValidationError::new(
            "observability.log_level",
            format!("unknown level '{}'", config.observability.log_level),
        ));
    }

    if config.telemetry.is_active() {
        if let Err(e) = Url::parse(&config.telemetry.endpoint()) {
            errors.push(ValidationError::new(
                "telemetry.collector_url",
                format!("invalid URL: {}", e),
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
