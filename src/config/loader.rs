//! Configuration loading.
//!
//! Sources, lowest to highest precedence:
//! 1. Built-in defaults
//! 2. Optional TOML file
//! 3. `.env` file in the working directory (never overrides the process env)
//! 4. Process environment (`APP_*`, plus `OTEL_SDK_DISABLED`)
//!
//! Nested fields use `__` as separator (`APP_SERVER__PORT` → `server.port`).
//! The short flat names used by deployment manifests (`APP_DATABASE_URL`,
//! `APP_REDIS_URL`, `APP_SECRET_KEY`, …) are mapped onto their sections.

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use thiserror::Error;

use crate::config::schema::AppConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Prefix shared by every application environment variable.
pub const ENV_PREFIX: &str = "APP_";

/// Flat environment names and the config keys they populate.
const FLAT_ALIASES: &[(&str, &str)] = &[
    ("database_url", "database.url"),
    ("database_schema", "database.schema"),
    ("db_debug", "database.debug"),
    ("redis_url", "redis.url"),
    ("rate_limit", "rate_limit.user_requests_per_minute"),
    ("secret_key", "auth.secret_key"),
    ("algorithm", "auth.algorithm"),
    ("access_token_expire_minutes", "auth.access_token_expire_minutes"),
    ("api_root_path", "api.root_path"),
    ("log_level", "observability.log_level"),
    ("otel_collector_url", "telemetry.collector_url"),
    ("port", "server.port"),
];

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An explicitly requested file does not exist.
    #[error("Config file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// Figment extraction or merge error.
    #[error("Configuration error: {0}")]
    Figment(#[from] figment::Error),

    /// Semantic checks failed.
    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Translate a prefix-stripped environment key into a config key.
fn env_key_to_path(key: &str) -> String {
    let key = key.to_ascii_lowercase();
    FLAT_ALIASES
        .iter()
        .find(|(alias, _)| *alias == key)
        .map(|(_, path)| (*path).to_string())
        .unwrap_or_else(|| key.replace("__", "."))
}

/// Empty variables behave as if unset.
fn env_value_present(key: &str) -> bool {
    std::env::var(format!("{}{}", ENV_PREFIX, key.to_ascii_uppercase()))
        .map(|v| !v.is_empty())
        .unwrap_or(true)
}

impl AppConfig {
    /// Build the figment provider chain without touching `.env`.
    ///
    /// This is public so tests and the CLI can inspect the merged sources.
    pub fn figment(path: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(AppConfig::default()));

        if let Some(path) = path {
            figment = figment.merge(Toml::file(path));
        }

        figment
            .merge(
                Env::prefixed(ENV_PREFIX)
                    .filter(|key| env_value_present(key.as_str()))
                    .map(|key| env_key_to_path(key.as_str()).into()),
            )
            .merge(
                Env::raw()
                    .only(&["OTEL_SDK_DISABLED"])
                    .filter(|_| {
                        std::env::var("OTEL_SDK_DISABLED")
                            .map(|v| !v.is_empty())
                            .unwrap_or(false)
                    })
                    .map(|_| "telemetry.sdk_disabled".into()),
            )
    }

    /// Load and validate configuration, reading `.env` first.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::load_without_dotenv(path)
    }

    /// Load and validate configuration from the file and process env only.
    pub fn load_without_dotenv(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
        }

        let config: AppConfig = Self::figment(path).extract()?;
        validate_config(&config).map_err(ConfigError::Validation)?;

        Ok(config)
    }

    /// Render the configuration as TOML with secrets redacted.
    pub fn to_redacted_toml(&self) -> Result<String, toml::ser::Error> {
        let mut shown = self.clone();
        shown.auth.secret_key = "********".to_string();
        toml::to_string_pretty(&shown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_aliases_map_to_sections() {
        assert_eq!(env_key_to_path("DATABASE_URL"), "database.url");
        assert_eq!(env_key_to_path("db_debug"), "database.debug");
        assert_eq!(env_key_to_path("rate_limit"), "rate_limit.user_requests_per_minute");
        assert_eq!(env_key_to_path("port"), "server.port");
    }

    #[test]
    fn nested_keys_use_double_underscore() {
        assert_eq!(env_key_to_path("server__bind_address"), "server.bind_address");
        assert_eq!(env_key_to_path("RATE_LIMIT__IP_ENABLED"), "rate_limit.ip_enabled");
    }

    #[test]
    fn redacted_toml_hides_secret() {
        let mut config = AppConfig::default();
        config.auth.secret_key = "super-secret".into();
        let rendered = config.to_redacted_toml().unwrap();
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("[database]"));
    }
}
