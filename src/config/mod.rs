//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! defaults + TOML file + .env + APP_* environment
//!     → loader.rs (figment merge & deserialize)
//!     → validation.rs (semantic checks)
//!     → AppConfig (validated, immutable)
//!     → shared via Arc to all subsystems
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::ConfigError;
pub use schema::{
    ApiConfig, AppConfig, AuthConfig, DatabaseConfig, ObservabilityConfig, RateLimitConfig,
    RedisConfig, SecurityConfig, ServerConfig, TelemetryConfig,
};
pub use validation::{validate_config, ValidationError};
