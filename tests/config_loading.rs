use std::path::Path;

use figment::Jail;

use axum_base::config::{AppConfig, ConfigError};

#[test]
fn defaults_without_sources() {
    Jail::expect_with(|_jail| {
        let config = AppConfig::load_without_dotenv(None).unwrap();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.api.root_path, "/api/v1");
        assert_eq!(config.database.url, "sqlite::memory:");
        assert_eq!(config.database.effective_schema(), None);
        assert_eq!(config.rate_limit.user_requests_per_minute, 10);
        assert!(config.telemetry.is_active());
        Ok(())
    });
}

#[test]
fn flat_environment_names_are_honoured() {
    Jail::expect_with(|jail| {
        jail.set_env("APP_DATABASE_URL", "postgres://user:pw@db:5432/app");
        jail.set_env("APP_DATABASE_SCHEMA", "tenant");
        jail.set_env("APP_REDIS_URL", "redis://cache:6379/0");
        jail.set_env("APP_RATE_LIMIT", "25");
        jail.set_env("APP_SECRET_KEY", "from-env");
        jail.set_env("APP_ACCESS_TOKEN_EXPIRE_MINUTES", "5");
        jail.set_env("APP_API_ROOT_PATH", "/api/v2");
        jail.set_env("APP_OTEL_COLLECTOR_URL", "http://collector");
        jail.set_env("APP_PORT", "9000");

        let config = AppConfig::load_without_dotenv(None).unwrap();
        assert_eq!(config.database.url, "postgres://user:pw@db:5432/app");
        assert_eq!(config.database.effective_schema(), Some("tenant"));
        assert_eq!(config.redis.url.as_deref(), Some("redis://cache:6379/0"));
        assert_eq!(config.rate_limit.user_requests_per_minute, 25);
        assert_eq!(config.auth.secret_key, "from-env");
        assert_eq!(config.auth.access_token_expire_minutes, 5);
        assert_eq!(config.api.root_path, "/api/v2");
        assert_eq!(config.telemetry.endpoint(), "http://collector:4317");
        assert_eq!(config.server.port, 9000);
        Ok(())
    });
}

#[test]
fn nested_environment_keys_override_file() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "app.toml",
            r#"
            [server]
            port = 8100

            [rate_limit]
            ip_enabled = false
            "#,
        )?;
        jail.set_env("APP_RATE_LIMIT__IP_ENABLED", "true");
        jail.set_env("APP_SERVER__BIND_ADDRESS", "127.0.0.1");

        let config = AppConfig::load_without_dotenv(Some(Path::new("app.toml"))).unwrap();
        assert_eq!(config.server.port, 8100);
        assert_eq!(config.server.bind_address, "127.0.0.1");
        assert!(config.rate_limit.ip_enabled);
        Ok(())
    });
}

#[test]
fn empty_environment_values_are_ignored() {
    Jail::expect_with(|jail| {
        jail.set_env("APP_DATABASE_URL", "");
        jail.set_env("APP_PORT", "");

        let config = AppConfig::load_without_dotenv(None).unwrap();
        assert_eq!(config.database.url, "sqlite::memory:");
        assert_eq!(config.server.port, 8000);
        Ok(())
    });
}

#[test]
fn whitespace_secret_is_rejected_not_replaced() {
    Jail::expect_with(|jail| {
        jail.set_env("APP_SECRET_KEY", "   ");

        match AppConfig::load_without_dotenv(None) {
            Err(ConfigError::Validation(errors)) => {
                assert!(errors.iter().any(|e| e.field == "auth.secret_key"));
            }
            Ok(config) => panic!("loaded with secret {:?}", config.auth.secret_key),
            Err(other) => panic!("unexpected error: {other:?}"),
        }
        Ok(())
    });
}

#[test]
fn otel_sdk_disabled_turns_off_export() {
    Jail::expect_with(|jail| {
        jail.set_env("OTEL_SDK_DISABLED", "true");

        let config = AppConfig::load_without_dotenv(None).unwrap();
        assert!(config.telemetry.sdk_disabled);
        assert!(!config.telemetry.is_active());
        Ok(())
    });
}

#[test]
fn validation_reports_every_problem() {
    Jail::expect_with(|jail| {
        jail.set_env("APP_SECRET_KEY", " ");
        jail.set_env("APP_API_ROOT_PATH", "api");
        jail.set_env("APP_RATE_LIMIT", "0");

        match AppConfig::load_without_dotenv(None) {
            Err(ConfigError::Validation(errors)) => {
                let fields: Vec<&str> = errors.iter().map(|e| e.field).collect();
                assert!(fields.contains(&"auth.secret_key"));
                assert!(fields.contains(&"api.root_path"));
                assert!(fields.contains(&"rate_limit.user_requests_per_minute"));
            }
            other => panic!("expected validation errors, got {other:?}"),
        }
        Ok(())
    });
}

#[test]
fn missing_file_is_reported() {
    Jail::expect_with(|_jail| {
        let result = AppConfig::load_without_dotenv(Some(Path::new("does-not-exist.toml")));
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
        Ok(())
    });
}
