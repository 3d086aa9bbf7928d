//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the `tracing` subscriber once per process
//! - Console output (pretty or JSON) plus an optional daily-rotated JSON file
//! - Attach OpenTelemetry span and log bridge layers when telemetry is active
//!
//! # Design Decisions
//! - `RUST_LOG` wins over the configured level
//! - File writes go through a non-blocking worker; keep the `LogGuard` alive

use std::path::PathBuf;

use opentelemetry_appender_tracing::layer::OpenTelemetryTracingBridge;
use tracing_appender::{
    non_blocking::WorkerGuard,
    rolling::{RollingFileAppender, Rotation},
};
use tracing_subscriber::{
    filter::Targets, fmt::time::ChronoUtc, layer::SubscriberExt, util::SubscriberInitExt,
    EnvFilter, Layer,
};

use crate::config::ObservabilityConfig;
use crate::observability::telemetry::Telemetry;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Crates whose own events would loop back through the OTLP exporter.
const EXPORTER_TARGETS: &[&str] = &["h2", "hyper", "hyper_util", "tonic", "tower", "reqwest"];

/// Guard that keeps the file appender thread alive.
///
/// Must be held for the lifetime of the application so buffered lines are
/// flushed before exit.
pub struct LogGuard {
    _file_guard: Option<WorkerGuard>,
}

fn default_filter(level: &str) -> String {
    format!(
        "{level},axum_base={level},sqlx=warn,tower_http={level}",
        level = level.to_ascii_lowercase()
    )
}

/// Initialize the logging subsystem.
///
/// Safe to call more than once; later calls keep the first subscriber.
pub fn init_logging(config: &ObservabilityConfig, telemetry: Option<&Telemetry>) -> LogGuard {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(&config.log_level)));

    let mut layers = Vec::with_capacity(4);

    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_timer(ChronoUtc::new(TIME_FORMAT.to_string()));
    let stdout_layer = if config.json_console {
        stdout_layer.json().flatten_event(true).boxed()
    } else {
        stdout_layer.boxed()
    };
    layers.push(stdout_layer);

    let mut file_guard = None;
    if let Some(log_dir) = &config.log_dir {
        let log_dir = PathBuf::from(log_dir);
        match std::fs::create_dir_all(&log_dir) {
            Ok(()) => {
                let appender =
                    RollingFileAppender::new(Rotation::DAILY, log_dir, &config.log_file_name);
                let (non_blocking, guard) = tracing_appender::non_blocking(appender);
                file_guard = Some(guard);

                let file_layer = tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_file(true)
                    .with_line_number(true)
                    .with_timer(ChronoUtc::new(TIME_FORMAT.to_string()))
                    .with_writer(non_blocking)
                    .json()
                    .flatten_event(true)
                    .boxed();
                layers.push(file_layer);
            }
            Err(e) => eprintln!("Failed to create log directory {}: {}", log_dir.display(), e),
        }
    }

    if let Some(telemetry) = telemetry {
        layers.push(
            tracing_opentelemetry::layer()
                .with_tracer(telemetry.tracer())
                .boxed(),
        );

        let quiet = EXPORTER_TARGETS.iter().fold(
            Targets::new().with_default(tracing::Level::TRACE),
            |targets, name| targets.with_target(*name, tracing::level_filters::LevelFilter::OFF),
        );
        layers.push(
            OpenTelemetryTracingBridge::new(telemetry.logger_provider())
                .with_filter(quiet)
                .boxed(),
        );
    }

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(layers)
        .try_init();

    LogGuard {
        _file_guard: file_guard,
    }
}
