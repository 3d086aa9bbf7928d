//! OpenTelemetry export over OTLP/gRPC.
//!
//! # Responsibilities
//! - Build span, metric and log exporters pointed at the collector
//! - Tag everything with `service.name` and `service.instance.id`
//! - Install the W3C trace-context propagator
//! - Flush pending batches on shutdown
//!
//! # Design Decisions
//! - Export is skipped entirely when disabled or `OTEL_SDK_DISABLED` is set
//! - The `tracing` layers are built by `logging.rs`; this module only owns providers

use std::time::Duration;

use opentelemetry::{global, metrics::MeterProvider as _, trace::TracerProvider as _, KeyValue};
use opentelemetry_otlp::{LogExporter, MetricExporter, SpanExporter, WithExportConfig};
use opentelemetry_sdk::{
    logs::LoggerProvider,
    metrics::{PeriodicReader, SdkMeterProvider},
    propagation::TraceContextPropagator,
    runtime,
    trace::{Tracer, TracerProvider},
    Resource,
};
use thiserror::Error;

use crate::config::TelemetryConfig;
use crate::observability::metrics;

/// How often metric readings are pushed to the collector.
const METRIC_EXPORT_INTERVAL: Duration = Duration::from_secs(10);

/// Errors raised while wiring exporters.
#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("Failed to build span exporter: {0}")]
    SpanExporter(String),

    #[error("Failed to build metric exporter: {0}")]
    MetricExporter(String),

    #[error("Failed to build log exporter: {0}")]
    LogExporter(String),
}

/// Installed OpenTelemetry providers.
pub struct Telemetry {
    tracer_provider: TracerProvider,
    meter_provider: SdkMeterProvider,
    logger_provider: LoggerProvider,
    service_name: String,
}

impl Telemetry {
    /// Build exporters and register the global tracer provider.
    ///
    /// Returns `Ok(None)` when export is disabled by configuration.
    pub fn init(config: &TelemetryConfig) -> Result<Option<Self>, TelemetryError> {
        if !config.is_active() {
            return Ok(None);
        }

        let endpoint = config.endpoint();
        let instance_id = if config.instance_id.is_empty() {
            uuid::Uuid::new_v4().to_string()
        } else {
            config.instance_id.clone()
        };
        let resource = Resource::new(vec![
            KeyValue::new("service.name", config.service_name.clone()),
            KeyValue::new("service.instance.id", instance_id),
        ]);

        let span_exporter = SpanExporter::builder()
            .with_tonic()
            .with_endpoint(endpoint.clone())
            .build()
            .map_err(|e| TelemetryError::SpanExporter(e.to_string()))?;

        let metric_exporter = MetricExporter::builder()
            .with_tonic()
            .with_endpoint(endpoint.clone())
            .build()
            .map_err(|e| TelemetryError::MetricExporter(e.to_string()))?;

        let log_exporter = LogExporter::builder()
            .with_tonic()
            .with_endpoint(endpoint)
            .build()
            .map_err(|e| TelemetryError::LogExporter(e.to_string()))?;

        let tracer_provider = TracerProvider::builder()
            .with_batch_exporter(span_exporter, runtime::Tokio)
            .with_resource(resource.clone())
            .build();

        let reader = PeriodicReader::builder(metric_exporter, runtime::Tokio)
            .with_interval(METRIC_EXPORT_INTERVAL)
            .build();
        let meter_provider = SdkMeterProvider::builder()
            .with_reader(reader)
            .with_resource(resource.clone())
            .build();

        let logger_provider = LoggerProvider::builder()
            .with_batch_exporter(log_exporter, runtime::Tokio)
            .with_resource(resource)
            .build();

        global::set_text_map_propagator(TraceContextPropagator::new());
        global::set_tracer_provider(tracer_provider.clone());
        global::set_meter_provider(meter_provider.clone());
        metrics::init_otel_instruments(&meter_provider.meter(env!("CARGO_PKG_NAME")));

        Ok(Some(Self {
            tracer_provider,
            meter_provider,
            logger_provider,
            service_name: config.service_name.clone(),
        }))
    }

    /// Tracer used by the `tracing-opentelemetry` layer.
    pub fn tracer(&self) -> Tracer {
        self.tracer_provider.tracer(self.service_name.clone())
    }

    /// Provider backing the log bridge layer.
    pub fn logger_provider(&self) -> &LoggerProvider {
        &self.logger_provider
    }

    /// Flush and stop every provider.
    pub fn shutdown(self) {
        if let Err(e) = self.tracer_provider.shutdown() {
            eprintln!("Failed to flush spans: {}", e);
        }
        if let Err(e) = self.meter_provider.shutdown() {
            eprintln!("Failed to flush metrics: {}", e);
        }
        if let Err(e) = self.logger_provider.shutdown() {
            eprintln!("Failed to flush logs: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_config_installs_nothing() {
        let config = TelemetryConfig {
            enabled: false,
            ..Default::default()
        };
        assert!(Telemetry::init(&config).unwrap().is_none());

        let config = TelemetryConfig {
            sdk_disabled: true,
            ..Default::default()
        };
        assert!(Telemetry::init(&config).unwrap().is_none());
    }
}
