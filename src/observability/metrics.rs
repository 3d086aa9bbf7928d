//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Install the Prometheus recorder once per process
//! - Record HTTP traffic, rate limiting and domain counters
//! - Mirror the same series onto the OpenTelemetry meter exported over OTLP
//! - Render the scrape payload for `GET /metrics`
//!
//! # Metrics
//! - `http_requests_total` (counter): requests by method, route, status
//! - `http_request_duration_seconds` (histogram): latency by method, route
//! - `rate_limited_total` (counter): rejected requests by reason
//! - `actor_creation_counter`, `movie_creation_counter` (counters)
//! - `auth_tokens_issued_total`, `auth_failures_total` (counters)
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade; without a recorder it is a no-op
//! - OTel instruments exist only after `telemetry.rs` registers a meter provider
//! - Histogram buckets tuned for typical web latencies

use std::sync::OnceLock;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use opentelemetry::metrics::{Counter, Histogram, Meter};
use opentelemetry::KeyValue;

const LATENCY_BUCKETS: &[f64] = &[
    0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

static HANDLE: OnceLock<Option<PrometheusHandle>> = OnceLock::new();
static OTEL: OnceLock<OtelInstruments> = OnceLock::new();

/// The recorded series as OpenTelemetry instruments.
pub struct OtelInstruments {
    requests: Counter<u64>,
    request_duration: Histogram<f64>,
    rate_limited: Counter<u64>,
    actors_created: Counter<u64>,
    movies_created: Counter<u64>,
    tokens_issued: Counter<u64>,
    auth_failures: Counter<u64>,
}

impl OtelInstruments {
    pub fn new(meter: &Meter) -> Self {
        Self {
            requests: meter
                .u64_counter("http_requests_total")
                .with_description("HTTP requests by method, route and status")
                .build(),
            request_duration: meter
                .f64_histogram("http_request_duration_seconds")
                .with_unit("s")
                .with_boundaries(LATENCY_BUCKETS.to_vec())
                .build(),
            rate_limited: meter.u64_counter("rate_limited_total").build(),
            actors_created: meter
                .u64_counter("actor_creation_counter")
                .with_description("Actors created")
                .build(),
            movies_created: meter
                .u64_counter("movie_creation_counter")
                .with_description("Movies created")
                .build(),
            tokens_issued: meter.u64_counter("auth_tokens_issued_total").build(),
            auth_failures: meter.u64_counter("auth_failures_total").build(),
        }
    }

    fn request(&self, method: &str, status: u16, route: &str, duration: f64) {
        let attributes = [
            KeyValue::new("method", method.to_string()),
            KeyValue::new("status", i64::from(status)),
            KeyValue::new("route", route.to_string()),
        ];
        self.requests.add(1, &attributes);
        self.request_duration.record(duration, &attributes[..1]);
    }
}

/// Route every later recording to `meter` as well.
///
/// Called once by telemetry setup; later calls are ignored.
pub fn init_otel_instruments(meter: &Meter) {
    let _ = OTEL.set(OtelInstruments::new(meter));
}

fn otel() -> Option<&'static OtelInstruments> {
    OTEL.get()
}

/// Install the global Prometheus recorder.
///
/// Returns the render handle, or `None` if another recorder already owns the
/// process.
pub fn init_metrics() -> Option<PrometheusHandle> {
    HANDLE
        .get_or_init(|| {
            let builder = match PrometheusBuilder::new().set_buckets_for_metric(
                Matcher::Full("http_request_duration_seconds".to_string()),
                LATENCY_BUCKETS,
            ) {
                Ok(builder) => builder,
                Err(e) => {
                    tracing::error!(error = %e, "Invalid histogram buckets");
                    PrometheusBuilder::new()
                }
            };

            match builder.install_recorder() {
                Ok(handle) => {
                    tracing::info!("Prometheus recorder installed");
                    Some(handle)
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to install Prometheus recorder");
                    None
                }
            }
        })
        .clone()
}

/// Handle of the installed recorder, if any.
pub fn handle() -> Option<PrometheusHandle> {
    HANDLE.get().cloned().flatten()
}

/// Record a completed HTTP request.
pub fn record_request(method: &str, status: u16, route: &str, start: Instant) {
    let duration = start.elapsed().as_secs_f64();

    counter!(
        "http_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string(),
        "route" => route.to_string()
    )
    .increment(1);

    histogram!(
        "http_request_duration_seconds",
        "method" => method.to_string(),
        "route" => route.to_string()
    )
    .record(duration);

    if let Some(otel) = otel() {
        otel.request(method, status, route, duration);
    }
}

/// Record a request rejected by a limiter.
pub fn record_rate_limited(reason: &'static str) {
    counter!("rate_limited_total", "reason" => reason).increment(1);
    if let Some(otel) = otel() {
        otel.rate_limited.add(1, &[KeyValue::new("reason", reason)]);
    }
}

/// Record a newly created actor.
pub fn record_actor_created() {
    counter!("actor_creation_counter").increment(1);
    if let Some(otel) = otel() {
        otel.actors_created.add(1, &[]);
    }
}

/// Record a newly created movie.
pub fn record_movie_created() {
    counter!("movie_creation_counter").increment(1);
    if let Some(otel) = otel() {
        otel.movies_created.add(1, &[]);
    }
}

/// Record an issued access token.
pub fn record_token_issued() {
    counter!("auth_tokens_issued_total").increment(1);
    if let Some(otel) = otel() {
        otel.tokens_issued.add(1, &[]);
    }
}

/// Record a failed authentication attempt.
pub fn record_auth_failure(reason: &'static str) {
    counter!("auth_failures_total", "reason" => reason).increment(1);
    if let Some(otel) = otel() {
        otel.auth_failures.add(1, &[KeyValue::new("reason", reason)]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_contains_recorded_series() {
        let Some(handle) = init_metrics() else {
            return;
        };
        record_request("GET", 200, "/healthchecker", Instant::now());
        record_rate_limited("user_limit");

        let rendered = handle.render();
        assert!(rendered.contains("http_requests_total"));
        assert!(rendered.contains("rate_limited_total"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn otel_instruments_reach_the_exporter() {
        use opentelemetry::metrics::MeterProvider as _;
        use opentelemetry_sdk::metrics::{PeriodicReader, SdkMeterProvider};
        use opentelemetry_sdk::runtime;
        use opentelemetry_sdk::testing::metrics::InMemoryMetricExporter;

        let exporter = InMemoryMetricExporter::default();
        let reader = PeriodicReader::builder(exporter.clone(), runtime::Tokio).build();
        let provider = SdkMeterProvider::builder().with_reader(reader).build();

        let instruments = OtelInstruments::new(&provider.meter("axum-base"));
        instruments.actors_created.add(1, &[]);
        instruments.request("POST", 201, "/api/v1/actors", 0.02);
        provider.force_flush().unwrap();

        let names: Vec<String> = exporter
            .get_finished_metrics()
            .unwrap()
            .iter()
            .flat_map(|rm| rm.scope_metrics.iter())
            .flat_map(|sm| sm.metrics.iter())
            .map(|m| m.name.to_string())
            .collect();
        assert!(names.contains(&"actor_creation_counter".to_string()), "{names:?}");
        assert!(names.contains(&"http_requests_total".to_string()), "{names:?}");
        assert!(names.contains(&"http_request_duration_seconds".to_string()), "{names:?}");

        provider.shutdown().unwrap();
    }
}
