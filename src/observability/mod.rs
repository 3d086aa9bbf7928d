//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events, console + rolling file)
//!     → metrics.rs (counters, histograms)
//!     → telemetry.rs (OTLP spans and log records)
//!
//! Consumers:
//!     → stdout / log files
//!     → Metrics endpoint (Prometheus scrape)
//!     → OpenTelemetry collector (gRPC :4317)
//! ```
//!
//! # Design Decisions
//! - Request ID flows through all subsystems via the HTTP trace span
//! - Metrics are cheap (atomic increments)
//! - Telemetry export is optional and can be killed with `OTEL_SDK_DISABLED`

pub mod logging;
pub mod metrics;
pub mod telemetry;

pub use logging::{init_logging, LogGuard};
pub use telemetry::{Telemetry, TelemetryError};
