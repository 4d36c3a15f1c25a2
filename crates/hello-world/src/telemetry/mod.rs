//! OpenTelemetry setup: traces, metrics, and structured logs exported over OTLP/gRPC.
//!
//! The SDK exports to the collector extension listening on the function's
//! loopback interface (`localhost:4317`, plaintext).
//!
//! # Telemetry invariants
//!
//! - Providers are owned by [`Telemetry`] and passed to the handler
//!   explicitly; nothing is installed into `opentelemetry::global`.
//! - A broken exporter never stops the function: the signal goes inert.
//! - Log level is configurable via `LOG_LEVEL` (default: `info`).

pub mod collector;
pub mod init;
pub mod metrics;
pub mod propagation;
pub mod resource;

pub use init::{init_telemetry, Telemetry};
pub use metrics::InvocationMetrics;
