//! OTEL SDK initialisation: OTLP exporters, signal providers, tracing subscriber.

use std::sync::Arc;

use anyhow::{Context, Result};
use common::ServiceError;
use opentelemetry::propagation::TextMapCompositePropagator;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry_appender_tracing::layer::OpenTelemetryTracingBridge;
use opentelemetry_otlp::{ExporterBuildError, WithExportConfig};
use opentelemetry_sdk::logs::SdkLoggerProvider;
use opentelemetry_sdk::metrics::SdkMeterProvider;
use opentelemetry_sdk::trace::SdkTracerProvider;
use opentelemetry_sdk::Resource;
use tracing::warn;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use super::{propagation, resource};
use crate::config::Config;

const TRACES: &str = "traces";
const METRICS: &str = "metrics";
const LOGS: &str = "logs";

/// Crates whose events must never reach the OTLP log bridge: they carry the
/// exporter's own transport and would feed back into it.
const BRIDGE_SILENCED: &[&str] = &["hyper", "h2", "tonic", "tower", "reqwest", "opentelemetry"];

/// Handles to the three signal providers and the propagator.
///
/// Cloning is cheap; every provider is `Arc`-backed. Dropping a clone does not
/// shut anything down, only [`TelemetryGuard`] does.
#[derive(Clone)]
pub struct Telemetry {
    tracer_provider: SdkTracerProvider,
    meter_provider: SdkMeterProvider,
    logger_provider: SdkLoggerProvider,
    propagator: Arc<TextMapCompositePropagator>,
}

impl Telemetry {
    /// Bundle already-built providers with the composite propagator.
    pub fn new(
        tracer_provider: SdkTracerProvider,
        meter_provider: SdkMeterProvider,
        logger_provider: SdkLoggerProvider,
    ) -> Self {
        Self {
            tracer_provider,
            meter_provider,
            logger_provider,
            propagator: Arc::new(propagation::composite()),
        }
    }

    pub fn meter_provider(&self) -> &SdkMeterProvider {
        &self.meter_provider
    }

    pub fn propagator(&self) -> &TextMapCompositePropagator {
        &self.propagator
    }

    /// Export everything buffered so far.
    ///
    /// Runs on the blocking pool: the batch processors block the caller until
    /// their worker threads have handed the data to the exporter.
    pub async fn flush(&self) {
        let telemetry = self.clone();
        if let Err(e) = tokio::task::spawn_blocking(move || telemetry.force_flush()).await {
            warn!(error = %e, "telemetry flush task failed");
        }
    }

    fn force_flush(&self) {
        let results = [
            (TRACES, self.tracer_provider.force_flush()),
            (METRICS, self.meter_provider.force_flush()),
            (LOGS, self.logger_provider.force_flush()),
        ];
        for (signal, result) in results {
            if let Err(e) = result {
                warn!(signal, error = %e, "telemetry flush failed");
            }
        }
    }

    /// Logs go last so the other shutdown results can still be reported.
    fn shutdown(&self) {
        let results = [
            (TRACES, self.tracer_provider.shutdown()),
            (METRICS, self.meter_provider.shutdown()),
        ];
        for (signal, result) in results {
            if let Err(e) = result {
                warn!(signal, error = %e, "telemetry shutdown failed");
            }
        }
        if let Err(e) = self.logger_provider.shutdown() {
            eprintln!("WARN: logs provider shutdown failed: {e}");
        }
    }
}

/// Owns the process telemetry; flushes and shuts down every provider on drop.
pub struct TelemetryGuard {
    telemetry: Telemetry,
}

impl TelemetryGuard {
    pub fn new(telemetry: Telemetry) -> Self {
        Self { telemetry }
    }

    pub fn telemetry(&self) -> &Telemetry {
        &self.telemetry
    }
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        self.telemetry.shutdown();
    }
}

/// Detect the resource and build the three providers.
///
/// Exporter failures do not abort: the affected signal gets an inert provider
/// and the failure is returned alongside the handle so the caller can report
/// it once logging is up.
///
/// # Errors
///
/// Returns [`ServiceError::Setup`] if resource detection fails.
pub fn bootstrap(cfg: &Config) -> Result<(Telemetry, Vec<ServiceError>), ServiceError> {
    let resource = resource::detect(cfg)?;
    let endpoint = cfg.otel_exporter_otlp_endpoint.as_str();
    let mut degraded = Vec::new();

    let tracer_provider = otlp_tracer_provider(endpoint, resource.clone()).unwrap_or_else(|e| {
        degraded.push(export_failure(TRACES, e));
        inert_tracer_provider(resource.clone())
    });
    let meter_provider = otlp_meter_provider(endpoint, resource.clone()).unwrap_or_else(|e| {
        degraded.push(export_failure(METRICS, e));
        inert_meter_provider(resource.clone())
    });
    let logger_provider = otlp_logger_provider(endpoint, resource.clone()).unwrap_or_else(|e| {
        degraded.push(export_failure(LOGS, e));
        inert_logger_provider(resource)
    });

    Ok((
        Telemetry::new(tracer_provider, meter_provider, logger_provider),
        degraded,
    ))
}

/// Initialise the telemetry providers and the global tracing subscriber.
///
/// Configures:
/// - A JSON-formatted [`tracing_subscriber`] layer for structured log output.
/// - A [`tracing_opentelemetry`] layer exporting spans through the trace
///   provider, using a tracer named after `TRACER_NAME`.
/// - An [`OpenTelemetryTracingBridge`] layer exporting events as OTLP logs.
///
/// # Errors
///
/// Returns an error if resource detection fails or a subscriber is already
/// installed. Exporter failures are logged and tolerated.
pub fn init_telemetry(cfg: &Config) -> Result<TelemetryGuard> {
    let (telemetry, degraded) = bootstrap(cfg)?;
    let guard = TelemetryGuard::new(telemetry);
    let telemetry = guard.telemetry();

    let tracer = telemetry.tracer_provider.tracer(cfg.tracer_name.clone());
    let otel_layer = tracing_opentelemetry::layer().with_tracer(tracer);

    let bridge_directives = std::iter::once(cfg.log_level.clone())
        .chain(BRIDGE_SILENCED.iter().map(|target| format!("{target}=off")))
        .collect::<Vec<_>>()
        .join(",");
    let bridge_filter =
        EnvFilter::try_new(&bridge_directives).context("invalid LOG_LEVEL for the log bridge")?;
    let log_bridge =
        OpenTelemetryTracingBridge::new(&telemetry.logger_provider).with_filter(bridge_filter);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cfg.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().json())
        .with(otel_layer)
        .with(log_bridge)
        .try_init()
        .context("failed to initialise tracing subscriber")?;

    for failure in &degraded {
        warn!(error = %failure, "telemetry degraded; continuing without this signal");
    }

    Ok(guard)
}

fn export_failure(signal: &'static str, e: ExporterBuildError) -> ServiceError {
    ServiceError::TelemetryExport {
        signal,
        reason: e.to_string(),
    }
}

fn otlp_tracer_provider(
    endpoint: &str,
    resource: Resource,
) -> Result<SdkTracerProvider, ExporterBuildError> {
    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .build()?;
    Ok(SdkTracerProvider::builder()
        .with_resource(resource)
        .with_batch_exporter(exporter)
        .build())
}

fn otlp_meter_provider(
    endpoint: &str,
    resource: Resource,
) -> Result<SdkMeterProvider, ExporterBuildError> {
    let exporter = opentelemetry_otlp::MetricExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .build()?;
    Ok(SdkMeterProvider::builder()
        .with_resource(resource)
        .with_periodic_exporter(exporter)
        .build())
}

fn otlp_logger_provider(
    endpoint: &str,
    resource: Resource,
) -> Result<SdkLoggerProvider, ExporterBuildError> {
    let exporter = opentelemetry_otlp::LogExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .build()?;
    Ok(SdkLoggerProvider::builder()
        .with_resource(resource)
        .with_batch_exporter(exporter)
        .build())
}

fn inert_tracer_provider(resource: Resource) -> SdkTracerProvider {
    SdkTracerProvider::builder().with_resource(resource).build()
}

fn inert_meter_provider(resource: Resource) -> SdkMeterProvider {
    SdkMeterProvider::builder().with_resource(resource).build()
}

fn inert_logger_provider(resource: Resource) -> SdkLoggerProvider {
    SdkLoggerProvider::builder().with_resource(resource).build()
}
