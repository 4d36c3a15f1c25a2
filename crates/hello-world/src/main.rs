//! `hello-world`: Lambda function entry point.
//!
//! Startup sequence:
//! 1. Load and validate [`Config`] from environment variables.
//! 2. Initialise the telemetry pipeline (OTLP traces, metrics, logs + tracing).
//! 3. Report the collector configuration shipped with the function.
//! 4. Load the AWS configuration and build instrumented clients.
//! 5. Build the handler state and serve invocations until the runtime stops
//!    or the process is asked to terminate.
//!
//! The [`TelemetryGuard`](telemetry::init::TelemetryGuard) returned by step 2 flushes
//! and shuts down every provider when `main` returns, on any path.

mod aws;
mod config;
mod function;
mod telemetry;

use std::sync::Arc;

use anyhow::{anyhow, Result};
use lambda_runtime::service_fn;
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info};

use config::Config;
use function::FunctionState;

#[tokio::main]
async fn main() -> Result<()> {
    // -----------------------------------------------------------------------
    // 1. Configuration
    // -----------------------------------------------------------------------
    let cfg = Config::from_env().map_err(|e| {
        // Telemetry is not yet up; write to stderr directly.
        eprintln!("ERROR: configuration invalid: {e:#}");
        e
    })?;

    // -----------------------------------------------------------------------
    // 2. Telemetry
    // -----------------------------------------------------------------------
    let guard = telemetry::init_telemetry(&cfg).map_err(|e| {
        eprintln!("ERROR: telemetry setup failed: {e:#}");
        e
    })?;
    info!(
        version = env!("CARGO_PKG_VERSION"),
        endpoint = %cfg.otel_exporter_otlp_endpoint,
        tracer = %cfg.tracer_name,
        "hello-world starting"
    );

    // -----------------------------------------------------------------------
    // 3. Collector configuration
    // -----------------------------------------------------------------------
    telemetry::collector::check_config(cfg.opentelemetry_collector_config_file.as_deref());

    // -----------------------------------------------------------------------
    // 4. AWS clients
    // -----------------------------------------------------------------------
    let aws = aws::AwsClients::init().await.map_err(|e| {
        error!(error = %e, "AWS configuration unusable");
        e
    })?;

    // -----------------------------------------------------------------------
    // 5. Invocation loop
    // -----------------------------------------------------------------------
    let state = Arc::new(FunctionState::new(&cfg, guard.telemetry().clone(), aws)?);
    info!(checkip_url = %state.lookup.url(), "serving invocations");

    let handler = service_fn(move |event| function::instrument::invoke(Arc::clone(&state), event));
    let mut terminate = signal(SignalKind::terminate())?;

    tokio::select! {
        result = lambda_runtime::run(handler) => {
            result.map_err(|e| anyhow!(e))?;
        }
        _ = tokio::signal::ctrl_c() => info!("received Ctrl-C, shutting down"),
        _ = terminate.recv() => info!("received SIGTERM, shutting down"),
    }

    Ok(())
}
