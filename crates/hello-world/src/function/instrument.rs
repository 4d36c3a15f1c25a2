//! Per-invocation instrumentation around the request handler.
//!
//! Each invocation gets a server span parented on the caller's trace context,
//! one set of invocation metrics, and a flush of every provider before the
//! result goes back to the runtime. Lambda may freeze the process as soon as
//! the response is posted, so nothing can be left in the batch queues.

use std::sync::Arc;
use std::time::Instant;

use common::{ProxyResponse, ServiceError};
use lambda_runtime::{Diagnostic, LambdaEvent};
use serde_json::Value;
use tracing::{debug, error, field::Empty, Instrument};
use tracing_opentelemetry::OpenTelemetrySpanExt;

use super::handlers;
use super::state::FunctionState;
use crate::telemetry::propagation;

/// Run one invocation of [`handlers::hello`] under full instrumentation.
pub async fn invoke(
    state: Arc<FunctionState>,
    event: LambdaEvent<Value>,
) -> Result<ProxyResponse, Diagnostic> {
    let (payload, context) = event.into_parts();
    let coldstart = state.take_coldstart();
    let parent = propagation::extract_from_event(state.telemetry.propagator(), &payload);

    let span = tracing::info_span!(
        "invocation",
        otel.name = %state.function_name,
        otel.kind = "server",
        otel.status_code = Empty,
        faas.invocation_id = %context.request_id,
        faas.coldstart = coldstart,
        faas.trigger = "http",
        cloud.resource_id = %context.invoked_function_arn,
        cloud.region = state.aws.region().unwrap_or_default(),
        error.type = Empty,
    );
    if let Err(e) = span.set_parent(parent) {
        debug!(error = ?e, "caller trace context not applied to invocation span");
    }

    let started = Instant::now();
    // The handler span is created on first poll, inside the invocation span.
    let result = async { handlers::hello(&state).await }
        .instrument(span.clone())
        .await;
    let error_type = result.as_ref().err().map(ServiceError::error_type);

    if let Err(e) = &result {
        span.record("otel.status_code", "ERROR");
        span.record("error.type", e.error_type());
        error!(parent: &span, error = %e, error_type = e.error_type(), "invocation failed");
    }
    state.metrics.record(started.elapsed(), coldstart, error_type);

    // Close the span before flushing so it is part of this invocation's export.
    drop(span);
    state.telemetry.flush().await;

    result.map_err(diagnostic)
}

fn diagnostic(e: ServiceError) -> Diagnostic {
    Diagnostic {
        error_type: e.error_type().to_owned(),
        error_message: e.to_string(),
    }
}
