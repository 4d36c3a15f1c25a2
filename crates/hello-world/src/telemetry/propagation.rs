//! W3C trace-context + baggage propagation for invocations and outbound calls.
//!
//! Incoming context is read from the `headers` object of the invocation event
//! (API Gateway v1/v2 and ALB all carry one). Outgoing context is written into
//! the HTTP request headers of the IP lookup.

use opentelemetry::propagation::{Extractor, TextMapCompositePropagator, TextMapPropagator};
use opentelemetry::Context;
use opentelemetry_http::HeaderInjector;
use opentelemetry_sdk::propagation::{BaggagePropagator, TraceContextPropagator};
use serde_json::{Map, Value as JsonValue};
use tracing_opentelemetry::OpenTelemetrySpanExt;

/// Composite propagator: `traceparent`/`tracestate` plus `baggage`.
pub fn composite() -> TextMapCompositePropagator {
    TextMapCompositePropagator::new(vec![
        Box::new(TraceContextPropagator::new()),
        Box::new(BaggagePropagator::new()),
    ])
}

/// `Extractor` over the JSON `headers` object of an invocation event.
///
/// API Gateway v1 keeps the caller's header casing, so lookups ignore case.
/// Non-string values are skipped.
struct EventHeaders<'a>(Option<&'a Map<String, JsonValue>>);

impl Extractor for EventHeaders<'_> {
    fn get(&self, key: &str) -> Option<&str> {
        self.0?
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(key))
            .and_then(|(_, value)| value.as_str())
    }

    fn keys(&self) -> Vec<&str> {
        self.0
            .map(|headers| headers.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }
}

/// Extract the caller's context from an invocation event.
///
/// Events without a `headers` object yield an empty context, so the
/// invocation span becomes a new root.
pub fn extract_from_event(propagator: &dyn TextMapPropagator, event: &JsonValue) -> Context {
    let headers = event.get("headers").and_then(JsonValue::as_object);
    propagator.extract(&EventHeaders(headers))
}

/// Inject the current span's context into outbound request headers.
pub fn inject_current(
    propagator: &dyn TextMapPropagator,
    headers: &mut reqwest::header::HeaderMap,
) {
    let cx = tracing::Span::current().context();
    propagator.inject_context(&cx, &mut HeaderInjector(headers));
}
