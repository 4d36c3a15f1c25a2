//! Invocation metrics recorded by the instrumentation wrapper.

use std::time::Duration;

use opentelemetry::metrics::{Counter, Histogram, MeterProvider as _};
use opentelemetry::KeyValue;
use opentelemetry_sdk::metrics::SdkMeterProvider;

pub const INVOCATIONS: &str = "faas.invocations";
pub const ERRORS: &str = "faas.errors";
pub const INVOKE_DURATION: &str = "faas.invoke_duration";

/// Instruments for the function's invocation metrics.
#[derive(Clone)]
pub struct InvocationMetrics {
    invocations: Counter<u64>,
    errors: Counter<u64>,
    duration: Histogram<f64>,
}

impl InvocationMetrics {
    /// Create the instruments on a meter scoped to `scope`.
    pub fn new(provider: &SdkMeterProvider, scope: &'static str) -> Self {
        let meter = provider.meter(scope);
        Self {
            invocations: meter
                .u64_counter(INVOCATIONS)
                .with_description("Number of successful invocations")
                .build(),
            errors: meter
                .u64_counter(ERRORS)
                .with_description("Number of invocations that returned an error")
                .build(),
            duration: meter
                .f64_histogram(INVOKE_DURATION)
                .with_description("Wall-clock duration of the handler")
                .with_unit("s")
                .build(),
        }
    }

    /// Record one finished invocation.
    ///
    /// `error_type` is `Some` for failed invocations and becomes the
    /// `error.type` attribute.
    pub fn record(&self, elapsed: Duration, coldstart: bool, error_type: Option<&'static str>) {
        let mut attrs = vec![
            KeyValue::new("faas.trigger", "http"),
            KeyValue::new("faas.coldstart", coldstart),
        ];
        match error_type {
            Some(kind) => {
                attrs.push(KeyValue::new("error.type", kind));
                self.errors.add(1, &attrs);
            }
            None => self.invocations.add(1, &attrs),
        }
        self.duration.record(elapsed.as_secs_f64(), &attrs);
    }
}
