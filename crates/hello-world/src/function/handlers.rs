//! Request handler.

use common::{ProxyResponse, ServiceError};
use tracing::{field::Empty, info, Span};

use super::state::FunctionState;

/// Greet the caller by public IP.
///
/// Lookup failures are propagated unchanged so the runtime reports their
/// error type.
#[tracing::instrument(name = "lambdaHandlerSpan", skip_all, fields(otel.status_code = Empty))]
pub async fn hello(state: &FunctionState) -> Result<ProxyResponse, ServiceError> {
    let ip = state
        .lookup
        .caller_ip(state.telemetry.propagator())
        .await
        .inspect_err(|_| {
            Span::current().record("otel.status_code", "ERROR");
        })?;

    info!(ip = %ip, "caller IP resolved");
    Ok(ProxyResponse::greeting(&ip))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::function::lookup::tests::{checkip, local_lookup};
    use crate::function::state::tests::test_state;
    use axum::http::StatusCode;
    use opentelemetry_sdk::trace::SdkTracerProvider;

    #[tokio::test]
    async fn greets_caller() {
        let url = checkip(StatusCode::OK, "203.0.113.5\n").await;
        let state = test_state(local_lookup(&url), SdkTracerProvider::builder().build());

        let resp = hello(&state).await.unwrap();
        assert_eq!(resp.status_code, 200);
        assert_eq!(resp.body, "Hello, 203.0.113.5\n");
    }

    #[tokio::test]
    async fn propagates_lookup_error() {
        let url = checkip(StatusCode::BAD_GATEWAY, "").await;
        let state = test_state(local_lookup(&url), SdkTracerProvider::builder().build());

        let err = hello(&state).await.unwrap_err();
        assert_eq!(err.error_type(), "NonSuccessResponse");
    }
}
