//! Outbound lookup of the caller's public IP.

use std::time::Duration;

use common::ServiceError;
use opentelemetry::propagation::TextMapCompositePropagator;
use reqwest::{header::HeaderMap, StatusCode, Url};
use tracing::{field::Empty, warn, Span};

use crate::telemetry::propagation;

/// HTTP client bound to the IP lookup address.
///
/// Cloning shares the underlying connection pool.
#[derive(Debug, Clone)]
pub struct IpLookup {
    client: reqwest::Client,
    url: Url,
}

impl IpLookup {
    /// Build a lookup against `url` with a per-request `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Setup`] if the URL does not parse or the HTTP
    /// client cannot be constructed.
    pub fn new(url: &str, timeout: Duration) -> Result<Self, ServiceError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ServiceError::Setup(format!("failed to build HTTP client: {e}")))?;
        Self::with_client(client, url)
    }

    /// Use an already configured client.
    pub fn with_client(client: reqwest::Client, url: &str) -> Result<Self, ServiceError> {
        let url = Url::parse(url)
            .map_err(|e| ServiceError::Setup(format!("invalid IP lookup URL {url}: {e}")))?;
        Ok(Self { client, url })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// `GET` the lookup address and return the body as received.
    ///
    /// The active trace context is injected into the request headers.
    ///
    /// # Errors
    ///
    /// - [`ServiceError::Transport`] if the request or body read fails.
    /// - [`ServiceError::NonSuccessResponse`] for any status other than 200.
    /// - [`ServiceError::EmptyResponse`] if the body is empty.
    #[tracing::instrument(
        name = "getIpAddressSpan",
        skip_all,
        fields(
            otel.kind = "client",
            otel.status_code = Empty,
            http.request.method = "GET",
            url.full = %self.url,
            http.response.status_code = Empty,
            error.type = Empty,
        )
    )]
    pub async fn caller_ip(
        &self,
        propagator: &TextMapCompositePropagator,
    ) -> Result<String, ServiceError> {
        let result = self.fetch(propagator).await;
        if let Err(e) = &result {
            let span = Span::current();
            span.record("otel.status_code", "ERROR");
            span.record("error.type", e.error_type());
            warn!(error = %e, "IP lookup failed");
        }
        result
    }

    async fn fetch(&self, propagator: &TextMapCompositePropagator) -> Result<String, ServiceError> {
        let mut headers = HeaderMap::new();
        propagation::inject_current(propagator, &mut headers);

        let response = self
            .client
            .get(self.url.clone())
            .headers(headers)
            .send()
            .await
            .map_err(|e| ServiceError::Transport(e.to_string()))?;

        let status = response.status();
        Span::current().record("http.response.status_code", status.as_u16());
        if status != StatusCode::OK {
            return Err(ServiceError::NonSuccessResponse(status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ServiceError::Transport(e.to_string()))?;
        if body.is_empty() {
            return Err(ServiceError::EmptyResponse);
        }
        Ok(body)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::telemetry::propagation::composite;
    use axum::{http::StatusCode as AxumStatus, routing::get, Router};

    /// Serve `app` on an ephemeral loopback port; returns its base URL.
    pub(crate) async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/")
    }

    pub(crate) async fn checkip(status: AxumStatus, body: &'static str) -> String {
        serve(Router::new().route("/", get(move || async move { (status, body) }))).await
    }

    /// Lookup that ignores proxy settings from the environment.
    pub(crate) fn local_lookup(url: &str) -> IpLookup {
        let client = reqwest::Client::builder()
            .no_proxy()
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap();
        IpLookup::with_client(client, url).unwrap()
    }

    #[tokio::test]
    async fn returns_body_verbatim() {
        let url = checkip(AxumStatus::OK, "203.0.113.5\n").await;
        let ip = local_lookup(&url).caller_ip(&composite()).await.unwrap();
        assert_eq!(ip, "203.0.113.5\n");
    }

    #[tokio::test]
    async fn non_200_status_is_rejected() {
        let url = checkip(AxumStatus::SERVICE_UNAVAILABLE, "busy").await;
        let err = local_lookup(&url).caller_ip(&composite()).await.unwrap_err();
        assert!(matches!(err, ServiceError::NonSuccessResponse(503)));
    }

    #[tokio::test]
    async fn empty_body_is_rejected() {
        let url = checkip(AxumStatus::OK, "").await;
        let err = local_lookup(&url).caller_ip(&composite()).await.unwrap_err();
        assert!(matches!(err, ServiceError::EmptyResponse));
        assert_eq!(err.to_string(), "no IP in HTTP response");
    }

    #[tokio::test]
    async fn whitespace_body_is_not_empty() {
        let url = checkip(AxumStatus::OK, " \n").await;
        let ip = local_lookup(&url).caller_ip(&composite()).await.unwrap();
        assert_eq!(ip, " \n");
    }

    #[tokio::test]
    async fn connection_failure_is_a_transport_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = local_lookup(&format!("http://{addr}/"))
            .caller_ip(&composite())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Transport(_)));
        assert!(!err.to_string().is_empty());
    }

    #[test]
    fn malformed_url_fails_setup() {
        let err = IpLookup::new("checkip", Duration::from_secs(1)).unwrap_err();
        assert!(err.is_fatal());
    }
}
