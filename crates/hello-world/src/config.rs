//! Configuration loading and validation for the function.
//!
//! All values are read from environment variables at startup. The Lambda
//! runtime supplies the `AWS_*` variables; everything else has a default. The
//! process exits with a clear error message if a value is present but invalid.

use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Validated function configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// OTLP/gRPC collector endpoint shared by all three signals.
    #[serde(default = "default_otlp_endpoint")]
    pub otel_exporter_otlp_endpoint: String,

    /// Overrides `service.name`; falls back to the function name.
    #[serde(default)]
    pub otel_service_name: Option<String>,

    /// Instrumentation scope name of the tracer handed to the span bridge.
    #[serde(default = "default_tracer_name")]
    pub tracer_name: String,

    /// Address returning the caller's public IP as a plain-text body.
    #[serde(default = "default_checkip_url")]
    pub checkip_url: String,

    /// Timeout (seconds) applied to the outbound IP lookup.
    #[serde(default = "default_http_timeout")]
    pub http_timeout_secs: u64,

    /// Tracing log level (e.g. `"info"`, `"debug"`).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Path of the collector configuration shipped alongside the function.
    #[serde(default)]
    pub opentelemetry_collector_config_file: Option<String>,

    /// Set by Lambda. Resource detection fails without it.
    #[serde(default)]
    pub aws_lambda_function_name: Option<String>,

    #[serde(default)]
    pub aws_lambda_function_version: Option<String>,

    #[serde(default)]
    pub aws_lambda_function_memory_size: Option<u64>,

    #[serde(default)]
    pub aws_lambda_log_group_name: Option<String>,

    #[serde(default)]
    pub aws_lambda_log_stream_name: Option<String>,

    #[serde(default)]
    pub aws_region: Option<String>,
}

fn default_otlp_endpoint() -> String {
    "http://localhost:4317".into()
}
fn default_tracer_name() -> String {
    "hello-world".into()
}
fn default_checkip_url() -> String {
    "http://checkip.amazonaws.com/".into()
}
fn default_http_timeout() -> u64 {
    10
}
fn default_log_level() -> String {
    "info".into()
}

impl Config {
    /// Load and validate configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable cannot be parsed or fails validation.
    pub fn from_env() -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(config::Environment::default())
            .build()
            .context("failed to build configuration from environment")?;

        let c: Config = cfg
            .try_deserialize()
            .context("failed to deserialise configuration")?;

        c.validate()?;
        Ok(c)
    }

    /// Outbound request timeout.
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    /// Validate all fields, returning a descriptive error on the first failure.
    fn validate(&self) -> Result<()> {
        ensure_non_empty(&self.otel_exporter_otlp_endpoint, "OTEL_EXPORTER_OTLP_ENDPOINT")?;
        ensure_non_empty(&self.tracer_name, "TRACER_NAME")?;
        ensure_non_empty(&self.checkip_url, "CHECKIP_URL")?;

        reqwest::Url::parse(&self.checkip_url)
            .with_context(|| format!("CHECKIP_URL is not a valid URL: {}", self.checkip_url))?;

        if self.http_timeout_secs == 0 {
            anyhow::bail!("HTTP_TIMEOUT_SECS must be > 0");
        }
        Ok(())
    }
}

fn ensure_non_empty(value: &str, name: &str) -> Result<()> {
    if value.trim().is_empty() {
        anyhow::bail!("{name} must not be empty");
    }
    Ok(())
}
