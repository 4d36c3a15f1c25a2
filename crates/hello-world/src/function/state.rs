//! State shared by every invocation handled by this process.

use std::sync::atomic::{AtomicBool, Ordering};

use common::ServiceError;

use super::lookup::IpLookup;
use crate::aws::AwsClients;
use crate::config::Config;
use crate::telemetry::{InvocationMetrics, Telemetry};

/// Handler state, built once at startup and shared behind an `Arc`.
pub struct FunctionState {
    pub lookup: IpLookup,
    pub telemetry: Telemetry,
    pub metrics: InvocationMetrics,
    /// Instrumented AWS clients. The handler makes no AWS calls itself.
    pub aws: AwsClients,
    /// Reported as the invocation span name.
    pub function_name: String,
    coldstart: AtomicBool,
}

impl FunctionState {
    /// Assemble the state from validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Setup`] if the HTTP client cannot be built.
    pub fn new(cfg: &Config, telemetry: Telemetry, aws: AwsClients) -> Result<Self, ServiceError> {
        let lookup = IpLookup::new(&cfg.checkip_url, cfg.http_timeout())?;
        Ok(Self::with_lookup(cfg, lookup, telemetry, aws))
    }

    pub fn with_lookup(
        cfg: &Config,
        lookup: IpLookup,
        telemetry: Telemetry,
        aws: AwsClients,
    ) -> Self {
        let metrics = InvocationMetrics::new(telemetry.meter_provider(), env!("CARGO_PKG_NAME"));
        let function_name = cfg
            .aws_lambda_function_name
            .clone()
            .unwrap_or_else(|| env!("CARGO_PKG_NAME").to_owned());
        Self {
            lookup,
            telemetry,
            metrics,
            aws,
            function_name,
            coldstart: AtomicBool::new(true),
        }
    }

    /// `true` for the first invocation served by this process only.
    pub fn take_coldstart(&self) -> bool {
        self.coldstart.swap(false, Ordering::Relaxed)
    }
}
