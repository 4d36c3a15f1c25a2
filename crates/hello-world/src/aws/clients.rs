//! AWS SDK configuration loading and instrumented client construction.

use anyhow::{bail, Result};
use aws_config::{BehaviorVersion, SdkConfig};

use super::interceptor::TracingInterceptor;

/// Shared AWS configuration plus the clients built from it.
///
/// Every client carries a [`TracingInterceptor`], so calls made through them
/// show up as child spans of whatever span is current.
#[derive(Clone)]
pub struct AwsClients {
    config: SdkConfig,
    /// S3 client carrying the [`TracingInterceptor`]. The greeting handler
    /// makes no AWS calls, so nothing reads it outside tests.
    #[allow(dead_code)]
    pub s3: aws_sdk_s3::Client,
}

impl AwsClients {
    /// Load the default AWS configuration chain and build instrumented clients.
    ///
    /// Inside Lambda, region and credentials come from the environment the
    /// runtime injects.
    ///
    /// # Errors
    ///
    /// Returns an error if no region or no credentials provider can be
    /// resolved.
    pub async fn init() -> Result<Self> {
        let config = aws_config::defaults(BehaviorVersion::latest()).load().await;
        Self::from_config(config)
    }

    /// Validate an already-loaded configuration and build the clients.
    pub fn from_config(config: SdkConfig) -> Result<Self> {
        let Some(region) = config.region() else {
            bail!("failed to load AWS config: no region configured");
        };
        if config.credentials_provider().is_none() {
            bail!("failed to load AWS config: no credentials provider");
        }

        let interceptor = TracingInterceptor::new(Some(region.to_string()));
        let s3 = aws_sdk_s3::Client::from_conf(
            aws_sdk_s3::config::Builder::from(&config)
                .interceptor(interceptor)
                .build(),
        );

        Ok(Self { config, s3 })
    }

    /// Region the clients resolve endpoints in.
    pub fn region(&self) -> Option<&str> {
        self.config.region().map(|r| r.as_ref())
    }
}
