//! Lambda resource detection.

use common::ServiceError;
use opentelemetry::{Array, KeyValue, StringValue, Value};
use opentelemetry_sdk::Resource;
use opentelemetry_semantic_conventions::resource::SERVICE_VERSION;

use crate::config::Config;

const CLOUD_PROVIDER: &str = "cloud.provider";
const CLOUD_PLATFORM: &str = "cloud.platform";
const CLOUD_REGION: &str = "cloud.region";
const FAAS_NAME: &str = "faas.name";
const FAAS_VERSION: &str = "faas.version";
const FAAS_INSTANCE: &str = "faas.instance";
const FAAS_MAX_MEMORY: &str = "faas.max_memory";
const AWS_LOG_GROUP_NAMES: &str = "aws.log.group.names";

/// Build the process [`Resource`] from the Lambda environment.
///
/// `service.name` is `OTEL_SERVICE_NAME` when set, otherwise the function
/// name. `faas.max_memory` is reported in bytes.
///
/// # Errors
///
/// Returns [`ServiceError::Setup`] when `AWS_LAMBDA_FUNCTION_NAME` is missing,
/// i.e. the process is not running inside Lambda.
pub fn detect(cfg: &Config) -> Result<Resource, ServiceError> {
    let function_name = cfg
        .aws_lambda_function_name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .ok_or_else(|| {
            ServiceError::Setup(
                "failed to detect lambda resources: AWS_LAMBDA_FUNCTION_NAME is not set".into(),
            )
        })?;

    let service_name = cfg
        .otel_service_name
        .clone()
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| function_name.to_owned());

    let mut attributes = vec![
        KeyValue::new(SERVICE_VERSION, env!("CARGO_PKG_VERSION")),
        KeyValue::new(CLOUD_PROVIDER, "aws"),
        KeyValue::new(CLOUD_PLATFORM, "aws_lambda"),
        KeyValue::new(FAAS_NAME, function_name.to_owned()),
    ];
    if let Some(region) = &cfg.aws_region {
        attributes.push(KeyValue::new(CLOUD_REGION, region.clone()));
    }
    if let Some(version) = &cfg.aws_lambda_function_version {
        attributes.push(KeyValue::new(FAAS_VERSION, version.clone()));
    }
    if let Some(stream) = &cfg.aws_lambda_log_stream_name {
        attributes.push(KeyValue::new(FAAS_INSTANCE, stream.clone()));
    }
    if let Some(mb) = cfg.aws_lambda_function_memory_size {
        let bytes = mb.saturating_mul(1024 * 1024);
        attributes.push(KeyValue::new(
            FAAS_MAX_MEMORY,
            i64::try_from(bytes).unwrap_or(i64::MAX),
        ));
    }
    if let Some(group) = &cfg.aws_lambda_log_group_name {
        attributes.push(KeyValue::new(
            AWS_LOG_GROUP_NAMES,
            Value::Array(Array::String(vec![StringValue::from(group.clone())])),
        ));
    }

    Ok(Resource::builder()
        .with_service_name(service_name)
        .with_attributes(attributes)
        .build())
}
