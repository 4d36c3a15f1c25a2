//! SDK interceptor that wraps every AWS operation in a client span.

use aws_smithy_runtime_api::box_error::BoxError;
use aws_smithy_runtime_api::client::interceptors::context::{
    BeforeSerializationInterceptorContextRef, FinalizerInterceptorContextRef,
};
use aws_smithy_runtime_api::client::interceptors::Intercept;
use aws_smithy_runtime_api::client::orchestrator::Metadata;
use aws_smithy_runtime_api::client::runtime_components::RuntimeComponents;
use aws_smithy_types::config_bag::{ConfigBag, Storable, StoreReplace};
use tracing::field::Empty;

/// Span of the operation in flight, parked in the interceptor state layer of
/// the operation's config bag between the first and last hook.
#[derive(Debug)]
struct OperationSpan(tracing::Span);

impl Storable for OperationSpan {
    type Storer = StoreReplace<Self>;
}

/// Opens a span named `<service>.<operation>` when an operation starts and
/// closes it once the orchestrator has a final result, retries included.
#[derive(Debug, Clone)]
pub struct TracingInterceptor {
    region: Option<String>,
}

impl TracingInterceptor {
    pub fn new(region: Option<String>) -> Self {
        Self { region }
    }
}

fn span_name(service: &str, operation: &str) -> String {
    format!("{service}.{operation}")
}

impl Intercept for TracingInterceptor {
    fn name(&self) -> &'static str {
        "TracingInterceptor"
    }

    fn read_before_execution(
        &self,
        _context: &BeforeSerializationInterceptorContextRef<'_>,
        cfg: &mut ConfigBag,
    ) -> Result<(), BoxError> {
        let (service, operation) = cfg
            .load::<Metadata>()
            .map(|m| (m.service().to_owned(), m.name().to_owned()))
            .unwrap_or_else(|| ("aws".to_owned(), "unknown".to_owned()));

        let span = tracing::info_span!(
            "aws.operation",
            otel.name = %span_name(&service, &operation),
            otel.kind = "client",
            otel.status_code = Empty,
            rpc.system = "aws-api",
            rpc.service = %service,
            rpc.method = %operation,
            cloud.region = self.region.as_deref().unwrap_or_default(),
            http.response.status_code = Empty,
        );
        cfg.interceptor_state().store_put(OperationSpan(span));
        Ok(())
    }

    fn read_after_execution(
        &self,
        context: &FinalizerInterceptorContextRef<'_>,
        _runtime_components: &RuntimeComponents,
        cfg: &mut ConfigBag,
    ) -> Result<(), BoxError> {
        if let Some(OperationSpan(span)) = cfg.load::<OperationSpan>() {
            if let Some(response) = context.response() {
                span.record("http.response.status_code", response.status().as_u16());
            }
            if matches!(context.output_or_error(), Some(Err(_))) {
                span.record("otel.status_code", "ERROR");
            }
        }
        // Dropping the stored handle closes the span.
        cfg.interceptor_state().unset::<OperationSpan>();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
    use aws_smithy_http_client::test_util::{ReplayEvent, StaticReplayClient};
    use aws_smithy_types::body::SdkBody;
    use opentelemetry::trace::TracerProvider as _;
    use opentelemetry_sdk::trace::{InMemorySpanExporter, SdkTracerProvider};
    use tracing_subscriber::layer::SubscriberExt;

    const LIST_BUCKETS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<ListAllMyBucketsResult xmlns="http://s3.amazonaws.com/doc/2006-03-01/">
  <Owner><ID>owner</ID><DisplayName>owner</DisplayName></Owner>
  <Buckets></Buckets>
</ListAllMyBucketsResult>"#;

    #[test]
    fn span_names_join_service_and_operation() {
        assert_eq!(span_name("s3", "ListBuckets"), "s3.ListBuckets");
    }

    #[tokio::test]
    async fn operations_through_instrumented_client_are_traced() {
        let exporter = InMemorySpanExporter::default();
        let provider = SdkTracerProvider::builder()
            .with_simple_exporter(exporter.clone())
            .build();
        let subscriber = tracing_subscriber::registry()
            .with(tracing_opentelemetry::layer().with_tracer(provider.tracer("test")));
        let _default = tracing::subscriber::set_default(subscriber);

        let http_client = StaticReplayClient::new(vec![ReplayEvent::new(
            http::Request::builder()
                .uri("https://s3.eu-west-1.amazonaws.com/?x-id=ListBuckets")
                .body(SdkBody::empty())
                .unwrap(),
            http::Response::builder()
                .status(200)
                .body(SdkBody::from(LIST_BUCKETS))
                .unwrap(),
        )]);
        let conf = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new("eu-west-1"))
            .credentials_provider(Credentials::new("AKID", "SECRET", None, None, "test"))
            .http_client(http_client)
            .interceptor(TracingInterceptor::new(Some("eu-west-1".into())))
            .build();
        let s3 = aws_sdk_s3::Client::from_conf(conf);

        let _ = s3.list_buckets().send().await;

        let spans = exporter.get_finished_spans().unwrap();
        let operation_spans: Vec<_> = spans
            .iter()
            .filter(|s| s.name.ends_with(".ListBuckets"))
            .collect();
        assert_eq!(operation_spans.len(), 1);
        let span = operation_spans[0];
        assert!(span
            .attributes
            .iter()
            .any(|kv| kv.key.as_str() == "rpc.system" && kv.value.as_str() == "aws-api"));
        assert!(span
            .attributes
            .iter()
            .any(|kv| kv.key.as_str() == "rpc.method" && kv.value.as_str() == "ListBuckets"));
    }
}
