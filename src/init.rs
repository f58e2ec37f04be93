//! Tracer backend initialization.
//!
//! Exactly one backend is expected to be configured per process. Both init
//! paths register the tracer provider globally (a second call replaces the
//! first; last writer wins) so third-party instrumentation interoperates,
//! but the returned [`RequestTracer`] is the capability the rest of the
//! process should use — no helper in this crate reads the global back. There
//! is no teardown; the tracer lives as long as the process.

#[cfg(feature = "zipkin")]
use std::net::SocketAddr;
#[cfg(feature = "jaeger")]
use std::time::Duration;

use opentelemetry::propagation::TextMapPropagator;
use opentelemetry::{global, KeyValue};
#[cfg(feature = "jaeger")]
use opentelemetry_sdk::trace::{BatchConfigBuilder, BatchSpanProcessor};
use opentelemetry_sdk::trace::{Sampler, TracerProvider};
use opentelemetry_sdk::{runtime, Resource};
use opentelemetry_semantic_conventions::attribute::SERVICE_NAME;

use crate::error::InitError;
use crate::tracer::RequestTracer;

/// Where and how finished spans are reported to Jaeger.
#[cfg(feature = "jaeger")]
#[derive(Clone, Debug)]
pub struct ReporterConfig {
    /// OTLP/gRPC endpoint spans are exported to.
    pub endpoint: String,
    /// Per-export request timeout.
    pub timeout: Duration,
    /// Maximum number of finished spans queued before drops occur.
    pub max_queue_size: usize,
    /// Delay between consecutive batch exports.
    pub scheduled_delay: Duration,
    /// Maximum number of spans sent in one export request.
    pub max_export_batch_size: usize,
}

#[cfg(feature = "jaeger")]
impl Default for ReporterConfig {
    fn default() -> Self {
        ReporterConfig {
            endpoint: "http://localhost:4317".to_owned(),
            timeout: Duration::from_secs(10),
            max_queue_size: 2048,
            scheduled_delay: Duration::from_secs(5),
            max_export_batch_size: 512,
        }
    }
}

/// Build and register a Jaeger-bound tracer for `component_name`.
///
/// Spans are exported over OTLP/gRPC, which current Jaeger ingests natively,
/// batched according to `reporter`. The sampler is passed through untouched.
/// The returned tracer propagates contexts in the Jaeger `uber-trace-id`
/// header format.
///
/// Must be called within a Tokio runtime; the batch exporter drives its
/// network I/O there. On error nothing is registered and the process keeps
/// whatever tracer it had before.
#[cfg(feature = "jaeger")]
pub fn init_jaeger(
    component_name: &str,
    sampler: Sampler,
    reporter: ReporterConfig,
) -> Result<RequestTracer<opentelemetry_sdk::trace::Tracer>, InitError> {
    use opentelemetry_otlp::WithExportConfig;

    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(reporter.endpoint.clone())
        .with_timeout(reporter.timeout)
        .build()
        .map_err(|err| InitError::Exporter(err.to_string()))?;
    let batch_config = BatchConfigBuilder::default()
        .with_max_queue_size(reporter.max_queue_size)
        .with_scheduled_delay(reporter.scheduled_delay)
        .with_max_export_batch_size(reporter.max_export_batch_size)
        .build();
    let processor = BatchSpanProcessor::builder(exporter, runtime::Tokio)
        .with_batch_config(batch_config)
        .build();
    let provider = TracerProvider::builder()
        .with_span_processor(processor)
        .with_sampler(sampler)
        .with_resource(resource(component_name))
        .build();

    Ok(register(
        provider,
        opentelemetry_jaeger_propagator::Propagator::new(),
        component_name,
    ))
}

/// Build and register a Zipkin-bound tracer for `component_name`.
///
/// Spans are recorded against the given `collector` endpoint (e.g.
/// `http://localhost:9411/api/v2/spans`), with `local_addr` reported as the
/// local service endpoint when given. The sampler is passed through
/// untouched. The returned tracer propagates contexts in the B3
/// multiple-header format.
///
/// Must be called within a Tokio runtime. Same error contract as
/// [`init_jaeger`].
#[cfg(feature = "zipkin")]
pub fn init_zipkin(
    collector: &str,
    sampler: Sampler,
    local_addr: Option<SocketAddr>,
    component_name: &str,
) -> Result<RequestTracer<opentelemetry_sdk::trace::Tracer>, InitError> {
    let mut pipeline = opentelemetry_zipkin::new_pipeline()
        .with_service_name(component_name.to_owned())
        .with_collector_endpoint(collector);
    if let Some(addr) = local_addr {
        pipeline = pipeline.with_service_address(addr);
    }
    let exporter = pipeline
        .init_exporter()
        .map_err(|err| InitError::Exporter(err.to_string()))?;
    let provider = TracerProvider::builder()
        .with_batch_exporter(exporter, runtime::Tokio)
        .with_sampler(sampler)
        .with_resource(resource(component_name))
        .build();

    Ok(register(
        provider,
        crate::propagation::B3Propagator::new(),
        component_name,
    ))
}

fn resource(component_name: &str) -> Resource {
    Resource::new([KeyValue::new(SERVICE_NAME, component_name.to_owned())])
}

fn register(
    provider: TracerProvider,
    propagator: impl TextMapPropagator + Send + Sync + 'static,
    component_name: &str,
) -> RequestTracer<opentelemetry_sdk::trace::Tracer> {
    use opentelemetry::trace::TracerProvider as _;

    let tracer = provider.tracer(env!("CARGO_PKG_NAME"));
    global::set_tracer_provider(provider);
    tracing::debug!(component = component_name, "registered tracer provider");
    RequestTracer::new(tracer, propagator)
}
