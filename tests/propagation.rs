//! End-to-end propagation across a simulated process boundary: an upstream
//! service injects its span context into an outbound request, a downstream
//! service extracts it and continues the trace.

use http::Request;
use opentelemetry::trace::{Span, SpanId, TracerProvider as _};
use opentelemetry_sdk::testing::trace::InMemorySpanExporter;
use opentelemetry_sdk::trace::TracerProvider;
use reqtrace::propagation::B3Propagator;
use reqtrace::{HeaderTagMap, RequestTracer};

fn service(
    exporter: &InMemorySpanExporter,
) -> (RequestTracer<opentelemetry_sdk::trace::Tracer>, TracerProvider) {
    let provider = TracerProvider::builder()
        .with_simple_exporter(exporter.clone())
        .build();
    let tracer = provider.tracer("propagation-test");
    (RequestTracer::new(tracer, B3Propagator::new()), provider)
}

fn request(uri: &str) -> Request<()> {
    Request::builder().method("GET").uri(uri).body(()).unwrap()
}

#[test]
fn trace_continues_across_process_boundary() {
    let upstream_exporter = InMemorySpanExporter::default();
    let downstream_exporter = InMemorySpanExporter::default();
    let (upstream, _up_provider) = service(&upstream_exporter);
    let (downstream, _down_provider) = service(&downstream_exporter);

    // Upstream handles a request and calls downstream.
    let mut upstream_span = upstream.span_from_request("frontend", &request("/checkout"));
    let mut outbound = request("http://cart:8080/items");
    upstream.inject_span(&upstream_span, &mut outbound).unwrap();
    upstream_span.end();

    // Downstream receives the outbound request as its inbound one.
    let mut downstream_span = downstream.span_from_request("cart", &outbound);
    downstream_span.end();

    let upstream_spans = upstream_exporter.get_finished_spans().unwrap();
    let downstream_spans = downstream_exporter.get_finished_spans().unwrap();
    assert_eq!(upstream_spans.len(), 1);
    assert_eq!(downstream_spans.len(), 1);

    // Root on the upstream side, continued on the downstream side.
    assert_eq!(upstream_spans[0].parent_span_id, SpanId::INVALID);
    assert_eq!(
        downstream_spans[0].span_context.trace_id(),
        upstream_spans[0].span_context.trace_id()
    );
    assert_eq!(
        downstream_spans[0].parent_span_id,
        upstream_spans[0].span_context.span_id()
    );
}

#[test]
fn header_tags_travel_with_every_creation_path() {
    let exporter = InMemorySpanExporter::default();
    let (tracer, _provider) = service(&exporter);
    let tracer = tracer.with_header_tags(
        HeaderTagMap::new().map(http::header::HeaderName::from_static("x-tenant-id"), "tenant.id"),
    );

    let mut req = request("http://cart:8080/items");
    req.headers_mut()
        .insert("x-tenant-id", "acme".parse().unwrap());

    let mut root = tracer.root_span("root", &req);
    let parent = root.span_context().clone();
    root.end();
    let mut child = tracer.child_span("child", &parent, &req);
    child.end();

    let spans = exporter.get_finished_spans().unwrap();
    for span in &spans {
        assert!(
            span.attributes
                .iter()
                .any(|kv| kv.key.as_str() == "tenant.id"),
            "span {} is missing the tenant tag",
            span.name
        );
    }
}
