use std::borrow::Cow;
use std::fmt;

use http::Request;
use opentelemetry::propagation::TextMapPropagator;
use opentelemetry::trace::{
    Link, Span, SpanBuilder, SpanContext, SpanKind, TraceContextExt, Tracer,
};
use opentelemetry::Context;
use opentelemetry_http::{HeaderExtractor, HeaderInjector};

use crate::error::InjectError;
use crate::tags::{request_attributes, HeaderTagMap};

/// Carries the current parent span across a logical call chain.
///
/// A scope is request-scoped state threaded through function calls so that
/// deeper layers can relate their spans to the request's span without taking
/// it as a parameter everywhere. The parent is a typed optional field; a
/// scope with no parent, or one holding an invalid (all-zero) context, makes
/// the scope-based helpers degrade to root spans.
#[derive(Clone, Debug, Default)]
pub struct TraceScope {
    parent: Option<SpanContext>,
}

impl TraceScope {
    /// A scope with no parent recorded.
    pub fn new() -> Self {
        Self::default()
    }

    /// A scope whose spans will be related to `parent`.
    pub fn with_parent(parent: SpanContext) -> Self {
        TraceScope {
            parent: Some(parent),
        }
    }

    /// A scope parented on `span`.
    pub fn from_span(span: &impl Span) -> Self {
        Self::with_parent(span.span_context().clone())
    }

    /// Replace the recorded parent.
    pub fn set_parent(&mut self, parent: SpanContext) {
        self.parent = Some(parent);
    }

    /// The recorded parent, if one is present and valid.
    pub fn parent(&self) -> Option<&SpanContext> {
        self.parent.as_ref().filter(|parent| parent.is_valid())
    }
}

/// Creates spans for HTTP requests and moves their contexts across process
/// boundaries.
///
/// A `RequestTracer` owns the tracer it starts spans with and the
/// [`TextMapPropagator`] that defines the header wire format, so span
/// creation never consults process-global state. Construct one at startup
/// (usually through [`init_jaeger`](crate::init_jaeger) or
/// [`init_zipkin`](crate::init_zipkin)) and pass it to every component that
/// creates spans.
///
/// All helpers are total with respect to inbound data: malformed carriers
/// and missing parents degrade to root spans rather than erroring, because
/// tracing must never block business logic. Callers own the returned spans
/// and are responsible for ending them.
pub struct RequestTracer<T> {
    tracer: T,
    propagator: Box<dyn TextMapPropagator + Send + Sync>,
    header_tags: HeaderTagMap,
}

impl<T> fmt::Debug for RequestTracer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestTracer")
            .field("header_tags", &self.header_tags)
            .finish_non_exhaustive()
    }
}

impl<T: Tracer> RequestTracer<T> {
    /// Create a tracer capability from a tracer and the propagation format
    /// used on the wire.
    pub fn new(tracer: T, propagator: impl TextMapPropagator + Send + Sync + 'static) -> Self {
        RequestTracer {
            tracer,
            propagator: Box::new(propagator),
            header_tags: HeaderTagMap::new(),
        }
    }

    /// Attach `header_tags` to every span this tracer creates.
    pub fn with_header_tags(mut self, header_tags: HeaderTagMap) -> Self {
        self.header_tags = header_tags;
        self
    }

    fn builder<B>(&self, name: impl Into<Cow<'static, str>>, req: &Request<B>) -> SpanBuilder {
        self.tracer
            .span_builder(name)
            .with_attributes(request_attributes(req, &self.header_tags))
    }

    /// Start a span for an inbound request.
    ///
    /// When the request headers carry a valid span context the new span
    /// becomes a child of that remote context with [`SpanKind::Server`];
    /// otherwise a root span is started. A missing or malformed carrier is
    /// swallowed, never surfaced.
    pub fn span_from_request<B>(
        &self,
        name: impl Into<Cow<'static, str>>,
        req: &Request<B>,
    ) -> T::Span {
        let parent_cx = self
            .propagator
            .extract_with_context(&Context::new(), &HeaderExtractor(req.headers()));
        if parent_cx.span().span_context().is_valid() {
            let builder = self.builder(name, req).with_kind(SpanKind::Server);
            self.tracer.build_with_context(builder, &parent_cx)
        } else {
            tracing::trace!("no valid span context on inbound request; starting a root span");
            self.root_span(name, req)
        }
    }

    /// Start a span with no parent.
    pub fn root_span<B>(&self, name: impl Into<Cow<'static, str>>, req: &Request<B>) -> T::Span {
        self.tracer
            .build_with_context(self.builder(name, req), &Context::new())
    }

    /// Start a span as a child of `parent`.
    ///
    /// The parent blocks on the new span's completion; use
    /// [`follows_from_span`](Self::follows_from_span) when it does not.
    pub fn child_span<B>(
        &self,
        name: impl Into<Cow<'static, str>>,
        parent: &SpanContext,
        req: &Request<B>,
    ) -> T::Span {
        let parent_cx = Context::new().with_remote_span_context(parent.clone());
        self.tracer
            .build_with_context(self.builder(name, req), &parent_cx)
    }

    /// Start a span as a child of the parent recorded in `scope`.
    ///
    /// A missing scope or an absent or invalid parent degrades to a root
    /// span; this never errors.
    pub fn child_span_from_scope<B>(
        &self,
        name: impl Into<Cow<'static, str>>,
        scope: Option<&TraceScope>,
        req: &Request<B>,
    ) -> T::Span {
        match scope.and_then(TraceScope::parent) {
            Some(parent) => self.child_span(name, parent, req),
            None => {
                tracing::trace!("no parent span recorded in scope; starting a root span");
                self.root_span(name, req)
            }
        }
    }

    /// Start a span that is causally related to `parent` without the parent
    /// waiting on its completion, e.g. async side effects or background
    /// fan-out.
    ///
    /// OpenTelemetry has no first-class follows-from reference: the parent
    /// is kept for trace continuity and the non-blocking relationship is
    /// recorded as a span [`Link`] to the parent context. The attributes are
    /// identical to [`child_span`](Self::child_span); only this relationship
    /// metadata differs.
    pub fn follows_from_span<B>(
        &self,
        name: impl Into<Cow<'static, str>>,
        parent: &SpanContext,
        req: &Request<B>,
    ) -> T::Span {
        let parent_cx = Context::new().with_remote_span_context(parent.clone());
        let builder = self
            .builder(name, req)
            .with_links(vec![Link::with_context(parent.clone())]);
        self.tracer.build_with_context(builder, &parent_cx)
    }

    /// [`follows_from_span`](Self::follows_from_span) with the parent taken
    /// from `scope`, degrading to a root span when no valid parent is
    /// recorded.
    pub fn follows_from_span_from_scope<B>(
        &self,
        name: impl Into<Cow<'static, str>>,
        scope: Option<&TraceScope>,
        req: &Request<B>,
    ) -> T::Span {
        match scope.and_then(TraceScope::parent) {
            Some(parent) => self.follows_from_span(name, parent, req),
            None => {
                tracing::trace!("no parent span recorded in scope; starting a root span");
                self.root_span(name, req)
            }
        }
    }

    /// Write `span`'s context into the outbound request headers.
    ///
    /// A single synchronous attempt with no retries. Errs when the span
    /// carries no valid context (e.g. it came from a no-op tracer); the
    /// caller decides whether to send the request without propagation.
    pub fn inject_span<S: Span, B>(
        &self,
        span: &S,
        req: &mut Request<B>,
    ) -> Result<(), InjectError> {
        let span_context = span.span_context();
        if !span_context.is_valid() {
            tracing::debug!("refusing to inject an invalid span context");
            return Err(InjectError::InvalidSpanContext);
        }
        let cx = Context::new().with_remote_span_context(span_context.clone());
        self.propagator
            .inject_context(&cx, &mut HeaderInjector(req.headers_mut()));
        Ok(())
    }
}
