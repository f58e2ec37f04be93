//! B3 multiple-header propagation:
//!
//! ```text
//! X-B3-TraceId: {trace_id}
//! X-B3-SpanId: {span_id}
//! X-B3-Sampled: {sampling_state}
//! X-B3-Flags: {debug_flag}
//! ```
//!
//! Header names are matched lower case; different transports disagree on
//! casing (HTTP uses `X-B3-$name`, gRPC uses `x-b3-$name`) and HTTP header
//! lookup is case insensitive anyway.

use opentelemetry::{
    propagation::{text_map_propagator::FieldIter, Extractor, Injector, TextMapPropagator},
    trace::{SpanContext, SpanId, TraceContextExt, TraceFlags, TraceId, TraceState},
    Context,
};

const B3_TRACE_ID_HEADER: &str = "x-b3-traceid";
const B3_SPAN_ID_HEADER: &str = "x-b3-spanid";
const B3_SAMPLED_HEADER: &str = "x-b3-sampled";
const B3_FLAGS_HEADER: &str = "x-b3-flags";

const TRACE_FLAG_DEBUG: TraceFlags = TraceFlags::new(0x04);

/// Extracts and injects `SpanContext`s using B3 multiple headers.
///
/// Extraction is lenient where the wild disagrees: trace ids may be 16 or 32
/// hex characters, the sampled header accepts `0`/`1` as well as the legacy
/// `false`/`true`, and a debug flag implies sampling. Any malformed field
/// aborts extraction so the caller can fall back to starting a root span.
#[derive(Clone, Debug)]
pub struct B3Propagator {
    fields: [String; 4],
}

impl Default for B3Propagator {
    fn default() -> Self {
        B3Propagator::new()
    }
}

impl B3Propagator {
    /// Create a B3 multiple-header propagator.
    pub fn new() -> Self {
        B3Propagator {
            fields: [
                B3_TRACE_ID_HEADER.to_string(),
                B3_SPAN_ID_HEADER.to_string(),
                B3_SAMPLED_HEADER.to_string(),
                B3_FLAGS_HEADER.to_string(),
            ],
        }
    }

    /// Extract a trace id from a hex encoded value.
    fn extract_trace_id(&self, trace_id: &str) -> Result<TraceId, ()> {
        // Only lower case hex is valid on the wire.
        if trace_id.to_lowercase() != trace_id || (trace_id.len() != 16 && trace_id.len() != 32) {
            return Err(());
        }
        u128::from_str_radix(trace_id, 16)
            .map(TraceId::from)
            .map_err(|_| ())
    }

    /// Extract a span id from a hex encoded value.
    fn extract_span_id(&self, span_id: &str) -> Result<SpanId, ()> {
        if span_id.to_lowercase() != span_id || span_id.len() != 16 {
            return Err(());
        }
        u64::from_str_radix(span_id, 16)
            .map(SpanId::from)
            .map_err(|_| ())
    }

    /// `true`/`false` are accepted for interop with legacy senders.
    fn extract_sampled_state(&self, sampled: &str) -> Result<TraceFlags, ()> {
        match sampled {
            "0" | "false" => Ok(TraceFlags::default()),
            "1" | "true" => Ok(TraceFlags::SAMPLED),
            _ => Err(()),
        }
    }

    fn extract_debug_flag(&self, debug: &str) -> Result<TraceFlags, ()> {
        match debug {
            "0" => Ok(TraceFlags::default()),
            // Debug implies sampled.
            "1" => Ok(TRACE_FLAG_DEBUG | TraceFlags::SAMPLED),
            _ => Err(()),
        }
    }

    fn extract_span_context(&self, extractor: &dyn Extractor) -> Result<SpanContext, ()> {
        let trace_id =
            self.extract_trace_id(extractor.get(B3_TRACE_ID_HEADER).unwrap_or(""))?;
        let span_id = self.extract_span_id(extractor.get(B3_SPAN_ID_HEADER).unwrap_or(""))?;
        let trace_flags = match extractor.get(B3_FLAGS_HEADER) {
            Some(debug) => self.extract_debug_flag(debug)?,
            None => match extractor.get(B3_SAMPLED_HEADER) {
                Some(sampled) => self.extract_sampled_state(sampled)?,
                None => TraceFlags::default(),
            },
        };

        let span_context =
            SpanContext::new(trace_id, span_id, trace_flags, true, TraceState::default());
        if span_context.is_valid() {
            Ok(span_context)
        } else {
            Err(())
        }
    }
}

impl TextMapPropagator for B3Propagator {
    fn inject_context(&self, cx: &Context, injector: &mut dyn Injector) {
        let span = cx.span();
        let span_context = span.span_context();
        if !span_context.is_valid() {
            return;
        }

        injector.set(B3_TRACE_ID_HEADER, span_context.trace_id().to_string());
        injector.set(B3_SPAN_ID_HEADER, span_context.span_id().to_string());
        if span_context.trace_flags() & TRACE_FLAG_DEBUG == TRACE_FLAG_DEBUG {
            injector.set(B3_FLAGS_HEADER, "1".to_string());
        } else if span_context.is_sampled() {
            injector.set(B3_SAMPLED_HEADER, "1".to_string());
        } else {
            injector.set(B3_SAMPLED_HEADER, "0".to_string());
        }
    }

    fn extract_with_context(&self, cx: &Context, extractor: &dyn Extractor) -> Context {
        self.extract_span_context(extractor)
            .map(|remote| cx.with_remote_span_context(remote))
            .unwrap_or_else(|_| cx.clone())
    }

    fn fields(&self) -> FieldIter<'_> {
        FieldIter::new(self.fields.as_slice())
    }
}
