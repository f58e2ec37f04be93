//! Carrier plumbing for moving span contexts across HTTP boundaries.
//!
//! The carrier is always an [`http::HeaderMap`], adapted to the
//! OpenTelemetry propagation traits through [`HeaderExtractor`] and
//! [`HeaderInjector`]. The wire encoding itself is chosen per backend:
//! the Jaeger path uses the `uber-trace-id` header format and the Zipkin
//! path uses the B3 multiple-header format implemented here.

mod b3;

pub use b3::B3Propagator;

#[doc(no_inline)]
pub use opentelemetry_http::{HeaderExtractor, HeaderInjector};
