//! Span creation and context propagation helpers for HTTP services.
//!
//! This crate sits between an HTTP handling layer and an OpenTelemetry
//! tracer. It decides how a new span relates to whatever came before it —
//! a root span, a child of a remote caller, a child of an in-process parent,
//! or a non-blocking follows-from span — and moves span contexts across
//! process boundaries through request headers.
//!
//! The tracer backend is configured once at startup with [`init_jaeger`] or
//! [`init_zipkin`] and handed around as an explicit [`RequestTracer`]
//! capability; the helpers never consult process-global state on the request
//! path. Tracing is best effort throughout: a missing or malformed inbound
//! context degrades to a root span and never surfaces an error to business
//! logic.
//!
//! # Examples
//!
//! ```no_run
//! use opentelemetry::trace::Span;
//! use reqtrace::{init_jaeger, ReporterConfig, Sampler};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let tracer = init_jaeger("checkout", Sampler::AlwaysOn, ReporterConfig::default())?;
//!
//!     let inbound: http::Request<()> = http::Request::builder()
//!         .method("GET")
//!         .uri("http://checkout:8080/carts/42")
//!         .body(())?;
//!     let mut span = tracer.span_from_request("get_cart", &inbound);
//!
//!     // Propagate the span to a downstream service.
//!     let mut outbound: http::Request<()> = http::Request::builder()
//!         .method("GET")
//!         .uri("http://inventory:8080/stock/42")
//!         .body(())?;
//!     tracer.inject_span(&span, &mut outbound)?;
//!
//!     span.end();
//!     Ok(())
//! }
//! ```
#![warn(
    future_incompatible,
    missing_debug_implementations,
    missing_docs,
    nonstandard_style,
    rust_2018_idioms,
    unreachable_pub,
    unused
)]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

mod error;
#[cfg(any(feature = "jaeger", feature = "zipkin"))]
mod init;
mod tags;
mod tracer;

pub mod propagation;

pub use error::{InitError, InjectError};
pub use tags::HeaderTagMap;
pub use tracer::{RequestTracer, TraceScope};

#[cfg(feature = "jaeger")]
pub use init::{init_jaeger, ReporterConfig};
#[cfg(feature = "zipkin")]
pub use init::init_zipkin;

#[doc(no_inline)]
pub use opentelemetry_sdk::trace::Sampler;
