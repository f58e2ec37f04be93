use thiserror::Error;

/// Errors returned when a tracer backend cannot be constructed.
///
/// Initialization failures are fatal to the init call but not to the
/// process; nothing is registered when an error is returned.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum InitError {
    /// The span exporter could not be built from the given configuration,
    /// e.g. a malformed collector endpoint.
    #[error("failed to build span exporter: {0}")]
    Exporter(String),
}

/// Errors returned when a span context cannot be written to a carrier.
///
/// Injection is a single synchronous attempt; on failure the caller decides
/// whether to proceed without trace propagation.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum InjectError {
    /// The span carries no valid context, so there is nothing to propagate.
    #[error("span context is not valid; nothing to inject")]
    InvalidSpanContext,
}
