//! Span builder helpers for request instrumentation.

/// Create the top-level span for one inbound request.
///
/// Usage: `next.run(req).instrument(request_span!(id, method, path))`
///
/// Fields recorded later:
/// - `status`: response status code
/// - `latency_ms`: milliseconds spent in the inner handler chain
#[macro_export]
macro_rules! request_span {
    ($request_id:expr, $method:expr, $path:expr) => {
        tracing::info_span!(
            "request",
            request_id = %$request_id,
            method = %$method,
            path = %$path,
            status = tracing::field::Empty,
            latency_ms = tracing::field::Empty,
        )
    };
}
