//! Axum middleware deciding the request id for each inbound request.

use std::time::Instant;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use tracing::Instrument;

use crate::config::RequestIdSettings;
use crate::context;
use crate::id::RequestId;

/// Resolve, bind and echo the request id.
///
/// 1. Adopt the configured header verbatim if it is present, non-empty and
///    UTF-8, otherwise generate a UUID v4
/// 2. Write the id back onto the inbound headers (when it was generated) and
///    into the request extensions, so handlers can take `Extension<RequestId>`
/// 3. Run the rest of the chain inside a request scope with the id bound,
///    instrumented with a `request` span
/// 4. Set the header on the response, replacing any value set by the handler
///
/// Never fails the request: binding or header encoding problems are logged
/// and skipped.
pub async fn request_id_middleware(
    State(settings): State<RequestIdSettings>,
    mut request: Request,
    next: Next,
) -> Response {
    let header_name = settings.header_name().clone();

    let adopted = request
        .headers()
        .get(&header_name)
        .and_then(RequestId::from_header);
    let adopted_from_header = adopted.is_some();
    let request_id = adopted.unwrap_or_else(RequestId::generate);

    if !adopted_from_header {
        match request_id.to_header_value() {
            Ok(value) => {
                request.headers_mut().insert(header_name.clone(), value);
            }
            Err(e) => {
                tracing::warn!(error = %e, header = %header_name, "Failed to set request id on inbound headers");
            }
        }
    }
    request.extensions_mut().insert(request_id.clone());

    let span = reqlog_tracing::request_span!(request_id, request.method(), request.uri().path());
    let inbound = request.headers().clone();
    let start = Instant::now();

    let bound_id = request_id.clone();
    let mut response = context::scope(
        inbound,
        async move {
            if let Err(e) = context::bind(bound_id) {
                tracing::warn!(error = %e, "Failed to bind request id, log records fall back to the inbound header");
            }
            tracing::debug!(adopted = adopted_from_header, "Request id resolved");
            next.run(request).await
        }
        .instrument(span.clone()),
    )
    .await;

    span.record("status", u64::from(response.status().as_u16()));
    span.record("latency_ms", start.elapsed().as_millis() as u64);

    match request_id.to_header_value() {
        Ok(value) => {
            response.headers_mut().insert(header_name, value);
        }
        Err(e) => {
            tracing::warn!(error = %e, header = %header_name, "Failed to set request id on response headers");
        }
    }

    response
}
