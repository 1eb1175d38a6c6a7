//! Request ID handling.
//!
//! # Design Decisions
//! - `SetRequestIdLayer` assigns a UUID v4 unless the caller sent one
//! - `PropagateRequestIdLayer` echoes it on the response
//! - Handlers read it back from the headers for log correlation

use axum::body::Body;
use axum::http::{HeaderMap, HeaderName, Request};
use tracing::Span;

pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Request ID set by the middleware, or `"unknown"` outside of it.
pub fn request_id(headers: &HeaderMap) -> String {
    headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string()
}

/// Span for `TraceLayer` carrying the request ID.
pub fn make_request_span(request: &Request<Body>) -> Span {
    tracing::info_span!(
        "request",
        method = %request.method(),
        uri = %request.uri(),
        request_id = %request_id(request.headers()),
    )
}
