//! Request inspection.
//!
//! # Responsibilities
//! - Extract the host used for log correlation
//! - Pick up the request ID assigned by the request-id layer

use axum::http::{header::HOST, HeaderName, Request};

use crate::recovery::RequestContext;

/// Header carrying the request correlation ID.
pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

impl RequestContext {
    /// Build the context for an incoming request.
    ///
    /// The host comes from the `Host` header, falling back to the URI
    /// authority (HTTP/2 requests carry it there).
    pub fn from_request<B>(request: &Request<B>) -> Self {
        let host = request
            .headers()
            .get(HOST)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned)
            .or_else(|| request.uri().authority().map(ToString::to_string))
            .unwrap_or_default();

        let request_id = request
            .headers()
            .get(&X_REQUEST_ID)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);

        Self {
            host,
            request_id,
            close_connection: false,
        }
    }
}
