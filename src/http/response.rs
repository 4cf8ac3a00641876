//! In-memory response sink.
//!
//! Collects status and body written by the recovery stage and turns them into
//! an axum response.

use axum::{
    body::Body,
    http::{header, HeaderValue, StatusCode},
    response::Response,
};

use crate::recovery::{ResponseSink, SinkError};

/// A [`ResponseSink`] that buffers everything until converted into a response.
#[derive(Debug)]
pub struct BufferedSink {
    status: StatusCode,
    body: Vec<u8>,
    closed: bool,
}

impl BufferedSink {
    /// Empty sink with status 200, as a fresh response writer starts out.
    pub fn new() -> Self {
        Self {
            status: StatusCode::OK,
            body: Vec::new(),
            closed: false,
        }
    }

    /// Refuse further writes, as if the connection had gone away.
    pub fn close(&mut self) {
        self.closed = true;
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Build the response. A non-empty body is sent as plain text.
    pub fn into_response(self) -> Response {
        let has_body = !self.body.is_empty();
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = self.status;
        if has_body {
            response.headers_mut().insert(
                header::CONTENT_TYPE,
                HeaderValue::from_static("text/plain; charset=utf-8"),
            );
        }
        response
    }
}

impl Default for BufferedSink {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseSink for BufferedSink {
    fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), SinkError> {
        if self.closed {
            return Err(SinkError::Closed);
        }
        self.body.extend_from_slice(bytes);
        Ok(())
    }
}
