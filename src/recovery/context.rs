//! Per-request state seen by the recovery stage.

/// Request data the stage reads, plus the flag it may set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    /// Host the request was addressed to, used for log correlation.
    pub host: String,

    /// Correlation ID, when the pipeline assigned one.
    pub request_id: Option<String>,

    /// Set after a recovered panic: the transport must not reuse the connection.
    pub close_connection: bool,
}

impl RequestContext {
    /// Context for a request to `host`.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            request_id: None,
            close_connection: false,
        }
    }

    /// Attach a request ID.
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }
}
