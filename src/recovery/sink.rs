//! Response sink abstraction used by the recovery stage.

use axum::http::StatusCode;

/// Error returned when a sink cannot accept the response.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    /// The underlying connection is gone.
    #[error("response sink closed")]
    Closed,

    /// I/O failure while writing.
    #[error("write failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Where a stage writes its response.
pub trait ResponseSink {
    /// Set the response status.
    fn set_status(&mut self, status: StatusCode);

    /// Append bytes to the response body.
    fn write(&mut self, bytes: &[u8]) -> Result<(), SinkError>;
}
