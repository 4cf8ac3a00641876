//! Failure classification.

use crate::recovery::payload::{AbortHandler, PanicPayload};

/// How an intercepted panic should be treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// The handler was aborted because the peer went away. Re-raised, never logged.
    ExpectedDisconnect,
    /// Anything else: a genuine defect in a downstream stage.
    UnexpectedError,
}

/// Classify a panic payload.
///
/// Only a payload whose concrete type is [`AbortHandler`] counts as a
/// disconnect. A string or error that merely prints the same text is a defect.
///
/// Takes the boxed payload rather than `&dyn Any` so that a caller cannot
/// accidentally hand over the `Box` itself as the `Any` value.
pub fn classify(payload: &PanicPayload) -> Classification {
    if payload.is::<AbortHandler>() {
        Classification::ExpectedDisconnect
    } else {
        Classification::UnexpectedError
    }
}
