//! Panic recovery subsystem.
//!
//! # Data Flow
//! ```text
//! next stage runs under supervise()
//!     → Outcome::Completed      → nothing else to do
//!     → Outcome::Failed(payload)
//!         → classify.rs (sentinel or defect?)
//!         → ExpectedDisconnect  → PeerDisconnected, re-raised to the transport
//!         → UnexpectedError     → payload.rs (coerce to PanicError, take PanicSite)
//!                               → log "panic-check"
//!                               → sink.rs (500 + fixed body)
//!                               → close_connection = true
//! ```
//!
//! # Design Decisions
//! - The sentinel is matched by payload type, never by message text
//! - The stage holds no handle to the process health signal
//! - No state survives between requests; everything per-request lives in
//!   `RequestContext` and `CapturedFailure`

pub mod classify;
pub mod context;
pub mod payload;
pub mod sink;
pub mod stage;

pub use classify::{classify, Classification};
pub use context::RequestContext;
pub use payload::{abort_handler, coerce, AbortHandler, PanicError, PanicPayload, PanicSite};
pub use sink::{ResponseSink, SinkError};
pub use stage::{
    supervise, supervise_future, CapturedFailure, Outcome, PeerDisconnected, RecoveryStage,
    PANIC_RESPONSE_BODY,
};
