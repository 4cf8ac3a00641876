//! Panic recovery boundary for axum/tower HTTP pipelines.
//!
//! A panic escaping any downstream stage is answered with a fixed 500 and a
//! closed connection instead of taking the connection task down silently. A
//! handler that wants to abort because its peer disconnected calls
//! [`recovery::abort_handler`]; that one keeps unwinding to the transport.

pub mod config;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod recovery;

pub use config::AppConfig;
pub use http::{HttpServer, PanicCheckLayer};
pub use lifecycle::Shutdown;
pub use recovery::{abort_handler, RecoveryStage};
