//! Process health subsystem.
//!
//! # Data Flow
//! ```text
//! lifecycle (startup / shutdown)
//!     → state.rs (Initializing → Healthy → Degraded)
//!     → GET /health reads it
//! ```
//!
//! # Design Decisions
//! - A panic in a request is not a health event; the recovery stage is never
//!   given a handle to this state
//! - Lock-free: a single atomic shared via Arc

pub mod state;

pub use state::{Health, HealthStatus};
