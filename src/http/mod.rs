//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → request-id layers (assign / propagate x-request-id)
//!     → middleware/panic_check.rs (recovery boundary)
//!         → request.rs (RequestContext: host, request ID)
//!         → application routes
//!         → on panic: response.rs (BufferedSink → 500)
//!     → Send to client
//! ```

pub mod middleware;
pub mod request;
pub mod response;
pub mod server;

pub use middleware::{PanicCheck, PanicCheckLayer};
pub use request::X_REQUEST_ID;
pub use response::BufferedSink;
pub use server::HttpServer;
