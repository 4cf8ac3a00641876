//! Tower middleware applied by the HTTP server.

pub mod panic_check;

pub use panic_check::{PanicCheck, PanicCheckLayer};
