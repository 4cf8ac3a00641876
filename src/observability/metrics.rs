//! Metrics collection and exposition.
//!
//! # Metrics
//! - `panic_check_recovered_total` (counter): panics answered with a 500
//! - `panic_check_disconnects_total` (counter): abort sentinels passed through
//! - `panic_check_fatal_writes_total` (counter): 500 responses that could not be written

use std::net::SocketAddr;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its HTTP listener.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn record_panic_recovered() {
    metrics::counter!("panic_check_recovered_total").increment(1);
}

pub fn record_peer_disconnect() {
    metrics::counter!("panic_check_disconnects_total").increment(1);
}

pub fn record_fatal_write() {
    metrics::counter!("panic_check_fatal_writes_total").increment(1);
}
