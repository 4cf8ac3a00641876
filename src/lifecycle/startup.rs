//! Startup orchestration.
//!
//! # Responsibilities
//! - Initialize logging and metrics from configuration
//! - Bind the listener and hand it to the HTTP server
//! - Wire OS signals to graceful shutdown

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;

use crate::config::AppConfig;
use crate::health::Health;
use crate::http::HttpServer;
use crate::lifecycle::{signals, Shutdown};
use crate::observability::{logging, metrics};

/// Errors that abort startup.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("failed to initialize logging: {0}")]
    Logging(#[from] tracing_subscriber::util::TryInitError),

    #[error("invalid metrics address '{0}'")]
    MetricsAddress(String),

    #[error("failed to start metrics exporter: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(std::io::Error),
}

/// Run `app` behind the full middleware stack until a termination signal.
pub async fn start(config: AppConfig, app: Router) -> Result<(), StartupError> {
    logging::init(&config.observability)?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        bind_address = %config.listener.bind_address,
        request_timeout_secs = config.timeouts.request_secs,
        on_write_failure = ?config.panic_check.on_write_failure,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config
            .observability
            .metrics_address
            .parse()
            .map_err(|_| StartupError::MetricsAddress(config.observability.metrics_address.clone()))?;
        metrics::init_metrics(addr)?;
    }

    let listener = TcpListener::bind(&config.listener.bind_address)
        .await
        .map_err(|source| StartupError::Bind {
            address: config.listener.bind_address.clone(),
            source,
        })?;

    let shutdown = Shutdown::new();
    signals::spawn_signal_listener(shutdown.clone());

    let server = HttpServer::new(config, app, Arc::new(Health::new()));
    server
        .run(listener, shutdown.subscribe())
        .await
        .map_err(StartupError::Serve)?;

    tracing::info!("Shutdown complete");
    Ok(())
}
