//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Wrap the application router in the middleware stack
//! - Serve the process health endpoint
//! - Bind to the listener and shut down gracefully

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::AppConfig;
use crate::health::{Health, HealthStatus};
use crate::http::middleware::PanicCheckLayer;
use crate::recovery::RecoveryStage;

/// HTTP server hosting an application behind the panic-check boundary.
pub struct HttpServer {
    router: Router,
    health: Arc<Health>,
}

impl HttpServer {
    /// Create a server for `app`. `app` must not define `/health`.
    pub fn new(config: AppConfig, app: Router, health: Arc<Health>) -> Self {
        let router = Self::build_router(&config, app, Arc::clone(&health));
        Self { router, health }
    }

    /// Build the full router with all middleware layers.
    ///
    /// Outermost first: trace, set request ID, propagate request ID,
    /// panic check, timeout. The health signal only reaches the `/health`
    /// handler.
    #[allow(deprecated)]
    pub fn build_router(config: &AppConfig, app: Router, health: Arc<Health>) -> Router {
        let stage = RecoveryStage::new(&config.panic_check);

        Router::new()
            .route("/health", get(health_handler))
            .with_state(health)
            .merge(app)
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(PanicCheckLayer::new(stage))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(TraceLayer::new_for_http())
    }

    /// Serve until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        self.health.set(HealthStatus::Healthy);
        let health = Arc::clone(&self.health);

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                health.set(HealthStatus::Degraded);
                tracing::info!("Draining connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

#[derive(Serialize)]
struct HealthReport {
    status: HealthStatus,
}

async fn health_handler(State(health): State<Arc<Health>>) -> impl IntoResponse {
    let status = health.status();
    let code = if status == HealthStatus::Healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (code, Json(HealthReport { status }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    fn router(health: Arc<Health>) -> Router {
        let app = Router::new().route("/", get(|| async { "hello" }));
        HttpServer::build_router(&AppConfig::default(), app, health)
    }

    #[tokio::test]
    async fn health_reflects_signal() {
        let health = Arc::new(Health::new());

        let response = router(Arc::clone(&health))
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        health.set(HealthStatus::Healthy);
        let response = router(health)
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn responses_carry_request_id() {
        let response = router(Arc::new(Health::new()))
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
    }
}
