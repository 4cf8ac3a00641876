//! End-to-end tests against a running server.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use panic_check::config::{AppConfig, FatalAction};
use panic_check::health::{Health, HealthStatus};
use panic_check::lifecycle::Shutdown;
use panic_check::recovery::PANIC_RESPONSE_BODY;
use panic_check::HttpServer;

mod common;

async fn start_server(shutdown: &Shutdown) -> (SocketAddr, Arc<Health>) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let mut config = AppConfig::default();
    config.listener.bind_address = addr.to_string();
    config.panic_check.on_write_failure = FatalAction::Log;

    let health = Arc::new(Health::new());
    let server = HttpServer::new(config, common::test_app(), Arc::clone(&health));
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    tokio::time::sleep(Duration::from_millis(100)).await;
    (addr, health)
}

fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

#[tokio::test]
async fn server_survives_panicking_handler() {
    let shutdown = Shutdown::new();
    let (addr, health) = start_server(&shutdown).await;
    let client = client();

    let res = client
        .get(format!("http://{}/panic", addr))
        .send()
        .await
        .expect("server unreachable");
    assert_eq!(res.status(), 500);
    assert_eq!(res.text().await.unwrap(), PANIC_RESPONSE_BODY);

    let res = client.get(format!("http://{}/", addr)).send().await.unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(res.text().await.unwrap(), "hello");

    assert_eq!(health.status(), HealthStatus::Healthy);
    shutdown.trigger();
}

#[tokio::test]
async fn aborted_handler_drops_connection_without_response() {
    let shutdown = Shutdown::new();
    let (addr, health) = start_server(&shutdown).await;
    let client = client();

    let res = client.get(format!("http://{}/abort", addr)).send().await;
    assert!(res.is_err(), "aborted handler must not produce a response");

    let res = client.get(format!("http://{}/health", addr)).send().await.unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(health.status(), HealthStatus::Healthy);
    shutdown.trigger();
}

#[tokio::test]
async fn shutdown_degrades_health() {
    let shutdown = Shutdown::new();
    let (_addr, health) = start_server(&shutdown).await;
    assert_eq!(health.status(), HealthStatus::Healthy);

    shutdown.trigger();
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(health.status(), HealthStatus::Degraded);
}
