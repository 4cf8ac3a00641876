//! Shared utilities for integration tests.

use std::io;
use std::sync::{Arc, Mutex};

use axum::{routing::get, Router};
use panic_check::abort_handler;
use tracing::subscriber::DefaultGuard;
use tracing_subscriber::fmt::MakeWriter;

/// In-memory log sink for a JSON tracing subscriber.
#[derive(Clone, Default)]
pub struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

#[allow(dead_code)]
impl CapturedLogs {
    /// Everything written so far.
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }

    /// Each log line parsed as JSON.
    pub fn records(&self) -> Vec<serde_json::Value> {
        self.contents()
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| serde_json::from_str(line).expect("log line is JSON"))
            .collect()
    }

    /// Records whose message is `message`.
    pub fn records_with_message(&self, message: &str) -> Vec<serde_json::Value> {
        self.records()
            .into_iter()
            .filter(|record| record["fields"]["message"] == message)
            .collect()
    }
}

#[allow(dead_code)]
pub struct CapturedWriter(Arc<Mutex<Vec<u8>>>);

impl io::Write for CapturedWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedWriter;

    fn make_writer(&'a self) -> Self::Writer {
        CapturedWriter(Arc::clone(&self.0))
    }
}

/// Route JSON logs emitted on this thread into a buffer until the guard drops.
#[allow(dead_code)]
pub fn capture_logs() -> (CapturedLogs, DefaultGuard) {
    let logs = CapturedLogs::default();
    let subscriber = tracing_subscriber::fmt()
        .json()
        .with_max_level(tracing::Level::TRACE)
        .with_writer(logs.clone())
        .finish();
    let guard = tracing::subscriber::set_default(subscriber);
    (logs, guard)
}

/// Raise and swallow a panic, leaving its site behind on this thread.
#[allow(dead_code)]
pub fn unrelated_panic() {
    let _ = std::panic::catch_unwind(|| panic!("unrelated panic"));
}

async fn exploding() -> &'static str {
    std::panic::panic_any(io::Error::other("we expect this panic"))
}

async fn aborting() -> &'static str {
    abort_handler()
}

/// Application with one healthy route and two failing ones.
#[allow(dead_code)]
pub fn test_app() -> Router {
    Router::new()
        .route("/", get(|| async { "hello" }))
        .route("/panic", get(exploding))
        .route("/abort", get(aborting))
}
