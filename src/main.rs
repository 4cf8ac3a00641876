//! panic-check server.
//!
//! ```text
//!     Client Request
//!     ──────────────▶ trace ─▶ request id ─▶ panic check ─▶ timeout ─▶ routes
//!                                                │
//!     Client Response                            │ panic?
//!     ◀────────────── 500 + Connection: close ◀──┘
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use axum::{routing::get, Router};
use clap::Parser;

use panic_check::config::{load_config, AppConfig};
use panic_check::lifecycle;

#[derive(Parser, Debug)]
#[command(name = "panic-check", version, about = "HTTP server with a panic recovery boundary")]
struct Args {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address.
    #[arg(short, long)]
    bind: Option<String>,
}

fn app() -> Router {
    Router::new().route("/", get(|| async { "ok\n" }))
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => match load_config(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("failed to load {}: {e}", path.display());
                return ExitCode::FAILURE;
            }
        },
        None => AppConfig::default(),
    };
    if let Some(bind) = args.bind {
        config.listener.bind_address = bind;
    }

    match lifecycle::start(config, app()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("panic-check: {e}");
            ExitCode::FAILURE
        }
    }
}
