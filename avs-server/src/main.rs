//! Anki Voice server (avs-server) - Main entry point
//!
//! HTTP service the phone app talks to while reviewing: reads the card the
//! Anki reviewer is showing, grades spoken answers, and drives the reviewer
//! through AnkiConnect.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::info;

use avs_common::config::ServerConfig;
use avs_server::{build_router, logging, AppState};

/// Command-line arguments for avs-server
#[derive(Parser, Debug)]
#[command(name = "avs-server")]
#[command(about = "Anki Voice grading and reviewer bridge server")]
#[command(version)]
struct Args {
    /// Config file (TOML); falls back to AVS_CONFIG, then the user config dir
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to listen on, overriding config and AVS_BIND
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is fine
    let dotenv = dotenvy::dotenv().ok();

    let args = Args::parse();

    // Tracing goes up first so config loading can log
    let log_filter = logging::init();

    let mut config =
        ServerConfig::load(args.config.as_deref()).context("Failed to load configuration")?;
    if let Some(bind) = args.bind {
        config.bind = bind;
    }
    log_filter.apply_configured_level(&config.logging.level)?;

    info!("Starting Anki Voice server v{}", env!("CARGO_PKG_VERSION"));
    if let Some(path) = dotenv {
        info!("Loaded environment from {}", path.display());
    }
    info!("AnkiConnect: {}", config.anki.connect_url);
    info!("Reviewer add-on: {}", config.anki.addon_url);

    let state = AppState::from_config(&config).context("Failed to initialize collaborators")?;
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind))?;

    info!("avs-server listening on http://{}", config.bind);
    info!("Health check: http://{}/health", config.bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
