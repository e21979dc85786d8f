//! Health check endpoint
//!
//! Reports the server itself plus reachability of the reviewer add-on and
//! AnkiConnect. Always answers 200; component problems are in the body.

use axum::{extract::State, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;
use tracing::debug;

use crate::AppState;

/// GET /health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub server: String,
    pub anki_addon: String,
    pub ankiconnect: String,
    pub anki_running: String,
    /// `ok` with an explanation backend, `test_mode` without
    pub explain: String,
    pub module: String,
    pub version: String,
    pub uptime_seconds: i64,
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let (addon, connect) = tokio::join!(state.bridge.ping_status(), state.anki.version());

    let anki_addon = match addon {
        Ok((200, true)) => "ok".to_string(),
        Ok((status, _)) => format!("error_{}", status),
        Err(e) => format!("error: {}", e),
    };

    let (ankiconnect, anki_running) = match connect {
        Ok(_) => ("ok".to_string(), "ok".to_string()),
        Err(e) if e.is_connectivity() => (format!("error: {}", e), "not_running".to_string()),
        Err(e) => (format!("error: {}", e), "unknown".to_string()),
    };
    let explain = if state.orchestrator.has_backend() {
        "ok"
    } else {
        "test_mode"
    };
    debug!(anki_addon = %anki_addon, ankiconnect = %ankiconnect, "Health check");

    Json(HealthResponse {
        server: "ok".to_string(),
        anki_addon,
        ankiconnect,
        anki_running,
        explain: explain.to_string(),
        module: "avs-server".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: (Utc::now() - state.startup_time).num_seconds(),
    })
}

/// Build health check routes
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
