//! avs-server library - HTTP surface for Anki Voice
//!
//! Thin axum layer over `avs-common`: card extraction and language lookup
//! for the reviewer's current card, deterministic grading, the optional
//! explanation/follow-up path, and pass-through reviewer actions.

use std::sync::Arc;

use axum::Router;
use chrono::{DateTime, Utc};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use avs_common::anki::{AnkiConnectClient, ReviewerBridge};
use avs_common::config::ServerConfig;
use avs_common::{GradingOrchestrator, LanguageResolver};

pub mod api;
pub mod error;
pub mod logging;

pub use error::{ApiError, ApiResult};

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// AnkiConnect client for metadata and reviewer actions
    pub anki: Arc<AnkiConnectClient>,
    /// Reviewer add-on client
    pub bridge: Arc<ReviewerBridge>,
    /// Card language resolution (owns the deck config cache)
    pub resolver: Arc<LanguageResolver>,
    /// Judge, ease mapper and explanation backend
    pub orchestrator: Arc<GradingOrchestrator>,
    /// Server start time, for uptime reporting
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(
        anki: Arc<AnkiConnectClient>,
        bridge: Arc<ReviewerBridge>,
        resolver: Arc<LanguageResolver>,
        orchestrator: Arc<GradingOrchestrator>,
    ) -> Self {
        Self {
            anki,
            bridge,
            resolver,
            orchestrator,
            startup_time: Utc::now(),
        }
    }

    /// Wire every collaborator from configuration. The resolver shares the
    /// AnkiConnect client used for reviewer actions.
    pub fn from_config(config: &ServerConfig) -> avs_common::Result<Self> {
        let anki = Arc::new(AnkiConnectClient::from_config(&config.anki)?);
        let bridge = Arc::new(ReviewerBridge::from_config(&config.anki)?);
        let resolver = Arc::new(LanguageResolver::from_settings(anki.clone(), &config.language));
        let orchestrator = Arc::new(GradingOrchestrator::from_config(&config.explain)?);
        Ok(Self::new(anki, bridge, resolver, orchestrator))
    }
}

/// Build application router
///
/// CORS is permissive so the phone app can call the server over the LAN.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::health_routes())
        .merge(api::card_routes())
        .merge(api::grade_routes())
        .merge(api::review_routes())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
