//! Card content endpoints: the reviewer's current card, ad-hoc markup
//! extraction and card language lookup

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use avs_common::anki::CurrentCard;
use avs_common::markup::{extract, to_text, ExtractedContent};
use avs_common::{Error, ResolvedLanguages};

use crate::AppState;

/// Current card plus the text and languages the phone app speaks
#[derive(Debug, Serialize)]
pub struct CurrentCardView {
    #[serde(flatten)]
    pub card: CurrentCard,
    /// Whole-document text of each side
    pub front_text: String,
    pub back_text: String,
    /// Study-region text of each side (back excludes the embedded front)
    pub front_readme: String,
    pub back_readme: String,
    pub front_language: String,
    pub back_language: String,
}

/// Returned with HTTP 200 when the add-on cannot supply a card
#[derive(Debug, Serialize)]
pub struct CurrentCardError {
    pub status: &'static str,
    pub message: String,
    pub details: String,
}

impl CurrentCardError {
    fn new(message: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            status: "error",
            message: message.into(),
            details: details.into(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum CurrentCardResponse {
    Card(Box<CurrentCardView>),
    Error(CurrentCardError),
}

/// GET /current
pub async fn current_card(State(state): State<AppState>) -> Json<CurrentCardResponse> {
    let card = match state.bridge.current().await {
        Ok(card) => card,
        Err(e) => {
            warn!(error = %e, "Reviewer add-on request failed");
            let response = match e {
                Error::Connectivity(_) => CurrentCardError::new(
                    "Cannot connect to Anki add-on",
                    "Make sure Anki is running and the add-on is installed",
                ),
                Error::Timeout(_) => CurrentCardError::new(
                    "Anki add-on timeout",
                    "Anki may be busy or not responding",
                ),
                other => CurrentCardError::new(
                    format!("Unexpected error: {}", other),
                    "Check server logs for more information",
                ),
            };
            return Json(CurrentCardResponse::Error(response));
        }
    };

    if !card.is_ready() {
        let status = if card.status.is_empty() { "unknown" } else { card.status.as_str() };
        return Json(CurrentCardResponse::Error(CurrentCardError::new(
            format!("Anki add-on returned: {}", status),
            "Make sure Anki is open with a card ready for review",
        )));
    }

    let front_html = card.front_html.as_deref().unwrap_or_default();
    let back_html = card.back_html.as_deref().unwrap_or_default();
    let front = extract(front_html, false);
    let back = extract(back_html, true);

    // Markup language wins; ask the resolver only when a side has none
    let resolved = if front.language.is_some() && back.language.is_some() {
        None
    } else {
        Some(match card.card_id {
            Some(card_id) => state.resolver.resolve(card_id).await,
            None => state.resolver.defaults(),
        })
    };
    let default_language = || state.resolver.default_language().to_string();
    let front_language = front
        .language
        .clone()
        .or_else(|| resolved.as_ref().map(|r| r.front_language.clone()))
        .unwrap_or_else(default_language);
    let back_language = back
        .language
        .clone()
        .or_else(|| resolved.as_ref().map(|r| r.back_language.clone()))
        .unwrap_or_else(default_language);

    debug!(
        card_id = ?card.card_id,
        front = %front_language,
        back = %back_language,
        "Current card"
    );

    Json(CurrentCardResponse::Card(Box::new(CurrentCardView {
        front_text: to_text(front_html),
        back_text: to_text(back_html),
        front_readme: front.text,
        back_readme: back.text,
        front_language,
        back_language,
        card,
    })))
}

/// POST /extract request
#[derive(Debug, Deserialize)]
pub struct ExtractRequest {
    #[serde(default)]
    pub markup: Option<String>,
    #[serde(default)]
    pub exclude_embedded_front: bool,
}

/// POST /extract
pub async fn extract_markup(Json(request): Json<ExtractRequest>) -> Json<ExtractedContent> {
    Json(extract(
        request.markup.as_deref().unwrap_or_default(),
        request.exclude_embedded_front,
    ))
}

/// GET /language/:card_id
pub async fn card_language(
    State(state): State<AppState>,
    Path(card_id): Path<i64>,
) -> Json<ResolvedLanguages> {
    Json(state.resolver.resolve(card_id).await)
}

/// Build card routes
pub fn card_routes() -> Router<AppState> {
    Router::new()
        .route("/current", get(current_card))
        .route("/extract", post(extract_markup))
        .route("/language/:card_id", get(card_language))
}
