//! Grading endpoints
//!
//! `/grade` is deterministic and never touches a collaborator.
//! `/grade-with-explanation` and `/ask` go through the explanation backend
//! and are requested separately by the client.

use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use tracing::info;

use avs_common::{ConceptTable, ExplanationRequest, FollowUpRequest, GradeResult};

use crate::error::ApiResult;
use crate::AppState;

/// POST /grade request
#[derive(Debug, Deserialize)]
pub struct GradeRequest {
    #[serde(default, alias = "cardId")]
    pub card_id: Option<i64>,
    pub transcript: String,
    pub concepts: ConceptTable,
}

/// POST /grade
pub async fn grade(State(state): State<AppState>, Json(request): Json<GradeRequest>) -> Json<GradeResult> {
    let concepts = request.concepts.with_normalized_aliases();
    let result = state
        .orchestrator
        .grade(request.card_id, &request.transcript, &concepts);
    info!(
        card_id = ?request.card_id,
        verdict = %result.verdict,
        ease = %result.suggested_ease,
        "Graded answer"
    );
    Json(result)
}

/// POST /grade-with-explanation request
#[derive(Debug, Deserialize)]
pub struct ExplainRequest {
    #[serde(default, alias = "cardId")]
    pub card_id: Option<i64>,
    #[serde(default)]
    pub transcript: String,
    #[serde(default)]
    pub question_text: Option<String>,
    #[serde(default)]
    pub reference_text: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ExplainResponse {
    pub explanation: String,
}

/// POST /grade-with-explanation
pub async fn grade_with_explanation(
    State(state): State<AppState>,
    Json(request): Json<ExplainRequest>,
) -> ApiResult<Json<ExplainResponse>> {
    let mut explanation_request = ExplanationRequest {
        question: request.question_text.unwrap_or_default(),
        reference: request.reference_text.unwrap_or_default(),
        transcript: request.transcript,
        language: String::new(),
    };
    explanation_request.validate()?;
    explanation_request.language =
        explanation_language(&state, request.language, request.card_id).await;

    let explanation = state.orchestrator.explain(&explanation_request).await?;
    Ok(Json(ExplainResponse { explanation }))
}

/// POST /ask request
#[derive(Debug, Deserialize)]
pub struct AskRequest {
    #[serde(default, alias = "cardId")]
    pub card_id: Option<i64>,
    /// The learner's question
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub question_text: Option<String>,
    #[serde(default)]
    pub reference_text: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AskResponse {
    pub answer: String,
}

/// POST /ask
pub async fn ask(
    State(state): State<AppState>,
    Json(request): Json<AskRequest>,
) -> ApiResult<Json<AskResponse>> {
    let mut follow_up = FollowUpRequest {
        question: request.question_text.unwrap_or_default(),
        reference: request.reference_text.unwrap_or_default(),
        user_question: request.question,
        language: String::new(),
    };
    follow_up.validate()?;
    follow_up.language = explanation_language(&state, request.language, request.card_id).await;

    let answer = state.orchestrator.follow_up(&follow_up).await?;
    Ok(Json(AskResponse { answer }))
}

/// Explicit language, else the card's back language, else the default
async fn explanation_language(state: &AppState, language: Option<String>, card_id: Option<i64>) -> String {
    if let Some(language) = language.filter(|l| !l.trim().is_empty()) {
        return language;
    }
    match card_id {
        Some(card_id) => state.resolver.resolve(card_id).await.back_language,
        None => state.resolver.default_language().to_string(),
    }
}

/// Build grading routes
pub fn grade_routes() -> Router<AppState> {
    Router::new()
        .route("/grade", post(grade))
        .route("/grade-with-explanation", post(grade_with_explanation))
        .route("/ask", post(ask))
}
