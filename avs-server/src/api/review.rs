//! Reviewer actions passed through to AnkiConnect

use axum::{
    extract::{Path, State},
    routing::post,
    Json, Router,
};
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};

use avs_common::anki::ApiResponse;
use avs_common::Ease;

use crate::error::{ApiError, ApiResult};
use crate::AppState;

type ActionResponse = Json<ApiResponse<Value>>;

fn success(result: Value) -> ActionResponse {
    Json(ApiResponse {
        result: Some(result),
        error: None,
    })
}

/// POST /show-answer
pub async fn show_answer(State(state): State<AppState>) -> ApiResult<ActionResponse> {
    Ok(success(state.anki.show_answer().await?))
}

/// POST /answer/:ease
pub async fn answer(State(state): State<AppState>, Path(ease): Path<i64>) -> ApiResult<ActionResponse> {
    let ease = Ease::new(ease)?;
    Ok(success(state.anki.answer_card(ease).await?))
}

/// POST /undo
pub async fn undo(State(state): State<AppState>) -> ApiResult<ActionResponse> {
    Ok(success(state.anki.undo_review().await?))
}

/// POST /submit-grade request
#[derive(Debug, Deserialize)]
pub struct SubmitGradeRequest {
    #[serde(alias = "cardId")]
    pub card_id: i64,
    pub ease: i64,
}

/// POST /submit-grade
///
/// `guiAnswerCard` only works while the answer is visible, so the answer
/// is shown first (a no-op if it already is).
pub async fn submit_grade(
    State(state): State<AppState>,
    Json(request): Json<SubmitGradeRequest>,
) -> ApiResult<ActionResponse> {
    let ease = Ease::new(request.ease)?;

    if let Err(e) = state.anki.show_answer().await {
        warn!(card_id = request.card_id, error = %e, "Reviewer not ready");
        return Err(ApiError::Conflict(format!("Reviewer not ready: {}", e)));
    }

    let result = state.anki.answer_card(ease).await.map_err(|e| {
        warn!(card_id = request.card_id, error = %e, "Answer failed");
        ApiError::BadGateway(format!("AnkiConnect error: {}", e))
    })?;

    info!(card_id = request.card_id, ease = %ease, "Submitted grade ({})", ease.label());
    Ok(success(result))
}

/// POST /delete-note request
#[derive(Debug, Deserialize)]
pub struct DeleteNoteRequest {
    #[serde(alias = "cardId")]
    pub card_id: i64,
}

/// POST /delete-note
pub async fn delete_note(
    State(state): State<AppState>,
    Json(request): Json<DeleteNoteRequest>,
) -> ApiResult<ActionResponse> {
    let note_id = state
        .anki
        .note_id_for_card(request.card_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Could not find note for this card".to_string()))?;

    let result = state.anki.delete_notes(&[note_id]).await.map_err(|e| {
        ApiError::BadGateway(format!("AnkiConnect error: {}", e))
    })?;

    info!(card_id = request.card_id, note_id, "Deleted note");
    Ok(success(result))
}

/// Build reviewer action routes
pub fn review_routes() -> Router<AppState> {
    Router::new()
        .route("/show-answer", post(show_answer))
        .route("/answer/:ease", post(answer))
        .route("/submit-grade", post(submit_grade))
        .route("/undo", post(undo))
        .route("/delete-note", post(delete_note))
}
