//! Grading orchestration
//!
//! [`GradingOrchestrator::grade`] is synchronous and depends on nothing but
//! the concept table. The explanation and follow-up paths go through the
//! optional [`ChatBackend`] and are called separately by the client, so a
//! slow or failing backend never holds up a grade.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::backend::{ChatBackend, OllamaBackend};
use crate::config::ExplainConfig;
use crate::ease::{ease_from_verdict, Ease};
use crate::judge::{judge, ConceptTable, Verdict};
use crate::prompts::{prompts_for, render, PromptTemplate};
use crate::{Error, Result};

/// Fixed explanation returned when no backend is configured
pub const TEST_MODE_EXPLANATION: &str = "Test mode: looks correct.";

/// Deterministic grading response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradeResult {
    pub verdict: Verdict,
    pub suggested_ease: Ease,
    pub hits: BTreeSet<String>,
    pub missing: BTreeSet<String>,
}

/// Input for the explanation path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExplanationRequest {
    pub question: String,
    pub reference: String,
    pub transcript: String,
    pub language: String,
}

impl ExplanationRequest {
    pub fn validate(&self) -> Result<()> {
        require("question_text", &self.question)?;
        require("reference_text", &self.reference)
    }
}

/// Input for a learner's follow-up question about a card
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FollowUpRequest {
    pub question: String,
    pub reference: String,
    pub user_question: String,
    pub language: String,
}

impl FollowUpRequest {
    pub fn validate(&self) -> Result<()> {
        require("question", &self.user_question)?;
        require("question_text", &self.question)?;
        require("reference_text", &self.reference)
    }
}

fn require(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        Err(Error::Validation(format!("{} is required", field)))
    } else {
        Ok(())
    }
}

/// Judge + ease mapper + optional explanation backend
#[derive(Clone, Default)]
pub struct GradingOrchestrator {
    backend: Option<Arc<dyn ChatBackend>>,
}

impl GradingOrchestrator {
    pub fn new(backend: Arc<dyn ChatBackend>) -> Self {
        Self {
            backend: Some(backend),
        }
    }

    /// Orchestrator whose explanations are the fixed test-mode text
    pub fn test_mode() -> Self {
        Self::default()
    }

    pub fn from_config(config: &ExplainConfig) -> Result<Self> {
        if !config.enabled {
            info!("Explanations disabled; running in test mode");
            return Ok(Self::test_mode());
        }
        let backend = OllamaBackend::from_config(config)?;
        info!(base_url = %config.base_url, model = %config.model, "Explanation backend configured");
        Ok(Self::new(Arc::new(backend)))
    }

    pub fn has_backend(&self) -> bool {
        self.backend.is_some()
    }

    /// Judge a transcript. Always succeeds.
    pub fn grade(&self, card_id: Option<i64>, transcript: &str, concepts: &ConceptTable) -> GradeResult {
        let outcome = judge(transcript, concepts);
        let suggested_ease = ease_from_verdict(outcome.verdict);
        debug!(
            card_id = ?card_id,
            verdict = %outcome.verdict,
            hits = outcome.hits.len(),
            total = concepts.len(),
            "Graded transcript"
        );
        GradeResult {
            verdict: outcome.verdict,
            suggested_ease,
            hits: outcome.hits,
            missing: outcome.missing,
        }
    }

    /// Brief explanation of what the spoken answer got wrong, if anything
    pub async fn explain(&self, request: &ExplanationRequest) -> Result<String> {
        request.validate()?;
        let Some(backend) = &self.backend else {
            return Ok(TEST_MODE_EXPLANATION.to_string());
        };

        let template = &prompts_for(&request.language).explain;
        let user = render(
            template.user,
            &[
                ("question", request.question.as_str()),
                ("reference", request.reference.as_str()),
                ("transcript", request.transcript.as_str()),
            ],
        );
        self.ask_backend(backend.as_ref(), template, &user, "explanation").await
    }

    /// Short answer to a learner's question, using the card as context
    pub async fn follow_up(&self, request: &FollowUpRequest) -> Result<String> {
        request.validate()?;
        let template = &prompts_for(&request.language).follow_up;
        let Some(backend) = &self.backend else {
            return Ok(template.default_response.to_string());
        };

        let user = render(
            template.user,
            &[
                ("question", request.question.as_str()),
                ("reference", request.reference.as_str()),
                ("user_question", request.user_question.as_str()),
            ],
        );
        self.ask_backend(backend.as_ref(), template, &user, "follow-up").await
    }

    async fn ask_backend(
        &self,
        backend: &dyn ChatBackend,
        template: &PromptTemplate,
        user: &str,
        kind: &str,
    ) -> Result<String> {
        match backend.chat(template.system, user).await {
            Ok(text) if text.trim().is_empty() => Ok(template.default_response.to_string()),
            Ok(text) => Ok(text.trim().to_string()),
            Err(e) => {
                warn!(error = %e, "Chat backend failed for {}", kind);
                Err(match e {
                    Error::Backend(_) => e,
                    other => Error::Backend(other.to_string()),
                })
            }
        }
    }
}
