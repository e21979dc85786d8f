//! # Anki Voice Common Library
//!
//! Core logic shared by the Anki Voice server and its setup tooling:
//! - Card markup text extraction with nested language tag resolution
//! - Front/back language resolution (note tags, deck config, default)
//! - Deterministic concept-matching judge and ease mapping
//! - Grading orchestration with an optional generative explanation path
//! - AnkiConnect, reviewer add-on, and chat backend clients
//! - Configuration loading

pub mod anki;
pub mod backend;
pub mod config;
pub mod ease;
pub mod error;
pub mod grading;
pub mod judge;
pub mod language;
pub mod markup;
pub mod prompts;

pub use ease::{map_ease, Ease};
pub use error::{Error, Result};
pub use grading::{ExplanationRequest, FollowUpRequest, GradeResult, GradingOrchestrator};
pub use judge::{judge, normalize, ConceptTable, Verdict};
pub use language::{LanguageResolver, ResolvedLanguages};
pub use markup::{extract, ExtractedContent};
