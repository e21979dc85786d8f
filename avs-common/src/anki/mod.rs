//! Clients for the Anki side of the system
//!
//! - [`AnkiConnectClient`]: the AnkiConnect add-on's JSON API (card/note
//!   metadata, media files, tags, reviewer GUI actions)
//! - [`ReviewerBridge`]: the Anki Voice add-on that exposes the card
//!   currently shown in the reviewer
//!
//! The language resolver only needs a narrow read-only view, captured by the
//! [`AnkiCollaborator`] trait so it can be swapped for an in-memory fake.

mod bridge;
mod connect;

pub use bridge::{CurrentCard, ReviewerBridge};
pub use connect::{AnkiConnectClient, ApiResponse, API_VERSION};

use async_trait::async_trait;
use serde::Deserialize;

use crate::Result;

/// Subset of AnkiConnect `cardsInfo` output used here
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardInfo {
    pub card_id: i64,
    #[serde(default)]
    pub deck_name: Option<String>,
    #[serde(rename = "note", default)]
    pub note_id: Option<i64>,
}

/// Subset of AnkiConnect `notesInfo` output used here
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteInfo {
    pub note_id: i64,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Read-only lookups the language resolver performs against Anki
#[async_trait]
pub trait AnkiCollaborator: Send + Sync {
    /// Card metadata, `None` when the card does not exist
    async fn card_info(&self, card_id: i64) -> Result<Option<CardInfo>>;

    /// Tags of a note in their stored order (empty when the note is unknown)
    async fn note_tags(&self, note_id: i64) -> Result<Vec<String>>;

    /// Base64 contents of a media file, `None` when it does not exist
    async fn retrieve_media_file(&self, filename: &str) -> Result<Option<String>>;
}
