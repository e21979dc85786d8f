//! AnkiConnect client
//!
//! Every action is a POST of `{action, version, params?}` to the AnkiConnect
//! endpoint, answered with `{result, error}`. Data lookups get a short
//! timeout; reviewer GUI actions (`gui*`) get a slightly longer one since
//! they wait on Anki's main thread.

use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use super::{AnkiCollaborator, CardInfo, NoteInfo};
use crate::config::AnkiConfig;
use crate::{Ease, Error, Result};

/// AnkiConnect API version spoken by this client
pub const API_VERSION: u32 = 6;

/// AnkiConnect response envelope
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub result: Option<T>,
    pub error: Option<String>,
}

/// Async AnkiConnect client
#[derive(Debug, Clone)]
pub struct AnkiConnectClient {
    http: Client,
    url: String,
    data_timeout: Duration,
    gui_timeout: Duration,
}

impl AnkiConnectClient {
    pub fn new(url: impl Into<String>, data_timeout: Duration, gui_timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .build()
            .map_err(|e| Error::Config(format!("HTTP client build failed: {}", e)))?;
        Ok(Self {
            http,
            url: url.into(),
            data_timeout,
            gui_timeout,
        })
    }

    pub fn from_config(config: &AnkiConfig) -> Result<Self> {
        Self::new(
            config.connect_url.clone(),
            Duration::from_millis(config.data_timeout_ms),
            Duration::from_millis(config.gui_timeout_ms),
        )
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn timeout_for(&self, action: &str) -> Duration {
        if action.starts_with("gui") {
            self.gui_timeout
        } else {
            self.data_timeout
        }
    }

    /// Invoke an action and decode its `result`.
    ///
    /// A missing or null `result` decodes as JSON null, so callers expecting
    /// "nothing" should ask for `Option<_>`, `()` or `Value`.
    pub async fn invoke<T: DeserializeOwned>(&self, action: &str, params: Option<Value>) -> Result<T> {
        let mut body = json!({ "action": action, "version": API_VERSION });
        if let Some(params) = params {
            body["params"] = params;
        }

        debug!(action, "AnkiConnect request");
        let response = self
            .http
            .post(&self.url)
            .timeout(self.timeout_for(action))
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::from_transport("AnkiConnect", e))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(Error::AnkiConnect {
                action: action.to_string(),
                message: format!("HTTP {} - {}", status.as_u16(), text),
            });
        }

        let envelope: ApiResponse<Value> = response
            .json()
            .await
            .map_err(|e| Error::from_transport("AnkiConnect", e))?;

        if let Some(message) = envelope.error {
            return Err(Error::AnkiConnect {
                action: action.to_string(),
                message,
            });
        }

        Ok(serde_json::from_value(envelope.result.unwrap_or(Value::Null))?)
    }

    /// Used as a liveness check
    pub async fn version(&self) -> Result<u32> {
        self.invoke("version", None).await
    }

    pub async fn cards_info(&self, card_ids: &[i64]) -> Result<Vec<CardInfo>> {
        let cards: Option<Vec<Value>> = self
            .invoke("cardsInfo", Some(json!({ "cards": card_ids })))
            .await?;
        Ok(decode_known(cards))
    }

    pub async fn notes_info(&self, note_ids: &[i64]) -> Result<Vec<NoteInfo>> {
        let notes: Option<Vec<Value>> = self
            .invoke("notesInfo", Some(json!({ "notes": note_ids })))
            .await?;
        Ok(decode_known(notes))
    }

    /// Note id owning a card
    pub async fn note_id_for_card(&self, card_id: i64) -> Result<Option<i64>> {
        Ok(self
            .cards_info(&[card_id])
            .await?
            .into_iter()
            .next()
            .and_then(|card| card.note_id))
    }

    /// Base64 contents of a media file. AnkiConnect answers `false` for a
    /// file that does not exist.
    pub async fn retrieve_media(&self, filename: &str) -> Result<Option<String>> {
        let value: Value = self
            .invoke("retrieveMediaFile", Some(json!({ "filename": filename })))
            .await?;
        Ok(match value {
            Value::String(data) if !data.is_empty() => Some(data),
            _ => None,
        })
    }

    /// Store a media file (contents are base64-encoded for transport)
    pub async fn store_media_file(&self, filename: &str, contents: &[u8]) -> Result<()> {
        let data = general_purpose::STANDARD.encode(contents);
        let _: Value = self
            .invoke("storeMediaFile", Some(json!({ "filename": filename, "data": data })))
            .await?;
        Ok(())
    }

    pub async fn deck_names(&self) -> Result<Vec<String>> {
        let names: Option<Vec<String>> = self.invoke("deckNames", None).await?;
        Ok(names.unwrap_or_default())
    }

    pub async fn find_notes(&self, query: &str) -> Result<Vec<i64>> {
        let ids: Option<Vec<i64>> = self
            .invoke("findNotes", Some(json!({ "query": query })))
            .await?;
        Ok(ids.unwrap_or_default())
    }

    /// Add space-separated `tags` to every note
    pub async fn add_tags(&self, note_ids: &[i64], tags: &str) -> Result<()> {
        let _: Value = self
            .invoke("addTags", Some(json!({ "notes": note_ids, "tags": tags })))
            .await?;
        Ok(())
    }

    /// Remove space-separated `tags` (exact tokens, no wildcards) from every note
    pub async fn remove_tags(&self, note_ids: &[i64], tags: &str) -> Result<()> {
        let _: Value = self
            .invoke("removeTags", Some(json!({ "notes": note_ids, "tags": tags })))
            .await?;
        Ok(())
    }

    pub async fn delete_notes(&self, note_ids: &[i64]) -> Result<Value> {
        self.invoke("deleteNotes", Some(json!({ "notes": note_ids })))
            .await
    }

    /// Flip the reviewer to the answer side (harmless if already shown)
    pub async fn show_answer(&self) -> Result<Value> {
        self.invoke("guiShowAnswer", None).await
    }

    /// Answer the card in the reviewer; only works while the answer is shown
    pub async fn answer_card(&self, ease: Ease) -> Result<Value> {
        self.invoke("guiAnswerCard", Some(json!({ "ease": ease.value() })))
            .await
    }

    pub async fn undo_review(&self) -> Result<Value> {
        self.invoke("guiUndoReview", None).await
    }
}

/// AnkiConnect answers unknown card/note ids with empty objects; drop them
fn decode_known<T: DeserializeOwned>(items: Option<Vec<Value>>) -> Vec<T> {
    items
        .unwrap_or_default()
        .into_iter()
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect()
}

#[async_trait]
impl AnkiCollaborator for AnkiConnectClient {
    async fn card_info(&self, card_id: i64) -> Result<Option<CardInfo>> {
        Ok(self.cards_info(&[card_id]).await?.into_iter().next())
    }

    async fn note_tags(&self, note_id: i64) -> Result<Vec<String>> {
        Ok(self
            .notes_info(&[note_id])
            .await?
            .into_iter()
            .next()
            .map(|note| note.tags)
            .unwrap_or_default())
    }

    async fn retrieve_media_file(&self, filename: &str) -> Result<Option<String>> {
        self.retrieve_media(filename).await
    }
}
