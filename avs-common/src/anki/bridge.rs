//! Client for the Anki Voice reviewer add-on
//!
//! The add-on runs a tiny HTTP server inside Anki exposing `/ping` and
//! `/current` (the card the reviewer is showing, as rendered HTML).

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::AnkiConfig;
use crate::{Error, Result};

/// Reviewer state reported by the add-on's `/current`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentCard {
    /// "ok" when a card is showing, "idle" otherwise
    pub status: String,
    #[serde(rename = "cardId", default)]
    pub card_id: Option<i64>,
    #[serde(rename = "noteId", default)]
    pub note_id: Option<i64>,
    #[serde(rename = "deckId", default)]
    pub deck_id: Option<i64>,
    #[serde(default)]
    pub front_html: Option<String>,
    #[serde(default)]
    pub back_html: Option<String>,
}

impl CurrentCard {
    pub fn is_ready(&self) -> bool {
        self.status == "ok"
    }
}

#[derive(Debug, Deserialize)]
struct PingResponse {
    #[serde(default)]
    ok: bool,
}

/// HTTP client for the reviewer add-on
#[derive(Debug, Clone)]
pub struct ReviewerBridge {
    http: Client,
    base_url: String,
    timeout: Duration,
}

impl ReviewerBridge {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .build()
            .map_err(|e| Error::Config(format!("HTTP client build failed: {}", e)))?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
        })
    }

    pub fn from_config(config: &AnkiConfig) -> Result<Self> {
        Self::new(
            config.addon_url.clone(),
            Duration::from_millis(config.data_timeout_ms),
        )
    }

    async fn get(&self, path: &str) -> Result<reqwest::Response> {
        let response = self
            .http
            .get(format!("{}{}", self.base_url, path))
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| Error::from_transport("Anki add-on", e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Connectivity(format!(
                "Anki add-on returned HTTP {}",
                status.as_u16()
            )));
        }
        Ok(response)
    }

    /// HTTP status and `ok` flag of `/ping`, without treating a non-2xx
    /// status as an error. Only transport failures are errors.
    pub async fn ping_status(&self) -> Result<(u16, bool)> {
        let response = self
            .http
            .get(format!("{}/ping", self.base_url))
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| Error::from_transport("Anki add-on", e))?;

        let status = response.status().as_u16();
        let ok = response
            .json::<PingResponse>()
            .await
            .map(|ping| ping.ok)
            .unwrap_or(false);
        Ok((status, ok))
    }

    /// The card currently shown in the reviewer
    pub async fn current(&self) -> Result<CurrentCard> {
        self.get("/current")
            .await?
            .json()
            .await
            .map_err(|e| Error::from_transport("Anki add-on", e))
    }
}
