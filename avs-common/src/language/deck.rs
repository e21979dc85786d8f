//! Deck-level language config blob
//!
//! Stored in Anki's media folder as `_ankiVoice.deck.<sanitized deck>.json`
//! (the leading underscore keeps Anki's unused-media check away from it).

use base64::{engine::general_purpose, Engine as _};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::tags::LanguageOverrides;

static UNSAFE_FILENAME_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9._-]+").expect("valid filename regex"));

/// `{"frontLang": ..., "backLang": ...}`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LanguageConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub front_lang: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub back_lang: Option<String>,
}

impl LanguageConfig {
    pub fn new(front_lang: impl Into<String>, back_lang: impl Into<String>) -> Self {
        Self {
            front_lang: Some(front_lang.into()),
            back_lang: Some(back_lang.into()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.as_overrides() == LanguageOverrides::default()
    }

    /// Decode the base64 media payload. Anything undecodable is treated as
    /// a missing config.
    pub fn from_media_blob(deck: &str, data: &str) -> Self {
        let bytes = match general_purpose::STANDARD.decode(data.trim()) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(deck, error = %e, "Deck language config is not valid base64; ignoring");
                return Self::default();
            }
        };
        match serde_json::from_slice(&bytes) {
            Ok(config) => config,
            Err(e) => {
                warn!(deck, error = %e, "Deck language config is not valid JSON; ignoring");
                Self::default()
            }
        }
    }

    /// Pretty JSON as written to the media folder
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Non-empty languages as overrides
    pub fn as_overrides(&self) -> LanguageOverrides {
        let clean = |lang: &Option<String>| {
            lang.as_deref()
                .map(str::trim)
                .filter(|lang| !lang.is_empty())
                .map(str::to_string)
        };
        LanguageOverrides {
            front: clean(&self.front_lang),
            back: clean(&self.back_lang),
        }
    }
}

/// Filename-safe form of a deck name: trimmed, with each run of characters
/// outside `[A-Za-z0-9._-]` replaced by one `_`
pub fn sanitize_deck_name(deck_name: &str) -> String {
    UNSAFE_FILENAME_CHARS
        .replace_all(deck_name.trim(), "_")
        .into_owned()
}

/// Media filename holding a deck's language config
pub fn deck_config_filename(deck_name: &str) -> String {
    format!("_ankiVoice.deck.{}.json", sanitize_deck_name(deck_name))
}
