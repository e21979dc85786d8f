//! Front/back language resolution
//!
//! Precedence, strongest first:
//! 1. Note tags (`av:front=<code>`, `av:back=<code>`)
//! 2. Deck-level config blob in the media folder
//! 3. Configured default (`en-US`)
//!
//! Resolution never fails: an unreachable Anki, a missing card, missing
//! tags or a missing/garbled deck config all just fall through to the next
//! tier.

pub mod cache;
pub mod deck;
pub mod tags;

pub use cache::DeckLanguageCache;
pub use deck::{deck_config_filename, sanitize_deck_name, LanguageConfig};
pub use tags::{overrides_from_tags, LanguageOverrides, TagPrefixes};

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::anki::AnkiCollaborator;
use crate::config::LanguageSettings;
use crate::{Error, Result};

/// Language used when nothing else applies
pub const DEFAULT_LANGUAGE: &str = "en-US";

/// Effective languages for both sides of a card
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedLanguages {
    pub front_language: String,
    pub back_language: String,
}

/// Resolves card languages through note tags, deck config and the default
pub struct LanguageResolver {
    anki: Arc<dyn AnkiCollaborator>,
    cache: Arc<DeckLanguageCache>,
    prefixes: TagPrefixes,
    default_language: String,
}

impl LanguageResolver {
    pub fn new(
        anki: Arc<dyn AnkiCollaborator>,
        cache: Arc<DeckLanguageCache>,
        prefixes: TagPrefixes,
        default_language: impl Into<String>,
    ) -> Self {
        let default_language = default_language.into();
        let default_language = if default_language.trim().is_empty() {
            DEFAULT_LANGUAGE.to_string()
        } else {
            default_language
        };
        Self {
            anki,
            cache,
            prefixes,
            default_language,
        }
    }

    pub fn from_settings(anki: Arc<dyn AnkiCollaborator>, settings: &LanguageSettings) -> Self {
        Self::new(
            anki,
            Arc::new(DeckLanguageCache::from_ttl_secs(settings.cache_ttl_secs)),
            TagPrefixes::from(settings),
            settings.default.clone(),
        )
    }

    pub fn cache(&self) -> &DeckLanguageCache {
        &self.cache
    }

    pub fn default_language(&self) -> &str {
        &self.default_language
    }

    /// Both languages for the configured default, no lookups
    pub fn defaults(&self) -> ResolvedLanguages {
        self.finish(LanguageOverrides::default())
    }

    /// Resolve a card's front and back languages
    pub async fn resolve(&self, card_id: i64) -> ResolvedLanguages {
        let card = match self.anki.card_info(card_id).await {
            Ok(Some(card)) => card,
            Ok(None) => {
                debug!(card_id, "Card not found; using default languages");
                return self.defaults();
            }
            Err(e) => {
                warn!(card_id, error = %e, "Card lookup failed; using default languages");
                return self.defaults();
            }
        };

        let mut overrides = LanguageOverrides::default();
        if let Some(note_id) = card.note_id {
            match self.anki.note_tags(note_id).await {
                Ok(tags) => overrides = overrides_from_tags(&tags, &self.prefixes),
                Err(e) => warn!(card_id, note_id, error = %e, "Note tag lookup failed; ignoring tag overrides"),
            }
        }

        if !overrides.is_complete() {
            if let Some(deck) = card.deck_name.as_deref().filter(|d| !d.trim().is_empty()) {
                let deck_config = self.deck_config(deck).await;
                overrides = overrides.or_fill(deck_config.as_overrides());
            }
        }

        let resolved = self.finish(overrides);
        debug!(
            card_id,
            front = %resolved.front_language,
            back = %resolved.back_language,
            "Resolved card languages"
        );
        resolved
    }

    /// Deck config through the cache. Missing blobs are cached as empty
    /// configs; connectivity failures are not cached.
    pub async fn deck_config(&self, deck: &str) -> LanguageConfig {
        if let Some(config) = self.cache.get(deck) {
            return config;
        }

        let config = match self.fetch_deck_config(deck).await {
            Ok(config) => config,
            Err(Error::ConfigNotFound(filename)) => {
                debug!(deck, filename = %filename, "No deck language config");
                LanguageConfig::default()
            }
            Err(e) => {
                warn!(deck, error = %e, "Deck language config lookup failed");
                return LanguageConfig::default();
            }
        };

        self.cache.insert(deck, config.clone());
        config
    }

    async fn fetch_deck_config(&self, deck: &str) -> Result<LanguageConfig> {
        let filename = deck_config_filename(deck);
        match self.anki.retrieve_media_file(&filename).await? {
            Some(data) => Ok(LanguageConfig::from_media_blob(deck, &data)),
            None => Err(Error::ConfigNotFound(filename)),
        }
    }

    fn finish(&self, overrides: LanguageOverrides) -> ResolvedLanguages {
        ResolvedLanguages {
            front_language: overrides
                .front
                .unwrap_or_else(|| self.default_language.clone()),
            back_language: overrides
                .back
                .unwrap_or_else(|| self.default_language.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anki::CardInfo;
    use async_trait::async_trait;
    use base64::{engine::general_purpose, Engine as _};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// In-memory Anki with call counters
    #[derive(Default)]
    struct FakeAnki {
        cards: HashMap<i64, CardInfo>,
        tags: HashMap<i64, Vec<String>>,
        media: HashMap<String, String>,
        offline: bool,
        tags_offline: bool,
        media_offline: bool,
        media_calls: AtomicUsize,
        tag_calls: AtomicUsize,
    }

    impl FakeAnki {
        fn with_card(mut self, card_id: i64, deck: &str, note_id: i64) -> Self {
            self.cards.insert(
                card_id,
                CardInfo {
                    card_id,
                    deck_name: Some(deck.to_string()),
                    note_id: Some(note_id),
                },
            );
            self
        }

        fn with_tags(mut self, note_id: i64, tags: &[&str]) -> Self {
            self.tags
                .insert(note_id, tags.iter().map(|t| t.to_string()).collect());
            self
        }

        fn with_deck_config(mut self, deck: &str, json: &str) -> Self {
            self.media.insert(
                deck_config_filename(deck),
                general_purpose::STANDARD.encode(json),
            );
            self
        }
    }

    #[async_trait]
    impl AnkiCollaborator for FakeAnki {
        async fn card_info(&self, card_id: i64) -> Result<Option<CardInfo>> {
            if self.offline {
                return Err(Error::Connectivity("Cannot connect to AnkiConnect".into()));
            }
            Ok(self.cards.get(&card_id).cloned())
        }

        async fn note_tags(&self, note_id: i64) -> Result<Vec<String>> {
            self.tag_calls.fetch_add(1, Ordering::SeqCst);
            if self.tags_offline {
                return Err(Error::Timeout("AnkiConnect did not respond in time".into()));
            }
            Ok(self.tags.get(&note_id).cloned().unwrap_or_default())
        }

        async fn retrieve_media_file(&self, filename: &str) -> Result<Option<String>> {
            self.media_calls.fetch_add(1, Ordering::SeqCst);
            if self.media_offline {
                return Err(Error::Connectivity("Cannot connect to AnkiConnect".into()));
            }
            Ok(self.media.get(filename).cloned())
        }
    }

    fn resolver(anki: FakeAnki) -> (LanguageResolver, Arc<FakeAnki>) {
        let anki = Arc::new(anki);
        let resolver = LanguageResolver::new(
            anki.clone(),
            Arc::new(DeckLanguageCache::new()),
            TagPrefixes::default(),
            DEFAULT_LANGUAGE,
        );
        (resolver, anki)
    }

    #[tokio::test]
    async fn test_note_tag_overrides_deck_config() {
        let (resolver, _) = resolver(
            FakeAnki::default()
                .with_card(1, "Spanish 1", 10)
                .with_tags(10, &["av:front=fr-FR"])
                .with_deck_config("Spanish 1", r#"{"frontLang":"es-ES","backLang":"en-GB"}"#),
        );

        let resolved = resolver.resolve(1).await;
        assert_eq!(resolved.front_language, "fr-FR");
        assert_eq!(resolved.back_language, "en-GB");
    }

    #[tokio::test]
    async fn test_no_tags_no_deck_config_uses_default() {
        let (resolver, _) = resolver(FakeAnki::default().with_card(1, "Plain", 10));

        let resolved = resolver.resolve(1).await;
        assert_eq!(resolved.front_language, "en-US");
        assert_eq!(resolved.back_language, "en-US");
    }

    #[tokio::test]
    async fn test_offline_anki_uses_default_without_further_lookups() {
        let mut anki = FakeAnki::default().with_card(1, "Spanish 1", 10);
        anki.offline = true;
        let (resolver, anki) = resolver(anki);

        let resolved = resolver.resolve(1).await;
        assert_eq!(resolved, resolver.defaults());
        assert_eq!(anki.tag_calls.load(Ordering::SeqCst), 0);
        assert_eq!(anki.media_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unknown_card_uses_default() {
        let (resolver, _) = resolver(FakeAnki::default());
        assert_eq!(resolver.resolve(42).await, resolver.defaults());
    }

    #[tokio::test]
    async fn test_tag_lookup_failure_falls_through_to_deck() {
        let mut anki = FakeAnki::default()
            .with_card(1, "Spanish 1", 10)
            .with_tags(10, &["av:front=fr-FR"])
            .with_deck_config("Spanish 1", r#"{"frontLang":"es-ES","backLang":"en-US"}"#);
        anki.tags_offline = true;
        let (resolver, _) = resolver(anki);

        let resolved = resolver.resolve(1).await;
        assert_eq!(resolved.front_language, "es-ES");
    }

    #[tokio::test]
    async fn test_complete_tags_skip_deck_lookup() {
        let (resolver, anki) = resolver(
            FakeAnki::default()
                .with_card(1, "Spanish 1", 10)
                .with_tags(10, &["av:front=es-MX", "av:back=en-US"]),
        );

        resolver.resolve(1).await;
        assert_eq!(anki.media_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_deck_config_is_cached() {
        let (resolver, anki) = resolver(
            FakeAnki::default()
                .with_card(1, "Spanish 1", 10)
                .with_card(2, "Spanish 1", 20)
                .with_card(3, "Plain", 30)
                .with_deck_config("Spanish 1", r#"{"frontLang":"es-ES","backLang":"en-US"}"#),
        );

        assert_eq!(resolver.resolve(1).await.front_language, "es-ES");
        assert_eq!(resolver.resolve(2).await.front_language, "es-ES");
        assert_eq!(anki.media_calls.load(Ordering::SeqCst), 1);

        // Missing configs are cached too
        resolver.resolve(3).await;
        resolver.resolve(3).await;
        assert_eq!(anki.media_calls.load(Ordering::SeqCst), 2);

        resolver.cache().invalidate("Spanish 1");
        resolver.resolve(1).await;
        assert_eq!(anki.media_calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_missing_config_cached_but_failed_lookup_not() {
        let (online, _) = resolver(FakeAnki::default());
        assert_eq!(online.deck_config("Plain").await, LanguageConfig::default());
        assert_eq!(online.cache().get("Plain"), Some(LanguageConfig::default()));

        let mut anki = FakeAnki::default();
        anki.media_offline = true;
        let (offline, anki) = resolver(anki);
        assert_eq!(offline.deck_config("Plain").await, LanguageConfig::default());
        assert!(offline.cache().is_empty());

        offline.deck_config("Plain").await;
        assert_eq!(anki.media_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_blank_default_falls_back_to_en_us() {
        let resolver = LanguageResolver::new(
            Arc::new(FakeAnki::default()),
            Arc::new(DeckLanguageCache::new()),
            TagPrefixes::default(),
            "  ",
        );
        assert_eq!(resolver.default_language(), "en-US");
    }

    #[tokio::test]
    async fn test_custom_default_language() {
        let settings = LanguageSettings {
            default: "es-ES".to_string(),
            ..LanguageSettings::default()
        };
        let resolver = LanguageResolver::from_settings(Arc::new(FakeAnki::default()), &settings);
        let resolved = resolver.resolve(7).await;
        assert_eq!(resolved.front_language, "es-ES");
        assert_eq!(resolved.back_language, "es-ES");
    }
}
