//! Deck language config cache
//!
//! Owned by the resolver and shared across requests. Concurrent misses for
//! the same deck may both fetch; the last insert wins, which is harmless
//! because a deck's config is the same whoever fetched it.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use std::time::{Duration, Instant};

use super::deck::LanguageConfig;

#[derive(Debug, Clone)]
struct CacheEntry {
    config: LanguageConfig,
    stored_at: Instant,
}

/// Deck name → language config, with an optional time-to-live
#[derive(Debug, Default)]
pub struct DeckLanguageCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    ttl: Option<Duration>,
}

impl DeckLanguageCache {
    /// Cache whose entries live until explicitly invalidated
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache whose entries expire `ttl` after being stored
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl: Some(ttl),
        }
    }

    pub fn from_ttl_secs(ttl_secs: Option<u64>) -> Self {
        match ttl_secs {
            Some(secs) => Self::with_ttl(Duration::from_secs(secs)),
            None => Self::new(),
        }
    }

    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    /// Fresh entry for `deck`, if any
    pub fn get(&self, deck: &str) -> Option<LanguageConfig> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries
            .get(deck)
            .filter(|entry| self.is_fresh(entry))
            .map(|entry| entry.config.clone())
    }

    pub fn insert(&self, deck: impl Into<String>, config: LanguageConfig) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.insert(
            deck.into(),
            CacheEntry {
                config,
                stored_at: Instant::now(),
            },
        );
    }

    /// Forget one deck so its next lookup refetches
    pub fn invalidate(&self, deck: &str) -> bool {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.remove(deck).is_some()
    }

    pub fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Number of stored entries, expired ones included
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn is_fresh(&self, entry: &CacheEntry) -> bool {
        match self.ttl {
            Some(ttl) => entry.stored_at.elapsed() < ttl,
            None => true,
        }
    }
}
