//! Deterministic concept-matching judge
//!
//! A transcript is normalized once and each concept is a hit when any of
//! its aliases (or its canonical name) occurs in it as a substring.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static DISALLOWED_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z0-9\s/-]").expect("valid normalize regex"));

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

/// Unescape HTML entities, lowercase, replace everything outside
/// `[a-z0-9 / -]` with a space, collapse whitespace and trim.
///
/// Idempotent: `normalize(&normalize(s)) == normalize(s)`.
pub fn normalize(s: &str) -> String {
    let unescaped = html_escape::decode_html_entities(s);
    let lowered = unescaped.to_lowercase();
    let replaced = DISALLOWED_CHARS.replace_all(&lowered, " ");
    WHITESPACE_RUN.replace_all(&replaced, " ").trim().to_string()
}

/// Three-way grading verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Correct,
    Partial,
    Wrong,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Correct => "correct",
            Verdict::Partial => "partial",
            Verdict::Wrong => "wrong",
        }
    }

    /// Verdict for `hits` matched concepts out of `total`
    pub fn from_counts(hits: usize, total: usize) -> Self {
        if hits == total {
            Verdict::Correct
        } else if hits >= total.saturating_sub(1).max(1) {
            Verdict::Partial
        } else {
            Verdict::Wrong
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Concept name → alias set, e.g. `{"embb": ["enhanced mobile broadband"]}`
///
/// Serialized as a plain JSON object of arrays.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConceptTable(BTreeMap<String, BTreeSet<String>>);

impl ConceptTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or extend) a concept with the given aliases
    pub fn with_concept<I, S>(mut self, name: impl Into<String>, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.0
            .entry(name.into())
            .or_default()
            .extend(aliases.into_iter().map(Into::into));
        self
    }

    /// Same table with every alias normalized and the normalized concept
    /// name added as an alias. Concept names themselves are kept as-is
    /// since they are reported back in hits/missing.
    pub fn with_normalized_aliases(&self) -> Self {
        Self(
            self.0
                .iter()
                .map(|(name, aliases)| {
                    let normalized = std::iter::once(name)
                        .chain(aliases.iter())
                        .map(|alias| normalize(alias))
                        .collect();
                    (name.clone(), normalized)
                })
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn concepts(&self) -> impl Iterator<Item = (&String, &BTreeSet<String>)> {
        self.0.iter()
    }
}

impl FromIterator<(String, BTreeSet<String>)> for ConceptTable {
    fn from_iter<T: IntoIterator<Item = (String, BTreeSet<String>)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Judge output before ease mapping
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JudgeOutcome {
    pub verdict: Verdict,
    pub hits: BTreeSet<String>,
    pub missing: BTreeSet<String>,
}

/// Match a transcript against a concept table.
///
/// An empty table is vacuously `correct`. Empty aliases never match.
pub fn judge(transcript: &str, concepts: &ConceptTable) -> JudgeOutcome {
    let text = normalize(transcript);

    let (hits, missing): (BTreeSet<String>, BTreeSet<String>) = concepts
        .concepts()
        .map(|(name, aliases)| {
            let hit = std::iter::once(name)
                .chain(aliases.iter())
                .filter(|alias| !alias.is_empty())
                .any(|alias| text.contains(alias.as_str()));
            (name, hit)
        })
        .fold(Default::default(), |(mut hits, mut missing), (name, hit)| {
            if hit {
                hits.insert(name.clone());
            } else {
                missing.insert(name.clone());
            }
            (hits, missing)
        });

    JudgeOutcome {
        verdict: Verdict::from_counts(hits.len(), concepts.len()),
        hits,
        missing,
    }
}
