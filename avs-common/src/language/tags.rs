//! Per-note language override tags
//!
//! A note may carry `av:front=<code>` / `av:back=<code>` tags overriding
//! the deck's languages for that note only.

use crate::config::LanguageSettings;

/// The two literal tag prefixes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagPrefixes {
    pub front: String,
    pub back: String,
}

impl Default for TagPrefixes {
    fn default() -> Self {
        Self {
            front: "av:front".to_string(),
            back: "av:back".to_string(),
        }
    }
}

impl From<&LanguageSettings> for TagPrefixes {
    fn from(settings: &LanguageSettings) -> Self {
        Self {
            front: settings.front_tag_prefix.clone(),
            back: settings.back_tag_prefix.clone(),
        }
    }
}

impl TagPrefixes {
    /// `<front>=<code> <back>=<code>`, the form written by the setup tool
    pub fn tag_pair(&self, front_lang: &str, back_lang: &str) -> String {
        format!("{}={} {}={}", self.front, front_lang, self.back, back_lang)
    }

    /// The two bare `<prefix>=` tokens removed by the setup tool
    pub fn removal_tokens(&self) -> String {
        format!("{}= {}=", self.front, self.back)
    }
}

/// Front/back languages that are known so far; `None` means "keep looking"
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LanguageOverrides {
    pub front: Option<String>,
    pub back: Option<String>,
}

impl LanguageOverrides {
    pub fn is_complete(&self) -> bool {
        self.front.is_some() && self.back.is_some()
    }

    /// Fill unset sides from a lower-precedence source
    pub fn or_fill(self, fallback: LanguageOverrides) -> Self {
        Self {
            front: self.front.or(fallback.front),
            back: self.back.or(fallback.back),
        }
    }
}

/// Read overrides from a note's tags. The first tag for each prefix wins;
/// an empty code counts as absent.
pub fn overrides_from_tags<S: AsRef<str>>(tags: &[S], prefixes: &TagPrefixes) -> LanguageOverrides {
    let mut overrides = LanguageOverrides::default();
    for tag in tags {
        let Some((prefix, code)) = tag.as_ref().trim().split_once('=') else {
            continue;
        };
        let code = code.trim();
        if code.is_empty() {
            continue;
        }
        if prefix == prefixes.front && overrides.front.is_none() {
            overrides.front = Some(code.to_string());
        } else if prefix == prefixes.back && overrides.back.is_none() {
            overrides.back = Some(code.to_string());
        }
    }
    overrides
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_both_overrides() {
        let tags = ["vocab", "av:front=fr-FR", "av:back=en-GB"];
        let overrides = overrides_from_tags(&tags, &TagPrefixes::default());
        assert_eq!(overrides.front.as_deref(), Some("fr-FR"));
        assert_eq!(overrides.back.as_deref(), Some("en-GB"));
        assert!(overrides.is_complete());
    }

    #[test]
    fn test_empty_code_is_absent() {
        let tags = ["av:front=", "av:back=es-ES"];
        let overrides = overrides_from_tags(&tags, &TagPrefixes::default());
        assert_eq!(overrides.front, None);
        assert_eq!(overrides.back.as_deref(), Some("es-ES"));
    }

    #[test]
    fn test_first_tag_wins() {
        let tags = ["av:front=es-MX", "av:front=es-ES"];
        let overrides = overrides_from_tags(&tags, &TagPrefixes::default());
        assert_eq!(overrides.front.as_deref(), Some("es-MX"));
    }

    #[test]
    fn test_prefix_must_match_exactly() {
        let tags = ["xav:front=de-DE", "av:frontside=de-DE", "AV:FRONT=de-DE"];
        let overrides = overrides_from_tags(&tags, &TagPrefixes::default());
        assert_eq!(overrides, LanguageOverrides::default());
    }

    #[test]
    fn test_or_fill_keeps_higher_precedence() {
        let tags = LanguageOverrides {
            front: Some("fr-FR".into()),
            back: None,
        };
        let deck = LanguageOverrides {
            front: Some("es-ES".into()),
            back: Some("en-US".into()),
        };
        let merged = tags.or_fill(deck);
        assert_eq!(merged.front.as_deref(), Some("fr-FR"));
        assert_eq!(merged.back.as_deref(), Some("en-US"));
    }

    #[test]
    fn test_setup_tool_tag_strings() {
        let prefixes = TagPrefixes::default();
        assert_eq!(prefixes.tag_pair("es-ES", "en-US"), "av:front=es-ES av:back=en-US");
        assert_eq!(prefixes.removal_tokens(), "av:front= av:back=");
    }
}
