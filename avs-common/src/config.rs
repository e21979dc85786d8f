//! Configuration loading
//!
//! Config file resolution follows the usual priority order:
//! 1. Command-line argument (highest priority)
//! 2. `AVS_CONFIG` environment variable
//! 3. `<user config dir>/anki-voice/config.toml`
//! 4. Compiled defaults (fallback)
//!
//! A handful of environment variables then override individual fields.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::{Error, Result};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "AVS_CONFIG";

/// Complete server configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address the HTTP server binds to
    #[serde(default = "default_bind")]
    pub bind: String,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub anki: AnkiConfig,

    #[serde(default)]
    pub language: LanguageSettings,

    #[serde(default)]
    pub explain: ExplainConfig,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive (trace, debug, info, warn, error); `RUST_LOG` wins
    #[serde(default = "default_log_level")]
    pub level: String,
}

/// Where Anki's HTTP endpoints live and how long to wait for them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnkiConfig {
    /// AnkiConnect endpoint
    #[serde(default = "default_connect_url")]
    pub connect_url: String,

    /// Anki Voice reviewer add-on endpoint
    #[serde(default = "default_addon_url")]
    pub addon_url: String,

    /// Timeout for data lookups (cards, notes, media, add-on)
    #[serde(default = "default_data_timeout_ms")]
    pub data_timeout_ms: u64,

    /// Timeout for reviewer GUI actions
    #[serde(default = "default_gui_timeout_ms")]
    pub gui_timeout_ms: u64,
}

/// Language resolution settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguageSettings {
    /// Language used when neither note tags nor deck config say otherwise
    #[serde(default = "default_language")]
    pub default: String,

    #[serde(default = "default_front_tag_prefix")]
    pub front_tag_prefix: String,

    #[serde(default = "default_back_tag_prefix")]
    pub back_tag_prefix: String,

    /// Deck config cache lifetime; absent means entries never expire
    #[serde(default)]
    pub cache_ttl_secs: Option<u64>,
}

/// Generative explanation backend settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplainConfig {
    /// When false, explanations return a fixed test-mode answer
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Chat server base URL
    #[serde(default = "default_explain_base_url")]
    pub base_url: String,

    #[serde(default = "default_explain_model")]
    pub model: String,

    #[serde(default = "default_explain_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_bind() -> String {
    "0.0.0.0:8000".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_connect_url() -> String {
    "http://127.0.0.1:8765".to_string()
}

fn default_addon_url() -> String {
    "http://127.0.0.1:8770".to_string()
}

fn default_data_timeout_ms() -> u64 {
    2000
}

fn default_gui_timeout_ms() -> u64 {
    4000
}

fn default_language() -> String {
    "en-US".to_string()
}

fn default_front_tag_prefix() -> String {
    "av:front".to_string()
}

fn default_back_tag_prefix() -> String {
    "av:back".to_string()
}

fn default_true() -> bool {
    true
}

fn default_explain_base_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_explain_model() -> String {
    "llama2:latest".to_string()
}

fn default_explain_timeout_secs() -> u64 {
    45
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            logging: LoggingConfig::default(),
            anki: AnkiConfig::default(),
            language: LanguageSettings::default(),
            explain: ExplainConfig::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for AnkiConfig {
    fn default() -> Self {
        Self {
            connect_url: default_connect_url(),
            addon_url: default_addon_url(),
            data_timeout_ms: default_data_timeout_ms(),
            gui_timeout_ms: default_gui_timeout_ms(),
        }
    }
}

impl Default for LanguageSettings {
    fn default() -> Self {
        Self {
            default: default_language(),
            front_tag_prefix: default_front_tag_prefix(),
            back_tag_prefix: default_back_tag_prefix(),
            cache_ttl_secs: None,
        }
    }
}

impl Default for ExplainConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: default_explain_base_url(),
            model: default_explain_model(),
            timeout_secs: default_explain_timeout_secs(),
        }
    }
}

impl ServerConfig {
    /// Resolve, load and env-override the configuration.
    ///
    /// An explicitly named file (CLI or `AVS_CONFIG`) must exist and parse.
    /// The per-user default file is optional: when missing, compiled
    /// defaults are used with a warning.
    pub fn load(cli_path: Option<&Path>) -> Result<Self> {
        let explicit = cli_path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var(CONFIG_ENV_VAR).ok().map(PathBuf::from));

        let mut config = match explicit {
            Some(path) => {
                info!("Loading config from {}", path.display());
                Self::from_file(&path)?
            }
            None => match default_config_path() {
                Some(path) if path.exists() => {
                    info!("Loading config from {}", path.display());
                    Self::from_file(&path)?
                }
                _ => {
                    warn!("No config file found, using compiled defaults");
                    Self::default()
                }
            },
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse a TOML config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
        Self::from_toml(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))
    }

    /// Apply `AVS_*` / `OLLAMA_*` environment overrides
    pub fn apply_env_overrides(&mut self) {
        if let Some(bind) = env_value("AVS_BIND") {
            self.bind = bind;
        }
        if let Some(url) = env_value("AVS_ANKICONNECT_URL") {
            self.anki.connect_url = url;
        }
        if let Some(url) = env_value("AVS_ADDON_URL") {
            self.anki.addon_url = url;
        }
        if let Some(url) = env_value("OLLAMA_API_BASE") {
            self.explain.base_url = url;
        }
        if let Some(model) = env_value("OLLAMA_MODEL") {
            self.explain.model = model;
        }
        if let Some(flag) = env_value("AVS_EXPLAIN_ENABLED") {
            match parse_flag(&flag) {
                Some(enabled) => self.explain.enabled = enabled,
                None => warn!("Ignoring AVS_EXPLAIN_ENABLED={:?} (expected 1/0/true/false)", flag),
            }
        }
    }
}

/// `<user config dir>/anki-voice/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("anki-voice").join("config.toml"))
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.bind, "0.0.0.0:8000");
        assert_eq!(config.anki.connect_url, "http://127.0.0.1:8765");
        assert_eq!(config.anki.data_timeout_ms, 2000);
        assert_eq!(config.anki.gui_timeout_ms, 4000);
        assert_eq!(config.language.default, "en-US");
        assert_eq!(config.language.front_tag_prefix, "av:front");
        assert_eq!(config.language.cache_ttl_secs, None);
        assert!(config.explain.enabled);
        assert_eq!(config.explain.timeout_secs, 45);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = ServerConfig::from_toml(
            r#"
            bind = "127.0.0.1:9000"

            [language]
            default = "es-ES"
            cache_ttl_secs = 300
            "#,
        )
        .unwrap();

        assert_eq!(config.bind, "127.0.0.1:9000");
        assert_eq!(config.language.default, "es-ES");
        assert_eq!(config.language.cache_ttl_secs, Some(300));
        assert_eq!(config.language.back_tag_prefix, "av:back");
        assert_eq!(config.anki, AnkiConfig::default());
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = ServerConfig::from_toml("bind = [").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_parse_flag() {
        assert_eq!(parse_flag("1"), Some(true));
        assert_eq!(parse_flag("TRUE"), Some(true));
        assert_eq!(parse_flag("0"), Some(false));
        assert_eq!(parse_flag("off"), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }
}
