//! Common error types for Anki Voice

use thiserror::Error;

/// Common result type for Anki Voice operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the Anki Voice crates
///
/// The language resolver and markup extractor never surface these; they
/// degrade to their documented fallbacks instead. The explanation path and
/// the reviewer actions report them to the caller.
#[derive(Error, Debug)]
pub enum Error {
    /// Collaborator unreachable (connection refused, DNS, reset)
    #[error("Connectivity error: {0}")]
    Connectivity(String),

    /// Collaborator did not answer within its timeout budget
    #[error("Timeout: {0}")]
    Timeout(String),

    /// AnkiConnect answered with a non-null `error` field or a non-2xx status
    #[error("AnkiConnect error from '{action}': {message}")]
    AnkiConnect { action: String, message: String },

    /// Deck-level language config blob does not exist
    #[error("Config not found: {0}")]
    ConfigNotFound(String),

    /// Generative explanation backend failed or timed out
    #[error("Backend failure: {0}")]
    Backend(String),

    /// Invalid input rejected before any collaborator call
    #[error("Invalid input: {0}")]
    Validation(String),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON encoding or decoding error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O operation error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Map a transport-level reqwest failure to a connectivity or timeout error
    pub fn from_transport(target: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Error::Timeout(format!("{} did not respond in time", target))
        } else if err.is_connect() {
            Error::Connectivity(format!("Cannot connect to {}: {}", target, err))
        } else {
            Error::Connectivity(format!("{} request failed: {}", target, err))
        }
    }

    /// True for errors caused by an unreachable or slow collaborator
    pub fn is_connectivity(&self) -> bool {
        matches!(self, Error::Connectivity(_) | Error::Timeout(_))
    }
}
