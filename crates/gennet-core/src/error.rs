//! Error types for GenNet.

use thiserror::Error;

/// Errors shared by all GenNet crates.
#[derive(Debug, Error)]
pub enum GenNetError {
    #[error("config error: {0}")]
    Config(String),

    #[error("http error: {0}")]
    Http(String),

    #[error("provider error: {0}")]
    Provider(String),

    #[error("API key missing for provider '{0}'")]
    ApiKeyMissing(String),

    #[error("knowledge error: {0}")]
    Knowledge(String),

    #[error("embedding error: {0}")]
    Embedding(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl GenNetError {
    /// Shorthand for a provider failure.
    pub fn provider(msg: impl Into<String>) -> Self {
        Self::Provider(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, GenNetError>;
