//! Error types for the Parley gateway

use thiserror::Error;

/// Result type alias for Parley operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the Parley gateway
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Request failed validation (missing or malformed field)
    #[error("invalid request: {0}")]
    Validation(String),

    /// Speech-to-text stage failed
    #[error("transcription error: {0}")]
    Transcription(String),

    /// Translation stage failed
    #[error("translation error: {0}")]
    Translation(String),

    /// Text-to-speech stage failed
    #[error("synthesis error: {0}")]
    Synthesis(String),

    /// Capability provider returned an unusable response
    #[error("provider error: {0}")]
    Provider(String),

    /// A pipeline stage did not finish within its deadline
    #[error("{stage} timed out after {secs}s")]
    Timeout {
        /// Stage that was running
        stage: &'static str,
        /// Deadline that elapsed
        secs: u64,
    },

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl Error {
    /// Whether the error was caused by the caller's input
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Shorthand for building a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}
