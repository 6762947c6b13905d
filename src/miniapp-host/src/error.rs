//! Host-side error types.

use thiserror::Error;

/// Errors surfaced by the session controller and its configuration.
#[derive(Error, Debug)]
pub enum HostError {
    /// The messaging service failed to issue a session.
    #[error("Session request failed: {0}")]
    SessionRequest(String),

    /// A session URL could not be parsed.
    #[error("Invalid session URL '{url}': {message}")]
    InvalidUrl { url: String, message: String },

    /// An operation was attempted in the wrong lifecycle phase.
    #[error("Invalid session state: expected {expected}, got {actual}")]
    InvalidState { expected: String, actual: String },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// IO error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl HostError {
    /// Create a session request error.
    pub fn session_request(message: impl Into<String>) -> Self {
        Self::SessionRequest(message.into())
    }

    /// Create an invalid URL error.
    pub fn invalid_url(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidUrl {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Create an invalid state error.
    pub fn invalid_state(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self::InvalidState {
            expected: expected.into(),
            actual: actual.into(),
        }
    }
}

impl From<serde_json::Error> for HostError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}

impl From<toml::de::Error> for HostError {
    fn from(err: toml::de::Error) -> Self {
        Self::ConfigError(err.to_string())
    }
}

/// Result type alias for host operations.
pub type Result<T> = std::result::Result<T, HostError>;
