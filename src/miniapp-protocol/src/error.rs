//! Bridge protocol error types.

use thiserror::Error;

/// Errors raised while decoding or encoding bridge traffic.
///
/// None of these are fatal to the host: a decode failure means the event is
/// dropped and the session carries on.
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// The raw envelope was not an object with a string `eventName`.
    #[error("Malformed bridge envelope: {0}")]
    MalformedEnvelope(String),

    /// A recognized event arrived without the payload it requires.
    #[error("Missing payload for '{event}'")]
    MissingPayload { event: String },

    /// A recognized event arrived with a payload of the wrong shape.
    #[error("Invalid payload for '{event}': {message}")]
    InvalidPayload { event: String, message: String },

    /// A required field was absent from a JSON payload.
    #[error("Missing field '{field}' in '{event}' payload")]
    MissingField { event: String, field: &'static str },

    /// JSON (de)serialization failed.
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl ProtocolError {
    /// Create a missing payload error.
    pub fn missing_payload(event: impl Into<String>) -> Self {
        Self::MissingPayload {
            event: event.into(),
        }
    }

    /// Create an invalid payload error.
    pub fn invalid_payload(event: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidPayload {
            event: event.into(),
            message: message.into(),
        }
    }

    /// Create a missing field error.
    pub fn missing_field(event: impl Into<String>, field: &'static str) -> Self {
        Self::MissingField {
            event: event.into(),
            field,
        }
    }
}

impl From<serde_json::Error> for ProtocolError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}

/// Error type for hex color parsing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ColorParseError {
    /// Input string was empty.
    #[error("empty input")]
    EmptyInput,

    /// Hex string had an invalid length.
    #[error("invalid hex length: {0} (expected 3 or 6)")]
    InvalidLength(usize),

    /// Invalid hexadecimal character.
    #[error("invalid hex character")]
    InvalidHexChar,
}

/// Result type alias for protocol operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;
