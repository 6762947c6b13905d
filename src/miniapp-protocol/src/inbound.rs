//! Inbound bridge events: embedded content to host.
//!
//! Content posts an envelope `{eventName, eventData}` through the surface's
//! script-message channel. [`decode`] turns it into an [`InboundEvent`]. Content
//! is untrusted, so every failure here is a [`ProtocolError`] that the caller
//! drops; unknown event names decode to [`InboundEvent::Unrecognized`] rather
//! than failing, so newer content keeps working against older hosts.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::color::Rgb;
use crate::error::{ProtocolError, Result};

/// Content submits data to the bot.
pub const WEB_APP_DATA_SEND: &str = "web_app_data_send";
/// Content configures the host's main button.
pub const WEB_APP_SETUP_MAIN_BUTTON: &str = "web_app_setup_main_button";
/// Content asks for the viewport to be republished.
pub const WEB_APP_REQUEST_VIEWPORT: &str = "web_app_request_viewport";
/// Content asks the host to expand its container.
pub const WEB_APP_EXPAND: &str = "web_app_expand";
/// Content asks the host to close the session.
pub const WEB_APP_CLOSE: &str = "web_app_close";

/// Raw envelope posted by embedded content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BridgeMessage {
    #[serde(rename = "eventName")]
    pub event_name: String,

    #[serde(rename = "eventData", default, skip_serializing_if = "Option::is_none")]
    pub event_data: Option<Value>,
}

impl BridgeMessage {
    /// Create an envelope without payload.
    pub fn new(event_name: impl Into<String>) -> Self {
        Self {
            event_name: event_name.into(),
            event_data: None,
        }
    }

    /// Create an envelope carrying a string payload, the shape content uses for
    /// almost every event.
    pub fn with_data(event_name: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            event_name: event_name.into(),
            event_data: Some(Value::String(data.into())),
        }
    }

    /// Parse an envelope from its JSON text.
    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).map_err(|e| ProtocolError::MalformedEnvelope(e.to_string()))
    }

    /// Parse an envelope from an already-decoded JSON value.
    pub fn from_value(value: Value) -> Result<Self> {
        serde_json::from_value(value).map_err(|e| ProtocolError::MalformedEnvelope(e.to_string()))
    }

    /// The payload as a string, when content sent one.
    pub fn data_str(&self) -> Option<&str> {
        self.event_data.as_ref().and_then(Value::as_str)
    }
}

/// A decoded inbound event.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundEvent {
    /// Raw data to hand to the bot, still undecoded.
    DataSend(String),
    /// Candidate main-button configuration.
    SetupMainButton(MainButtonSetup),
    /// Republish the viewport.
    RequestViewport,
    /// Expand the host container.
    Expand,
    /// Close the session.
    Close,
    /// An event name this host does not know.
    Unrecognized(String),
}

impl InboundEvent {
    /// Wire name of the event.
    pub fn name(&self) -> &str {
        match self {
            Self::DataSend(_) => WEB_APP_DATA_SEND,
            Self::SetupMainButton(_) => WEB_APP_SETUP_MAIN_BUTTON,
            Self::RequestViewport => WEB_APP_REQUEST_VIEWPORT,
            Self::Expand => WEB_APP_EXPAND,
            Self::Close => WEB_APP_CLOSE,
            Self::Unrecognized(name) => name,
        }
    }
}

/// Main-button configuration as declared by content, before host rules apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MainButtonSetup {
    pub is_visible: bool,
    pub text: Option<String>,
    /// Background color; `None` when absent or unparsable.
    pub color: Option<Rgb>,
    /// Label color; `None` when absent or unparsable.
    pub text_color: Option<Rgb>,
    pub is_progress_visible: bool,
    pub is_active: bool,
}

impl MainButtonSetup {
    /// Read a setup from the JSON object content sent.
    ///
    /// Only `is_visible` is required. Optional fields of the wrong type are
    /// treated as absent.
    pub fn from_value(value: &Value) -> Result<Self> {
        let object = value.as_object().ok_or_else(|| {
            ProtocolError::invalid_payload(WEB_APP_SETUP_MAIN_BUTTON, "expected a JSON object")
        })?;

        let is_visible = object
            .get("is_visible")
            .and_then(Value::as_bool)
            .ok_or_else(|| ProtocolError::missing_field(WEB_APP_SETUP_MAIN_BUTTON, "is_visible"))?;

        let color_field = |key: &str| {
            object
                .get(key)
                .and_then(Value::as_str)
                .and_then(|hex| Rgb::from_hex(hex).ok())
        };

        Ok(Self {
            is_visible,
            text: object.get("text").and_then(Value::as_str).map(str::to_string),
            color: color_field("color"),
            text_color: color_field("text_color"),
            is_progress_visible: object
                .get("is_progress_visible")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            is_active: object
                .get("is_active")
                .and_then(Value::as_bool)
                .unwrap_or(true),
        })
    }
}

/// Decode an envelope into a typed event.
pub fn decode(message: &BridgeMessage) -> Result<InboundEvent> {
    match message.event_name.as_str() {
        WEB_APP_DATA_SEND => match &message.event_data {
            Some(Value::String(data)) => Ok(InboundEvent::DataSend(data.clone())),
            Some(_) => Err(ProtocolError::invalid_payload(
                WEB_APP_DATA_SEND,
                "expected a string",
            )),
            None => Err(ProtocolError::missing_payload(WEB_APP_DATA_SEND)),
        },
        WEB_APP_SETUP_MAIN_BUTTON => {
            let payload = json_payload(message)?;
            Ok(InboundEvent::SetupMainButton(MainButtonSetup::from_value(
                &payload,
            )?))
        }
        WEB_APP_REQUEST_VIEWPORT => Ok(InboundEvent::RequestViewport),
        WEB_APP_EXPAND => Ok(InboundEvent::Expand),
        WEB_APP_CLOSE => Ok(InboundEvent::Close),
        other => Ok(InboundEvent::Unrecognized(other.to_string())),
    }
}

/// Decode an envelope straight from its JSON text.
pub fn decode_str(raw: &str) -> Result<InboundEvent> {
    decode(&BridgeMessage::from_json(raw)?)
}

/// Extract the string to submit from a `web_app_data_send` payload.
///
/// The payload must be a JSON object with a top-level `data` field. A string
/// value is returned verbatim; anything else is re-serialized as pretty JSON.
pub fn parse_data_payload(raw: &str) -> Result<String> {
    let value: Value = serde_json::from_str(raw)?;
    let object = value.as_object().ok_or_else(|| {
        ProtocolError::invalid_payload(WEB_APP_DATA_SEND, "expected a JSON object")
    })?;
    match object.get("data") {
        Some(Value::String(data)) => Ok(data.clone()),
        Some(other) => Ok(serde_json::to_string_pretty(other)?),
        None => Err(ProtocolError::missing_field(WEB_APP_DATA_SEND, "data")),
    }
}

/// Payloads arrive as string-encoded JSON; an inline object is accepted too.
fn json_payload(message: &BridgeMessage) -> Result<Value> {
    match &message.event_data {
        Some(Value::String(raw)) => Ok(serde_json::from_str(raw)?),
        Some(value @ Value::Object(_)) => Ok(value.clone()),
        Some(_) => Err(ProtocolError::invalid_payload(
            &message.event_name,
            "expected string-encoded JSON",
        )),
        None => Err(ProtocolError::missing_payload(&message.event_name)),
    }
}
