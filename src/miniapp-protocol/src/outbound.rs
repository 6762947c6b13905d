//! Outbound bridge events: host to embedded content.
//!
//! Events are delivered by evaluating a script in the surface that calls the
//! content-side receiver:
//!
//! ```text
//! <receiver> && <receiver>.receiveEvent("<name>", <data|null>)
//! ```
//!
//! The data argument is inserted as a script expression, not as a quoted string.

use serde_json::Value;

use crate::theme::ThemePalette;

/// Theme colors changed.
pub const THEME_CHANGED: &str = "theme_changed";
/// The host's main button was pressed.
pub const MAIN_BUTTON_PRESSED: &str = "main_button_pressed";

/// Receiver object content installs to accept host events.
pub const DEFAULT_SCRIPT_RECEIVER: &str = "window.TelegramGameProxy";

/// An event sent from the host into embedded content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundEvent {
    ThemeChanged(ThemePalette),
    MainButtonPressed,
    /// Any other event; `data` is an opaque script expression.
    Custom { name: String, data: Option<String> },
}

impl OutboundEvent {
    /// Create a custom event.
    pub fn custom(name: impl Into<String>, data: Option<String>) -> Self {
        Self::Custom {
            name: name.into(),
            data,
        }
    }

    /// Wire name of the event.
    pub fn name(&self) -> &str {
        match self {
            Self::ThemeChanged(_) => THEME_CHANGED,
            Self::MainButtonPressed => MAIN_BUTTON_PRESSED,
            Self::Custom { name, .. } => name,
        }
    }

    /// Serialized payload, if the event carries one.
    pub fn payload(&self) -> Option<String> {
        match self {
            Self::ThemeChanged(palette) => Some(encode_theme_params(palette)),
            Self::MainButtonPressed => None,
            Self::Custom { data, .. } => data.clone(),
        }
    }

    /// Render the script that delivers this event to `receiver`.
    pub fn to_script(&self, receiver: &str) -> String {
        // JSON string escaping is valid script string escaping
        let name = Value::String(self.name().to_string());
        let data = self.payload().unwrap_or_else(|| "null".to_string());
        format!("{receiver} && {receiver}.receiveEvent({name}, {data})")
    }
}

/// Encode a palette as the `theme_changed` payload.
///
/// Produces `{theme_params: {"bg_color": "#rrggbb", ...}}` with keys in fixed order.
pub fn encode_theme_params(palette: &ThemePalette) -> String {
    let entries = palette
        .entries()
        .iter()
        .map(|(key, color)| format!("\"{key}\": \"{color}\""))
        .collect::<Vec<_>>()
        .join(", ");
    format!("{{theme_params: {{{entries}}}}}")
}
