//! # Mini-App Bridge Protocol
//!
//! Wire types for the bridge between a host messaging app and the bot mini-app
//! it embeds in a web surface.
//!
//! ## Features
//!
//! - **Theme palette**: derive the fixed six-key color palette from a host theme
//! - **Inbound codec**: decode `{eventName, eventData}` envelopes into typed events
//! - **Outbound codec**: render host events as receiver scripts
//! - **Main button**: resolve a declared button setup against host defaults
//!
//! Everything here is pure; session state lives in `miniapp-host`.
//!
//! ## Example
//!
//! ```rust
//! use miniapp_protocol::{decode_str, HostTheme, InboundEvent, OutboundEvent, ThemePalette};
//!
//! let event = decode_str(r#"{"eventName":"web_app_expand"}"#).unwrap();
//! assert_eq!(event, InboundEvent::Expand);
//!
//! let palette = ThemePalette::from_theme(&HostTheme::night());
//! let script = OutboundEvent::ThemeChanged(palette).to_script("window.TelegramGameProxy");
//! assert!(script.contains("theme_params"));
//! ```

pub mod color;
pub mod error;
pub mod inbound;
pub mod main_button;
pub mod outbound;
pub mod theme;
pub mod types;

// Re-exports for convenience
pub use color::Rgb;
pub use error::{ColorParseError, ProtocolError, Result};
pub use inbound::{
    decode, decode_str, parse_data_payload, BridgeMessage, InboundEvent, MainButtonSetup,
};
pub use main_button::MainButtonState;
pub use outbound::{encode_theme_params, OutboundEvent, DEFAULT_SCRIPT_RECEIVER};
pub use theme::{HostTheme, ThemePalette, PALETTE_KEYS};
pub use types::{MessageRef, PeerId, QueryId};
