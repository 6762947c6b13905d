//! Theme parameters handed to embedded content.
//!
//! The host resolves its own visual theme elsewhere; this module only turns the
//! handful of colors embedded content cares about into a [`ThemePalette`] with a
//! fixed key set. Derivation is pure, so the same theme always yields the same
//! palette whether it is computed for the initial session request or for a later
//! `theme_changed` event.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::color::Rgb;

/// Palette key for the page background.
pub const BG_COLOR: &str = "bg_color";
/// Palette key for primary text.
pub const TEXT_COLOR: &str = "text_color";
/// Palette key for hint/secondary text.
pub const HINT_COLOR: &str = "hint_color";
/// Palette key for links and accents.
pub const LINK_COLOR: &str = "link_color";
/// Palette key for the button background.
pub const BUTTON_COLOR: &str = "button_color";
/// Palette key for the button label.
pub const BUTTON_TEXT_COLOR: &str = "button_text_color";

/// All palette keys, in encoding order.
pub const PALETTE_KEYS: [&str; 6] = [
    BG_COLOR,
    TEXT_COLOR,
    HINT_COLOR,
    LINK_COLOR,
    BUTTON_COLOR,
    BUTTON_TEXT_COLOR,
];

/// The subset of the host's visual theme that matters to embedded content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostTheme {
    /// Plain list background.
    pub plain_background: Rgb,
    /// Background of grouped "block" lists; stands in when the plain background is black.
    pub blocks_background: Rgb,
    /// Primary item text.
    pub primary_text: Rgb,
    /// Secondary item text.
    pub secondary_text: Rgb,
    /// Accent color for links.
    pub accent: Rgb,
    /// Fill color of check marks and primary buttons.
    pub button_fill: Rgb,
    /// Foreground drawn on top of `button_fill`.
    pub button_foreground: Rgb,
}

impl HostTheme {
    /// The stock light theme.
    pub fn day() -> Self {
        Self {
            plain_background: Rgb::WHITE,
            blocks_background: Rgb::new(0xEFEFF4),
            primary_text: Rgb::BLACK,
            secondary_text: Rgb::new(0x8E8E93),
            accent: Rgb::new(0x007EE5),
            button_fill: Rgb::new(0x007EE5),
            button_foreground: Rgb::WHITE,
        }
    }

    /// The stock dark theme. Its plain background is pure black.
    pub fn night() -> Self {
        Self {
            plain_background: Rgb::BLACK,
            blocks_background: Rgb::new(0x1C1C1D),
            primary_text: Rgb::WHITE,
            secondary_text: Rgb::new(0x98989E),
            accent: Rgb::new(0x3E88F7),
            button_fill: Rgb::new(0x3E88F7),
            button_foreground: Rgb::WHITE,
        }
    }

    /// Background shown behind embedded content.
    ///
    /// Pure black is reserved: content runs its own dark-mode heuristics on the
    /// background it receives, so black is swapped for the block background.
    pub fn content_background(&self) -> Rgb {
        if self.plain_background.is_black() {
            self.blocks_background
        } else {
            self.plain_background
        }
    }
}

impl Default for HostTheme {
    fn default() -> Self {
        Self::day()
    }
}

/// Fixed key/color palette consumed by embedded content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemePalette {
    pub bg_color: Rgb,
    pub text_color: Rgb,
    pub hint_color: Rgb,
    pub link_color: Rgb,
    pub button_color: Rgb,
    pub button_text_color: Rgb,
}

impl ThemePalette {
    /// Derive the palette for a theme.
    pub fn from_theme(theme: &HostTheme) -> Self {
        Self {
            bg_color: theme.content_background(),
            text_color: theme.primary_text,
            hint_color: theme.secondary_text,
            link_color: theme.accent,
            button_color: theme.button_fill,
            button_text_color: theme.button_foreground,
        }
    }

    /// Key/color pairs in [`PALETTE_KEYS`] order.
    pub fn entries(&self) -> [(&'static str, Rgb); 6] {
        [
            (BG_COLOR, self.bg_color),
            (TEXT_COLOR, self.text_color),
            (HINT_COLOR, self.hint_color),
            (LINK_COLOR, self.link_color),
            (BUTTON_COLOR, self.button_color),
            (BUTTON_TEXT_COLOR, self.button_text_color),
        ]
    }

    /// Look up a color by palette key.
    pub fn get(&self, key: &str) -> Option<Rgb> {
        self.entries()
            .into_iter()
            .find_map(|(k, color)| (k == key).then_some(color))
    }

    /// Render as session request parameters: key to signed 32-bit RGB bit pattern.
    pub fn to_request_params(&self) -> Map<String, Value> {
        self.entries()
            .into_iter()
            .map(|(key, color)| (key.to_string(), Value::from(color.to_i32_bits())))
            .collect()
    }
}

impl From<&HostTheme> for ThemePalette {
    fn from(theme: &HostTheme) -> Self {
        Self::from_theme(theme)
    }
}
