//! Effective main-button state.

use serde::{Deserialize, Serialize};

use crate::color::Rgb;
use crate::inbound::MainButtonSetup;
use crate::theme::HostTheme;

/// Main-button state as published to the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MainButtonState {
    pub text: Option<String>,
    pub background_color: Rgb,
    pub text_color: Rgb,
    pub is_visible: bool,
    pub is_loading: bool,
    pub is_enabled: bool,
}

impl MainButtonState {
    /// A hidden button in the theme's default colors.
    pub fn hidden(theme: &HostTheme) -> Self {
        Self {
            text: None,
            background_color: theme.button_fill,
            text_color: theme.button_foreground,
            is_visible: false,
            is_loading: false,
            is_enabled: true,
        }
    }

    /// Apply host rules to a setup declared by content.
    ///
    /// Missing colors fall back to the theme's button colors, and the button is
    /// only visible when it has a non-blank label.
    pub fn resolve(setup: &MainButtonSetup, theme: &HostTheme) -> Self {
        let has_text = setup
            .text
            .as_deref()
            .is_some_and(|text| !text.trim().is_empty());

        Self {
            text: setup.text.clone(),
            background_color: setup.color.unwrap_or(theme.button_fill),
            text_color: setup.text_color.unwrap_or(theme.button_foreground),
            is_visible: setup.is_visible && has_text,
            is_loading: setup.is_progress_visible,
            is_enabled: setup.is_active,
        }
    }
}

impl Default for MainButtonState {
    fn default() -> Self {
        Self::hidden(&HostTheme::default())
    }
}
