//! Host layout and the viewport derived from it.

use serde::{Deserialize, Serialize};

use crate::geometry::{Insets, Rect, Size};

/// Horizontal size class of the host container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WidthClass {
    #[default]
    Compact,
    Regular,
}

/// Container layout reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct HostLayout {
    pub size: Size,
    #[serde(default)]
    pub safe_insets: Insets,
    /// Insets the container itself draws into (home indicator, tab bars).
    #[serde(default)]
    pub intrinsic_insets: Insets,
    /// Extra insets added by the host, such as the input panel.
    #[serde(default)]
    pub additional_insets: Insets,
    /// Height of the on-screen input surface, when one is up.
    #[serde(default)]
    pub input_height: Option<f64>,
    #[serde(default)]
    pub navigation_bar_height: f64,
    #[serde(default)]
    pub width_class: WidthClass,
}

impl HostLayout {
    pub fn new(size: Size) -> Self {
        Self {
            size,
            ..Default::default()
        }
    }

    pub fn with_input_height(mut self, height: f64) -> Self {
        self.input_height = Some(height);
        self
    }

    pub fn with_navigation_bar_height(mut self, height: f64) -> Self {
        self.navigation_bar_height = height;
        self
    }

    pub fn with_safe_insets(mut self, insets: Insets) -> Self {
        self.safe_insets = insets;
        self
    }

    pub fn with_intrinsic_insets(mut self, insets: Insets) -> Self {
        self.intrinsic_insets = insets;
        self
    }

    pub fn with_additional_insets(mut self, insets: Insets) -> Self {
        self.additional_insets = insets;
        self
    }

    pub fn with_width_class(mut self, width_class: WidthClass) -> Self {
        self.width_class = width_class;
        self
    }

    /// Input height, with no input surface counting as zero.
    pub fn effective_input_height(&self) -> f64 {
        self.input_height.unwrap_or(0.0)
    }

    /// Whether going from `previous` to this layout opened the keyboard:
    /// the input height was zero and is now above `threshold`.
    pub fn opens_keyboard_from(&self, previous: &HostLayout, threshold: f64) -> bool {
        previous.effective_input_height() == 0.0
            && self.input_height.is_some_and(|height| height > threshold)
    }
}

/// Viewport published to the surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportState {
    /// Frame of the surface itself.
    pub surface_frame: Rect,
    /// Part of the surface not covered by the host's additional insets.
    pub available_frame: Rect,
    pub safe_insets: Insets,
    pub bottom_inset: f64,
    pub is_expand_eligible: bool,
}

impl ViewportState {
    /// Derive the viewport from a host layout.
    pub fn compute(layout: &HostLayout) -> Self {
        let x = layout.safe_insets.left;
        let y = layout.navigation_bar_height;
        let width = layout.size.width - layout.safe_insets.horizontal();
        let surface_height =
            (layout.size.height - layout.navigation_bar_height - layout.intrinsic_insets.bottom)
                .max(1.0);
        let available_height = (layout.size.height
            - layout.navigation_bar_height
            - layout.intrinsic_insets.bottom
            - layout.additional_insets.bottom)
            .max(1.0);

        Self {
            surface_frame: Rect::new(x, y, width, surface_height),
            available_frame: Rect::new(x, y, width, available_height),
            safe_insets: layout.safe_insets,
            bottom_inset: layout.intrinsic_insets.bottom + layout.additional_insets.bottom,
            is_expand_eligible: layout.width_class == WidthClass::Compact,
        }
    }
}
