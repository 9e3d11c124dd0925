use serde::{Deserialize, Serialize};

use crate::error::{OverlayError, OverlayResult};

/// Appearance of text annotations.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    /// Font size in pixels.
    pub font_size: f32,
    /// Vertical padding added to the font size to get the box height.
    pub padding: f32,
    pub font_family: String,
    pub text_color: String,
    pub backing_color: String,
    /// Opacity of the backing box, `0.0..=1.0`.
    pub backing_opacity: f32,
    /// Load the host's fonts at startup. Without fonts only the backing box
    /// is drawn.
    pub load_system_fonts: bool,
    /// Longest annotation accepted, in characters.
    pub max_text_chars: usize,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            font_size: 24.0,
            padding: 10.0,
            font_family: "sans-serif".into(),
            text_color: "white".into(),
            backing_color: "black".into(),
            backing_opacity: 0.6,
            load_system_fonts: true,
            max_text_chars: 1024,
        }
    }
}

impl OverlayConfig {
    /// Reject values that would produce empty or unbounded overlays.
    pub fn validate(&self) -> OverlayResult<()> {
        if !(self.font_size.is_finite() && self.font_size >= 1.0 && self.font_size <= 512.0) {
            return Err(OverlayError::InvalidConfig(format!(
                "font_size must be within 1..=512, got {}",
                self.font_size
            )));
        }
        if !(self.padding.is_finite() && self.padding >= 0.0 && self.padding <= 512.0) {
            return Err(OverlayError::InvalidConfig(format!(
                "padding must be within 0..=512, got {}",
                self.padding
            )));
        }
        if !(0.0..=1.0).contains(&self.backing_opacity) {
            return Err(OverlayError::InvalidConfig(format!(
                "backing_opacity must be within 0..=1, got {}",
                self.backing_opacity
            )));
        }
        if self.max_text_chars == 0 {
            return Err(OverlayError::InvalidConfig("max_text_chars must be positive".into()));
        }
        Ok(())
    }
}
