//! Overlay placement.
//!
//! Pure arithmetic over image dimensions; nothing here decodes pixels.
//! Coordinates are not clamped to the base image. Whatever falls outside is
//! clipped by the compositor.

use artifex_types::Dimensions;

/// Share of the font size above the baseline.
const ASCENT: f32 = 0.8;

/// Axis-aligned pixel rectangle. The origin may lie outside the base image.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rect {
    pub x: i64,
    pub y: i64,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn size(&self) -> Dimensions {
        Dimensions::new(self.width, self.height)
    }

    /// Whether pixel `(px, py)` lies inside the rectangle.
    pub fn contains(&self, px: i64, py: i64) -> bool {
        px >= self.x
            && py >= self.y
            && px < self.x.saturating_add(i64::from(self.width))
            && py < self.y.saturating_add(i64::from(self.height))
    }

    /// Whether any part of the rectangle lies inside `bounds` placed at the origin.
    pub fn intersects(&self, bounds: Dimensions) -> bool {
        self.width > 0
            && self.height > 0
            && self.x < i64::from(bounds.width)
            && self.y < i64::from(bounds.height)
            && self.x.saturating_add(i64::from(self.width)) > 0
            && self.y.saturating_add(i64::from(self.height)) > 0
    }
}

/// Where a text annotation goes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextLayout {
    /// Backing box in base-image coordinates.
    pub rect: Rect,
    /// Text origin (left edge, baseline) relative to the box.
    pub baseline_x: f32,
    pub baseline_y: f32,
    pub font_size: f32,
}

/// Lay out a text annotation anchored by its bottom-left corner at `(x, y)`.
///
/// The width is an estimate, `chars * font_size / 1.8`, not shaped text; the
/// box is a translucent backing so small errors are invisible.
pub fn text_layout(x: i64, y: i64, text: &str, font_size: f32, padding: f32) -> TextLayout {
    let chars = text.chars().count() as f64;
    // font_size / 1.8 written as * 5 / 9 so whole results stay exact.
    let width = (chars * f64::from(font_size) * 5.0 / 9.0).ceil().max(1.0) as u32;
    let height = (font_size + padding).ceil().max(1.0) as u32;

    TextLayout {
        rect: Rect {
            x,
            y: y.saturating_sub(i64::from(height)),
            width,
            height,
        },
        baseline_x: padding / 2.0,
        baseline_y: padding / 2.0 + font_size * ASCENT,
        font_size,
    }
}

/// Where a drawing layer goes and at what size.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DrawLayout {
    pub rect: Rect,
    /// Whether the layer must be resized to `rect`'s size.
    pub scaled: bool,
}

/// Place a drawing of size `overlay` at `offset` (default top-left corner).
pub fn draw_layout(overlay: Dimensions, base: Dimensions, offset: Option<(i64, i64)>) -> DrawLayout {
    let (x, y) = offset.unwrap_or((0, 0));
    let size = fit_within(overlay, base);
    DrawLayout {
        rect: Rect {
            x,
            y,
            width: size.width,
            height: size.height,
        },
        scaled: size != overlay,
    }
}

/// Scale `overlay` down to fit inside `bounds`, keeping its aspect ratio.
///
/// Never upscales: an overlay that already fits is returned unchanged.
pub fn fit_within(overlay: Dimensions, bounds: Dimensions) -> Dimensions {
    if overlay.fits_within(&bounds) {
        return overlay;
    }
    let ratio = f64::min(
        f64::from(bounds.width) / f64::from(overlay.width.max(1)),
        f64::from(bounds.height) / f64::from(overlay.height.max(1)),
    );
    // The epsilon keeps an exact fit like 400 * (200 / 400) from flooring to 199.
    let scale =
        |v: u32, limit: u32| ((f64::from(v) * ratio + 1e-9).floor() as u32).clamp(1, limit.max(1));
    Dimensions::new(
        scale(overlay.width, bounds.width),
        scale(overlay.height, bounds.height),
    )
}
