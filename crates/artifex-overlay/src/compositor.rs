use std::io::Cursor;
use std::sync::Arc;

use artifex_types::Dimensions;
use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use resvg::{tiny_skia, usvg};

use crate::config::OverlayConfig;
use crate::error::{OverlayError, OverlayResult};
use crate::geometry::{self, Rect};
use crate::markup;

/// A freshly composited image.
#[derive(Clone, Debug)]
pub struct Composite {
    /// Encoded in the base image's own format.
    pub bytes: Vec<u8>,
    pub dimensions: Dimensions,
    /// The area the overlay was drawn over, in base-image coordinates.
    pub region: Rect,
}

/// Draws overlays on top of encoded images.
///
/// Decoding, resizing and blending go through the `image` crate; text
/// markup is rasterised by `resvg`. Fonts are loaded once at construction.
/// A `Compositor` is cheap to share behind an `Arc` and all methods are
/// CPU-bound, so async callers should run them on a blocking thread.
pub struct Compositor {
    config: OverlayConfig,
    fontdb: Arc<usvg::fontdb::Database>,
}

impl Compositor {
    pub fn new(config: OverlayConfig) -> OverlayResult<Self> {
        config.validate()?;
        let mut fontdb = usvg::fontdb::Database::new();
        if config.load_system_fonts {
            fontdb.load_system_fonts();
            if fontdb.is_empty() {
                tracing::warn!("no system fonts found; annotations will render without text");
            }
        }
        tracing::debug!(faces = fontdb.len(), "compositor fonts loaded");
        Ok(Self {
            config,
            fontdb: Arc::new(fontdb),
        })
    }

    pub fn config(&self) -> &OverlayConfig {
        &self.config
    }

    /// Draw a text annotation whose box has its bottom-left corner at `(x, y)`.
    pub fn annotate(&self, base: &[u8], x: i64, y: i64, text: &str) -> OverlayResult<Composite> {
        let (image, format) = decode_base(base)?;
        let layout = geometry::text_layout(x, y, text, self.config.font_size, self.config.padding);
        tracing::debug!(?layout, "text overlay layout");

        let svg = markup::text_svg(&layout, text, &self.config);
        let layer = self.rasterize(&svg, layout.rect.size())?;
        finish(image, format, &layer, layout.rect)
    }

    /// Draw a raster layer with its top-left corner at `offset` (default `(0, 0)`).
    ///
    /// Layers larger than the base image are scaled down to fit.
    pub fn draw(
        &self,
        base: &[u8],
        drawing: &[u8],
        offset: Option<(i64, i64)>,
    ) -> OverlayResult<Composite> {
        let (image, format) = decode_base(base)?;
        let layer = image::load_from_memory(drawing)
            .map_err(OverlayError::DecodeOverlay)?
            .to_rgba8();

        let base_dims = Dimensions::new(image.width(), image.height());
        let layer_dims = Dimensions::new(layer.width(), layer.height());
        let layout = geometry::draw_layout(layer_dims, base_dims, offset);
        tracing::debug!(?layout, %layer_dims, %base_dims, "drawing overlay layout");

        let layer = if layout.scaled {
            imageops::resize(&layer, layout.rect.width, layout.rect.height, FilterType::Triangle)
        } else {
            layer
        };
        finish(image, format, &layer, layout.rect)
    }

    fn rasterize(&self, svg: &str, size: Dimensions) -> OverlayResult<RgbaImage> {
        let mut options = usvg::Options::default();
        options.fontdb = Arc::clone(&self.fontdb);
        options.font_family = self.config.font_family.clone();

        let tree = usvg::Tree::from_str(svg, &options)
            .map_err(|e| OverlayError::Markup(e.to_string()))?;
        let mut pixmap =
            tiny_skia::Pixmap::new(size.width, size.height).ok_or(OverlayError::Canvas {
                width: size.width,
                height: size.height,
            })?;
        resvg::render(&tree, tiny_skia::Transform::identity(), &mut pixmap.as_mut());

        let mut layer = RgbaImage::new(size.width, size.height);
        for (dst, src) in layer.pixels_mut().zip(pixmap.pixels()) {
            let c = src.demultiply();
            *dst = Rgba([c.red(), c.green(), c.blue(), c.alpha()]);
        }
        Ok(layer)
    }
}

fn decode_base(bytes: &[u8]) -> OverlayResult<(DynamicImage, ImageFormat)> {
    let format = image::guess_format(bytes).map_err(OverlayError::DecodeBase)?;
    let image = image::load_from_memory_with_format(bytes, format).map_err(OverlayError::DecodeBase)?;
    Ok((image, format))
}

/// Blend `layer` over `base` at `rect` and re-encode in `format`.
fn finish(
    base: DynamicImage,
    format: ImageFormat,
    layer: &RgbaImage,
    rect: Rect,
) -> OverlayResult<Composite> {
    let had_alpha = base.color().has_alpha();
    let mut canvas = base.to_rgba8();
    let dimensions = Dimensions::new(canvas.width(), canvas.height());
    // Offsets far outside the canvas never reach the blending arithmetic.
    if rect.intersects(dimensions) {
        imageops::overlay(&mut canvas, layer, rect.x, rect.y);
    }

    let bytes = encode(canvas, format, had_alpha)?;
    Ok(Composite {
        bytes,
        dimensions,
        region: rect,
    })
}

fn encode(canvas: RgbaImage, format: ImageFormat, keep_alpha: bool) -> OverlayResult<Vec<u8>> {
    // JPEG has no alpha channel.
    let image = if keep_alpha && format != ImageFormat::Jpeg {
        DynamicImage::ImageRgba8(canvas)
    } else {
        DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(canvas).to_rgb8())
    };
    let mut out = Cursor::new(Vec::new());
    image.write_to(&mut out, format).map_err(OverlayError::Encode)?;
    Ok(out.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    const BASE_COLOR: Rgb<u8> = Rgb([10, 200, 30]);

    fn compositor() -> Compositor {
        Compositor::new(OverlayConfig {
            load_system_fonts: false,
            ..Default::default()
        })
        .unwrap()
    }

    fn encode_rgb(img: &RgbImage, format: ImageFormat) -> Vec<u8> {
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, format).unwrap();
        out.into_inner()
    }

    fn solid_png(width: u32, height: u32) -> Vec<u8> {
        encode_rgb(&RgbImage::from_pixel(width, height, BASE_COLOR), ImageFormat::Png)
    }

    fn red_layer(width: u32, height: u32) -> Vec<u8> {
        let img = RgbaImage::from_pixel(width, height, Rgba([255, 0, 0, 255]));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    fn decode(bytes: &[u8]) -> RgbaImage {
        image::load_from_memory(bytes).unwrap().to_rgba8()
    }

    /// Every pixel outside `rect` must equal the original; every pixel inside must differ.
    fn assert_changed_only_inside(before: &RgbaImage, after: &RgbaImage, rect: Rect) {
        assert_eq!(before.dimensions(), after.dimensions());
        for (x, y, px) in after.enumerate_pixels() {
            let original = before.get_pixel(x, y);
            if rect.contains(i64::from(x), i64::from(y)) {
                assert_ne!(px, original, "pixel ({x},{y}) inside overlay unchanged");
            } else {
                assert_eq!(px, original, "pixel ({x},{y}) outside overlay changed");
            }
        }
    }

    #[test]
    fn annotate_changes_only_the_box() {
        let base = solid_png(200, 100);
        let out = compositor().annotate(&base, 50, 50, "Hi").unwrap();

        assert_eq!(out.dimensions, Dimensions::new(200, 100));
        assert_eq!(out.region, Rect { x: 50, y: 16, width: 27, height: 34 });
        assert_eq!(image::guess_format(&out.bytes).unwrap(), ImageFormat::Png);
        assert_changed_only_inside(&decode(&base), &decode(&out.bytes), out.region);
    }

    #[test]
    fn annotate_with_system_fonts_stays_inside_box() {
        let compositor = Compositor::new(OverlayConfig::default()).unwrap();
        let base = solid_png(200, 100);
        let out = compositor.annotate(&base, 20, 90, "Hello, world").unwrap();
        assert_changed_only_inside(&decode(&base), &decode(&out.bytes), out.region);
    }

    #[test]
    fn annotate_partially_outside_is_clipped() {
        let base = solid_png(40, 40);
        let out = compositor().annotate(&base, 30, 10, "overflowing text").unwrap();
        assert_eq!(out.dimensions, Dimensions::new(40, 40));
        let before = decode(&base);
        let after = decode(&out.bytes);
        for (x, y, px) in after.enumerate_pixels() {
            if !out.region.contains(i64::from(x), i64::from(y)) {
                assert_eq!(px, before.get_pixel(x, y));
            }
        }
    }

    #[test]
    fn annotate_fully_outside_leaves_pixels() {
        let base = solid_png(40, 40);
        let out = compositor().annotate(&base, 500, 500, "gone").unwrap();
        assert_eq!(decode(&out.bytes), decode(&base));
    }

    #[test]
    fn extreme_anchors_leave_pixels() {
        let base = solid_png(20, 20);
        for (x, y) in [(0, i64::MIN), (i64::MIN, 0), (i64::MAX, i64::MAX), (0, i64::MAX)] {
            let out = compositor().annotate(&base, x, y, "far").unwrap();
            assert_eq!(decode(&out.bytes), decode(&base), "anchor ({x},{y})");
        }
        let out = compositor()
            .draw(&base, &red_layer(4, 4), Some((i64::MIN, i64::MAX)))
            .unwrap();
        assert_eq!(decode(&out.bytes), decode(&base));
    }

    #[test]
    fn draw_fitting_layer_at_offset() {
        let base = solid_png(200, 100);
        let out = compositor().draw(&base, &red_layer(20, 10), Some((5, 6))).unwrap();
        assert_eq!(out.region, Rect { x: 5, y: 6, width: 20, height: 10 });
        let after = decode(&out.bytes);
        assert_eq!(*after.get_pixel(5, 6), Rgba([255, 0, 0, 255]));
        assert_eq!(*after.get_pixel(24, 15), Rgba([255, 0, 0, 255]));
        assert_changed_only_inside(&decode(&base), &after, out.region);
    }

    #[test]
    fn draw_defaults_to_origin() {
        let base = solid_png(50, 50);
        let out = compositor().draw(&base, &red_layer(3, 3), None).unwrap();
        assert_eq!(out.region.x, 0);
        assert_eq!(out.region.y, 0);
        assert_eq!(*decode(&out.bytes).get_pixel(0, 0), Rgba([255, 0, 0, 255]));
    }

    #[test]
    fn draw_oversized_layer_is_scaled_to_fit() {
        let base = solid_png(200, 100);
        let out = compositor().draw(&base, &red_layer(400, 100), None).unwrap();
        assert_eq!(out.dimensions, Dimensions::new(200, 100));
        assert_eq!(out.region, Rect { x: 0, y: 0, width: 200, height: 50 });
        let after = decode(&out.bytes);
        assert_eq!(*after.get_pixel(199, 49), Rgba([255, 0, 0, 255]));
        assert_eq!(*after.get_pixel(0, 50), decode(&base).get_pixel(0, 50).to_owned());
    }

    #[test]
    fn transparent_layer_pixels_keep_base() {
        let base = solid_png(10, 10);
        let mut layer = RgbaImage::from_pixel(4, 4, Rgba([0, 0, 0, 0]));
        layer.put_pixel(1, 1, Rgba([0, 0, 255, 255]));
        let mut bytes = Cursor::new(Vec::new());
        layer.write_to(&mut bytes, ImageFormat::Png).unwrap();

        let out = compositor().draw(&base, &bytes.into_inner(), None).unwrap();
        let after = decode(&out.bytes);
        assert_eq!(*after.get_pixel(1, 1), Rgba([0, 0, 255, 255]));
        assert_eq!(*after.get_pixel(0, 0), Rgba([10, 200, 30, 255]));
    }

    #[test]
    fn jpeg_base_stays_jpeg() {
        let base = encode_rgb(&RgbImage::from_pixel(64, 64, BASE_COLOR), ImageFormat::Jpeg);
        let out = compositor().annotate(&base, 4, 60, "jpeg").unwrap();
        assert_eq!(image::guess_format(&out.bytes).unwrap(), ImageFormat::Jpeg);
        assert_eq!(out.dimensions, Dimensions::new(64, 64));
    }

    #[test]
    fn rgba_base_keeps_alpha() {
        let img = RgbaImage::from_pixel(8, 8, Rgba([1, 2, 3, 100]));
        let mut bytes = Cursor::new(Vec::new());
        img.write_to(&mut bytes, ImageFormat::Png).unwrap();
        let out = compositor().draw(&bytes.into_inner(), &red_layer(1, 1), Some((7, 7))).unwrap();
        let after = decode(&out.bytes);
        assert_eq!(after.get_pixel(0, 0).0[3], 100);
    }

    #[test]
    fn garbage_base_is_decode_error() {
        let err = compositor().annotate(b"not an image", 0, 0, "x").unwrap_err();
        assert!(matches!(err, OverlayError::DecodeBase(_)));
    }

    #[test]
    fn garbage_drawing_is_decode_error() {
        let err = compositor()
            .draw(&solid_png(4, 4), b"not an image", None)
            .unwrap_err();
        assert!(matches!(err, OverlayError::DecodeOverlay(_)));
    }

    #[test]
    fn invalid_config_rejected() {
        let err = Compositor::new(OverlayConfig {
            font_size: -1.0,
            ..Default::default()
        })
        .err()
        .unwrap();
        assert!(matches!(err, OverlayError::InvalidConfig(_)));
    }
}
