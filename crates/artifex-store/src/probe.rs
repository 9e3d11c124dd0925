//! Lightweight inspection of image bytes.
//!
//! Decoding headers is delegated to the `image` crate; no pixels are decoded.

use std::io::Cursor;

use artifex_types::Dimensions;
use image::ImageReader;

/// Read width and height from an encoded image's header.
pub fn dimensions(bytes: &[u8]) -> Result<Dimensions, String> {
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| e.to_string())?;
    let (width, height) = reader.into_dimensions().map_err(|e| e.to_string())?;
    Ok(Dimensions::new(width, height))
}

/// Preferred file extension for the sniffed format, if recognised.
pub fn sniff_extension(bytes: &[u8]) -> Option<&'static str> {
    let format = image::guess_format(bytes).ok()?;
    format.extensions_str().first().copied()
}

/// MIME type for the sniffed format, if recognised.
pub fn sniff_content_type(bytes: &[u8]) -> Option<&'static str> {
    image::guess_format(bytes).ok().map(|f| f.to_mime_type())
}
