use thiserror::Error;

/// Errors from overlay layout and compositing.
#[derive(Debug, Error)]
pub enum OverlayError {
    /// The base image could not be decoded.
    #[error("failed to decode base image: {0}")]
    DecodeBase(#[source] image::ImageError),

    /// The drawing layer could not be decoded.
    #[error("failed to decode drawing: {0}")]
    DecodeOverlay(#[source] image::ImageError),

    /// Synthesised markup was rejected by the SVG parser.
    #[error("invalid overlay markup: {0}")]
    Markup(String),

    /// A raster canvas of the requested size could not be allocated.
    #[error("cannot allocate {width}x{height} overlay canvas")]
    Canvas { width: u32, height: u32 },

    /// The composited image could not be encoded, including formats this
    /// build can read but not write.
    #[error("failed to encode image: {0}")]
    Encode(#[source] image::ImageError),

    /// Overlay configuration is out of range.
    #[error("invalid overlay configuration: {0}")]
    InvalidConfig(String),
}

/// Result alias for overlay operations.
pub type OverlayResult<T> = Result<T, OverlayError>;
