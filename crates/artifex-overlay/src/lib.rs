//! Overlay geometry and compositing for the artifex image store.
//!
//! Two overlay kinds are supported:
//!
//! - **Text**: a translucent backing box with a line of text, synthesised as
//!   SVG markup and rasterised with `resvg`.
//! - **Drawing**: a caller-supplied raster layer, scaled down to fit the base
//!   image when it is larger.
//!
//! [`geometry`] decides where an overlay goes; [`Compositor`] produces the new
//! encoded image. Neither touches storage.

pub mod compositor;
pub mod config;
pub mod error;
pub mod geometry;
pub mod markup;

pub use compositor::{Composite, Compositor};
pub use config::OverlayConfig;
pub use error::{OverlayError, OverlayResult};
pub use geometry::{DrawLayout, Rect, TextLayout};
