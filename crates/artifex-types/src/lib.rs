//! Foundation types for the artifex image store.
//!
//! Every other crate in the workspace speaks in these types:
//!
//! - [`ImageId`] -- the stable, filesystem-safe name of one stored image
//! - [`ContentDigest`] -- 256-bit fingerprint of uploaded bytes (the dedup key)
//! - [`ImageRecord`] -- identifier plus the digest it was ingested with
//! - [`Dimensions`] -- pixel width and height of a raster image

pub mod digest;
pub mod error;
pub mod image_id;
pub mod record;

pub use digest::ContentDigest;
pub use error::TypeError;
pub use image_id::{content_type_for_extension, ImageId, RECOGNIZED_EXTENSIONS};
pub use record::{Dimensions, ImageRecord};
