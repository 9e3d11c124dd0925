use std::fmt;

use serde::{Deserialize, Serialize};

use crate::digest::ContentDigest;
use crate::image_id::ImageId;

/// Pixel dimensions of a raster image.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Whether `self` fits inside `bounds` on both axes.
    pub fn fits_within(&self, bounds: &Dimensions) -> bool {
        self.width <= bounds.width && self.height <= bounds.height
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// An ingested image: its identifier and the digest it was first stored with.
///
/// The identifier never changes. The digest describes the content at ingest
/// time; mutations move the dedup binding but do not rewrite past records.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRecord {
    pub id: ImageId,
    pub digest: ContentDigest,
}

impl ImageRecord {
    pub fn new(id: ImageId, digest: ContentDigest) -> Self {
        Self { id, digest }
    }
}
