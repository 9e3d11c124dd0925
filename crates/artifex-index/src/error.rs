//! Error types for dedup index operations.

use artifex_types::{ContentDigest, ImageId};
use thiserror::Error;

/// Errors that can occur during index operations.
#[derive(Debug, Error)]
pub enum IndexError {
    /// The digest is already bound to a different identifier.
    #[error("digest {digest} already bound to {existing}, refusing to rebind to {requested}")]
    DigestConflict {
        digest: ContentDigest,
        existing: ImageId,
        requested: ImageId,
    },

    /// The identifier is already bound to a different digest.
    #[error("identifier {id} already bound to digest {existing}")]
    IdentifierConflict { id: ImageId, existing: ContentDigest },

    /// A lock guarding the index was poisoned by a panicking writer.
    #[error("index lock poisoned: {0}")]
    Poisoned(String),
}

/// Convenience type alias for index operations.
pub type Result<T> = std::result::Result<T, IndexError>;
