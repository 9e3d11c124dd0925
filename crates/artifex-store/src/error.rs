use artifex_types::ImageId;

/// Errors from image store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No blob exists for the identifier.
    #[error("image not found: {0}")]
    NotFound(ImageId),

    /// A create targeted an identifier that already has a blob.
    #[error("image already exists: {0}")]
    AlreadyExists(ImageId),

    /// The stored bytes are not a decodable raster image.
    #[error("cannot decode {id}: {reason}")]
    Decode { id: ImageId, reason: String },

    /// Writing the temporary blob failed; the canonical blob is untouched.
    #[error("failed to write new content for {id}: {source}")]
    Write {
        id: ImageId,
        #[source]
        source: std::io::Error,
    },

    /// Moving the temporary blob into place failed; the canonical blob is untouched.
    #[error("failed to commit new content for {id}: {source}")]
    Commit {
        id: ImageId,
        #[source]
        source: std::io::Error,
    },

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A lock guarding an in-memory backend was poisoned.
    #[error("store lock poisoned: {0}")]
    Poisoned(String),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
