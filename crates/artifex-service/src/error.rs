use artifex_index::IndexError;
use artifex_overlay::OverlayError;
use artifex_store::StoreError;
use thiserror::Error;

/// Why a catalog listing came back empty.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EmptyCatalog {
    /// The store holds no blobs at all.
    NoImages,
    /// Blobs exist but none has a recognised image extension.
    NoValidImages,
}

impl EmptyCatalog {
    pub fn message(&self) -> &'static str {
        match self {
            Self::NoImages => "No images found",
            Self::NoValidImages => "No valid image files found",
        }
    }
}

/// Errors surfaced by [`ImageService`](crate::ImageService).
///
/// Callers classify them with [`is_input`](Self::is_input),
/// [`is_not_found`](Self::is_not_found) and [`empty_catalog`](Self::empty_catalog).
/// Everything else is a processing failure with its cause attached.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// A required field is missing or malformed. Nothing was read or written.
    #[error("{0}")]
    Input(String),

    /// The identifier names no stored image.
    #[error("image not found: {0}")]
    NotFound(String),

    #[error("{}", .0.message())]
    EmptyCatalog(EmptyCatalog),

    #[error("store error: {0}")]
    Store(#[source] StoreError),

    #[error("index error: {0}")]
    Index(#[from] IndexError),

    #[error("overlay error: {0}")]
    Overlay(#[from] OverlayError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A blocking raster task panicked or was cancelled.
    #[error("background task failed: {0}")]
    Task(String),
}

impl ServiceError {
    pub fn is_input(&self) -> bool {
        matches!(self, Self::Input(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    pub fn empty_catalog(&self) -> Option<EmptyCatalog> {
        match self {
            Self::EmptyCatalog(kind) => Some(*kind),
            _ => None,
        }
    }

    /// Whether this is a decode/compose/I-O failure rather than a caller mistake.
    pub fn is_processing(&self) -> bool {
        !(self.is_input() || self.is_not_found() || self.empty_catalog().is_some())
    }
}

impl From<StoreError> for ServiceError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(id) => Self::NotFound(id.to_string()),
            other => Self::Store(other),
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
