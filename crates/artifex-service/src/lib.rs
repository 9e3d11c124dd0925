//! Request orchestration for the artifex image store.
//!
//! [`ImageService`] ties the fingerprinter, the dedup index, the image store
//! and the compositor together:
//!
//! - **ingest**: fingerprint, dedup under a per-digest lock, create-new
//! - **fetch**: read the current blob and pick a content type
//! - **annotate / draw**: per-identifier lock held across read, composite
//!   and atomic replace; the dedup binding follows the new content
//! - **list**: catalog snapshot with empty-catalog distinctions
//!
//! The service is transport-agnostic. The HTTP layer and the CLI both drive
//! it directly.

pub mod error;
pub mod locks;
pub mod payload;
pub mod service;

pub use error::{EmptyCatalog, ServiceError, ServiceResult};
pub use locks::KeyedLocks;
pub use payload::decode_drawing_data;
pub use service::{
    AnnotateRequest, DrawRequest, Fetched, ImageService, IngestOutcome, MutationOutcome,
    StagedFile,
};
