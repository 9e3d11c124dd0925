//! Image blob storage for the artifex image store.
//!
//! Each [`ImageId`](artifex_types::ImageId) owns exactly one current blob.
//! Uploads create it; annotate and draw replace it wholesale. Nothing ever
//! edits a blob in place.
//!
//! # Storage Backends
//!
//! All backends implement the [`ImageStore`] trait:
//!
//! - [`FsImageStore`] -- flat directory, one file per identifier
//! - [`InMemoryImageStore`] -- `BTreeMap`-based store for tests and embedding
//!
//! # Design Rules
//!
//! 1. Replacement is write-temp-then-rename ([`StagedBlob`]). The canonical
//!    file is never deleted first, so readers always see the old or the new
//!    bytes, never neither and never a truncated file.
//! 2. Creation is no-clobber: a fully written temporary file is linked into
//!    place only if the identifier is still free.
//! 3. Existence is never checked ahead of acting. Reads open-or-fail.
//! 4. Temporary artifacts are hidden names and are never listed.
//! 5. All I/O errors are propagated, never silently ignored. Only cleanup of
//!    temporary artifacts is best-effort (and logged).

pub mod catalog;
pub mod error;
pub mod fs;
pub mod memory;
pub mod probe;
pub mod staging;
pub mod traits;

// Re-export primary types at crate root for ergonomic imports.
pub use catalog::Catalog;
pub use error::{StoreError, StoreResult};
pub use fs::FsImageStore;
pub use memory::InMemoryImageStore;
pub use staging::StagedBlob;
pub use traits::ImageStore;
