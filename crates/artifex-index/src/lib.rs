//! Content dedup index for the artifex image store.
//!
//! The index maps a [`ContentDigest`](artifex_types::ContentDigest) to the
//! [`ImageId`](artifex_types::ImageId) that first stored those bytes. Upload
//! handling consults it before writing anything, so byte-identical uploads
//! share one blob.
//!
//! # Lifecycle
//!
//! The index is an explicit component constructed at process start and handed
//! to the service. [`InMemoryDedupIndex`] keeps bindings for the process
//! lifetime only: after a restart a previously deduplicated upload is stored
//! again under a new identifier. [`DedupIndex::is_persistent`] reports this
//! so callers can surface it instead of assuming durability.
//!
//! # Modules
//!
//! - [`error`] -- Error types for index operations
//! - [`traits`] -- The [`DedupIndex`] trait
//! - [`memory`] -- In-memory [`InMemoryDedupIndex`]

pub mod error;
pub mod memory;
pub mod traits;

pub use error::{IndexError, Result};
pub use memory::InMemoryDedupIndex;
pub use traits::{DedupIndex, Rebinding};
