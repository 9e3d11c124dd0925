//! The [`DedupIndex`] trait defining the dedup storage interface.
//!
//! Any backend (in-memory, file, database) implements this trait. The
//! service depends on the trait object, never on a concrete map.

use artifex_types::{ContentDigest, ImageId};

use crate::error::Result;

/// Outcome of moving an identifier's binding to new content.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Rebinding {
    /// The digest the identifier was bound to before, if any.
    pub previous: Option<ContentDigest>,
    /// `false` when the new digest already belonged to another identifier,
    /// in which case the identifier is left unbound.
    pub bound: bool,
}

/// Digest to identifier mapping used for upload deduplication.
///
/// Implementations must be thread-safe (`Send + Sync`) and keep the mapping
/// one-to-one: a digest names at most one identifier and an identifier is
/// named by at most one digest. Each method is atomic on its own; callers
/// that need check-then-register across I/O hold their own per-digest lock.
pub trait DedupIndex: Send + Sync {
    /// Identifier currently bound to `digest`.
    fn lookup(&self, digest: &ContentDigest) -> Result<Option<ImageId>>;

    /// Bind `digest` to `id`.
    ///
    /// Registering the exact same pair again is a no-op. Binding a digest
    /// that already names a different identifier fails with
    /// [`IndexError::DigestConflict`](crate::IndexError::DigestConflict);
    /// there is never a silent overwrite.
    fn register(&self, digest: ContentDigest, id: ImageId) -> Result<()>;

    /// Move `id` from whatever digest it had to `digest`.
    ///
    /// Used after a mutation replaced the identifier's content: the old
    /// digest no longer describes the stored bytes and must stop matching.
    fn rebind(&self, id: &ImageId, digest: ContentDigest) -> Result<Rebinding>;

    /// Number of live bindings.
    fn len(&self) -> Result<usize>;

    /// Whether the index holds no bindings.
    fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Whether bindings survive a process restart.
    fn is_persistent(&self) -> bool {
        false
    }
}
