//! In-memory dedup index for the running process.
//!
//! [`InMemoryDedupIndex`] stores bindings in two `HashMap`s protected by one
//! `RwLock`. Data is lost when the index is dropped.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use artifex_types::{ContentDigest, ImageId};

use crate::error::{IndexError, Result};
use crate::traits::{DedupIndex, Rebinding};

#[derive(Debug, Default)]
struct Bindings {
    by_digest: HashMap<ContentDigest, ImageId>,
    by_id: HashMap<ImageId, ContentDigest>,
}

/// An in-memory implementation of [`DedupIndex`].
#[derive(Debug, Default)]
pub struct InMemoryDedupIndex {
    bindings: RwLock<Bindings>,
}

impl InMemoryDedupIndex {
    /// Create a new empty index.
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Bindings>> {
        self.bindings
            .read()
            .map_err(|e| IndexError::Poisoned(e.to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Bindings>> {
        self.bindings
            .write()
            .map_err(|e| IndexError::Poisoned(e.to_string()))
    }
}

impl DedupIndex for InMemoryDedupIndex {
    fn lookup(&self, digest: &ContentDigest) -> Result<Option<ImageId>> {
        Ok(self.read()?.by_digest.get(digest).cloned())
    }

    fn register(&self, digest: ContentDigest, id: ImageId) -> Result<()> {
        let mut bindings = self.write()?;

        if let Some(existing) = bindings.by_digest.get(&digest) {
            if *existing == id {
                return Ok(());
            }
            return Err(IndexError::DigestConflict {
                digest,
                existing: existing.clone(),
                requested: id,
            });
        }
        if let Some(existing) = bindings.by_id.get(&id) {
            return Err(IndexError::IdentifierConflict {
                id,
                existing: *existing,
            });
        }

        tracing::debug!(digest = %digest.short_hex(), %id, "registered dedup binding");
        bindings.by_id.insert(id.clone(), digest);
        bindings.by_digest.insert(digest, id);
        Ok(())
    }

    fn rebind(&self, id: &ImageId, digest: ContentDigest) -> Result<Rebinding> {
        let mut bindings = self.write()?;

        let previous = bindings.by_id.remove(id);
        if let Some(old) = previous {
            bindings.by_digest.remove(&old);
        }

        let bound = match bindings.by_digest.get(&digest) {
            Some(owner) if owner != id => false,
            _ => {
                bindings.by_digest.insert(digest, id.clone());
                bindings.by_id.insert(id.clone(), digest);
                true
            }
        };

        tracing::debug!(
            %id,
            previous = ?previous.map(|d| d.short_hex()),
            digest = %digest.short_hex(),
            bound,
            "rebound dedup binding"
        );
        Ok(Rebinding { previous, bound })
    }

    fn len(&self) -> Result<usize> {
        Ok(self.read()?.by_digest.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn digest(b: u8) -> ContentDigest {
        ContentDigest::from_hash([b; 32])
    }

    fn id(s: &str) -> ImageId {
        ImageId::parse(s).unwrap()
    }

    #[test]
    fn lookup_on_empty_index() {
        let index = InMemoryDedupIndex::new();
        assert!(index.lookup(&digest(1)).unwrap().is_none());
        assert!(index.is_empty().unwrap());
        assert!(!index.is_persistent());
    }

    #[test]
    fn register_then_lookup() {
        let index = InMemoryDedupIndex::new();
        index.register(digest(1), id("a.png")).unwrap();
        assert_eq!(index.lookup(&digest(1)).unwrap(), Some(id("a.png")));
        assert_eq!(index.len().unwrap(), 1);
    }

    #[test]
    fn register_same_pair_is_idempotent() {
        let index = InMemoryDedupIndex::new();
        index.register(digest(1), id("a.png")).unwrap();
        index.register(digest(1), id("a.png")).unwrap();
        assert_eq!(index.len().unwrap(), 1);
    }

    #[test]
    fn register_rejects_overwrite() {
        let index = InMemoryDedupIndex::new();
        index.register(digest(1), id("a.png")).unwrap();
        let err = index.register(digest(1), id("b.png")).unwrap_err();
        assert!(matches!(err, IndexError::DigestConflict { .. }));
        // First binding survives.
        assert_eq!(index.lookup(&digest(1)).unwrap(), Some(id("a.png")));
    }

    #[test]
    fn register_rejects_second_digest_for_identifier() {
        let index = InMemoryDedupIndex::new();
        index.register(digest(1), id("a.png")).unwrap();
        let err = index.register(digest(2), id("a.png")).unwrap_err();
        assert!(matches!(err, IndexError::IdentifierConflict { .. }));
    }

    #[test]
    fn rebind_moves_binding() {
        let index = InMemoryDedupIndex::new();
        index.register(digest(1), id("a.png")).unwrap();

        let outcome = index.rebind(&id("a.png"), digest(2)).unwrap();
        assert_eq!(
            outcome,
            Rebinding {
                previous: Some(digest(1)),
                bound: true
            }
        );
        assert!(index.lookup(&digest(1)).unwrap().is_none());
        assert_eq!(index.lookup(&digest(2)).unwrap(), Some(id("a.png")));
    }

    #[test]
    fn rebind_onto_foreign_digest_leaves_identifier_unbound() {
        let index = InMemoryDedupIndex::new();
        index.register(digest(1), id("a.png")).unwrap();
        index.register(digest(2), id("b.png")).unwrap();

        let outcome = index.rebind(&id("a.png"), digest(2)).unwrap();
        assert!(!outcome.bound);
        assert!(index.lookup(&digest(1)).unwrap().is_none());
        assert_eq!(index.lookup(&digest(2)).unwrap(), Some(id("b.png")));
        assert_eq!(index.len().unwrap(), 1);
    }

    #[test]
    fn rebind_unknown_identifier_binds_fresh() {
        let index = InMemoryDedupIndex::new();
        let outcome = index.rebind(&id("new.png"), digest(9)).unwrap();
        assert_eq!(outcome.previous, None);
        assert!(outcome.bound);
    }

    #[test]
    fn concurrent_registers_have_one_winner() {
        use std::sync::Arc;
        use std::thread;

        let index = Arc::new(InMemoryDedupIndex::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let index = Arc::clone(&index);
                thread::spawn(move || index.register(digest(7), id(&format!("{i}.png"))).is_ok())
            })
            .collect();

        let winners = handles
            .into_iter()
            .map(|h| h.join().expect("thread should not panic"))
            .filter(|ok| *ok)
            .count();
        assert_eq!(winners, 1);
        assert_eq!(index.len().unwrap(), 1);
    }
}
