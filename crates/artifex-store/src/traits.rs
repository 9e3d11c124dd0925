use artifex_types::{Dimensions, ImageId};
use async_trait::async_trait;

use crate::catalog::Catalog;
use crate::error::{StoreError, StoreResult};
use crate::probe;

/// Identifier-addressed image blob store.
///
/// All implementations must satisfy these invariants:
/// - At most one blob exists per identifier at any observable instant.
/// - `put` replaces the blob atomically: a concurrent `get` returns either
///   the complete old bytes or the complete new bytes.
/// - `create` never overwrites and never exposes a partially written blob.
/// - `entries` only reports committed blobs, never temporary artifacts.
/// - The store never interprets blob contents except in `metadata`.
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Store `bytes` under a new identifier.
    ///
    /// Fails with [`StoreError::AlreadyExists`] if the identifier is taken.
    async fn create(&self, id: &ImageId, bytes: &[u8]) -> StoreResult<()>;

    /// Store `bytes` under `id`, atomically replacing any current blob.
    async fn put(&self, id: &ImageId, bytes: &[u8]) -> StoreResult<()>;

    /// Read the current blob.
    ///
    /// Fails with [`StoreError::NotFound`] if no blob exists.
    async fn get(&self, id: &ImageId) -> StoreResult<Vec<u8>>;

    /// Names of all committed blobs, unfiltered and in no particular order.
    async fn entries(&self) -> StoreResult<Vec<String>>;

    /// Pixel dimensions of the current blob.
    ///
    /// Fails with [`StoreError::NotFound`] if absent and
    /// [`StoreError::Decode`] if the bytes are not a raster image.
    async fn metadata(&self, id: &ImageId) -> StoreResult<Dimensions> {
        let bytes = self.get(id).await?;
        probe::dimensions(&bytes).map_err(|reason| StoreError::Decode {
            id: id.clone(),
            reason,
        })
    }

    /// Identifiers of stored images with a recognised image extension.
    ///
    /// Each call takes a fresh snapshot of the store.
    async fn list(&self) -> StoreResult<Catalog> {
        let entries = self.entries().await?;
        Ok(Catalog::from_entries(entries))
    }
}
