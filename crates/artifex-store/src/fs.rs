use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use artifex_types::ImageId;
use async_trait::async_trait;

use crate::error::{StoreError, StoreResult};
use crate::staging::{is_temp_name, StagedBlob};
use crate::traits::ImageStore;

/// Flat-directory image store: one file per identifier.
///
/// The identifier is the file name. [`ImageId`] validation rules out path
/// separators and hidden names, so a blob path can never escape `root` or
/// collide with a temporary artifact.
#[derive(Clone, Debug)]
pub struct FsImageStore {
    root: PathBuf,
}

impl FsImageStore {
    /// Open a store rooted at `root`, creating the directory if needed.
    pub async fn open(root: impl Into<PathBuf>) -> StoreResult<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await?;
        tracing::debug!(root = %root.display(), "opened image store");
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Canonical location of an identifier's blob.
    pub fn blob_path(&self, id: &ImageId) -> PathBuf {
        self.root.join(id.as_str())
    }

    /// Write new content for `id` without making it visible yet.
    ///
    /// [`ImageStore::put`] is `stage` followed by [`StagedBlob::commit`].
    pub async fn stage(&self, id: &ImageId, bytes: &[u8]) -> StoreResult<StagedBlob> {
        StagedBlob::write(id, self.blob_path(id), bytes).await
    }
}

#[async_trait]
impl ImageStore for FsImageStore {
    async fn create(&self, id: &ImageId, bytes: &[u8]) -> StoreResult<()> {
        self.stage(id, bytes).await?.commit_new().await
    }

    async fn put(&self, id: &ImageId, bytes: &[u8]) -> StoreResult<()> {
        self.stage(id, bytes).await?.commit().await
    }

    async fn get(&self, id: &ImageId) -> StoreResult<Vec<u8>> {
        let path = self.blob_path(id);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(StoreError::NotFound(id.clone())),
            // Only regular files are blobs; a directory under the name is no image.
            Err(e) => match tokio::fs::metadata(&path).await {
                Ok(meta) if !meta.is_file() => Err(StoreError::NotFound(id.clone())),
                _ => Err(e.into()),
            },
        }
    }

    async fn entries(&self) -> StoreResult<Vec<String>> {
        let mut dir = tokio::fs::read_dir(&self.root).await?;
        let mut names = Vec::new();
        while let Some(entry) = dir.next_entry().await? {
            let file_type = entry.file_type().await?;
            if !file_type.is_file() {
                continue;
            }
            let Ok(name) = entry.file_name().into_string() else {
                tracing::warn!(path = %entry.path().display(), "skipping non UTF-8 file name");
                continue;
            };
            if is_temp_name(&name) || name.starts_with('.') {
                continue;
            }
            names.push(name);
        }
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn id(s: &str) -> ImageId {
        ImageId::parse(s).unwrap()
    }

    fn png(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbImage::new(width, height);
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png).unwrap();
        out.into_inner()
    }

    async fn store() -> (tempfile::TempDir, FsImageStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = FsImageStore::open(dir.path().join("uploads")).await.unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn open_creates_root() {
        let (_dir, store) = store().await;
        assert!(store.root().is_dir());
    }

    #[tokio::test]
    async fn create_then_get() {
        let (_dir, store) = store().await;
        store.create(&id("a.png"), b"bytes").await.unwrap();
        assert_eq!(store.get(&id("a.png")).await.unwrap(), b"bytes");
    }

    #[tokio::test]
    async fn create_twice_fails_and_keeps_first() {
        let (_dir, store) = store().await;
        store.create(&id("a.png"), b"first").await.unwrap();
        let err = store.create(&id("a.png"), b"second").await.unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists(_)));
        assert_eq!(store.get(&id("a.png")).await.unwrap(), b"first");
    }

    #[tokio::test]
    async fn get_missing_is_not_found() {
        let (_dir, store) = store().await;
        let err = store.get(&id("nope.jpg")).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn directory_under_image_name_is_not_found() {
        let (_dir, store) = store().await;
        std::fs::create_dir(store.root().join("sub.png")).unwrap();
        let err = store.get(&id("sub.png")).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
        assert!(matches!(
            store.metadata(&id("sub.png")).await.unwrap_err(),
            StoreError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn put_then_get_returns_exact_bytes() {
        let (_dir, store) = store().await;
        store.create(&id("a.png"), b"old").await.unwrap();
        let payload: Vec<u8> = (0..=255).collect();
        store.put(&id("a.png"), &payload).await.unwrap();
        assert_eq!(store.get(&id("a.png")).await.unwrap(), payload);
    }

    #[tokio::test]
    async fn put_creates_when_absent() {
        let (_dir, store) = store().await;
        store.put(&id("fresh.gif"), b"gif").await.unwrap();
        assert_eq!(store.get(&id("fresh.gif")).await.unwrap(), b"gif");
    }

    #[tokio::test]
    async fn interrupted_mutation_leaves_old_content() {
        let (_dir, store) = store().await;
        store.create(&id("a.png"), b"old").await.unwrap();

        // Write completes but the rename never happens.
        let staged = store.stage(&id("a.png"), b"new").await.unwrap();
        assert_eq!(store.get(&id("a.png")).await.unwrap(), b"old");
        let catalog = store.list().await.unwrap();
        assert_eq!(catalog.images, vec![id("a.png")]);
        drop(staged);

        assert_eq!(store.get(&id("a.png")).await.unwrap(), b"old");
        assert_eq!(store.entries().await.unwrap(), vec!["a.png".to_string()]);
    }

    #[tokio::test]
    async fn list_filters_extensions() {
        let (_dir, store) = store().await;
        for name in ["a.jpg", "b.txt", "c.PNG"] {
            store.create(&id(name), b"x").await.unwrap();
        }
        let catalog = store.list().await.unwrap();
        let names: Vec<_> = catalog.images.iter().map(|i| i.as_str()).collect();
        assert_eq!(names, vec!["a.jpg", "c.PNG"]);
        assert_eq!(catalog.skipped, 1);
    }

    #[tokio::test]
    async fn entries_skip_hidden_files_and_directories() {
        let (_dir, store) = store().await;
        std::fs::write(store.root().join(".tmp-leftover"), b"x").unwrap();
        std::fs::write(store.root().join(".DS_Store"), b"x").unwrap();
        std::fs::create_dir(store.root().join("sub.png")).unwrap();
        store.create(&id("real.png"), b"x").await.unwrap();

        assert_eq!(store.entries().await.unwrap(), vec!["real.png".to_string()]);
    }

    #[tokio::test]
    async fn metadata_reads_dimensions() {
        let (_dir, store) = store().await;
        store.create(&id("a.png"), &png(200, 100)).await.unwrap();
        let dims = store.metadata(&id("a.png")).await.unwrap();
        assert_eq!((dims.width, dims.height), (200, 100));
    }

    #[tokio::test]
    async fn metadata_errors() {
        let (_dir, store) = store().await;
        assert!(matches!(
            store.metadata(&id("missing.png")).await.unwrap_err(),
            StoreError::NotFound(_)
        ));
        store.create(&id("fake.png"), b"not an image").await.unwrap();
        assert!(matches!(
            store.metadata(&id("fake.png")).await.unwrap_err(),
            StoreError::Decode { .. }
        ));
    }

    #[tokio::test]
    async fn concurrent_puts_never_expose_partial_content() {
        use std::sync::Arc;

        let (_dir, store) = store().await;
        let store = Arc::new(store);
        let a = vec![b'a'; 64 * 1024];
        let b = vec![b'b'; 128 * 1024];
        store.create(&id("race.png"), &a).await.unwrap();

        let writers: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                let payload = if i % 2 == 0 { a.clone() } else { b.clone() };
                tokio::spawn(async move { store.put(&id("race.png"), &payload).await })
            })
            .collect();

        for _ in 0..32 {
            let seen = store.get(&id("race.png")).await.unwrap();
            assert!(seen == a || seen == b, "observed torn blob of {} bytes", seen.len());
        }
        for w in writers {
            w.await.unwrap().unwrap();
        }
        assert_eq!(store.entries().await.unwrap().len(), 1);
    }
}
