//! Write-temp-then-rename replacement of a single blob.
//!
//! A [`StagedBlob`] is a fully written and synced temporary file sitting next
//! to the canonical file it will replace. Committing it is one `rename`,
//! which POSIX filesystems perform atomically over an existing target.
//! Dropping it uncommitted removes the temporary file and leaves the canonical
//! blob exactly as it was.

use std::path::{Path, PathBuf};

use artifex_types::ImageId;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};

/// Temporary artifacts are hidden so listings never pick them up.
const TEMP_PREFIX: &str = ".tmp-";

/// New content for an identifier, written but not yet visible to readers.
#[derive(Debug)]
pub struct StagedBlob {
    id: ImageId,
    temp_path: PathBuf,
    dest: PathBuf,
    len: u64,
    armed: bool,
}

impl StagedBlob {
    /// Write `bytes` to a fresh temporary file beside `dest`.
    ///
    /// Every call gets its own temporary name, so concurrent writers never
    /// share a temporary path.
    pub async fn write(id: &ImageId, dest: PathBuf, bytes: &[u8]) -> StoreResult<Self> {
        let dir = dest.parent().unwrap_or_else(|| Path::new("."));
        let temp_path = dir.join(format!("{TEMP_PREFIX}{}", Uuid::now_v7().simple()));

        let mut staged = Self {
            id: id.clone(),
            temp_path,
            dest,
            len: bytes.len() as u64,
            armed: true,
        };

        if let Err(source) = staged.write_temp(bytes).await {
            staged.discard().await;
            return Err(StoreError::Write {
                id: id.clone(),
                source,
            });
        }
        Ok(staged)
    }

    async fn write_temp(&self, bytes: &[u8]) -> std::io::Result<()> {
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&self.temp_path)
            .await?;
        file.write_all(bytes).await?;
        file.sync_all().await?;
        Ok(())
    }

    /// Location of the temporary file.
    pub fn path(&self) -> &Path {
        &self.temp_path
    }

    /// Number of bytes staged.
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Atomically move the staged bytes over the canonical blob.
    pub async fn commit(mut self) -> StoreResult<()> {
        match fs::rename(&self.temp_path, &self.dest).await {
            Ok(()) => {
                self.armed = false;
                sync_parent(&self.dest).await;
                tracing::debug!(id = %self.id, bytes = self.len, "committed staged blob");
                Ok(())
            }
            Err(source) => {
                self.discard().await;
                Err(StoreError::Commit {
                    id: self.id.clone(),
                    source,
                })
            }
        }
    }

    /// Move the staged bytes into place only if no blob exists yet.
    ///
    /// Uses a hard link, which fails instead of clobbering an existing file.
    pub async fn commit_new(mut self) -> StoreResult<()> {
        let linked = fs::hard_link(&self.temp_path, &self.dest).await;
        self.discard().await;
        match linked {
            Ok(()) => {
                sync_parent(&self.dest).await;
                tracing::debug!(id = %self.id, bytes = self.len, "created blob");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                Err(StoreError::AlreadyExists(self.id.clone()))
            }
            Err(source) => Err(StoreError::Commit {
                id: self.id.clone(),
                source,
            }),
        }
    }

    async fn discard(&mut self) {
        if !self.armed {
            return;
        }
        self.armed = false;
        match fs::remove_file(&self.temp_path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(
                path = %self.temp_path.display(),
                "failed to remove temporary blob: {e}"
            ),
        }
    }
}

impl Drop for StagedBlob {
    fn drop(&mut self) {
        // Reached when a request is cancelled between write and commit.
        if self.armed {
            if let Err(e) = std::fs::remove_file(&self.temp_path) {
                if e.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!(
                        path = %self.temp_path.display(),
                        "failed to remove abandoned temporary blob: {e}"
                    );
                }
            }
        }
    }
}

/// Whether a directory entry is a temporary artifact.
pub fn is_temp_name(name: &str) -> bool {
    name.starts_with(TEMP_PREFIX)
}

/// Best-effort fsync of the containing directory so the rename is durable.
async fn sync_parent(path: &Path) {
    let Some(parent) = path.parent() else {
        return;
    };
    if let Ok(dir) = fs::File::open(parent).await {
        let _ = dir.sync_all().await;
    }
}
