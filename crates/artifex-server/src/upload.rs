//! Multipart upload spooling.

use std::path::{Path, PathBuf};

use artifex_service::StagedFile;
use axum::extract::multipart::{Field, Multipart, MultipartError};
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::error::ApiError;

/// A spooled upload, removed from disk when dropped.
///
/// Held across ingest so a cancelled request leaves no staged file behind.
#[derive(Debug)]
pub struct StagedUpload {
    file: StagedFile,
}

impl StagedUpload {
    fn new(path: PathBuf, original_name: String) -> Self {
        Self {
            file: StagedFile {
                path,
                original_name,
            },
        }
    }

    pub fn file(&self) -> &StagedFile {
        &self.file
    }
}

impl Drop for StagedUpload {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.file.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(path = %self.file.path.display(), error = %e, "failed to remove staged upload");
            }
        }
    }
}

/// Spool the first file field of `multipart` into `staging_dir`.
///
/// Returns `None` when the form carries no file. Non-file fields are ignored.
pub async fn stage_first_file(
    multipart: &mut Multipart,
    staging_dir: &Path,
) -> Result<Option<StagedUpload>, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(rejected)?
    {
        let Some(original_name) = field.file_name().map(str::to_owned) else {
            continue;
        };
        let path = staging_dir.join(format!("upload-{}", Uuid::now_v7().simple()));
        let upload = StagedUpload::new(path, original_name);
        spool(field, &upload.file().path).await?;
        return Ok(Some(upload));
    }
    Ok(None)
}

async fn spool(mut field: Field<'_>, path: &Path) -> Result<(), ApiError> {
    let io_err = |e: std::io::Error| ApiError::internal("Error uploading image", e.to_string());
    let mut file = tokio::fs::File::create(path).await.map_err(io_err)?;
    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(rejected)?
    {
        file.write_all(&chunk).await.map_err(io_err)?;
    }
    file.flush().await.map_err(io_err)?;
    Ok(())
}

/// Malformed forms are 400s, oversized ones 413.
fn rejected(e: MultipartError) -> ApiError {
    ApiError::with_status(e.status(), e.body_text())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dropping_upload_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("upload-abandoned");
        std::fs::write(&path, b"partial").unwrap();

        let upload = StagedUpload::new(path.clone(), "cat.png".into());
        assert_eq!(upload.file().original_name, "cat.png");
        drop(upload);
        assert!(!path.exists());
    }

    #[test]
    fn dropping_consumed_upload_is_quiet() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("upload-ingested");
        let upload = StagedUpload::new(path.clone(), "cat.png".into());
        drop(upload);
        assert!(!path.exists());
    }
}
