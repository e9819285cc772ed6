//! Blob storage for uploaded files.
//!
//! Bytes live on the local filesystem under `{root}/{owner uid}/{file id}`.
//! The user-facing `"{displayName}'s Files/{name}"` path is only a logical key
//! recorded in the database.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::errors::AppError;

/// Filesystem-backed blob store.
#[derive(Debug, Clone)]
pub struct BlobStore {
    root: PathBuf,
}

impl BlobStore {
    /// Create the storage root if needed.
    pub async fn open(root: &Path) -> Result<Self, AppError> {
        tokio::fs::create_dir_all(root).await.map_err(|e| {
            AppError::Storage(format!("Failed to create storage directory: {}", e))
        })?;
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    fn blob_path(&self, owner_uid: &str, file_id: &str) -> PathBuf {
        self.root.join(owner_uid).join(file_id)
    }

    /// Write a blob, replacing any previous content.
    pub async fn put(&self, owner_uid: &str, file_id: &str, bytes: &[u8]) -> Result<(), AppError> {
        let path = self.blob_path(owner_uid, file_id);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, bytes).await?;
        Ok(())
    }

    /// Read a blob back.
    pub async fn get(&self, owner_uid: &str, file_id: &str) -> Result<Vec<u8>, AppError> {
        match tokio::fs::read(self.blob_path(owner_uid, file_id)).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(AppError::NotFound(format!(
                "Content for file {} not found",
                file_id
            ))),
            Err(e) => Err(e.into()),
        }
    }

    /// Remove a blob. Removing a missing blob is not an error.
    pub async fn delete(&self, owner_uid: &str, file_id: &str) -> Result<(), AppError> {
        match tokio::fs::remove_file(self.blob_path(owner_uid, file_id)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Logical storage key for a user's file.
pub fn storage_key(display_name: &str, file_name: &str) -> String {
    format!("{}'s Files/{}", display_name, file_name)
}

/// Reduce a client-supplied file name to its last path component.
pub fn sanitize_file_name(raw: &str) -> Result<String, AppError> {
    let name = raw
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();

    if name.is_empty() || name == "." || name == ".." {
        return Err(AppError::Validation(format!("Invalid file name: {:?}", raw)));
    }
    Ok(name.to_string())
}
