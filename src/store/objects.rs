//! Object storage on the local filesystem. Objects live at
//! `<root>/<bucket>/<path>` and are served read-only under `/storage`.

use async_trait::async_trait;
use std::path::PathBuf;

use super::{ObjectRef, ObjectStorage};
use crate::error::{ContentError, ContentResult};

/// URL prefix the HTTP layer serves the storage root under.
pub const PUBLIC_PREFIX: &str = "/storage";

#[derive(Debug, Clone)]
pub struct LocalObjectStorage {
    root: PathBuf,
    base_url: String,
}

impl LocalObjectStorage {
    /// `base_url` is prepended to public URLs (empty for same-origin links).
    pub fn new(root: impl Into<PathBuf>, base_url: &str) -> Self {
        Self {
            root: root.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

/// Rejects path traversal and special characters in a bucket or object path.
fn is_safe_segment_path(path: &str) -> bool {
    !path.is_empty()
        && !path.starts_with('/')
        && !path.contains("..")
        && !path.contains('\\')
        && !path.contains('\0')
}

#[async_trait]
impl ObjectStorage for LocalObjectStorage {
    async fn upload_file(
        &self,
        bucket: &str,
        path: &str,
        bytes: &[u8],
    ) -> ContentResult<ObjectRef> {
        if !is_safe_segment_path(bucket) || bucket.contains('/') || !is_safe_segment_path(path) {
            return Err(ContentError::Upload(format!(
                "invalid object path {}/{}",
                bucket, path
            )));
        }

        let file_path = self.root.join(bucket).join(path);
        if let Some(parent) = file_path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                tracing::error!("Failed to create storage directory: {}", e);
                ContentError::Upload("failed to prepare storage directory".to_string())
            })?;
        }

        tokio::fs::write(&file_path, bytes).await.map_err(|e| {
            tracing::error!("Failed to write object {}/{}: {}", bucket, path, e);
            ContentError::Upload("failed to save file".to_string())
        })?;

        tracing::info!(bucket = %bucket, path = %path, size = bytes.len(), "object stored");
        Ok(ObjectRef {
            bucket: bucket.to_string(),
            path: path.to_string(),
        })
    }

    async fn remove_file(&self, bucket: &str, path: &str) -> ContentResult<()> {
        if !is_safe_segment_path(bucket) || bucket.contains('/') || !is_safe_segment_path(path) {
            return Err(ContentError::Upload(format!(
                "invalid object path {}/{}",
                bucket, path
            )));
        }

        let file_path = self.root.join(bucket).join(path);
        tokio::fs::remove_file(&file_path).await.map_err(|e| {
            tracing::error!("Failed to delete object {}/{}: {}", bucket, path, e);
            ContentError::Upload("failed to delete file".to_string())
        })?;

        tracing::info!(bucket = %bucket, path = %path, "object removed");
        Ok(())
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!("{}{}/{}/{}", self.base_url, PUBLIC_PREFIX, bucket, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_upload_writes_under_bucket() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalObjectStorage::new(dir.path(), "");
        let object = storage
            .upload_file("uploads", "blogs/cover.png", b"\x89PNG")
            .await
            .unwrap();

        let written = std::fs::read(dir.path().join("uploads/blogs/cover.png")).unwrap();
        assert_eq!(written, b"\x89PNG");
        assert_eq!(object.path, "blogs/cover.png");
    }

    #[tokio::test]
    async fn test_remove_deletes_stored_object() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalObjectStorage::new(dir.path(), "");
        storage
            .upload_file("uploads", "projects/thumb.gif", b"GIF89a")
            .await
            .unwrap();

        storage
            .remove_file("uploads", "projects/thumb.gif")
            .await
            .unwrap();
        assert!(!dir.path().join("uploads/projects/thumb.gif").exists());

        assert!(storage
            .remove_file("uploads", "projects/thumb.gif")
            .await
            .is_err());
        assert!(storage.remove_file("uploads", "../secret").await.is_err());
    }

    #[tokio::test]
    async fn test_upload_rejects_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalObjectStorage::new(dir.path(), "");
        for path in ["../escape.png", "/abs.png", "a\\b.png", ""] {
            let err = storage
                .upload_file("uploads", path, b"x")
                .await
                .unwrap_err();
            assert!(matches!(err, ContentError::Upload(_)), "path {path:?}");
        }
        assert!(storage
            .upload_file("up/loads", "a.png", b"x")
            .await
            .is_err());
    }

    #[test]
    fn test_public_url_joins_base_and_prefix() {
        let storage = LocalObjectStorage::new("storage", "https://example.com/");
        assert_eq!(
            storage.public_url("uploads", "projects/a.webp"),
            "https://example.com/storage/uploads/projects/a.webp"
        );
        let local = LocalObjectStorage::new("storage", "");
        assert_eq!(
            local.public_url("uploads", "blogs/b.gif"),
            "/storage/uploads/blogs/b.gif"
        );
    }
}
