//! Local filesystem storage provider for inline blobs.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::StreamExt;
use tokio::fs;
use tokio_util::io::ReaderStream;
use tracing::debug;

use assethub_core::error::{AppError, ErrorKind};
use assethub_core::result::AppResult;
use assethub_core::traits::storage::{ByteStream, StorageObjectMeta, StorageProvider};

use crate::mime::mime_from_path;

/// Local filesystem storage provider.
#[derive(Debug, Clone)]
pub struct LocalStorageProvider {
    /// Root directory for all stored blobs.
    root: PathBuf,
}

impl LocalStorageProvider {
    /// Create a new local storage provider rooted at the given path.
    pub async fn new(root_path: &str) -> AppResult<Self> {
        let root = PathBuf::from(root_path);
        fs::create_dir_all(&root).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to create storage root: {}", root.display()),
                e,
            )
        })?;
        Ok(Self { root })
    }

    /// Resolve a key to an absolute path within the root.
    fn resolve(&self, path: &str) -> AppResult<PathBuf> {
        let clean = Path::new(path.trim_start_matches('/'));
        if clean
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            return Err(AppError::validation(format!("Invalid storage key: {path}")));
        }
        Ok(self.root.join(clean))
    }

    /// Ensure the parent directory of a path exists.
    async fn ensure_parent(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to create parent directory: {}", parent.display()),
                    e,
                )
            })?;
        }
        Ok(())
    }
}

fn open_error(path: &str, e: std::io::Error) -> AppError {
    if e.kind() == std::io::ErrorKind::NotFound {
        AppError::not_found(format!("Blob not found: {path}"))
    } else {
        AppError::with_source(ErrorKind::Storage, format!("Failed to open blob: {path}"), e)
    }
}

#[async_trait]
impl StorageProvider for LocalStorageProvider {
    fn provider_type(&self) -> &str {
        "local"
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(fs::metadata(&self.root)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false))
    }

    async fn read(&self, path: &str) -> AppResult<ByteStream> {
        let full_path = self.resolve(path)?;
        let file = fs::File::open(&full_path)
            .await
            .map_err(|e| open_error(path, e))?;

        let stream = ReaderStream::new(file);
        Ok(Box::pin(stream.map(|r| r.map(Bytes::from))))
    }

    async fn read_bytes(&self, path: &str) -> AppResult<Bytes> {
        let full_path = self.resolve(path)?;
        let data = fs::read(&full_path)
            .await
            .map_err(|e| open_error(path, e))?;
        Ok(Bytes::from(data))
    }

    async fn write(&self, path: &str, data: Bytes) -> AppResult<()> {
        let full_path = self.resolve(path)?;
        self.ensure_parent(&full_path).await?;

        // Write to a sibling temp file, then rename into place.
        let mut tmp_name = full_path.clone().into_os_string();
        tmp_name.push(".partial");
        let tmp_path = PathBuf::from(tmp_name);
        fs::write(&tmp_path, &data).await.map_err(|e| {
            AppError::with_source(ErrorKind::Storage, format!("Failed to write blob: {path}"), e)
        })?;
        fs::rename(&tmp_path, &full_path).await.map_err(|e| {
            AppError::with_source(ErrorKind::Storage, format!("Failed to commit blob: {path}"), e)
        })?;

        debug!(path, bytes = data.len(), "Wrote blob");
        Ok(())
    }

    async fn metadata(&self, path: &str) -> AppResult<StorageObjectMeta> {
        let full_path = self.resolve(path)?;
        let meta = fs::metadata(&full_path)
            .await
            .map_err(|e| open_error(path, e))?;

        Ok(StorageObjectMeta {
            path: path.to_string(),
            size_bytes: meta.len(),
            mime_type: mime_from_path(path),
            last_modified: meta.modified().ok().map(chrono::DateTime::<chrono::Utc>::from),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn provider() -> (tempfile::TempDir, LocalStorageProvider) {
        let dir = tempfile::tempdir().unwrap();
        let provider = LocalStorageProvider::new(dir.path().to_str().unwrap())
            .await
            .unwrap();
        (dir, provider)
    }

    #[tokio::test]
    async fn test_write_read_metadata() {
        let (_dir, provider) = provider().await;

        let data = Bytes::from("hello world");
        provider.write("blobs/abc", data.clone()).await.unwrap();

        let read_back = provider.read_bytes("blobs/abc").await.unwrap();
        assert_eq!(read_back, data);

        let meta = provider.metadata("blobs/abc").await.unwrap();
        assert_eq!(meta.size_bytes, 11);
        assert!(meta.last_modified.is_some());
    }

    #[tokio::test]
    async fn test_stream_read() {
        let (_dir, provider) = provider().await;
        provider.write("s.txt", Bytes::from("streamed")).await.unwrap();

        let mut stream = provider.read("s.txt").await.unwrap();
        let mut collected = Vec::new();
        while let Some(chunk) = stream.next().await {
            collected.extend_from_slice(&chunk.unwrap());
        }
        assert_eq!(collected, b"streamed");
    }

    #[tokio::test]
    async fn test_missing_blob_is_not_found() {
        let (_dir, provider) = provider().await;
        let err = provider.read_bytes("nope").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
        let err = provider.metadata("nope").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_rejects_escaping_keys() {
        let (_dir, provider) = provider().await;
        let err = provider.write("../outside", Bytes::from("x")).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_no_presigned_urls() {
        let (_dir, provider) = provider().await;
        let url = provider
            .presigned_get_url("blobs/abc", std::time::Duration::from_secs(60))
            .await
            .unwrap();
        assert!(url.is_none());
    }
}
