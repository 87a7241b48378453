//! In-process storage provider.
//!
//! Used for development and tests. With a presign base configured it also
//! stands in for an external object store by handing out fake signed URLs.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use futures::stream;

use assethub_core::error::AppError;
use assethub_core::result::AppResult;
use assethub_core::traits::storage::{ByteStream, StorageObjectMeta, StorageProvider};

use crate::mime::mime_from_path;

#[derive(Debug, Clone)]
struct StoredObject {
    data: Bytes,
    modified: DateTime<Utc>,
}

/// Storage provider that keeps objects in a concurrent map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorageProvider {
    objects: Arc<DashMap<String, StoredObject>>,
    presign_base: Option<String>,
}

impl MemoryStorageProvider {
    /// Create an empty provider without URL signing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty provider that mints URLs under `base`.
    pub fn with_presign_base(base: impl Into<String>) -> Self {
        Self {
            objects: Arc::new(DashMap::new()),
            presign_base: Some(base.into().trim_end_matches('/').to_string()),
        }
    }

    /// Number of stored objects.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Whether no objects are stored.
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    fn get(&self, path: &str) -> AppResult<StoredObject> {
        self.objects
            .get(path)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| AppError::not_found(format!("Blob not found: {path}")))
    }

    fn sign(&self, method: &str, path: &str, ttl: Duration) -> Option<String> {
        self.presign_base.as_ref().map(|base| {
            format!(
                "{base}/{path}?X-Method={method}&X-Expires={}",
                ttl.as_secs()
            )
        })
    }
}

#[async_trait]
impl StorageProvider for MemoryStorageProvider {
    fn provider_type(&self) -> &str {
        "memory"
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }

    async fn read(&self, path: &str) -> AppResult<ByteStream> {
        let object = self.get(path)?;
        Ok(Box::pin(stream::once(async move { Ok::<_, std::io::Error>(object.data) })))
    }

    async fn read_bytes(&self, path: &str) -> AppResult<Bytes> {
        Ok(self.get(path)?.data)
    }

    async fn write(&self, path: &str, data: Bytes) -> AppResult<()> {
        self.objects.insert(
            path.to_string(),
            StoredObject {
                data,
                modified: Utc::now(),
            },
        );
        Ok(())
    }

    async fn metadata(&self, path: &str) -> AppResult<StorageObjectMeta> {
        let object = self.get(path)?;
        Ok(StorageObjectMeta {
            path: path.to_string(),
            size_bytes: object.data.len() as u64,
            mime_type: mime_from_path(path),
            last_modified: Some(object.modified),
        })
    }

    async fn presigned_put_url(
        &self,
        path: &str,
        _content_type: Option<&str>,
        ttl: Duration,
    ) -> AppResult<Option<String>> {
        Ok(self.sign("PUT", path, ttl))
    }

    async fn presigned_get_url(&self, path: &str, ttl: Duration) -> AppResult<Option<String>> {
        Ok(self.sign("GET", path, ttl))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_write_read_metadata() {
        let provider = MemoryStorageProvider::new();
        provider.write("a.png", Bytes::from_static(b"png")).await.unwrap();
        assert_eq!(provider.read_bytes("a.png").await.unwrap(), Bytes::from_static(b"png"));
        let meta = provider.metadata("a.png").await.unwrap();
        assert_eq!(meta.size_bytes, 3);
        assert_eq!(meta.mime_type.as_deref(), Some("image/png"));
        assert_eq!(provider.len(), 1);
    }

    #[tokio::test]
    async fn test_presign_only_with_base() {
        let plain = MemoryStorageProvider::new();
        assert!(
            plain
                .presigned_put_url("k", None, Duration::from_secs(5))
                .await
                .unwrap()
                .is_none()
        );

        let signing = MemoryStorageProvider::with_presign_base("https://bucket.test/");
        let url = signing
            .presigned_get_url("assets/k.png", Duration::from_secs(60))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(url, "https://bucket.test/assets/k.png?X-Method=GET&X-Expires=60");
    }

    #[tokio::test]
    async fn test_missing_object() {
        let provider = MemoryStorageProvider::new();
        assert!(provider.read_bytes("missing").await.is_err());
        let err = provider.metadata("missing").await.unwrap_err();
        assert_eq!(err.kind, assethub_core::ErrorKind::NotFound);
    }
}
