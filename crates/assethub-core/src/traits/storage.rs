//! Storage provider trait for pluggable blob backends.

use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;

use crate::result::AppResult;

/// Metadata about a stored object.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct StorageObjectMeta {
    /// Key within the storage provider.
    pub path: String,
    /// Size in bytes.
    pub size_bytes: u64,
    /// MIME type (if known).
    pub mime_type: Option<String>,
    /// Last modified timestamp.
    pub last_modified: Option<chrono::DateTime<chrono::Utc>>,
}

/// A byte stream type used for reading object contents.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, std::io::Error>> + Send>>;

/// Trait for blob storage backends.
///
/// Implementations exist for the local filesystem, S3-compatible object
/// stores and process memory. The trait is defined here in `assethub-core`
/// and implemented in `assethub-storage`.
#[async_trait]
pub trait StorageProvider: Send + Sync + std::fmt::Debug + 'static {
    /// Return the provider type name (e.g., "local", "s3").
    fn provider_type(&self) -> &str;

    /// Check whether the provider is healthy and reachable.
    async fn health_check(&self) -> AppResult<bool>;

    /// Read an object and return its byte stream.
    async fn read(&self, path: &str) -> AppResult<ByteStream>;

    /// Read an object into memory.
    async fn read_bytes(&self, path: &str) -> AppResult<Bytes>;

    /// Write bytes to the given key, replacing any previous object.
    async fn write(&self, path: &str, data: Bytes) -> AppResult<()>;

    /// Get metadata about an object.
    async fn metadata(&self, path: &str) -> AppResult<StorageObjectMeta>;

    /// Mint a URL that lets a client PUT bytes directly to `path`.
    ///
    /// Providers without direct client access return `Ok(None)`.
    async fn presigned_put_url(
        &self,
        _path: &str,
        _content_type: Option<&str>,
        _ttl: Duration,
    ) -> AppResult<Option<String>> {
        Ok(None)
    }

    /// Mint a short-lived URL that lets a client GET `path` directly.
    ///
    /// Providers without direct client access return `Ok(None)`.
    async fn presigned_get_url(&self, _path: &str, _ttl: Duration) -> AppResult<Option<String>> {
        Ok(None)
    }
}
