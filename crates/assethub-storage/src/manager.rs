//! Storage manager: routes blob operations to the inline or external backend.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{info, warn};
use uuid::Uuid;

use assethub_core::config::AppConfig;
use assethub_core::error::AppError;
use assethub_core::result::AppResult;
use assethub_core::traits::storage::{ByteStream, StorageObjectMeta, StorageProvider};
use assethub_entity::asset::StorageRef;

use crate::providers::{LocalStorageProvider, MemoryStorageProvider};

/// Response handle returned after bytes land in the inline blob store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineBlob {
    /// Blob identifier, used as `StorageRef::Inline { id }`.
    pub storage_id: String,
    /// Number of bytes written.
    pub size: i64,
    /// MIME type reported by the uploader.
    pub content_type: Option<String>,
    /// Hex-encoded SHA-256 of the bytes.
    pub sha256: String,
}

/// Holds the inline blob provider and the optional external object store.
#[derive(Debug, Clone)]
pub struct StorageManager {
    inline: Arc<dyn StorageProvider>,
    external: Option<Arc<dyn StorageProvider>>,
    public_base_url: String,
    serve_base_path: String,
    key_prefix: String,
    presign_ttl: Duration,
    download_ttl: Duration,
}

impl StorageManager {
    /// Build providers from configuration.
    pub async fn from_config(config: &AppConfig) -> AppResult<Self> {
        let inline: Arc<dyn StorageProvider> = match config.storage.inline_provider.as_str() {
            "local" => Arc::new(LocalStorageProvider::new(&config.storage.local.root_path).await?),
            "memory" => Arc::new(MemoryStorageProvider::new()),
            other => {
                return Err(AppError::configuration(format!(
                    "Unknown inline storage provider '{other}'. Expected one of: local, memory"
                )));
            }
        };

        let external = if config.storage.s3.enabled {
            Some(Self::external_provider(config).await?)
        } else {
            None
        };

        info!(
            inline = inline.provider_type(),
            external = external.as_ref().map(|p| p.provider_type()).unwrap_or("none"),
            "Storage providers initialized"
        );

        Ok(Self::with_providers(inline, external, config))
    }

    #[cfg(feature = "s3")]
    async fn external_provider(config: &AppConfig) -> AppResult<Arc<dyn StorageProvider>> {
        let provider = crate::providers::S3StorageProvider::new(&config.storage.s3).await?;
        Ok(Arc::new(provider))
    }

    #[cfg(not(feature = "s3"))]
    async fn external_provider(_config: &AppConfig) -> AppResult<Arc<dyn StorageProvider>> {
        Err(AppError::configuration(
            "storage.s3.enabled is set but assethub-storage was built without the `s3` feature",
        ))
    }

    /// Assemble a manager around already constructed providers.
    pub fn with_providers(
        inline: Arc<dyn StorageProvider>,
        external: Option<Arc<dyn StorageProvider>>,
        config: &AppConfig,
    ) -> Self {
        Self {
            inline,
            external,
            public_base_url: config.server.public_base_url.trim_end_matches('/').to_string(),
            serve_base_path: config.serving.normalized_base_path(),
            key_prefix: config.storage.s3.key_prefix.clone(),
            presign_ttl: Duration::from_secs(config.storage.upload.presign_ttl_seconds),
            download_ttl: Duration::from_secs(config.serving.download_url_ttl_seconds),
        }
    }

    /// Whether an external object store is configured.
    pub fn has_external(&self) -> bool {
        self.external.is_some()
    }

    fn external(&self) -> AppResult<&Arc<dyn StorageProvider>> {
        self.external
            .as_ref()
            .ok_or_else(|| AppError::configuration("External storage backend is not configured"))
    }

    fn provider_for(&self, storage_ref: &StorageRef) -> AppResult<&Arc<dyn StorageProvider>> {
        match storage_ref {
            StorageRef::Inline { .. } => Ok(&self.inline),
            StorageRef::External { .. } => self.external(),
        }
    }

    /// Upload target for an inline intent.
    pub fn inline_upload_url(&self, intent_id: Uuid) -> String {
        format!("{}/api/uploads/{intent_id}/blob", self.public_base_url)
    }

    /// Pre-allocate the object key an external intent will upload to.
    pub fn allocate_external_key(&self, intent_id: Uuid, filename: Option<&str>) -> String {
        let ext = filename
            .and_then(|f| f.rsplit_once('.'))
            .map(|(_, ext)| ext.trim())
            .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
            .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
            .unwrap_or_default();
        format!("{}{intent_id}{ext}", self.key_prefix)
    }

    /// Pre-signed PUT URL for a pre-allocated external key.
    pub async fn external_upload_url(
        &self,
        key: &str,
        content_type: Option<&str>,
    ) -> AppResult<String> {
        self.external()?
            .presigned_put_url(key, content_type, self.presign_ttl)
            .await?
            .ok_or_else(|| {
                AppError::configuration("External storage backend cannot mint upload URLs")
            })
    }

    /// Write bytes to the inline blob store under a fresh id.
    pub async fn write_inline_blob(
        &self,
        data: Bytes,
        content_type: Option<String>,
    ) -> AppResult<InlineBlob> {
        let storage_id = Uuid::new_v4().to_string();
        let sha256 = hex::encode(Sha256::digest(&data));
        let size = data.len() as i64;
        self.inline.write(&storage_id, data).await?;
        info!(storage_id = %storage_id, size, "Stored inline blob");
        Ok(InlineBlob {
            storage_id,
            size,
            content_type,
            sha256,
        })
    }

    /// Stream the bytes behind a storage reference.
    pub async fn read(&self, storage_ref: &StorageRef) -> AppResult<ByteStream> {
        self.provider_for(storage_ref)?
            .read(storage_ref.locator())
            .await
    }

    /// Read the bytes behind a storage reference into memory.
    pub async fn read_bytes(&self, storage_ref: &StorageRef) -> AppResult<Bytes> {
        self.provider_for(storage_ref)?
            .read_bytes(storage_ref.locator())
            .await
    }

    /// Read an inline blob by id as a stream.
    pub async fn read_inline(&self, storage_id: &str) -> AppResult<ByteStream> {
        self.inline.read(storage_id).await
    }

    /// Object metadata behind a storage reference.
    pub async fn object_meta(&self, storage_ref: &StorageRef) -> AppResult<StorageObjectMeta> {
        self.provider_for(storage_ref)?
            .metadata(storage_ref.locator())
            .await
    }

    /// Mint a short-lived download URL for a storage reference.
    pub async fn download_url(&self, storage_ref: &StorageRef) -> AppResult<String> {
        match storage_ref {
            StorageRef::Inline { id } => Ok(format!(
                "{}{}/blobs/{id}",
                self.public_base_url,
                self.serve_base_path.trim_end_matches('/')
            )),
            StorageRef::External { key } => self
                .external()?
                .presigned_get_url(key, self.download_ttl)
                .await?
                .ok_or_else(|| {
                    AppError::configuration("External storage backend cannot mint download URLs")
                }),
        }
    }

    /// Health of every configured provider, keyed by role.
    pub async fn health_check_all(&self) -> Vec<(&'static str, bool)> {
        let mut results = vec![("inline", self.inline.health_check().await.unwrap_or(false))];
        if let Some(external) = &self.external {
            let healthy = external.health_check().await.unwrap_or(false);
            if !healthy {
                warn!(provider = external.provider_type(), "External storage unhealthy");
            }
            results.push(("external", healthy));
        }
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager(external: bool) -> StorageManager {
        let mut config = AppConfig::default();
        config.server.public_base_url = "https://assets.test/".into();
        let external: Option<Arc<dyn StorageProvider>> = external
            .then(|| Arc::new(MemoryStorageProvider::with_presign_base("https://s3.test")) as _);
        StorageManager::with_providers(Arc::new(MemoryStorageProvider::new()), external, &config)
    }

    #[test]
    fn test_upload_targets() {
        let manager = manager(true);
        let id = Uuid::nil();
        assert_eq!(
            manager.inline_upload_url(id),
            format!("https://assets.test/api/uploads/{id}/blob")
        );
        assert_eq!(
            manager.allocate_external_key(id, Some("Cover.PNG")),
            format!("assets/{id}.png")
        );
        assert_eq!(manager.allocate_external_key(id, Some("README")), format!("assets/{id}"));
        assert_eq!(manager.allocate_external_key(id, None), format!("assets/{id}"));
    }

    #[tokio::test]
    async fn test_inline_blob_roundtrip() {
        let manager = manager(false);
        let blob = manager
            .write_inline_blob(Bytes::from_static(b"abc"), Some("text/plain".into()))
            .await
            .unwrap();
        assert_eq!(blob.size, 3);
        assert_eq!(
            blob.sha256,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );

        let storage_ref = StorageRef::Inline {
            id: blob.storage_id.clone(),
        };
        assert_eq!(
            manager.read_bytes(&storage_ref).await.unwrap(),
            Bytes::from_static(b"abc")
        );
        assert_eq!(
            manager.download_url(&storage_ref).await.unwrap(),
            format!("https://assets.test/files/blobs/{}", blob.storage_id)
        );
    }

    #[tokio::test]
    async fn test_external_requires_provider() {
        let manager = manager(false);
        let err = manager.external_upload_url("k", None).await.unwrap_err();
        assert_eq!(err.kind, assethub_core::ErrorKind::Configuration);
        let err = manager
            .download_url(&StorageRef::External { key: "k".into() })
            .await
            .unwrap_err();
        assert_eq!(err.kind, assethub_core::ErrorKind::Configuration);
    }

    #[tokio::test]
    async fn test_external_urls() {
        let manager = manager(true);
        let put = manager
            .external_upload_url("assets/x.png", Some("image/png"))
            .await
            .unwrap();
        assert_eq!(put, "https://s3.test/assets/x.png?X-Method=PUT&X-Expires=3600");
        let get = manager
            .download_url(&StorageRef::External {
                key: "assets/x.png".into(),
            })
            .await
            .unwrap();
        assert_eq!(get, "https://s3.test/assets/x.png?X-Method=GET&X-Expires=300");
    }
}
