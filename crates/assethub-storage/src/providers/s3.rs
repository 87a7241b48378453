//! S3-compatible object storage provider (requires the `s3` feature).

use std::time::Duration;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::Client;
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream as S3ByteStream;
use bytes::Bytes;
use futures::stream::StreamExt;
use tokio_util::io::ReaderStream;
use tracing::{debug, info};

use assethub_core::config::S3StorageConfig;
use assethub_core::error::{AppError, ErrorKind};
use assethub_core::result::AppResult;
use assethub_core::traits::storage::{ByteStream, StorageObjectMeta, StorageProvider};

use crate::mime::mime_from_path;

/// S3-compatible storage provider.
#[derive(Debug, Clone)]
pub struct S3StorageProvider {
    client: Client,
    bucket: String,
}

fn s3_error(
    message: impl Into<String>,
    err: impl std::error::Error + Send + Sync + 'static,
) -> AppError {
    AppError::with_source(ErrorKind::Storage, message, err)
}

impl S3StorageProvider {
    /// Create a new S3 storage provider from static credentials.
    pub async fn new(config: &S3StorageConfig) -> AppResult<Self> {
        if config.bucket.trim().is_empty() {
            return Err(AppError::configuration("storage.s3.bucket is required"));
        }
        info!(
            endpoint = %config.endpoint,
            region = %config.region,
            bucket = %config.bucket,
            "Initializing S3 storage provider"
        );

        let credentials = Credentials::new(
            config.access_key.clone(),
            config.secret_key.clone(),
            None,
            None,
            "assethub-config",
        );
        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .credentials_provider(credentials);
        if !config.endpoint.trim().is_empty() {
            loader = loader.endpoint_url(config.endpoint.trim());
        }
        let shared = loader.load().await;
        let s3_config = aws_sdk_s3::config::Builder::from(&shared)
            .force_path_style(config.force_path_style)
            .build();

        Ok(Self {
            client: Client::from_conf(s3_config),
            bucket: config.bucket.clone(),
        })
    }

    fn presigning(ttl: Duration) -> AppResult<PresigningConfig> {
        PresigningConfig::expires_in(ttl).map_err(|e| s3_error("Invalid presign TTL", e))
    }
}

#[async_trait]
impl StorageProvider for S3StorageProvider {
    fn provider_type(&self) -> &str {
        "s3"
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(self
            .client
            .head_bucket()
            .bucket(&self.bucket)
            .send()
            .await
            .is_ok())
    }

    async fn read(&self, path: &str) -> AppResult<ByteStream> {
        let output = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(path)
            .send()
            .await
            .map_err(|e| {
                let err = e.into_service_error();
                if err.is_no_such_key() {
                    AppError::not_found(format!("Object not found: {path}"))
                } else {
                    s3_error(format!("Failed to get object: {path}"), err)
                }
            })?;

        let stream = ReaderStream::new(output.body.into_async_read());
        Ok(Box::pin(stream.map(|r| r.map(Bytes::from))))
    }

    async fn read_bytes(&self, path: &str) -> AppResult<Bytes> {
        let output = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(path)
            .send()
            .await
            .map_err(|e| {
                let err = e.into_service_error();
                if err.is_no_such_key() {
                    AppError::not_found(format!("Object not found: {path}"))
                } else {
                    s3_error(format!("Failed to get object: {path}"), err)
                }
            })?;
        let data = output
            .body
            .collect()
            .await
            .map_err(|e| s3_error(format!("Failed to read object body: {path}"), e))?;
        Ok(data.into_bytes())
    }

    async fn write(&self, path: &str, data: Bytes) -> AppResult<()> {
        let len = data.len();
        let mut request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(path)
            .body(S3ByteStream::from(data));
        if let Some(content_type) = mime_from_path(path) {
            request = request.content_type(content_type);
        }
        request
            .send()
            .await
            .map_err(|e| s3_error(format!("Failed to put object: {path}"), e.into_service_error()))?;
        debug!(path, bytes = len, "Wrote object");
        Ok(())
    }

    async fn metadata(&self, path: &str) -> AppResult<StorageObjectMeta> {
        let output = self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(path)
            .send()
            .await
            .map_err(|e| {
                let err = e.into_service_error();
                if err.is_not_found() {
                    AppError::not_found(format!("Object not found: {path}"))
                } else {
                    s3_error(format!("Failed to stat object: {path}"), err)
                }
            })?;

        let last_modified = output
            .last_modified()
            .and_then(|t| chrono::DateTime::from_timestamp(t.secs(), t.subsec_nanos()));

        Ok(StorageObjectMeta {
            path: path.to_string(),
            size_bytes: output.content_length().unwrap_or_default().max(0) as u64,
            mime_type: output
                .content_type()
                .map(str::to_string)
                .or_else(|| mime_from_path(path)),
            last_modified,
        })
    }

    async fn presigned_put_url(
        &self,
        path: &str,
        content_type: Option<&str>,
        ttl: Duration,
    ) -> AppResult<Option<String>> {
        let mut request = self.client.put_object().bucket(&self.bucket).key(path);
        if let Some(content_type) = content_type {
            request = request.content_type(content_type);
        }
        let presigned = request
            .presigned(Self::presigning(ttl)?)
            .await
            .map_err(|e| s3_error(format!("Failed to presign upload: {path}"), e.into_service_error()))?;
        Ok(Some(presigned.uri().to_string()))
    }

    async fn presigned_get_url(&self, path: &str, ttl: Duration) -> AppResult<Option<String>> {
        let presigned = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(path)
            .presigned(Self::presigning(ttl)?)
            .await
            .map_err(|e| {
                s3_error(format!("Failed to presign download: {path}"), e.into_service_error())
            })?;
        Ok(Some(presigned.uri().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> S3StorageConfig {
        S3StorageConfig {
            enabled: true,
            endpoint: "http://127.0.0.1:9000".into(),
            bucket: "assets".into(),
            access_key: "minio".into(),
            secret_key: "minio-secret".into(),
            ..S3StorageConfig::default()
        }
    }

    #[tokio::test]
    async fn test_requires_bucket() {
        let mut config = config();
        config.bucket.clear();
        let err = S3StorageProvider::new(&config).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Configuration);
    }

    #[tokio::test]
    async fn test_presigned_urls_are_signed_locally() {
        let provider = S3StorageProvider::new(&config()).await.unwrap();
        let put = provider
            .presigned_put_url("assets/x.png", Some("image/png"), Duration::from_secs(900))
            .await
            .unwrap()
            .unwrap();
        assert!(put.starts_with("http://127.0.0.1:9000/assets/assets/x.png?"));
        assert!(put.contains("X-Amz-Signature="));
        assert!(put.contains("X-Amz-Expires=900"));

        let get = provider
            .presigned_get_url("assets/x.png", Duration::from_secs(60))
            .await
            .unwrap()
            .unwrap();
        assert!(get.contains("X-Amz-Expires=60"));
    }
}
