//! Upload intents: reserve a slot, move bytes out of band, then finalize.

use std::sync::Arc;

use bytes::Bytes;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use assethub_core::config::UploadConfig;
use assethub_core::error::{AppError, ErrorKind};
use assethub_core::result::AppResult;
use assethub_database::AssetStore;
use assethub_entity::asset::{NewVersion, PayloadMeta, StorageRef};
use assethub_entity::upload::{IntentStatus, UploadBackend, UploadIntent};
use assethub_storage::{InlineBlob, StorageManager};

use crate::asset::service::asset_key;
use crate::asset::{AssetService, CommitVersionRequest};
use crate::context::RequestContext;
use crate::settings::StorageSettingsService;

/// Manages the upload intent lifecycle.
#[derive(Debug, Clone)]
pub struct UploadService {
    store: Arc<dyn AssetStore>,
    storage: Arc<StorageManager>,
    settings: StorageSettingsService,
    assets: AssetService,
    config: UploadConfig,
}

/// Request to start an upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartUploadRequest {
    /// Target folder.
    #[serde(default)]
    pub folder_path: String,
    /// Target basename.
    pub basename: String,
    /// Client-side file name.
    #[serde(default)]
    pub filename: Option<String>,
    /// Expected MIME type, signed into external upload URLs.
    #[serde(default)]
    pub content_type: Option<String>,
    /// Publish the resulting version immediately.
    #[serde(default)]
    pub publish: bool,
    /// Label for the resulting version.
    #[serde(default)]
    pub label: Option<String>,
    /// Metadata for the resulting version.
    #[serde(default)]
    pub extra: Option<serde_json::Value>,
}

/// Where and how the client sends its bytes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadTicket {
    /// Intent to finish once the bytes are sent.
    pub intent_id: Uuid,
    /// Backend chosen for this upload.
    pub backend: UploadBackend,
    /// Upload target.
    pub upload_url: String,
    /// HTTP method to use against `upload_url`.
    pub upload_method: String,
    /// Pre-allocated object key (external backend only).
    pub backend_key: Option<String>,
    /// When the intent stops being usable.
    pub expires_at: DateTime<Utc>,
}

/// Request to finish an upload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FinishUploadRequest {
    /// Body returned by the inline blob endpoint.
    #[serde(default)]
    pub upload_response: Option<serde_json::Value>,
    /// Size in bytes, when the client knows it.
    #[serde(default)]
    pub size: Option<i64>,
    /// MIME type, when the client knows it.
    #[serde(default)]
    pub content_type: Option<String>,
}

/// The version an upload produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinishedUpload {
    /// Asset the version belongs to.
    pub asset_id: Uuid,
    /// New version identifier.
    pub version_id: Uuid,
    /// New version number.
    pub version: i32,
}

/// Inline response handle as sent back by clients; only the id is required.
///
/// The id must match the blob pushed for the intent; size comes from storage.
#[derive(Debug, Deserialize)]
struct InlineHandle {
    #[serde(alias = "id")]
    storage_id: String,
    #[serde(default)]
    content_type: Option<String>,
    #[serde(default)]
    sha256: Option<String>,
}

fn ensure_open(intent: &UploadIntent, now: DateTime<Utc>) -> AppResult<()> {
    match intent.status {
        IntentStatus::Finalized => Err(AppError::conflict(format!(
            "Upload intent {} is already finalized",
            intent.id
        ))),
        IntentStatus::Expired => Err(AppError::expired(format!(
            "Upload intent {} has expired",
            intent.id
        ))),
        IntentStatus::Created if intent.is_past_due(now) => Err(AppError::expired(format!(
            "Upload intent {} expired at {}",
            intent.id, intent.expires_at
        ))),
        IntentStatus::Created => Ok(()),
    }
}

impl UploadService {
    /// Creates a new upload service.
    pub fn new(
        store: Arc<dyn AssetStore>,
        storage: Arc<StorageManager>,
        settings: StorageSettingsService,
        assets: AssetService,
        config: UploadConfig,
    ) -> Self {
        Self {
            store,
            storage,
            settings,
            assets,
            config,
        }
    }

    /// Reserve an upload slot and return where to send the bytes.
    pub async fn start_upload(
        &self,
        ctx: &RequestContext,
        req: StartUploadRequest,
    ) -> AppResult<UploadTicket> {
        let key = asset_key(&req.folder_path, &req.basename)?;
        let backend = self.settings.current().await?.backend;
        let intent_id = Uuid::new_v4();

        let (upload_url, backend_key) = match backend {
            UploadBackend::Inline => (self.storage.inline_upload_url(intent_id), None),
            UploadBackend::External => {
                if !self.storage.has_external() {
                    return Err(AppError::configuration(
                        "External storage backend is selected but not configured",
                    ));
                }
                let object_key = self
                    .storage
                    .allocate_external_key(intent_id, req.filename.as_deref());
                let url = self
                    .storage
                    .external_upload_url(&object_key, req.content_type.as_deref())
                    .await?;
                (url, Some(object_key))
            }
        };

        let now = ctx.request_time;
        let intent = UploadIntent {
            id: intent_id,
            folder_path: key.folder_path,
            basename: key.basename,
            filename: req.filename,
            backend,
            backend_key: backend_key.clone(),
            status: IntentStatus::Created,
            publish: req.publish,
            label: req.label,
            extra: req.extra,
            created_at: now,
            expires_at: now + Duration::seconds(self.config.intent_ttl_seconds),
            finalized_at: None,
            created_by: ctx.actor.clone(),
        };
        self.store.insert_intent(&intent).await?;
        info!(
            intent_id = %intent.id,
            backend = %backend,
            folder_path = %intent.folder_path,
            basename = %intent.basename,
            "Upload intent created"
        );

        Ok(UploadTicket {
            intent_id,
            backend,
            upload_url,
            upload_method: backend.upload_method().to_string(),
            backend_key,
            expires_at: intent.expires_at,
        })
    }

    /// Store the bytes of an inline intent and return the response handle.
    pub async fn accept_inline_blob(
        &self,
        intent_id: Uuid,
        data: Bytes,
        content_type: Option<String>,
    ) -> AppResult<InlineBlob> {
        let intent = self.find_intent(intent_id).await?;
        ensure_open(&intent, Utc::now())?;
        if intent.backend != UploadBackend::Inline {
            return Err(AppError::validation(format!(
                "Upload intent {intent_id} does not accept inline bytes"
            )));
        }
        if data.len() as u64 > self.config.max_inline_upload_bytes {
            return Err(AppError::validation(format!(
                "Upload of {} bytes exceeds the inline limit of {} bytes",
                data.len(),
                self.config.max_inline_upload_bytes
            )));
        }
        let blob = self.storage.write_inline_blob(data, content_type).await?;
        self.store.record_intent_blob(intent_id, &blob.storage_id).await?;
        Ok(blob)
    }

    /// Turn an intent into a committed version.
    ///
    /// Finalizing the intent and committing the version happen in one store
    /// transaction; on failure the intent stays `created`.
    pub async fn finish_upload(
        &self,
        ctx: &RequestContext,
        intent_id: Uuid,
        req: FinishUploadRequest,
    ) -> AppResult<FinishedUpload> {
        let intent = self.find_intent(intent_id).await?;
        ensure_open(&intent, ctx.request_time)?;

        let (storage_ref, payload) = match intent.backend {
            UploadBackend::Inline => {
                let handle = req
                    .upload_response
                    .and_then(|value| serde_json::from_value::<InlineHandle>(value).ok())
                    .filter(|handle| !handle.storage_id.trim().is_empty())
                    .ok_or_else(|| {
                        AppError::validation(format!(
                            "Upload intent {intent_id} needs the inline upload response"
                        ))
                    })?;
                if intent.backend_key.as_deref() != Some(handle.storage_id.as_str()) {
                    return Err(AppError::validation(format!(
                        "Upload response does not match the blob pushed for intent {intent_id}"
                    )));
                }
                let storage_ref = StorageRef::Inline {
                    id: handle.storage_id,
                };
                let meta = self
                    .storage
                    .object_meta(&storage_ref)
                    .await
                    .map_err(|e| match e.kind {
                        ErrorKind::NotFound => AppError::validation(format!(
                            "Blob for upload intent {intent_id} is missing"
                        )),
                        _ => e,
                    })?;
                let payload = PayloadMeta {
                    original_filename: intent.filename.clone(),
                    size: i64::try_from(meta.size_bytes).ok(),
                    content_type: req.content_type.or(handle.content_type),
                    sha256: handle.sha256,
                };
                (storage_ref, payload)
            }
            UploadBackend::External => {
                let object_key = intent.backend_key.clone().ok_or_else(|| {
                    AppError::internal(format!("Upload intent {intent_id} has no object key"))
                })?;
                let payload = PayloadMeta {
                    original_filename: intent.filename.clone(),
                    size: req.size,
                    content_type: req.content_type,
                    sha256: None,
                };
                (StorageRef::External { key: object_key }, payload)
            }
        };

        let version = self
            .assets
            .commit(
                ctx,
                CommitVersionRequest {
                    folder_path: intent.folder_path,
                    basename: intent.basename,
                    publish: intent.publish,
                    version: NewVersion {
                        storage_ref,
                        label: intent.label,
                        extra: intent.extra,
                        payload,
                    },
                },
                Some(intent_id),
            )
            .await?;

        info!(
            intent_id = %intent_id,
            asset_id = %version.asset_id,
            version = version.version,
            "Upload finished"
        );
        Ok(FinishedUpload {
            asset_id: version.asset_id,
            version_id: version.id,
            version: version.version,
        })
    }

    /// Expire every open intent whose TTL has passed.
    pub async fn sweep_expired(&self) -> AppResult<u64> {
        let expired = self.store.expire_intents(Utc::now()).await?;
        if expired > 0 {
            info!(expired, "Expired stale upload intents");
        }
        Ok(expired)
    }

    /// Get an upload intent by identifier.
    pub async fn get_intent(&self, intent_id: Uuid) -> AppResult<Option<UploadIntent>> {
        self.store.find_intent(intent_id).await
    }

    async fn find_intent(&self, intent_id: Uuid) -> AppResult<UploadIntent> {
        self.store
            .find_intent(intent_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Upload intent {intent_id} not found")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;
    use assethub_entity::asset::VersionState;

    fn service(external: bool, ttl_seconds: i64) -> (Arc<dyn AssetStore>, UploadService) {
        let (store, storage) = testing::backends(external);
        let settings =
            StorageSettingsService::new(store.clone(), storage.clone(), UploadBackend::Inline);
        let config = UploadConfig {
            intent_ttl_seconds: ttl_seconds,
            max_inline_upload_bytes: 16,
            ..UploadConfig::default()
        };
        let svc = UploadService::new(
            store.clone(),
            storage,
            settings,
            AssetService::new(store.clone()),
            config,
        );
        (store, svc)
    }

    fn start(publish: bool) -> StartUploadRequest {
        StartUploadRequest {
            folder_path: "covers".into(),
            basename: "hero.png".into(),
            filename: Some("Hero.PNG".into()),
            content_type: Some("image/png".into()),
            publish,
            label: Some("first".into()),
            extra: None,
        }
    }

    #[tokio::test]
    async fn test_inline_round_trip() {
        let (_store, svc) = service(false, 3600);
        let ctx = RequestContext::new(Some("ana".into()));
        let ticket = svc.start_upload(&ctx, start(true)).await.unwrap();
        assert_eq!(ticket.backend, UploadBackend::Inline);
        assert_eq!(ticket.upload_method, "POST");
        assert!(ticket.upload_url.ends_with(&format!("/api/uploads/{}/blob", ticket.intent_id)));
        assert!(ticket.backend_key.is_none());

        let blob = svc
            .accept_inline_blob(ticket.intent_id, Bytes::from_static(b"png-bytes"), None)
            .await
            .unwrap();
        let done = svc
            .finish_upload(
                &ctx,
                ticket.intent_id,
                FinishUploadRequest {
                    upload_response: Some(serde_json::to_value(&blob).unwrap()),
                    size: None,
                    content_type: Some("image/png".into()),
                },
            )
            .await
            .unwrap();
        assert_eq!(done.version, 1);

        let version = svc.assets.get_version(done.version_id).await.unwrap().unwrap();
        assert_eq!(version.state, VersionState::Published);
        assert_eq!(version.storage_ref, StorageRef::Inline { id: blob.storage_id });
        assert_eq!(version.size, Some(9));
        assert_eq!(version.original_filename.as_deref(), Some("Hero.PNG"));
        assert_eq!(version.label.as_deref(), Some("first"));

        let intent = svc.get_intent(ticket.intent_id).await.unwrap().unwrap();
        assert_eq!(intent.status, IntentStatus::Finalized);

        let err = svc
            .finish_upload(
                &ctx,
                ticket.intent_id,
                FinishUploadRequest {
                    upload_response: Some(serde_json::json!({"id": "again"})),
                    ..FinishUploadRequest::default()
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn test_inline_finish_requires_handle() {
        let (_store, svc) = service(false, 3600);
        let ctx = RequestContext::system();
        let ticket = svc.start_upload(&ctx, start(false)).await.unwrap();
        let err = svc
            .finish_upload(
                &ctx,
                ticket.intent_id,
                FinishUploadRequest {
                    upload_response: Some(serde_json::json!({"unexpected": true})),
                    ..FinishUploadRequest::default()
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);

        // The intent is still usable after a rejected finish.
        let intent = svc.get_intent(ticket.intent_id).await.unwrap().unwrap();
        assert_eq!(intent.status, IntentStatus::Created);
    }

    #[tokio::test]
    async fn test_inline_finish_rejects_foreign_handles() {
        let (_store, svc) = service(false, 3600);
        let ctx = RequestContext::system();
        let ticket = svc.start_upload(&ctx, start(true)).await.unwrap();
        let other = svc.start_upload(&ctx, start(false)).await.unwrap();
        let foreign = svc
            .accept_inline_blob(other.intent_id, Bytes::from_static(b"other"), None)
            .await
            .unwrap();

        for handle in [
            serde_json::json!({"storage_id": "does-not-exist", "size": 3}),
            serde_json::to_value(&foreign).unwrap(),
        ] {
            let err = svc
                .finish_upload(
                    &ctx,
                    ticket.intent_id,
                    FinishUploadRequest {
                        upload_response: Some(handle),
                        ..FinishUploadRequest::default()
                    },
                )
                .await
                .unwrap_err();
            assert_eq!(err.kind, ErrorKind::Validation);
        }

        let intent = svc.get_intent(ticket.intent_id).await.unwrap().unwrap();
        assert_eq!(intent.status, IntentStatus::Created);
        assert!(svc.assets.get_asset("covers", "hero.png").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_inline_size_comes_from_storage() {
        let (_store, svc) = service(false, 3600);
        let ctx = RequestContext::system();
        let ticket = svc.start_upload(&ctx, start(true)).await.unwrap();
        let blob = svc
            .accept_inline_blob(ticket.intent_id, Bytes::from_static(b"abcd"), None)
            .await
            .unwrap();
        let mut handle = serde_json::to_value(&blob).unwrap();
        handle["size"] = serde_json::json!(50 * 1024 * 1024);

        let done = svc
            .finish_upload(
                &ctx,
                ticket.intent_id,
                FinishUploadRequest {
                    upload_response: Some(handle),
                    size: Some(1),
                    content_type: None,
                },
            )
            .await
            .unwrap();
        let version = svc.assets.get_version(done.version_id).await.unwrap().unwrap();
        assert_eq!(version.size, Some(4));
    }

    #[tokio::test]
    async fn test_inline_size_limit() {
        let (_store, svc) = service(false, 3600);
        let ticket = svc
            .start_upload(&RequestContext::system(), start(false))
            .await
            .unwrap();
        let err = svc
            .accept_inline_blob(ticket.intent_id, Bytes::from(vec![0u8; 17]), None)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_external_upload() {
        let (_store, svc) = service(true, 3600);
        svc.settings
            .set_backend(&RequestContext::system(), UploadBackend::External)
            .await
            .unwrap();
        let ctx = RequestContext::system();
        let ticket = svc.start_upload(&ctx, start(false)).await.unwrap();
        let key = format!("assets/{}.png", ticket.intent_id);
        assert_eq!(ticket.upload_method, "PUT");
        assert_eq!(ticket.backend_key.as_deref(), Some(key.as_str()));
        assert!(ticket.upload_url.starts_with(&format!("https://s3.test/{key}?")));

        let err = svc
            .accept_inline_blob(ticket.intent_id, Bytes::from_static(b"x"), None)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);

        let done = svc
            .finish_upload(
                &ctx,
                ticket.intent_id,
                FinishUploadRequest {
                    upload_response: None,
                    size: Some(30 * 1024 * 1024),
                    content_type: Some("image/png".into()),
                },
            )
            .await
            .unwrap();
        let version = svc.assets.get_version(done.version_id).await.unwrap().unwrap();
        assert_eq!(version.state, VersionState::Draft);
        assert_eq!(version.storage_ref, StorageRef::External { key });
    }

    #[tokio::test]
    async fn test_external_selected_without_provider() {
        let (store, svc) = service(false, 3600);
        let forced = assethub_entity::settings::StorageSettings::new(
            UploadBackend::External,
            None,
            Utc::now(),
        );
        store.save_storage_settings(&forced).await.unwrap();
        let err = svc
            .start_upload(&RequestContext::system(), start(false))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Configuration);
    }

    #[tokio::test]
    async fn test_expired_intent_creates_nothing() {
        let (store, svc) = service(false, 0);
        let ctx = RequestContext::system();
        let ticket = svc.start_upload(&ctx, start(true)).await.unwrap();

        let err = svc
            .finish_upload(
                &RequestContext::system(),
                ticket.intent_id,
                FinishUploadRequest {
                    upload_response: Some(serde_json::json!({"storage_id": "blob"})),
                    ..FinishUploadRequest::default()
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Expired);
        assert!(svc.assets.get_asset("covers", "hero.png").await.unwrap().is_none());

        assert_eq!(svc.sweep_expired().await.unwrap(), 1);
        assert_eq!(svc.sweep_expired().await.unwrap(), 0);
        let intent = store.find_intent(ticket.intent_id).await.unwrap().unwrap();
        assert_eq!(intent.status, IntentStatus::Expired);
    }

    #[tokio::test]
    async fn test_unknown_intent() {
        let (_store, svc) = service(false, 3600);
        let err = svc
            .finish_upload(
                &RequestContext::system(),
                Uuid::new_v4(),
                FinishUploadRequest::default(),
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }
}
