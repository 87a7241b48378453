//! Asset and version operations.
//!
//! Every change goes through [`AssetStore::mutate_asset`] with a pure
//! closure over [`AssetAggregate`], so the version state machine, the event
//! log and any upload intent finalization commit together.

use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use assethub_core::error::{AppError, ErrorKind};
use assethub_core::result::AppResult;
use assethub_database::{AssetMutation, AssetStore, AssetTarget};
use assethub_entity::asset::{
    Asset, AssetAggregate, AssetKey, AssetVersion, NewVersion, PayloadMeta, PublishedAsset,
    StorageRef,
};
use assethub_entity::folder::path::{normalize_path, validate_basename};
use assethub_entity::upload::UploadBackend;

use crate::context::RequestContext;

/// Manages assets and their versions.
#[derive(Debug, Clone)]
pub struct AssetService {
    store: Arc<dyn AssetStore>,
}

/// Request to create an empty asset.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CreateAssetRequest {
    /// Folder path.
    #[serde(default)]
    pub folder_path: String,
    /// Basename within the folder.
    pub basename: String,
    /// Opaque caller metadata.
    #[serde(default)]
    pub extra: Option<serde_json::Value>,
}

/// A version to commit under `(folder_path, basename)`.
#[derive(Debug, Clone)]
pub struct CommitVersionRequest {
    /// Folder path.
    pub folder_path: String,
    /// Basename within the folder.
    pub basename: String,
    /// Whether to publish immediately instead of installing a draft.
    pub publish: bool,
    /// Content and metadata of the version.
    pub version: NewVersion,
}

/// Server-side version creation from an already stored blob or object.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct StorageVersionRequest {
    /// Folder path.
    #[serde(default)]
    pub folder_path: String,
    /// Basename within the folder.
    pub basename: String,
    /// Backend that holds the bytes.
    #[serde(default = "default_backend")]
    pub backend: UploadBackend,
    /// Inline blob id or external object key.
    pub storage_id: String,
    /// Whether to publish immediately.
    #[serde(default)]
    pub publish: bool,
    /// Optional label.
    #[serde(default)]
    pub label: Option<String>,
    /// Opaque caller metadata.
    #[serde(default)]
    pub extra: Option<serde_json::Value>,
    /// Descriptive metadata of the bytes.
    #[serde(default)]
    pub payload: PayloadMeta,
}

fn default_backend() -> UploadBackend {
    UploadBackend::Inline
}

/// Source and destination of an asset move.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct MoveAssetRequest {
    /// Current folder path.
    #[serde(default)]
    pub from_folder_path: String,
    /// Basename of the asset.
    pub basename: String,
    /// Destination folder path.
    #[serde(default)]
    pub to_folder_path: String,
}

/// Asset rename.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RenameAssetRequest {
    /// Folder path.
    #[serde(default)]
    pub folder_path: String,
    /// Current basename.
    pub basename: String,
    /// New basename.
    pub new_basename: String,
}

/// Normalize and validate an asset key.
pub(crate) fn asset_key(folder_path: &str, basename: &str) -> AppResult<AssetKey> {
    Ok(AssetKey::new(
        normalize_path(folder_path)?,
        validate_basename(basename)?,
    ))
}

impl AssetService {
    /// Creates a new asset service.
    pub fn new(store: Arc<dyn AssetStore>) -> Self {
        Self { store }
    }

    /// Create an empty asset.
    pub async fn create_asset(
        &self,
        ctx: &RequestContext,
        req: CreateAssetRequest,
    ) -> AppResult<Asset> {
        let key = asset_key(&req.folder_path, &req.basename)?;
        let actor = ctx.actor.clone();
        let now = ctx.request_time;
        let create_key = key.clone();
        let mutation: AssetMutation = Box::new(move |current| {
            if current.is_some() {
                return Err(AppError::already_exists(format!(
                    "Asset '{create_key}' already exists"
                )));
            }
            Ok(AssetAggregate::create(create_key, req.extra, actor.as_deref(), now))
        });
        let aggregate = self.store.mutate_asset(AssetTarget::Key(key), mutation).await?;
        info!(asset_id = %aggregate.asset.id, key = %aggregate.asset.key(), "Asset created");
        Ok(aggregate.asset)
    }

    /// Commit a version, creating the asset on first commit.
    pub async fn commit_version(
        &self,
        ctx: &RequestContext,
        req: CommitVersionRequest,
    ) -> AppResult<AssetVersion> {
        self.commit(ctx, req, None).await
    }

    /// Commit a version and finalize `intent_id` in the same transaction.
    pub(crate) async fn commit(
        &self,
        ctx: &RequestContext,
        req: CommitVersionRequest,
        intent_id: Option<Uuid>,
    ) -> AppResult<AssetVersion> {
        let key = asset_key(&req.folder_path, &req.basename)?;
        let mut retried = false;
        loop {
            let mutation = commit_mutation(key.clone(), &req, intent_id, ctx);
            match self
                .store
                .mutate_asset(AssetTarget::Key(key.clone()), mutation)
                .await
            {
                Ok(aggregate) => {
                    let version = if req.publish {
                        aggregate.published
                    } else {
                        aggregate.draft
                    }
                    .ok_or_else(|| AppError::internal("Commit produced no live version"))?;
                    info!(
                        asset_id = %version.asset_id,
                        version_id = %version.id,
                        version = version.version,
                        state = %version.state,
                        "Version committed"
                    );
                    return Ok(version);
                }
                // Another writer created the asset between our read and insert.
                Err(e) if e.kind == ErrorKind::AlreadyExists && !retried => {
                    warn!(key = %key, "Concurrent asset creation, retrying commit");
                    retried = true;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Publish the live draft.
    pub async fn publish_draft(
        &self,
        ctx: &RequestContext,
        folder_path: &str,
        basename: &str,
    ) -> AppResult<AssetVersion> {
        let key = asset_key(folder_path, basename)?;
        let actor = ctx.actor.clone();
        let now = ctx.request_time;
        let missing = key.clone();
        let mutation: AssetMutation = Box::new(move |current| {
            let mut aggregate =
                current.ok_or_else(|| AppError::not_found(format!("Asset '{missing}' not found")))?;
            aggregate.publish_draft(actor.as_deref(), now)?;
            Ok(aggregate)
        });
        let aggregate = self.store.mutate_asset(AssetTarget::Key(key), mutation).await?;
        let published = aggregate
            .published
            .ok_or_else(|| AppError::internal("Publish produced no published version"))?;
        info!(asset_id = %published.asset_id, version = published.version, "Draft published");
        Ok(published)
    }

    /// Re-publish the content of an earlier version as a new version.
    pub async fn restore_version(
        &self,
        ctx: &RequestContext,
        version_id: Uuid,
        label: Option<String>,
    ) -> AppResult<AssetVersion> {
        let source = self
            .store
            .find_version(version_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Version {version_id} not found")))?;
        let asset_id = source.asset_id;
        let actor = ctx.actor.clone();
        let now = ctx.request_time;
        let mutation: AssetMutation = Box::new(move |current| {
            let mut aggregate = current
                .ok_or_else(|| AppError::not_found(format!("Asset {asset_id} not found")))?;
            aggregate.restore(&source, label, actor.as_deref(), now)?;
            Ok(aggregate)
        });
        let aggregate = self
            .store
            .mutate_asset(AssetTarget::Id(asset_id), mutation)
            .await?;
        let restored = aggregate
            .published
            .ok_or_else(|| AppError::internal("Restore produced no published version"))?;
        info!(
            asset_id = %asset_id,
            from = %version_id,
            version = restored.version,
            "Version restored"
        );
        Ok(restored)
    }

    /// Move an asset to another folder.
    pub async fn move_asset(&self, ctx: &RequestContext, req: MoveAssetRequest) -> AppResult<Asset> {
        let key = asset_key(&req.from_folder_path, &req.basename)?;
        let to = normalize_path(&req.to_folder_path)?;
        let actor = ctx.actor.clone();
        let now = ctx.request_time;
        let missing = key.clone();
        let mutation: AssetMutation = Box::new(move |current| {
            let mut aggregate =
                current.ok_or_else(|| AppError::not_found(format!("Asset '{missing}' not found")))?;
            aggregate.relocate(&to, actor.as_deref(), now);
            Ok(aggregate)
        });
        let aggregate = self.store.mutate_asset(AssetTarget::Key(key), mutation).await?;
        info!(asset_id = %aggregate.asset.id, to = %aggregate.asset.folder_path, "Asset moved");
        Ok(aggregate.asset)
    }

    /// Rename an asset within its folder.
    pub async fn rename_asset(
        &self,
        ctx: &RequestContext,
        req: RenameAssetRequest,
    ) -> AppResult<Asset> {
        let key = asset_key(&req.folder_path, &req.basename)?;
        let new_basename = validate_basename(&req.new_basename)?;
        let actor = ctx.actor.clone();
        let now = ctx.request_time;
        let missing = key.clone();
        let mutation: AssetMutation = Box::new(move |current| {
            let mut aggregate =
                current.ok_or_else(|| AppError::not_found(format!("Asset '{missing}' not found")))?;
            aggregate.rename(&new_basename, actor.as_deref(), now);
            Ok(aggregate)
        });
        let aggregate = self.store.mutate_asset(AssetTarget::Key(key), mutation).await?;
        info!(asset_id = %aggregate.asset.id, basename = %aggregate.asset.basename, "Asset renamed");
        Ok(aggregate.asset)
    }

    /// Create a version from bytes already sitting in a backend.
    pub async fn create_version_from_storage_id(
        &self,
        ctx: &RequestContext,
        req: StorageVersionRequest,
    ) -> AppResult<AssetVersion> {
        let storage_ref = match req.backend {
            UploadBackend::Inline => StorageRef::Inline { id: req.storage_id },
            UploadBackend::External => StorageRef::External { key: req.storage_id },
        };
        self.commit_version(
            ctx,
            CommitVersionRequest {
                folder_path: req.folder_path,
                basename: req.basename,
                publish: req.publish,
                version: NewVersion {
                    storage_ref,
                    label: req.label,
                    extra: req.extra,
                    payload: req.payload,
                },
            },
        )
        .await
    }

    /// Get an asset by key.
    pub async fn get_asset(&self, folder_path: &str, basename: &str) -> AppResult<Option<Asset>> {
        let key = asset_key(folder_path, basename)?;
        self.store.find_asset(&key).await
    }

    /// Get an asset by identifier.
    pub async fn get_asset_by_id(&self, id: Uuid) -> AppResult<Option<Asset>> {
        self.store.find_asset_by_id(id).await
    }

    /// Every version of an asset, by version number ascending.
    pub async fn get_versions(&self, asset_id: Uuid) -> AppResult<Vec<AssetVersion>> {
        self.store.list_versions(asset_id).await
    }

    /// Get a version by identifier.
    pub async fn get_version(&self, version_id: Uuid) -> AppResult<Option<AssetVersion>> {
        self.store.find_version(version_id).await
    }

    /// The published version of an asset, if any.
    pub async fn get_published_version(&self, asset_id: Uuid) -> AppResult<Option<AssetVersion>> {
        let Some(asset) = self.store.find_asset_by_id(asset_id).await? else {
            return Ok(None);
        };
        match asset.published_version_id {
            Some(id) => self.store.find_version(id).await,
            None => Ok(None),
        }
    }

    /// Assets directly inside a folder, sorted by basename.
    pub async fn list_assets_in_folder(&self, folder_path: &str) -> AppResult<Vec<Asset>> {
        let folder_path = normalize_path(folder_path)?;
        self.store.list_assets(&folder_path).await
    }

    /// Published assets directly inside a folder.
    pub async fn list_published_assets_in_folder(
        &self,
        folder_path: &str,
    ) -> AppResult<Vec<PublishedAsset>> {
        let folder_path = normalize_path(folder_path)?;
        self.store.list_published(&folder_path).await
    }
}

fn commit_mutation(
    key: AssetKey,
    req: &CommitVersionRequest,
    intent_id: Option<Uuid>,
    ctx: &RequestContext,
) -> AssetMutation {
    let version = req.version.clone();
    let publish = req.publish;
    let actor = ctx.actor.clone();
    let now = ctx.request_time;
    Box::new(move |current| {
        let mut aggregate = current
            .unwrap_or_else(|| AssetAggregate::create(key, None, actor.as_deref(), now));
        aggregate.commit(version, publish, actor.as_deref(), now)?;
        if let Some(intent_id) = intent_id {
            aggregate.finalize_intent(intent_id);
        }
        Ok(aggregate)
    })
}
