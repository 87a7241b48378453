//! The transactional backend the asset store is written against.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use assethub_core::AppError;
use assethub_core::result::AppResult;
use assethub_entity::asset::{Asset, AssetAggregate, AssetKey, AssetVersion, PublishedAsset};
use assethub_entity::event::AssetEvent;
use assethub_entity::folder::{Folder, FolderUpdate};
use assethub_entity::settings::StorageSettings;
use assethub_entity::upload::{IntentStatus, UploadIntent};

/// How a mutation addresses its asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetTarget {
    /// By `(folder_path, basename)`; the asset may not exist yet.
    Key(AssetKey),
    /// By identifier; the asset must exist.
    Id(Uuid),
}

/// Pure read-modify-write step applied to an asset inside one transaction.
///
/// Receives the current aggregate (`None` if no asset matches the target)
/// and returns the aggregate to persist.
pub type AssetMutation =
    Box<dyn FnOnce(Option<AssetAggregate>) -> AppResult<AssetAggregate> + Send>;

/// Storage of folders, assets, versions, events, intents and settings.
///
/// Every method is atomic on its own. [`AssetStore::mutate_asset`] is the
/// only way to change assets and versions.
#[async_trait]
pub trait AssetStore: Send + Sync + std::fmt::Debug + 'static {
    /// Return the backend name (e.g., "memory", "postgres").
    fn backend_name(&self) -> &str;

    /// Check whether the backend is reachable.
    async fn health_check(&self) -> AppResult<bool>;

    /// Insert a folder. Fails with `AlreadyExists` if the path is taken.
    async fn insert_folder(&self, folder: &Folder) -> AppResult<Folder>;

    /// Find a folder by normalized path.
    async fn find_folder(&self, path: &str) -> AppResult<Option<Folder>>;

    /// Direct children of `parent_path`, ordered by path.
    async fn list_child_folders(&self, parent_path: &str) -> AppResult<Vec<Folder>>;

    /// Relabel and/or move a folder.
    ///
    /// A move rewrites descendant folder paths and the folder path of every
    /// asset in the subtree, recording a `move` event per asset.
    async fn update_folder(&self, path: &str, update: &FolderUpdate) -> AppResult<Folder>;

    /// Find an asset by key.
    async fn find_asset(&self, key: &AssetKey) -> AppResult<Option<Asset>>;

    /// Find an asset by identifier.
    async fn find_asset_by_id(&self, id: Uuid) -> AppResult<Option<Asset>>;

    /// Assets directly inside a folder, ordered by basename.
    async fn list_assets(&self, folder_path: &str) -> AppResult<Vec<Asset>>;

    /// Assets directly inside a folder that have a published version.
    async fn list_published(&self, folder_path: &str) -> AppResult<Vec<PublishedAsset>>;

    /// Find a version by identifier.
    async fn find_version(&self, id: Uuid) -> AppResult<Option<AssetVersion>>;

    /// Whether some published version is backed by the inline blob `blob_id`.
    async fn is_inline_blob_published(&self, blob_id: &str) -> AppResult<bool>;

    /// Every version of an asset, ordered by version number.
    async fn list_versions(&self, asset_id: Uuid) -> AppResult<Vec<AssetVersion>>;

    /// Every event of an asset, oldest first.
    async fn list_events(&self, asset_id: Uuid) -> AppResult<Vec<AssetEvent>>;

    /// Atomically load, mutate and persist one asset.
    ///
    /// Persists the asset row, every touched version, every recorded event
    /// and the optional intent finalization, or nothing at all.
    async fn mutate_asset(
        &self,
        target: AssetTarget,
        mutation: AssetMutation,
    ) -> AppResult<AssetAggregate>;

    /// Insert a new upload intent.
    async fn insert_intent(&self, intent: &UploadIntent) -> AppResult<()>;

    /// Find an upload intent.
    async fn find_intent(&self, id: Uuid) -> AppResult<Option<UploadIntent>>;

    /// Record the inline blob pushed for an open intent.
    ///
    /// Fails with `NotFound` if the intent is missing and `Conflict` if it is
    /// no longer `created`.
    async fn record_intent_blob(&self, id: Uuid, blob_id: &str) -> AppResult<()>;

    /// Mark every `created` intent whose TTL passed at `now` as `expired`.
    async fn expire_intents(&self, now: DateTime<Utc>) -> AppResult<u64>;

    /// Load the storage settings singleton.
    async fn load_storage_settings(&self) -> AppResult<Option<StorageSettings>>;

    /// Replace the storage settings singleton.
    async fn save_storage_settings(&self, settings: &StorageSettings) -> AppResult<()>;
}

/// Check that an intent in `status`, expiring at `expires_at`, can be
/// finalized at `now`.
pub(crate) fn ensure_finalizable(
    intent_id: Uuid,
    intent: Option<(IntentStatus, DateTime<Utc>)>,
    now: DateTime<Utc>,
) -> AppResult<()> {
    match intent {
        None => Err(AppError::not_found(format!("Upload intent {intent_id} not found"))),
        Some((IntentStatus::Finalized, _)) => Err(AppError::conflict(format!(
            "Upload intent {intent_id} is already finalized"
        ))),
        Some((IntentStatus::Expired, _)) => Err(AppError::expired(format!(
            "Upload intent {intent_id} has expired"
        ))),
        Some((IntentStatus::Created, expires_at)) if expires_at <= now => Err(AppError::expired(
            format!("Upload intent {intent_id} expired at {expires_at}"),
        )),
        Some((IntentStatus::Created, _)) => Ok(()),
    }
}
