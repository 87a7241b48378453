//! PostgreSQL asset store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use tracing::{debug, info};
use uuid::Uuid;

use assethub_core::{AppError, AppResult};
use assethub_entity::asset::{Asset, AssetAggregate, AssetKey, AssetVersion, PublishedAsset};
use assethub_entity::event::{AssetEvent, AssetEventType};
use assethub_entity::folder::path::{is_within, path_depth, rebase_path};
use assethub_entity::folder::{Folder, FolderUpdate};
use assethub_entity::settings::StorageSettings;
use assethub_entity::upload::UploadIntent;

use crate::repositories::{
    AssetRepository, EventRepository, FolderRepository, IntentRepository, SettingsRepository,
    VersionRepository, db_error,
};
use crate::store::{AssetMutation, AssetStore, AssetTarget, ensure_finalizable};

/// Asset store backed by PostgreSQL.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
    folders: FolderRepository,
    assets: AssetRepository,
    versions: VersionRepository,
    events: EventRepository,
    intents: IntentRepository,
    settings: SettingsRepository,
}

impl PostgresStore {
    /// Build the store and its repositories over a connected pool.
    pub fn new(pool: PgPool) -> Self {
        Self {
            folders: FolderRepository::new(pool.clone()),
            assets: AssetRepository::new(pool.clone()),
            versions: VersionRepository::new(pool.clone()),
            events: EventRepository::new(pool.clone()),
            intents: IntentRepository::new(pool.clone()),
            settings: SettingsRepository::new(pool.clone()),
            pool,
        }
    }

    async fn load_aggregate(
        conn: &mut PgConnection,
        target: &AssetTarget,
    ) -> AppResult<Option<AssetAggregate>> {
        let asset = match target {
            AssetTarget::Key(key) => AssetRepository::lock_by_key(conn, key).await?,
            AssetTarget::Id(id) => AssetRepository::lock_by_id(conn, *id).await?,
        };
        let Some(asset) = asset else {
            return Ok(None);
        };
        let draft = match asset.draft_version_id {
            Some(id) => VersionRepository::find_in(conn, id).await?,
            None => None,
        };
        let published = match asset.published_version_id {
            Some(id) => VersionRepository::find_in(conn, id).await?,
            None => None,
        };
        AssetAggregate::load(asset, draft, published).map(Some)
    }

    async fn persist(
        conn: &mut PgConnection,
        aggregate: &AssetAggregate,
        now: DateTime<Utc>,
    ) -> AppResult<()> {
        if let Some(intent_id) = aggregate.intent_to_finalize() {
            let intent = IntentRepository::lock_status(conn, intent_id).await?;
            ensure_finalizable(intent_id, intent, now)?;
        }

        if aggregate.is_new() {
            AssetRepository::insert(conn, &aggregate.asset).await?;
        } else {
            AssetRepository::update(conn, &aggregate.asset).await?;
        }
        // Archive transitions come before the publish they pair with.
        for version in aggregate.touched_versions() {
            VersionRepository::upsert(conn, version).await?;
        }
        for event in aggregate.events() {
            EventRepository::insert(conn, event).await?;
        }
        if let Some(intent_id) = aggregate.intent_to_finalize() {
            IntentRepository::mark_finalized(conn, intent_id, now).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl AssetStore for PostgresStore {
    fn backend_name(&self) -> &str {
        "postgres"
    }

    async fn health_check(&self) -> AppResult<bool> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|v| v == 1)
            .map_err(db_error("Health check failed"))
    }

    async fn insert_folder(&self, folder: &Folder) -> AppResult<Folder> {
        self.folders.create(folder).await
    }

    async fn find_folder(&self, path: &str) -> AppResult<Option<Folder>> {
        self.folders.find_by_path(path).await
    }

    async fn list_child_folders(&self, parent_path: &str) -> AppResult<Vec<Folder>> {
        self.folders.find_children(parent_path).await
    }

    async fn update_folder(&self, path: &str, update: &FolderUpdate) -> AppResult<Folder> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_error("Failed to begin transaction"))?;

        let subtree = FolderRepository::lock_subtree(&mut tx, path).await?;
        let Some(root) = subtree.iter().find(|f| f.path == path).cloned() else {
            return Err(AppError::not_found(format!("Folder '{path}' not found")));
        };
        let actor = update.actor.as_deref();
        let new_path = update.new_path.as_deref().unwrap_or(path);
        if new_path != path && is_within(new_path, path) {
            return Err(AppError::validation(format!(
                "Cannot move folder '{path}' into its own subtree '{new_path}'"
            )));
        }

        let mut updated_root = root.clone();
        if new_path != path {
            // Deepest first.
            for folder in subtree.iter().rev() {
                let mut moved = folder.clone();
                moved.path = rebase_path(&folder.path, path, new_path);
                moved.depth = path_depth(&moved.path);
                moved.updated_at = update.at;
                moved.updated_by = actor.map(str::to_string);
                if folder.path == path {
                    if let Some(name) = &update.name {
                        moved.name = name.clone();
                    }
                    updated_root = moved.clone();
                }
                FolderRepository::update(&mut tx, &folder.path, &moved).await?;
            }

            for asset in AssetRepository::lock_in_subtree(&mut tx, path).await? {
                let to = rebase_path(&asset.folder_path, path, new_path);
                let moved = Asset {
                    folder_path: to.clone(),
                    updated_at: update.at,
                    updated_by: actor.map(str::to_string),
                    ..asset.clone()
                };
                AssetRepository::update(&mut tx, &moved).await?;
                let event = AssetEvent::new(asset.id, AssetEventType::Move, actor, update.at)
                    .with_folders(Some(&asset.folder_path), Some(&to))
                    .with_basenames(Some(&asset.basename), Some(&asset.basename));
                EventRepository::insert(&mut tx, &event).await?;
            }
        } else {
            if let Some(name) = &update.name {
                updated_root.name = name.clone();
            }
            updated_root.updated_at = update.at;
            updated_root.updated_by = actor.map(str::to_string);
            FolderRepository::update(&mut tx, path, &updated_root).await?;
        }

        tx.commit()
            .await
            .map_err(db_error("Failed to commit folder update"))?;
        info!(from = %path, to = %updated_root.path, "Folder updated");
        Ok(updated_root)
    }

    async fn find_asset(&self, key: &AssetKey) -> AppResult<Option<Asset>> {
        self.assets.find_by_key(key).await
    }

    async fn find_asset_by_id(&self, id: Uuid) -> AppResult<Option<Asset>> {
        self.assets.find_by_id(id).await
    }

    async fn list_assets(&self, folder_path: &str) -> AppResult<Vec<Asset>> {
        self.assets.find_in_folder(folder_path).await
    }

    async fn list_published(&self, folder_path: &str) -> AppResult<Vec<PublishedAsset>> {
        self.assets.find_published_in_folder(folder_path).await
    }

    async fn find_version(&self, id: Uuid) -> AppResult<Option<AssetVersion>> {
        self.versions.find_by_id(id).await
    }

    async fn is_inline_blob_published(&self, blob_id: &str) -> AppResult<bool> {
        self.versions.inline_blob_published(blob_id).await
    }

    async fn list_versions(&self, asset_id: Uuid) -> AppResult<Vec<AssetVersion>> {
        self.versions.find_by_asset(asset_id).await
    }

    async fn list_events(&self, asset_id: Uuid) -> AppResult<Vec<AssetEvent>> {
        self.events.find_by_asset(asset_id).await
    }

    async fn mutate_asset(
        &self,
        target: AssetTarget,
        mutation: AssetMutation,
    ) -> AppResult<AssetAggregate> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_error("Failed to begin transaction"))?;

        let current = Self::load_aggregate(&mut tx, &target).await?;
        let existing_id = current.as_ref().map(|agg| agg.asset.id);
        let aggregate = mutation(current)?;
        if aggregate.is_new() && existing_id.is_some() {
            return Err(AppError::already_exists(format!(
                "Asset '{}' already exists",
                aggregate.original_key()
            )));
        }
        if !aggregate.is_new() && existing_id != Some(aggregate.asset.id) {
            return Err(AppError::internal(
                "Mutation returned an aggregate for a different asset",
            ));
        }

        Self::persist(&mut tx, &aggregate, Utc::now()).await?;
        tx.commit()
            .await
            .map_err(db_error("Failed to commit asset mutation"))?;

        debug!(
            asset_id = %aggregate.asset.id,
            versions = aggregate.touched_versions().len(),
            events = aggregate.events().len(),
            "Applied asset mutation"
        );
        Ok(aggregate)
    }

    async fn insert_intent(&self, intent: &UploadIntent) -> AppResult<()> {
        self.intents.create(intent).await
    }

    async fn find_intent(&self, id: Uuid) -> AppResult<Option<UploadIntent>> {
        self.intents.find_by_id(id).await
    }

    async fn record_intent_blob(&self, id: Uuid, blob_id: &str) -> AppResult<()> {
        if self.intents.record_blob(id, blob_id).await? == 1 {
            return Ok(());
        }
        match self.intents.find_by_id(id).await? {
            None => Err(AppError::not_found(format!("Upload intent {id} not found"))),
            Some(intent) => Err(AppError::conflict(format!(
                "Upload intent {id} is {} and no longer accepts bytes",
                intent.status
            ))),
        }
    }

    async fn expire_intents(&self, now: DateTime<Utc>) -> AppResult<u64> {
        self.intents.expire_due(now).await
    }

    async fn load_storage_settings(&self) -> AppResult<Option<StorageSettings>> {
        self.settings.load().await
    }

    async fn save_storage_settings(&self, settings: &StorageSettings) -> AppResult<()> {
        self.settings.save(settings).await
    }
}
