//! In-process asset store.
//!
//! All state sits behind one `RwLock`; every mutation holds the write lock
//! for its whole read-validate-apply cycle, which makes each call atomic.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use assethub_core::{AppError, AppResult};
use assethub_entity::asset::{
    Asset, AssetAggregate, AssetKey, AssetVersion, PublishedAsset, StorageRef, VersionState,
};
use assethub_entity::event::{AssetEvent, AssetEventType};
use assethub_entity::folder::path::{descendant_prefix, is_within, path_depth, rebase_path};
use assethub_entity::folder::{Folder, FolderUpdate};
use assethub_entity::settings::StorageSettings;
use assethub_entity::upload::{IntentStatus, UploadIntent};

use crate::store::{AssetMutation, AssetStore, AssetTarget, ensure_finalizable};

#[derive(Debug, Default)]
struct MemoryState {
    folders: BTreeMap<String, Folder>,
    assets: HashMap<Uuid, Asset>,
    asset_keys: BTreeMap<AssetKey, Uuid>,
    versions: HashMap<Uuid, AssetVersion>,
    events: Vec<AssetEvent>,
    intents: HashMap<Uuid, UploadIntent>,
    settings: Option<StorageSettings>,
}

impl MemoryState {
    fn resolve(&self, target: &AssetTarget) -> Option<&Asset> {
        let id = match target {
            AssetTarget::Key(key) => *self.asset_keys.get(key)?,
            AssetTarget::Id(id) => *id,
        };
        self.assets.get(&id)
    }

    fn aggregate(&self, asset: &Asset) -> AppResult<AssetAggregate> {
        let draft = asset
            .draft_version_id
            .and_then(|id| self.versions.get(&id))
            .cloned();
        let published = asset
            .published_version_id
            .and_then(|id| self.versions.get(&id))
            .cloned();
        AssetAggregate::load(asset.clone(), draft, published)
    }
}

/// Asset store kept entirely in process memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AssetStore for MemoryStore {
    fn backend_name(&self) -> &str {
        "memory"
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }

    async fn insert_folder(&self, folder: &Folder) -> AppResult<Folder> {
        let mut state = self.state.write().await;
        if state.folders.contains_key(&folder.path) {
            return Err(AppError::already_exists(format!(
                "Folder '{}' already exists",
                folder.path
            )));
        }
        state.folders.insert(folder.path.clone(), folder.clone());
        Ok(folder.clone())
    }

    async fn find_folder(&self, path: &str) -> AppResult<Option<Folder>> {
        Ok(self.state.read().await.folders.get(path).cloned())
    }

    async fn list_child_folders(&self, parent_path: &str) -> AppResult<Vec<Folder>> {
        let state = self.state.read().await;
        let prefix = descendant_prefix(parent_path);
        let depth = path_depth(parent_path) + 1;
        Ok(state
            .folders
            .range(prefix.clone()..)
            .take_while(|(path, _)| path.starts_with(&prefix))
            .filter(|(_, folder)| folder.depth == depth)
            .map(|(_, folder)| folder.clone())
            .collect())
    }

    async fn update_folder(&self, path: &str, update: &FolderUpdate) -> AppResult<Folder> {
        let mut state = self.state.write().await;
        if !state.folders.contains_key(path) {
            return Err(AppError::not_found(format!("Folder '{path}' not found")));
        }

        let actor = update.actor.as_deref();
        if let Some(new_path) = update.new_path.as_deref().filter(|p| *p != path) {
            if is_within(new_path, path) {
                return Err(AppError::validation(format!(
                    "Cannot move folder '{path}' into its own subtree '{new_path}'"
                )));
            }
            let moving: Vec<String> = state
                .folders
                .keys()
                .filter(|p| is_within(p, path))
                .cloned()
                .collect();
            for old in &moving {
                let target = rebase_path(old, path, new_path);
                if state.folders.contains_key(&target) {
                    return Err(AppError::already_exists(format!(
                        "Folder '{target}' already exists"
                    )));
                }
            }
            let moving_assets: Vec<(AssetKey, Uuid)> = state
                .asset_keys
                .iter()
                .filter(|(key, _)| is_within(&key.folder_path, path))
                .map(|(key, id)| (key.clone(), *id))
                .collect();
            for (key, _) in &moving_assets {
                let target = AssetKey::new(
                    rebase_path(&key.folder_path, path, new_path),
                    key.basename.clone(),
                );
                if state.asset_keys.contains_key(&target) {
                    return Err(AppError::already_exists(format!(
                        "Asset '{target}' already exists"
                    )));
                }
            }

            for old in moving {
                if let Some(mut folder) = state.folders.remove(&old) {
                    folder.path = rebase_path(&old, path, new_path);
                    folder.depth = path_depth(&folder.path);
                    folder.updated_at = update.at;
                    folder.updated_by = actor.map(str::to_string);
                    state.folders.insert(folder.path.clone(), folder);
                }
            }
            for (key, id) in moving_assets {
                state.asset_keys.remove(&key);
                let to = rebase_path(&key.folder_path, path, new_path);
                if let Some(asset) = state.assets.get_mut(&id) {
                    asset.folder_path = to.clone();
                    asset.updated_at = update.at;
                    asset.updated_by = actor.map(str::to_string);
                }
                state
                    .asset_keys
                    .insert(AssetKey::new(to.clone(), key.basename.clone()), id);
                let event = AssetEvent::new(id, AssetEventType::Move, actor, update.at)
                    .with_folders(Some(&key.folder_path), Some(&to))
                    .with_basenames(Some(&key.basename), Some(&key.basename));
                state.events.push(event);
            }
        }

        let current = update.new_path.as_deref().unwrap_or(path);
        let folder = state
            .folders
            .get_mut(current)
            .ok_or_else(|| AppError::internal(format!("Folder '{current}' vanished during update")))?;
        if let Some(name) = &update.name {
            folder.name = name.clone();
        }
        folder.updated_at = update.at;
        folder.updated_by = actor.map(str::to_string);
        Ok(folder.clone())
    }

    async fn find_asset(&self, key: &AssetKey) -> AppResult<Option<Asset>> {
        let state = self.state.read().await;
        Ok(state.resolve(&AssetTarget::Key(key.clone())).cloned())
    }

    async fn find_asset_by_id(&self, id: Uuid) -> AppResult<Option<Asset>> {
        Ok(self.state.read().await.assets.get(&id).cloned())
    }

    async fn list_assets(&self, folder_path: &str) -> AppResult<Vec<Asset>> {
        let state = self.state.read().await;
        let start = AssetKey::new(folder_path, "");
        Ok(state
            .asset_keys
            .range(start..)
            .take_while(|(key, _)| key.folder_path == folder_path)
            .filter_map(|(_, id)| state.assets.get(id).cloned())
            .collect())
    }

    async fn list_published(&self, folder_path: &str) -> AppResult<Vec<PublishedAsset>> {
        let state = self.state.read().await;
        let start = AssetKey::new(folder_path, "");
        Ok(state
            .asset_keys
            .range(start..)
            .take_while(|(key, _)| key.folder_path == folder_path)
            .filter_map(|(_, id)| {
                let asset = state.assets.get(id)?;
                let version = state.versions.get(&asset.published_version_id?)?;
                PublishedAsset::from_parts(asset, version)
            })
            .collect())
    }

    async fn find_version(&self, id: Uuid) -> AppResult<Option<AssetVersion>> {
        Ok(self.state.read().await.versions.get(&id).cloned())
    }

    async fn is_inline_blob_published(&self, blob_id: &str) -> AppResult<bool> {
        let state = self.state.read().await;
        Ok(state.versions.values().any(|v| {
            v.state == VersionState::Published
                && matches!(&v.storage_ref, StorageRef::Inline { id } if id == blob_id)
        }))
    }

    async fn list_versions(&self, asset_id: Uuid) -> AppResult<Vec<AssetVersion>> {
        let state = self.state.read().await;
        let mut versions: Vec<AssetVersion> = state
            .versions
            .values()
            .filter(|v| v.asset_id == asset_id)
            .cloned()
            .collect();
        versions.sort_by_key(|v| v.version);
        Ok(versions)
    }

    async fn list_events(&self, asset_id: Uuid) -> AppResult<Vec<AssetEvent>> {
        let state = self.state.read().await;
        let mut events: Vec<AssetEvent> = state
            .events
            .iter()
            .filter(|e| e.asset_id == asset_id)
            .cloned()
            .collect();
        events.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(events)
    }

    async fn mutate_asset(
        &self,
        target: AssetTarget,
        mutation: AssetMutation,
    ) -> AppResult<AssetAggregate> {
        let mut state = self.state.write().await;
        let current = match state.resolve(&target) {
            Some(asset) => Some(state.aggregate(asset)?),
            None => None,
        };
        let existing_id = current.as_ref().map(|agg| agg.asset.id);
        let aggregate = mutation(current)?;
        let now = Utc::now();

        // Validate everything before touching state.
        if aggregate.is_new() {
            if existing_id.is_some() || state.asset_keys.contains_key(aggregate.original_key()) {
                return Err(AppError::already_exists(format!(
                    "Asset '{}' already exists",
                    aggregate.original_key()
                )));
            }
        } else if existing_id != Some(aggregate.asset.id) {
            return Err(AppError::internal(
                "Mutation returned an aggregate for a different asset",
            ));
        }
        let new_key = aggregate.asset.key();
        if aggregate.key_changed() && state.asset_keys.contains_key(&new_key) {
            return Err(AppError::already_exists(format!(
                "Asset '{new_key}' already exists"
            )));
        }
        if let Some(intent_id) = aggregate.intent_to_finalize() {
            let intent = state.intents.get(&intent_id).map(|i| (i.status, i.expires_at));
            ensure_finalizable(intent_id, intent, now)?;
        }

        // Apply.
        if !aggregate.is_new() {
            state.asset_keys.remove(aggregate.original_key());
        }
        state.asset_keys.insert(new_key, aggregate.asset.id);
        state.assets.insert(aggregate.asset.id, aggregate.asset.clone());
        for version in aggregate.touched_versions() {
            state.versions.insert(version.id, version.clone());
        }
        state.events.extend(aggregate.events().iter().cloned());
        if let Some(intent_id) = aggregate.intent_to_finalize() {
            if let Some(intent) = state.intents.get_mut(&intent_id) {
                intent.status = IntentStatus::Finalized;
                intent.finalized_at = Some(now);
            }
        }

        debug!(
            asset_id = %aggregate.asset.id,
            versions = aggregate.touched_versions().len(),
            events = aggregate.events().len(),
            "Applied asset mutation"
        );
        Ok(aggregate)
    }

    async fn insert_intent(&self, intent: &UploadIntent) -> AppResult<()> {
        let mut state = self.state.write().await;
        if state.intents.contains_key(&intent.id) {
            return Err(AppError::already_exists(format!(
                "Upload intent {} already exists",
                intent.id
            )));
        }
        state.intents.insert(intent.id, intent.clone());
        Ok(())
    }

    async fn find_intent(&self, id: Uuid) -> AppResult<Option<UploadIntent>> {
        Ok(self.state.read().await.intents.get(&id).cloned())
    }

    async fn record_intent_blob(&self, id: Uuid, blob_id: &str) -> AppResult<()> {
        let mut state = self.state.write().await;
        let intent = state
            .intents
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found(format!("Upload intent {id} not found")))?;
        if intent.status != IntentStatus::Created {
            return Err(AppError::conflict(format!(
                "Upload intent {id} is {} and no longer accepts bytes",
                intent.status
            )));
        }
        intent.backend_key = Some(blob_id.to_string());
        Ok(())
    }

    async fn expire_intents(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let mut state = self.state.write().await;
        let mut count = 0;
        for intent in state.intents.values_mut() {
            if intent.status == IntentStatus::Created && intent.is_past_due(now) {
                intent.status = IntentStatus::Expired;
                count += 1;
            }
        }
        Ok(count)
    }

    async fn load_storage_settings(&self) -> AppResult<Option<StorageSettings>> {
        Ok(self.state.read().await.settings.clone())
    }

    async fn save_storage_settings(&self, settings: &StorageSettings) -> AppResult<()> {
        self.state.write().await.settings = Some(settings.clone());
        Ok(())
    }
}
