//! Asset version state machine.
//!
//! An [`AssetAggregate`] is the unit a store backend loads, mutates and
//! persists atomically: the asset row, its live draft and published
//! versions, plus every version and event touched by the mutation. All
//! methods are pure; nothing here performs I/O.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use assethub_core::{AppError, AppResult};

use super::model::{Asset, AssetKey};
use super::version::{AssetVersion, PayloadMeta, StorageRef, VersionState};
use crate::event::{AssetEvent, AssetEventType};

/// Content and metadata of a version about to be committed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewVersion {
    /// Where the bytes live.
    pub storage_ref: StorageRef,
    /// Optional human label.
    pub label: Option<String>,
    /// Opaque caller metadata.
    pub extra: Option<serde_json::Value>,
    /// Descriptive metadata of the bytes.
    #[serde(default)]
    pub payload: PayloadMeta,
}

/// An asset together with its live versions and pending changes.
#[derive(Debug, Clone)]
pub struct AssetAggregate {
    /// The asset row.
    pub asset: Asset,
    /// The live draft version, if any.
    pub draft: Option<AssetVersion>,
    /// The live published version, if any.
    pub published: Option<AssetVersion>,
    is_new: bool,
    original_key: AssetKey,
    touched: Vec<AssetVersion>,
    events: Vec<AssetEvent>,
    finalize_intent: Option<Uuid>,
}

impl AssetAggregate {
    /// Start a brand-new, empty asset and record its `create` event.
    pub fn create(
        key: AssetKey,
        extra: Option<serde_json::Value>,
        actor: Option<&str>,
        now: DateTime<Utc>,
    ) -> Self {
        let asset = Asset {
            id: Uuid::new_v4(),
            folder_path: key.folder_path.clone(),
            basename: key.basename.clone(),
            extra: extra.unwrap_or(serde_json::Value::Null),
            version_counter: 0,
            published_version_id: None,
            draft_version_id: None,
            created_at: now,
            updated_at: now,
            created_by: actor.map(str::to_string),
            updated_by: actor.map(str::to_string),
        };
        let event = AssetEvent::new(asset.id, AssetEventType::Create, actor, now)
            .with_folders(None, Some(&key.folder_path))
            .with_basenames(None, Some(&key.basename));
        Self {
            asset,
            draft: None,
            published: None,
            is_new: true,
            original_key: key,
            touched: Vec::new(),
            events: vec![event],
            finalize_intent: None,
        }
    }

    /// Wrap a persisted asset and its live versions.
    pub fn load(
        asset: Asset,
        draft: Option<AssetVersion>,
        published: Option<AssetVersion>,
    ) -> AppResult<Self> {
        if draft.as_ref().map(|v| v.id) != asset.draft_version_id {
            return Err(AppError::internal(format!(
                "Draft pointer of asset {} does not match the loaded version",
                asset.id
            )));
        }
        if published.as_ref().map(|v| v.id) != asset.published_version_id {
            return Err(AppError::internal(format!(
                "Published pointer of asset {} does not match the loaded version",
                asset.id
            )));
        }
        let original_key = asset.key();
        Ok(Self {
            asset,
            draft,
            published,
            is_new: false,
            original_key,
            touched: Vec::new(),
            events: Vec::new(),
            finalize_intent: None,
        })
    }

    /// Whether the asset row does not exist in the store yet.
    pub fn is_new(&self) -> bool {
        self.is_new
    }

    /// Key the asset had when it was loaded.
    pub fn original_key(&self) -> &AssetKey {
        &self.original_key
    }

    /// Whether a move or rename changed the asset's key.
    pub fn key_changed(&self) -> bool {
        self.asset.folder_path != self.original_key.folder_path
            || self.asset.basename != self.original_key.basename
    }

    /// Versions created or transitioned by this mutation.
    pub fn touched_versions(&self) -> &[AssetVersion] {
        &self.touched
    }

    /// Events recorded by this mutation, in order.
    pub fn events(&self) -> &[AssetEvent] {
        &self.events
    }

    /// Upload intent to finalize in the same transaction.
    pub fn intent_to_finalize(&self) -> Option<Uuid> {
        self.finalize_intent
    }

    /// The most recently created version touched by this mutation.
    pub fn latest_touched(&self) -> Option<&AssetVersion> {
        self.touched.iter().max_by_key(|v| v.version)
    }

    /// Mark an upload intent to be finalized together with this mutation.
    pub fn finalize_intent(&mut self, intent_id: Uuid) {
        self.finalize_intent = Some(intent_id);
    }

    /// Allocate the next version number and commit `new` as a draft or as
    /// the published version.
    ///
    /// A replaced draft is archived; a replaced published version is
    /// archived with the same actor and timestamp.
    pub fn commit(
        &mut self,
        new: NewVersion,
        publish: bool,
        actor: Option<&str>,
        now: DateTime<Utc>,
    ) -> AppResult<AssetVersion> {
        if new.storage_ref.is_empty() {
            return Err(AppError::validation("Storage reference cannot be empty"));
        }
        let version = self.allocate(new, actor, now)?;

        if publish {
            let published = self.install_published(version, actor, now);
            self.events.push(
                AssetEvent::new(self.asset.id, AssetEventType::Publish, actor, now)
                    .with_version(published.id),
            );
            return Ok(published);
        }

        if let Some(mut previous) = self.draft.take() {
            previous.mark_archived(actor, now);
            self.touch(previous);
        }
        self.asset.draft_version_id = Some(version.id);
        self.draft = Some(version.clone());
        self.touch(version.clone());
        self.stamp(actor, now);
        Ok(version)
    }

    /// Promote the live draft to published.
    pub fn publish_draft(
        &mut self,
        actor: Option<&str>,
        now: DateTime<Utc>,
    ) -> AppResult<AssetVersion> {
        let draft = self.draft.take().ok_or_else(|| {
            AppError::not_found(format!("Asset '{}' has no draft to publish", self.asset.key()))
        })?;
        let published = self.install_published(draft, actor, now);
        self.events.push(
            AssetEvent::new(self.asset.id, AssetEventType::Publish, actor, now)
                .with_version(published.id),
        );
        Ok(published)
    }

    /// Re-publish the content of `source` as a brand-new version.
    ///
    /// `source` itself is left untouched whatever its state.
    pub fn restore(
        &mut self,
        source: &AssetVersion,
        label: Option<String>,
        actor: Option<&str>,
        now: DateTime<Utc>,
    ) -> AppResult<AssetVersion> {
        if source.asset_id != self.asset.id {
            return Err(AppError::conflict(format!(
                "Version {} does not belong to asset {}",
                source.id, self.asset.id
            )));
        }
        if source.storage_ref.is_empty() {
            return Err(AppError::validation(format!(
                "Version {} has no storage reference to restore",
                source.id
            )));
        }
        let new = NewVersion {
            storage_ref: source.storage_ref.clone(),
            label: Some(label.unwrap_or_else(|| format!("Restored from v{}", source.version))),
            extra: Some(source.extra.clone()),
            payload: source.payload(),
        };
        let version = self.allocate(new, actor, now)?;
        let published = self.install_published(version, actor, now);
        self.events.push(
            AssetEvent::new(self.asset.id, AssetEventType::Restore, actor, now)
                .with_version(published.id),
        );
        Ok(published)
    }

    /// Move the asset to another folder.
    pub fn relocate(&mut self, to_folder_path: &str, actor: Option<&str>, now: DateTime<Utc>) {
        if self.asset.folder_path == to_folder_path {
            return;
        }
        let event = AssetEvent::new(self.asset.id, AssetEventType::Move, actor, now)
            .with_folders(Some(&self.asset.folder_path), Some(to_folder_path))
            .with_basenames(Some(&self.asset.basename), Some(&self.asset.basename));
        self.events.push(event);
        self.asset.folder_path = to_folder_path.to_string();
        self.stamp(actor, now);
    }

    /// Change the asset's basename.
    pub fn rename(&mut self, new_basename: &str, actor: Option<&str>, now: DateTime<Utc>) {
        if self.asset.basename == new_basename {
            return;
        }
        let event = AssetEvent::new(self.asset.id, AssetEventType::Rename, actor, now)
            .with_folders(Some(&self.asset.folder_path), Some(&self.asset.folder_path))
            .with_basenames(Some(&self.asset.basename), Some(new_basename));
        self.events.push(event);
        self.asset.basename = new_basename.to_string();
        self.stamp(actor, now);
    }

    fn allocate(
        &mut self,
        new: NewVersion,
        actor: Option<&str>,
        now: DateTime<Utc>,
    ) -> AppResult<AssetVersion> {
        let number = self
            .asset
            .version_counter
            .checked_add(1)
            .ok_or_else(|| AppError::internal("Version counter overflow"))?;
        self.asset.version_counter = number;
        Ok(AssetVersion {
            id: Uuid::new_v4(),
            asset_id: self.asset.id,
            version: number,
            state: VersionState::Draft,
            label: new.label,
            extra: new.extra.unwrap_or(serde_json::Value::Null),
            storage_ref: new.storage_ref,
            original_filename: new.payload.original_filename,
            size: new.payload.size,
            content_type: new.payload.content_type,
            sha256: new.payload.sha256,
            created_at: now,
            created_by: actor.map(str::to_string),
            published_at: None,
            published_by: None,
            archived_at: None,
            archived_by: None,
        })
    }

    /// Publish `version`, archiving the previously published one in the
    /// same step.
    fn install_published(
        &mut self,
        mut version: AssetVersion,
        actor: Option<&str>,
        now: DateTime<Utc>,
    ) -> AssetVersion {
        if let Some(mut previous) = self.published.take() {
            previous.mark_archived(actor, now);
            self.touch(previous);
        }
        version.mark_published(actor, now);
        if self.asset.draft_version_id == Some(version.id) {
            self.asset.draft_version_id = None;
            self.draft = None;
        }
        self.asset.published_version_id = Some(version.id);
        self.published = Some(version.clone());
        self.touch(version.clone());
        self.stamp(actor, now);
        version
    }

    fn touch(&mut self, version: AssetVersion) {
        match self.touched.iter_mut().find(|v| v.id == version.id) {
            Some(existing) => *existing = version,
            None => self.touched.push(version),
        }
    }

    fn stamp(&mut self, actor: Option<&str>, now: DateTime<Utc>) {
        self.asset.updated_at = now;
        self.asset.updated_by = actor.map(str::to_string);
    }
}
