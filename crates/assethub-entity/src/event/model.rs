//! Append-only structural event recorded per asset.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use uuid::Uuid;

/// Kind of structural operation an event documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "asset_event_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AssetEventType {
    /// Asset record created.
    Create,
    /// Asset moved to another folder.
    Move,
    /// Asset basename changed.
    Rename,
    /// A version became the published version.
    Publish,
    /// A historical version was re-published as a new version.
    Restore,
}

impl AssetEventType {
    /// Return the event type as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Move => "move",
            Self::Rename => "rename",
            Self::Publish => "publish",
            Self::Restore => "restore",
        }
    }
}

impl fmt::Display for AssetEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One entry in an asset's history.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AssetEvent {
    /// Time-ordered event identifier.
    pub id: Uuid,
    /// Asset the event belongs to.
    pub asset_id: Uuid,
    /// What happened.
    pub event_type: AssetEventType,
    /// Folder before a move.
    pub from_folder_path: Option<String>,
    /// Folder after a move or create.
    pub to_folder_path: Option<String>,
    /// Basename before a rename.
    pub from_basename: Option<String>,
    /// Basename after a rename or create.
    pub to_basename: Option<String>,
    /// Version the event refers to (publish and restore).
    pub version_id: Option<Uuid>,
    /// When the event was recorded.
    pub created_at: DateTime<Utc>,
    /// Actor that caused the event.
    pub created_by: Option<String>,
}

impl AssetEvent {
    /// Build an event with no path or version details.
    pub fn new(
        asset_id: Uuid,
        event_type: AssetEventType,
        actor: Option<&str>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            asset_id,
            event_type,
            from_folder_path: None,
            to_folder_path: None,
            from_basename: None,
            to_basename: None,
            version_id: None,
            created_at: now,
            created_by: actor.map(str::to_string),
        }
    }

    /// Attach folder transition details.
    pub fn with_folders(mut self, from: Option<&str>, to: Option<&str>) -> Self {
        self.from_folder_path = from.map(str::to_string);
        self.to_folder_path = to.map(str::to_string);
        self
    }

    /// Attach basename transition details.
    pub fn with_basenames(mut self, from: Option<&str>, to: Option<&str>) -> Self {
        self.from_basename = from.map(str::to_string);
        self.to_basename = to.map(str::to_string);
        self
    }

    /// Attach the version the event refers to.
    pub fn with_version(mut self, version_id: Uuid) -> Self {
        self.version_id = Some(version_id);
        self
    }
}
