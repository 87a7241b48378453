//! Folder entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::path::{last_segment, path_depth};

/// A folder in the asset namespace.
///
/// `path` is the structural identifier; `name` is a free-form label that
/// need not match the last path segment.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Folder {
    /// Unique folder identifier.
    pub id: Uuid,
    /// Normalized slash-separated path (empty for root).
    pub path: String,
    /// Human-facing label.
    pub name: String,
    /// Number of segments in `path` (0 for root).
    pub depth: i32,
    /// Opaque caller metadata.
    pub extra: serde_json::Value,
    /// When the folder was created.
    pub created_at: DateTime<Utc>,
    /// When the folder was last updated.
    pub updated_at: DateTime<Utc>,
    /// Actor that created the folder.
    pub created_by: Option<String>,
    /// Actor that last updated the folder.
    pub updated_by: Option<String>,
}

impl Folder {
    /// Build a new folder record at an already normalized path.
    pub fn new(
        path: String,
        name: Option<String>,
        extra: Option<serde_json::Value>,
        actor: Option<&str>,
        now: DateTime<Utc>,
    ) -> Self {
        let name = name.unwrap_or_else(|| last_segment(&path).to_string());
        Self {
            id: Uuid::new_v4(),
            depth: path_depth(&path),
            path,
            name,
            extra: extra.unwrap_or(serde_json::Value::Null),
            created_at: now,
            updated_at: now,
            created_by: actor.map(str::to_string),
            updated_by: actor.map(str::to_string),
        }
    }

    /// Check if this is the root folder.
    pub fn is_root(&self) -> bool {
        self.path.is_empty()
    }
}

/// Changes applied by a folder update.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FolderUpdate {
    /// New label.
    pub name: Option<String>,
    /// New normalized path.
    pub new_path: Option<String>,
    /// Actor performing the update.
    pub actor: Option<String>,
    /// Update timestamp.
    pub at: DateTime<Utc>,
}
