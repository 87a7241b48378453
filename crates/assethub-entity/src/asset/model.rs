//! Asset entity model.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A named, versioned asset inside a folder.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Asset {
    /// Unique asset identifier.
    pub id: Uuid,
    /// Normalized path of the containing folder.
    pub folder_path: String,
    /// File-like name, unique within the folder.
    pub basename: String,
    /// Opaque caller metadata.
    pub extra: serde_json::Value,
    /// Number of versions ever created; never reused.
    pub version_counter: i32,
    /// The single externally visible version.
    pub published_version_id: Option<Uuid>,
    /// The live draft version.
    pub draft_version_id: Option<Uuid>,
    /// When the asset was created.
    pub created_at: DateTime<Utc>,
    /// When the asset was last updated.
    pub updated_at: DateTime<Utc>,
    /// Actor that created the asset.
    pub created_by: Option<String>,
    /// Actor that last updated the asset.
    pub updated_by: Option<String>,
}

impl Asset {
    /// The unique `(folder_path, basename)` key of this asset.
    pub fn key(&self) -> AssetKey {
        AssetKey::new(self.folder_path.clone(), self.basename.clone())
    }
}

/// Unique structural key of an asset.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AssetKey {
    /// Normalized folder path.
    pub folder_path: String,
    /// Basename within the folder.
    pub basename: String,
}

impl AssetKey {
    /// Build a key from already normalized parts.
    pub fn new(folder_path: impl Into<String>, basename: impl Into<String>) -> Self {
        Self {
            folder_path: folder_path.into(),
            basename: basename.into(),
        }
    }
}

impl fmt::Display for AssetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.folder_path.is_empty() {
            write!(f, "{}", self.basename)
        } else {
            write!(f, "{}/{}", self.folder_path, self.basename)
        }
    }
}
