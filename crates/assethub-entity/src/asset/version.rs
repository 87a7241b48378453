//! Asset version entity and its lifecycle state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Lifecycle state of a version.
///
/// `draft -> published -> archived`; `archived` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "version_state", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum VersionState {
    /// Not yet visible to external consumers.
    Draft,
    /// The single externally visible version.
    Published,
    /// Superseded, kept for history.
    Archived,
}

impl VersionState {
    /// Return the state as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Published => "published",
            Self::Archived => "archived",
        }
    }
}

impl fmt::Display for VersionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for VersionState {
    type Err = assethub_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "draft" => Ok(Self::Draft),
            "published" => Ok(Self::Published),
            "archived" => Ok(Self::Archived),
            _ => Err(assethub_core::AppError::validation(format!(
                "Invalid version state: '{s}'. Expected one of: draft, published, archived"
            ))),
        }
    }
}

/// Pointer to the bytes of a version in one of the two storage backends.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum StorageRef {
    /// Blob id in the inline blob store.
    Inline {
        /// Blob identifier.
        id: String,
    },
    /// Object key in the external S3-compatible bucket.
    External {
        /// Object key.
        key: String,
    },
}

impl StorageRef {
    /// Whether the reference points at nothing.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Inline { id } => id.trim().is_empty(),
            Self::External { key } => key.trim().is_empty(),
        }
    }

    /// Backend-specific identifier.
    pub fn locator(&self) -> &str {
        match self {
            Self::Inline { id } => id,
            Self::External { key } => key,
        }
    }
}

impl fmt::Display for StorageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inline { id } => write!(f, "inline:{id}"),
            Self::External { key } => write!(f, "external:{key}"),
        }
    }
}

/// Descriptive metadata of a version's bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayloadMeta {
    /// Name of the file the client uploaded.
    pub original_filename: Option<String>,
    /// Size in bytes.
    pub size: Option<i64>,
    /// MIME type.
    pub content_type: Option<String>,
    /// Hex-encoded SHA-256 of the bytes (informational).
    pub sha256: Option<String>,
}

/// One immutable content snapshot of an asset.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AssetVersion {
    /// Unique version identifier.
    pub id: Uuid,
    /// Owning asset.
    pub asset_id: Uuid,
    /// 1-based sequence number within the asset.
    pub version: i32,
    /// Lifecycle state.
    pub state: VersionState,
    /// Optional human label.
    pub label: Option<String>,
    /// Opaque caller metadata.
    pub extra: serde_json::Value,
    /// Where the bytes live.
    #[sqlx(json)]
    pub storage_ref: StorageRef,
    /// Name of the file the client uploaded.
    pub original_filename: Option<String>,
    /// Size in bytes.
    pub size: Option<i64>,
    /// MIME type.
    pub content_type: Option<String>,
    /// Hex-encoded SHA-256 of the bytes.
    pub sha256: Option<String>,
    /// When the version was created.
    pub created_at: DateTime<Utc>,
    /// Actor that created the version.
    pub created_by: Option<String>,
    /// When the version was published.
    pub published_at: Option<DateTime<Utc>>,
    /// Actor that published the version.
    pub published_by: Option<String>,
    /// When the version was archived.
    pub archived_at: Option<DateTime<Utc>>,
    /// Actor whose publish archived this version.
    pub archived_by: Option<String>,
}

impl AssetVersion {
    /// Payload metadata of this version.
    pub fn payload(&self) -> PayloadMeta {
        PayloadMeta {
            original_filename: self.original_filename.clone(),
            size: self.size,
            content_type: self.content_type.clone(),
            sha256: self.sha256.clone(),
        }
    }

    /// Whether this version may be served publicly.
    pub fn is_published(&self) -> bool {
        self.state == VersionState::Published
    }

    pub(crate) fn mark_published(&mut self, actor: Option<&str>, now: DateTime<Utc>) {
        self.state = VersionState::Published;
        self.published_at = Some(now);
        self.published_by = actor.map(str::to_string);
    }

    pub(crate) fn mark_archived(&mut self, actor: Option<&str>, now: DateTime<Utc>) {
        self.state = VersionState::Archived;
        self.archived_at = Some(now);
        self.archived_by = actor.map(str::to_string);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_from_str() {
        assert_eq!("draft".parse::<VersionState>().unwrap(), VersionState::Draft);
        assert_eq!("PUBLISHED".parse::<VersionState>().unwrap(), VersionState::Published);
        assert!("deleted".parse::<VersionState>().is_err());
    }

    #[test]
    fn test_storage_ref_serialization_is_tagged() {
        let inline = StorageRef::Inline { id: "b1".into() };
        let json = serde_json::to_value(&inline).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "inline", "id": "b1"}));

        let external: StorageRef =
            serde_json::from_value(serde_json::json!({"kind": "external", "key": "assets/x.png"}))
                .unwrap();
        assert_eq!(external.locator(), "assets/x.png");
    }

    #[test]
    fn test_storage_ref_empty() {
        assert!(StorageRef::Inline { id: " ".into() }.is_empty());
        assert!(!StorageRef::External { key: "k".into() }.is_empty());
    }
}
