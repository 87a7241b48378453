//! Flattened read model of published assets.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::model::Asset;
use super::version::AssetVersion;

/// An asset joined with its currently published version.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PublishedAsset {
    /// Asset identifier.
    pub asset_id: Uuid,
    /// Containing folder.
    pub folder_path: String,
    /// Asset basename.
    pub basename: String,
    /// Asset-level metadata.
    pub asset_extra: serde_json::Value,
    /// Published version identifier.
    pub version_id: Uuid,
    /// Published version number.
    pub version: i32,
    /// Version label.
    pub label: Option<String>,
    /// Version-level metadata.
    pub extra: serde_json::Value,
    /// Size in bytes.
    pub size: Option<i64>,
    /// MIME type.
    pub content_type: Option<String>,
    /// When the version was published.
    pub published_at: Option<DateTime<Utc>>,
}

impl PublishedAsset {
    /// Combine an asset with its published version.
    ///
    /// Returns `None` unless `version` is the asset's live published version.
    pub fn from_parts(asset: &Asset, version: &AssetVersion) -> Option<Self> {
        if asset.published_version_id != Some(version.id) || !version.is_published() {
            return None;
        }
        Some(Self {
            asset_id: asset.id,
            folder_path: asset.folder_path.clone(),
            basename: asset.basename.clone(),
            asset_extra: asset.extra.clone(),
            version_id: version.id,
            version: version.version,
            label: version.label.clone(),
            extra: version.extra.clone(),
            size: version.size,
            content_type: version.content_type.clone(),
            published_at: version.published_at,
        })
    }
}
