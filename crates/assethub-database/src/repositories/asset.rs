//! Asset repository implementation.

use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use assethub_core::error::AppError;
use assethub_core::result::AppResult;
use assethub_entity::asset::{Asset, AssetKey, PublishedAsset};
use assethub_entity::folder::path::descendant_prefix;

use super::{db_error, unique_violation};

const KEY_CONSTRAINT: &str = "assets_folder_path_basename_key";

/// Repository for asset rows.
#[derive(Debug, Clone)]
pub struct AssetRepository {
    pool: PgPool,
}

impl AssetRepository {
    /// Create a new asset repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find an asset by key.
    pub async fn find_by_key(&self, key: &AssetKey) -> AppResult<Option<Asset>> {
        sqlx::query_as::<_, Asset>("SELECT * FROM assets WHERE folder_path = $1 AND basename = $2")
            .bind(&key.folder_path)
            .bind(&key.basename)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to find asset"))
    }

    /// Find an asset by ID.
    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Asset>> {
        sqlx::query_as::<_, Asset>("SELECT * FROM assets WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to find asset by id"))
    }

    /// Assets directly inside a folder.
    pub async fn find_in_folder(&self, folder_path: &str) -> AppResult<Vec<Asset>> {
        sqlx::query_as::<_, Asset>("SELECT * FROM assets WHERE folder_path = $1 ORDER BY basename ASC")
            .bind(folder_path)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("Failed to list assets"))
    }

    /// Assets directly inside a folder joined with their published version.
    pub async fn find_published_in_folder(&self, folder_path: &str) -> AppResult<Vec<PublishedAsset>> {
        sqlx::query_as::<_, PublishedAsset>(
            "SELECT a.id AS asset_id, a.folder_path, a.basename, a.extra AS asset_extra, \
                    v.id AS version_id, v.version, v.label, v.extra, v.size, v.content_type, v.published_at \
             FROM assets a \
             JOIN asset_versions v ON v.id = a.published_version_id AND v.state = 'published' \
             WHERE a.folder_path = $1 \
             ORDER BY a.basename ASC",
        )
        .bind(folder_path)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to list published assets"))
    }

    /// Lock an asset row by key.
    pub async fn lock_by_key(conn: &mut PgConnection, key: &AssetKey) -> AppResult<Option<Asset>> {
        sqlx::query_as::<_, Asset>(
            "SELECT * FROM assets WHERE folder_path = $1 AND basename = $2 FOR UPDATE",
        )
        .bind(&key.folder_path)
        .bind(&key.basename)
        .fetch_optional(conn)
        .await
        .map_err(db_error("Failed to lock asset"))
    }

    /// Lock an asset row by ID.
    pub async fn lock_by_id(conn: &mut PgConnection, id: Uuid) -> AppResult<Option<Asset>> {
        sqlx::query_as::<_, Asset>("SELECT * FROM assets WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(conn)
            .await
            .map_err(db_error("Failed to lock asset"))
    }

    /// Lock every asset inside a folder subtree.
    pub async fn lock_in_subtree(conn: &mut PgConnection, folder_path: &str) -> AppResult<Vec<Asset>> {
        sqlx::query_as::<_, Asset>(
            "SELECT * FROM assets WHERE folder_path = $1 OR starts_with(folder_path, $2) FOR UPDATE",
        )
        .bind(folder_path)
        .bind(descendant_prefix(folder_path))
        .fetch_all(conn)
        .await
        .map_err(db_error("Failed to lock assets in folder"))
    }

    /// Insert a new asset row.
    pub async fn insert(conn: &mut PgConnection, asset: &Asset) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO assets (id, folder_path, basename, extra, version_counter, \
                published_version_id, draft_version_id, created_at, updated_at, created_by, updated_by) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
        )
        .bind(asset.id)
        .bind(&asset.folder_path)
        .bind(&asset.basename)
        .bind(&asset.extra)
        .bind(asset.version_counter)
        .bind(asset.published_version_id)
        .bind(asset.draft_version_id)
        .bind(asset.created_at)
        .bind(asset.updated_at)
        .bind(&asset.created_by)
        .bind(&asset.updated_by)
        .execute(conn)
        .await
        .map_err(|e| match unique_violation(&e) {
            Some(KEY_CONSTRAINT) => {
                AppError::already_exists(format!("Asset '{}' already exists", asset.key()))
            }
            _ => db_error("Failed to create asset")(e),
        })?;
        Ok(())
    }

    /// Write back every mutable column of an asset row.
    pub async fn update(conn: &mut PgConnection, asset: &Asset) -> AppResult<()> {
        sqlx::query(
            "UPDATE assets SET folder_path = $2, basename = $3, version_counter = $4, \
                published_version_id = $5, draft_version_id = $6, updated_at = $7, updated_by = $8 \
             WHERE id = $1",
        )
        .bind(asset.id)
        .bind(&asset.folder_path)
        .bind(&asset.basename)
        .bind(asset.version_counter)
        .bind(asset.published_version_id)
        .bind(asset.draft_version_id)
        .bind(asset.updated_at)
        .bind(&asset.updated_by)
        .execute(conn)
        .await
        .map_err(|e| match unique_violation(&e) {
            Some(KEY_CONSTRAINT) => {
                AppError::already_exists(format!("Asset '{}' already exists", asset.key()))
            }
            _ => db_error("Failed to update asset")(e),
        })?;
        Ok(())
    }
}
