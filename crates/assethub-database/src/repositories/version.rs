//! Asset version repository implementation.

use sqlx::types::Json;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use assethub_core::error::AppError;
use assethub_core::result::AppResult;
use assethub_entity::asset::AssetVersion;

use super::{db_error, unique_violation};

/// Repository for asset version rows.
#[derive(Debug, Clone)]
pub struct VersionRepository {
    pool: PgPool,
}

impl VersionRepository {
    /// Create a new version repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a version by ID.
    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<AssetVersion>> {
        sqlx::query_as::<_, AssetVersion>("SELECT * FROM asset_versions WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to find version"))
    }

    /// All versions of an asset ordered by version number.
    pub async fn find_by_asset(&self, asset_id: Uuid) -> AppResult<Vec<AssetVersion>> {
        sqlx::query_as::<_, AssetVersion>(
            "SELECT * FROM asset_versions WHERE asset_id = $1 ORDER BY version ASC",
        )
        .bind(asset_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to list versions"))
    }

    /// Whether a published version points at the inline blob `blob_id`.
    pub async fn inline_blob_published(&self, blob_id: &str) -> AppResult<bool> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM asset_versions \
             WHERE state = 'published' AND storage_ref->>'kind' = 'inline' \
               AND storage_ref->>'id' = $1)",
        )
        .bind(blob_id)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("Failed to check inline blob visibility"))
    }

    /// Load a version inside a transaction.
    pub async fn find_in(conn: &mut PgConnection, id: Uuid) -> AppResult<Option<AssetVersion>> {
        sqlx::query_as::<_, AssetVersion>("SELECT * FROM asset_versions WHERE id = $1")
            .bind(id)
            .fetch_optional(conn)
            .await
            .map_err(db_error("Failed to load version"))
    }

    /// Insert a version, or apply a state transition to an existing one.
    ///
    /// Only state and stamp columns change on conflict; the payload is
    /// immutable.
    pub async fn upsert(conn: &mut PgConnection, version: &AssetVersion) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO asset_versions (id, asset_id, version, state, label, extra, storage_ref, \
                original_filename, size, content_type, sha256, created_at, created_by, \
                published_at, published_by, archived_at, archived_by) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17) \
             ON CONFLICT (id) DO UPDATE SET state = EXCLUDED.state, \
                published_at = EXCLUDED.published_at, published_by = EXCLUDED.published_by, \
                archived_at = EXCLUDED.archived_at, archived_by = EXCLUDED.archived_by",
        )
        .bind(version.id)
        .bind(version.asset_id)
        .bind(version.version)
        .bind(version.state)
        .bind(&version.label)
        .bind(&version.extra)
        .bind(Json(&version.storage_ref))
        .bind(&version.original_filename)
        .bind(version.size)
        .bind(&version.content_type)
        .bind(&version.sha256)
        .bind(version.created_at)
        .bind(&version.created_by)
        .bind(version.published_at)
        .bind(&version.published_by)
        .bind(version.archived_at)
        .bind(&version.archived_by)
        .execute(conn)
        .await
        .map_err(|e| match unique_violation(&e) {
            Some(_) => AppError::conflict(format!(
                "Version {} of asset {} conflicts with a concurrent write",
                version.version, version.asset_id
            )),
            None => db_error("Failed to write version")(e),
        })?;
        Ok(())
    }
}
