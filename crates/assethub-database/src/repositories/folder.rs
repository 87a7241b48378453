//! Folder repository implementation.

use sqlx::{PgConnection, PgPool};

use assethub_core::error::AppError;
use assethub_core::result::AppResult;
use assethub_entity::folder::Folder;
use assethub_entity::folder::path::{descendant_prefix, path_depth};

use super::{db_error, unique_violation};

/// Repository for folder rows.
#[derive(Debug, Clone)]
pub struct FolderRepository {
    pool: PgPool,
}

impl FolderRepository {
    /// Create a new folder repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a folder by path.
    pub async fn find_by_path(&self, path: &str) -> AppResult<Option<Folder>> {
        sqlx::query_as::<_, Folder>("SELECT * FROM folders WHERE path = $1")
            .bind(path)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to find folder by path"))
    }

    /// Direct children of a folder: prefix scan plus depth filter.
    pub async fn find_children(&self, parent_path: &str) -> AppResult<Vec<Folder>> {
        sqlx::query_as::<_, Folder>(
            "SELECT * FROM folders WHERE starts_with(path, $1) AND depth = $2 ORDER BY path ASC",
        )
        .bind(descendant_prefix(parent_path))
        .bind(path_depth(parent_path) + 1)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to list child folders"))
    }

    /// Insert a new folder.
    pub async fn create(&self, folder: &Folder) -> AppResult<Folder> {
        sqlx::query_as::<_, Folder>(
            "INSERT INTO folders (id, path, name, depth, extra, created_at, updated_at, created_by, updated_by) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING *",
        )
        .bind(folder.id)
        .bind(&folder.path)
        .bind(&folder.name)
        .bind(folder.depth)
        .bind(&folder.extra)
        .bind(folder.created_at)
        .bind(folder.updated_at)
        .bind(&folder.created_by)
        .bind(&folder.updated_by)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match unique_violation(&e) {
            Some("folders_path_key") => {
                AppError::already_exists(format!("Folder '{}' already exists", folder.path))
            }
            _ => db_error("Failed to create folder")(e),
        })
    }

    /// Lock a folder and its whole subtree inside a transaction.
    pub async fn lock_subtree(conn: &mut PgConnection, path: &str) -> AppResult<Vec<Folder>> {
        sqlx::query_as::<_, Folder>(
            "SELECT * FROM folders WHERE path = $1 OR starts_with(path, $2) \
             ORDER BY depth ASC FOR UPDATE",
        )
        .bind(path)
        .bind(descendant_prefix(path))
        .fetch_all(conn)
        .await
        .map_err(db_error("Failed to lock folder subtree"))
    }

    /// Rewrite the path, depth and label of one folder.
    pub async fn update(conn: &mut PgConnection, old_path: &str, folder: &Folder) -> AppResult<()> {
        sqlx::query(
            "UPDATE folders SET path = $2, depth = $3, name = $4, updated_at = $5, updated_by = $6 \
             WHERE path = $1",
        )
        .bind(old_path)
        .bind(&folder.path)
        .bind(folder.depth)
        .bind(&folder.name)
        .bind(folder.updated_at)
        .bind(&folder.updated_by)
        .execute(conn)
        .await
        .map_err(|e| match unique_violation(&e) {
            Some("folders_path_key") => {
                AppError::already_exists(format!("Folder '{}' already exists", folder.path))
            }
            _ => db_error("Failed to update folder")(e),
        })?;
        Ok(())
    }
}
