//! Asset event repository implementation.

use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use assethub_core::result::AppResult;
use assethub_entity::event::AssetEvent;

use super::db_error;

/// Repository for the append-only asset event log.
#[derive(Debug, Clone)]
pub struct EventRepository {
    pool: PgPool,
}

impl EventRepository {
    /// Create a new event repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// History of an asset, oldest first.
    pub async fn find_by_asset(&self, asset_id: Uuid) -> AppResult<Vec<AssetEvent>> {
        sqlx::query_as::<_, AssetEvent>(
            "SELECT * FROM asset_events WHERE asset_id = $1 ORDER BY created_at ASC, id ASC",
        )
        .bind(asset_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to list asset events"))
    }

    /// Append an event inside a transaction.
    pub async fn insert(conn: &mut PgConnection, event: &AssetEvent) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO asset_events (id, asset_id, event_type, from_folder_path, to_folder_path, \
                from_basename, to_basename, version_id, created_at, created_by) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(event.id)
        .bind(event.asset_id)
        .bind(event.event_type)
        .bind(&event.from_folder_path)
        .bind(&event.to_folder_path)
        .bind(&event.from_basename)
        .bind(&event.to_basename)
        .bind(event.version_id)
        .bind(event.created_at)
        .bind(&event.created_by)
        .execute(conn)
        .await
        .map_err(db_error("Failed to record asset event"))?;
        Ok(())
    }
}
