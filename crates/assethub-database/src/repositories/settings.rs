//! Storage settings repository implementation.

use sqlx::PgPool;

use assethub_core::result::AppResult;
use assethub_entity::settings::StorageSettings;

use super::db_error;

/// Repository for the storage settings singleton row.
#[derive(Debug, Clone)]
pub struct SettingsRepository {
    pool: PgPool,
}

impl SettingsRepository {
    /// Create a new settings repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Load the settings row.
    pub async fn load(&self) -> AppResult<Option<StorageSettings>> {
        sqlx::query_as::<_, StorageSettings>(
            "SELECT backend, updated_at, updated_by FROM storage_settings WHERE singleton",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to load storage settings"))
    }

    /// Insert or replace the settings row.
    pub async fn save(&self, settings: &StorageSettings) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO storage_settings (singleton, backend, updated_at, updated_by) \
             VALUES (TRUE, $1, $2, $3) \
             ON CONFLICT (singleton) DO UPDATE SET backend = EXCLUDED.backend, \
                updated_at = EXCLUDED.updated_at, updated_by = EXCLUDED.updated_by",
        )
        .bind(settings.backend)
        .bind(settings.updated_at)
        .bind(&settings.updated_by)
        .execute(&self.pool)
        .await
        .map_err(db_error("Failed to save storage settings"))?;
        Ok(())
    }
}
