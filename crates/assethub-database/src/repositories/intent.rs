//! Upload intent repository implementation.

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use assethub_core::result::AppResult;
use assethub_entity::upload::{IntentStatus, UploadIntent};

use super::db_error;

/// Repository for upload intent rows.
#[derive(Debug, Clone)]
pub struct IntentRepository {
    pool: PgPool,
}

impl IntentRepository {
    /// Create a new intent repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new intent.
    pub async fn create(&self, intent: &UploadIntent) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO upload_intents (id, folder_path, basename, filename, backend, backend_key, \
                status, publish, label, extra, created_at, expires_at, finalized_at, created_by) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)",
        )
        .bind(intent.id)
        .bind(&intent.folder_path)
        .bind(&intent.basename)
        .bind(&intent.filename)
        .bind(intent.backend)
        .bind(&intent.backend_key)
        .bind(intent.status)
        .bind(intent.publish)
        .bind(&intent.label)
        .bind(&intent.extra)
        .bind(intent.created_at)
        .bind(intent.expires_at)
        .bind(intent.finalized_at)
        .bind(&intent.created_by)
        .execute(&self.pool)
        .await
        .map_err(db_error("Failed to create upload intent"))?;
        Ok(())
    }

    /// Find an intent by ID.
    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<UploadIntent>> {
        sqlx::query_as::<_, UploadIntent>("SELECT * FROM upload_intents WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to find upload intent"))
    }

    /// Point an open intent at its pushed inline blob.
    ///
    /// Returns the number of rows changed; zero when the intent is missing
    /// or no longer `created`.
    pub async fn record_blob(&self, id: Uuid, blob_id: &str) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE upload_intents SET backend_key = $2 WHERE id = $1 AND status = 'created'",
        )
        .bind(id)
        .bind(blob_id)
        .execute(&self.pool)
        .await
        .map_err(db_error("Failed to record inline blob"))?;
        Ok(result.rows_affected())
    }

    /// Expire every open intent past its deadline.
    pub async fn expire_due(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE upload_intents SET status = 'expired' \
             WHERE status = 'created' AND expires_at <= $1",
        )
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(db_error("Failed to expire upload intents"))?;
        Ok(result.rows_affected())
    }

    /// Lock an intent and return its status and deadline.
    pub async fn lock_status(
        conn: &mut PgConnection,
        id: Uuid,
    ) -> AppResult<Option<(IntentStatus, DateTime<Utc>)>> {
        sqlx::query_as::<_, (IntentStatus, DateTime<Utc>)>(
            "SELECT status, expires_at FROM upload_intents WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(conn)
        .await
        .map_err(db_error("Failed to lock upload intent"))
    }

    /// Mark a locked intent as finalized.
    pub async fn mark_finalized(
        conn: &mut PgConnection,
        id: Uuid,
        at: DateTime<Utc>,
    ) -> AppResult<()> {
        sqlx::query(
            "UPDATE upload_intents SET status = 'finalized', finalized_at = $2 WHERE id = $1",
        )
        .bind(id)
        .bind(at)
        .execute(conn)
        .await
        .map_err(db_error("Failed to finalize upload intent"))?;
        Ok(())
    }
}
