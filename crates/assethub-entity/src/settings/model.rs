//! Storage backend settings singleton.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::upload::UploadBackend;

/// Which backend new uploads go to.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct StorageSettings {
    /// Backend used by `start_upload`.
    pub backend: UploadBackend,
    /// When the record was last written.
    pub updated_at: DateTime<Utc>,
    /// Actor that last wrote the record.
    pub updated_by: Option<String>,
}

impl StorageSettings {
    /// Settings record with the given backend.
    pub fn new(backend: UploadBackend, actor: Option<&str>, now: DateTime<Utc>) -> Self {
        Self {
            backend,
            updated_at: now,
            updated_by: actor.map(str::to_string),
        }
    }
}
