//! Storage backend selection record.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use assethub_core::error::AppError;
use assethub_core::result::AppResult;
use assethub_database::AssetStore;
use assethub_entity::settings::StorageSettings;
use assethub_entity::upload::UploadBackend;
use assethub_storage::StorageManager;

use crate::context::RequestContext;

/// Reads and writes the process-wide upload backend setting.
#[derive(Debug, Clone)]
pub struct StorageSettingsService {
    store: Arc<dyn AssetStore>,
    storage: Arc<StorageManager>,
    default_backend: UploadBackend,
}

impl StorageSettingsService {
    /// Creates a new settings service with the configured fallback backend.
    pub fn new(
        store: Arc<dyn AssetStore>,
        storage: Arc<StorageManager>,
        default_backend: UploadBackend,
    ) -> Self {
        Self {
            store,
            storage,
            default_backend,
        }
    }

    /// Write the configured default if no record is stored yet.
    pub async fn seed(&self) -> AppResult<StorageSettings> {
        if let Some(existing) = self.store.load_storage_settings().await? {
            return Ok(existing);
        }
        if self.default_backend == UploadBackend::External && !self.storage.has_external() {
            warn!("Default upload backend is external but no external storage is configured");
        }
        let settings = StorageSettings::new(self.default_backend, None, Utc::now());
        self.store.save_storage_settings(&settings).await?;
        info!(backend = %settings.backend, "Seeded storage settings");
        Ok(settings)
    }

    /// The current settings, falling back to the configured default.
    pub async fn current(&self) -> AppResult<StorageSettings> {
        Ok(self
            .store
            .load_storage_settings()
            .await?
            .unwrap_or_else(|| StorageSettings::new(self.default_backend, None, Utc::now())))
    }

    /// Select the backend for subsequent uploads.
    pub async fn set_backend(
        &self,
        ctx: &RequestContext,
        backend: UploadBackend,
    ) -> AppResult<StorageSettings> {
        if backend == UploadBackend::External && !self.storage.has_external() {
            return Err(AppError::configuration(
                "External storage backend is not configured",
            ));
        }
        let settings = StorageSettings::new(backend, ctx.actor(), ctx.request_time);
        self.store.save_storage_settings(&settings).await?;
        info!(backend = %backend, actor = ?ctx.actor(), "Storage backend changed");
        Ok(settings)
    }
}
