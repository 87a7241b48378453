//! Application state shared across all handlers and middleware.

use std::sync::Arc;

use assethub_core::config::AppConfig;
use assethub_core::result::AppResult;
use assethub_database::AssetStore;
use assethub_entity::upload::UploadBackend;
use assethub_service::{
    AssetService, EventLog, FolderService, ServingService, StorageSettingsService, UploadService,
};
use assethub_storage::StorageManager;

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`.
/// All fields are `Arc`-wrapped for cheap cloning across tasks.
#[derive(Debug, Clone)]
pub struct AppState {
    // ── Configuration ────────────────────────────────────────
    /// Application configuration
    pub config: Arc<AppConfig>,

    // ── Infrastructure ───────────────────────────────────────
    /// Metadata store backend
    pub store: Arc<dyn AssetStore>,
    /// Blob storage providers
    pub storage: Arc<StorageManager>,

    // ── Services ─────────────────────────────────────────────
    /// Folder directory
    pub folder_service: Arc<FolderService>,
    /// Assets and versions
    pub asset_service: Arc<AssetService>,
    /// Asset history
    pub event_log: Arc<EventLog>,
    /// Upload intents
    pub upload_service: Arc<UploadService>,
    /// Upload backend selection
    pub settings_service: Arc<StorageSettingsService>,
    /// Public read path
    pub serving_service: Arc<ServingService>,
}

impl AppState {
    /// Wire every service over the given store and storage manager.
    pub fn new(
        config: AppConfig,
        store: Arc<dyn AssetStore>,
        storage: Arc<StorageManager>,
    ) -> AppResult<Self> {
        let default_backend: UploadBackend = config.storage.default_backend.parse()?;

        let asset_service = AssetService::new(Arc::clone(&store));
        let settings_service =
            StorageSettingsService::new(Arc::clone(&store), Arc::clone(&storage), default_backend);
        let upload_service = UploadService::new(
            Arc::clone(&store),
            Arc::clone(&storage),
            settings_service.clone(),
            asset_service.clone(),
            config.storage.upload.clone(),
        );
        let serving_service = ServingService::new(
            Arc::clone(&store),
            Arc::clone(&storage),
            config.serving.small_file_threshold_bytes,
        );

        Ok(Self {
            folder_service: Arc::new(FolderService::new(Arc::clone(&store))),
            asset_service: Arc::new(asset_service),
            event_log: Arc::new(EventLog::new(Arc::clone(&store))),
            upload_service: Arc::new(upload_service),
            settings_service: Arc::new(settings_service),
            serving_service: Arc::new(serving_service),
            config: Arc::new(config),
            store,
            storage,
        })
    }
}
