//! Read side of the asset event log.
//!
//! Events are written by the store inside the same transaction as the
//! change they document; this service only reads them back.

use std::sync::Arc;

use uuid::Uuid;

use assethub_core::error::AppError;
use assethub_core::result::AppResult;
use assethub_database::AssetStore;
use assethub_entity::event::AssetEvent;

use crate::asset::service::asset_key;

/// Reads asset histories.
#[derive(Debug, Clone)]
pub struct EventLog {
    store: Arc<dyn AssetStore>,
}

impl EventLog {
    /// Creates a new event log reader.
    pub fn new(store: Arc<dyn AssetStore>) -> Self {
        Self { store }
    }

    /// Events of an asset, oldest first.
    pub async fn history(&self, asset_id: Uuid) -> AppResult<Vec<AssetEvent>> {
        if self.store.find_asset_by_id(asset_id).await?.is_none() {
            return Err(AppError::not_found(format!("Asset {asset_id} not found")));
        }
        self.store.list_events(asset_id).await
    }

    /// Events of the asset currently at `(folder_path, basename)`.
    pub async fn history_by_key(
        &self,
        folder_path: &str,
        basename: &str,
    ) -> AppResult<Vec<AssetEvent>> {
        let key = asset_key(folder_path, basename)?;
        let asset = self
            .store
            .find_asset(&key)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Asset '{key}' not found")))?;
        self.store.list_events(asset.id).await
    }
}
