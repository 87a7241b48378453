//! Serving gateway: decides how a version is delivered to anonymous readers.

use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use assethub_core::result::AppResult;
use assethub_core::traits::storage::ByteStream;
use assethub_database::AssetStore;
use assethub_entity::asset::{StorageRef, VersionState};
use assethub_storage::StorageManager;
use assethub_storage::mime::DEFAULT_CONTENT_TYPE;

/// Cache policy for bytes served directly; a version's content never changes.
pub const IMMUTABLE_CACHE_CONTROL: &str = "public, max-age=31536000, immutable";

/// Cache policy for redirects to short-lived signed URLs.
pub const REDIRECT_CACHE_CONTROL: &str = "public, max-age=60";

/// How a version should be served.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServeOutcome {
    /// Stream the bytes from the backend.
    Blob {
        /// Where the bytes live.
        storage_ref: StorageRef,
        /// Response MIME type.
        content_type: String,
        /// Content length.
        size: u64,
        /// `Cache-Control` header value.
        cache_control: &'static str,
    },
    /// Redirect to a freshly minted download URL.
    Redirect {
        /// `Location` header value.
        location: String,
        /// `Cache-Control` header value.
        cache_control: &'static str,
    },
    /// Nothing publicly visible under this id.
    NotServable,
}

/// Resolves public read requests.
#[derive(Debug, Clone)]
pub struct ServingService {
    store: Arc<dyn AssetStore>,
    storage: Arc<StorageManager>,
    small_file_threshold: u64,
}

impl ServingService {
    /// Creates a new serving service.
    pub fn new(
        store: Arc<dyn AssetStore>,
        storage: Arc<StorageManager>,
        small_file_threshold: u64,
    ) -> Self {
        Self {
            store,
            storage,
            small_file_threshold,
        }
    }

    /// Decide how to serve `version_id`.
    ///
    /// Visibility failures collapse into [`ServeOutcome::NotServable`];
    /// errors are reserved for infrastructure failures such as URL minting.
    pub async fn resolve_for_serving(&self, version_id: Uuid) -> AppResult<ServeOutcome> {
        let Some(version) = self.store.find_version(version_id).await? else {
            return Ok(ServeOutcome::NotServable);
        };
        if version.state != VersionState::Published || version.storage_ref.is_empty() {
            debug!(version_id = %version_id, state = %version.state, "Version not servable");
            return Ok(ServeOutcome::NotServable);
        }

        let size = version.size.and_then(|s| u64::try_from(s).ok());
        match size {
            Some(size) if size <= self.small_file_threshold => Ok(ServeOutcome::Blob {
                storage_ref: version.storage_ref,
                content_type: version
                    .content_type
                    .filter(|ct| !ct.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string()),
                size,
                cache_control: IMMUTABLE_CACHE_CONTROL,
            }),
            _ => Ok(ServeOutcome::Redirect {
                location: self.storage.download_url(&version.storage_ref).await?,
                cache_control: REDIRECT_CACHE_CONTROL,
            }),
        }
    }

    /// Open the bytes behind a storage reference.
    pub async fn open(&self, storage_ref: &StorageRef) -> AppResult<ByteStream> {
        self.storage.read(storage_ref).await
    }

    /// Open an inline blob by id (the redirect target for inline versions).
    ///
    /// Returns `None` unless some published version is backed by the blob,
    /// so draft and archived bytes never leave through this path.
    pub async fn open_published_blob(&self, blob_id: &str) -> AppResult<Option<ByteStream>> {
        if !self.store.is_inline_blob_published(blob_id).await? {
            debug!(blob_id, "Inline blob not published");
            return Ok(None);
        }
        self.storage.read_inline(blob_id).await.map(Some)
    }
}
