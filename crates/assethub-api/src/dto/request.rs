//! Request DTOs and query strings.

use serde::{Deserialize, Serialize};

use assethub_entity::upload::UploadBackend;

/// `?parent=` on folder listings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ParentQuery {
    /// Parent folder path; root when absent.
    pub parent: Option<String>,
}

/// `?path=` on folder lookups.
#[derive(Debug, Clone, Deserialize)]
pub struct PathQuery {
    /// Folder path.
    #[serde(default)]
    pub path: String,
}

/// `?folder=` on asset listings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FolderQuery {
    /// Folder path; root when absent.
    #[serde(default)]
    pub folder: String,
}

/// `?folder=&basename=` on asset lookups.
#[derive(Debug, Clone, Deserialize)]
pub struct AssetLookupQuery {
    /// Folder path.
    #[serde(default)]
    pub folder: String,
    /// Basename.
    pub basename: String,
}

/// Asset addressed by key in a request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetKeyRequest {
    /// Folder path.
    #[serde(default)]
    pub folder_path: String,
    /// Basename.
    pub basename: String,
}

/// Body of a restore request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RestoreRequest {
    /// Label for the restored version.
    #[serde(default)]
    pub label: Option<String>,
}

/// Body of a storage settings update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetStorageBackendRequest {
    /// Backend for new uploads.
    pub backend: UploadBackend,
}
