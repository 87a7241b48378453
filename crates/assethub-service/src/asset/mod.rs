//! Asset and version services.

pub mod service;

pub use service::{
    AssetService, CommitVersionRequest, CreateAssetRequest, MoveAssetRequest, RenameAssetRequest,
    StorageVersionRequest,
};
