//! # assethub-service
//!
//! Business logic service layer for AssetHub. Each service orchestrates the
//! [`AssetStore`](assethub_database::AssetStore) backend and the
//! [`StorageManager`](assethub_storage::StorageManager) to implement one
//! group of use cases.
//!
//! Services follow constructor injection: all dependencies are provided
//! at construction time via `Arc` references.

pub mod asset;
pub mod context;
pub mod event;
pub mod folder;
pub mod serving;
pub mod settings;
pub mod upload;

pub use asset::AssetService;
pub use context::RequestContext;
pub use event::EventLog;
pub use folder::FolderService;
pub use serving::{ServeOutcome, ServingService};
pub use settings::StorageSettingsService;
pub use upload::UploadService;
