//! Asset and version domain entities.

pub mod aggregate;
pub mod model;
pub mod published;
pub mod version;

pub use aggregate::{AssetAggregate, NewVersion};
pub use model::{Asset, AssetKey};
pub use published::PublishedAsset;
pub use version::{AssetVersion, PayloadMeta, StorageRef, VersionState};
