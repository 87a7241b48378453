//! Asset event log entities.

pub mod model;

pub use model::{AssetEvent, AssetEventType};
