//! Process-wide settings records.

pub mod model;

pub use model::StorageSettings;
