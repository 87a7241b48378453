//! Upload intent entities.

pub mod model;

pub use model::{IntentStatus, UploadBackend, UploadIntent};
