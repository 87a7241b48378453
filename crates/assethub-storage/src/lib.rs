//! # assethub-storage
//!
//! Blob storage for AssetHub: provider implementations for the local
//! filesystem, S3-compatible object stores and process memory, plus the
//! [`StorageManager`] that maps storage references to providers and mints
//! upload and download URLs.

pub mod manager;
pub mod mime;
pub mod providers;

pub use manager::{InlineBlob, StorageManager};
