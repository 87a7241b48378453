//! # assethub-core
//!
//! Core crate for AssetHub. Contains the configuration schemas, the
//! storage provider trait and the unified error system.
//!
//! This crate has **no** internal dependencies on other AssetHub crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;

pub use error::{AppError, ErrorKind};
pub use result::AppResult;
