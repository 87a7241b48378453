//! # assethub-api
//!
//! HTTP API layer for AssetHub built on Axum.
//!
//! Provides the JSON management API, the inline upload endpoint, the public
//! read path, middleware (CORS, request logging), extractors, DTOs and
//! error mapping.

pub mod app;
pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use app::{bootstrap, build_app, run_server};
pub use error::ApiError;
pub use state::AppState;
