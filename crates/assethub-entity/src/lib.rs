//! # assethub-entity
//!
//! Domain entity models for AssetHub. Every struct in this crate
//! represents a database table row or a domain value object. All entities
//! derive `Debug`, `Clone`, `Serialize`, `Deserialize`, and database
//! entities additionally derive `sqlx::FromRow`.
//!
//! The asset version lifecycle lives in [`asset::AssetAggregate`], a pure
//! state machine that store backends persist atomically.

pub mod asset;
pub mod event;
pub mod folder;
pub mod settings;
pub mod upload;
