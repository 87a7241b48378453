//! # assethub-database
//!
//! The [`AssetStore`] transactional backend and its two implementations:
//! PostgreSQL (through sqlx repositories) and an in-process memory store.

pub mod connection;
pub mod factory;
pub mod memory;
pub mod migration;
pub mod postgres;
pub mod repositories;
pub mod store;

pub use connection::connect_pool;
pub use factory::connect_store;
pub use memory::MemoryStore;
pub use postgres::PostgresStore;
pub use store::{AssetMutation, AssetStore, AssetTarget};
