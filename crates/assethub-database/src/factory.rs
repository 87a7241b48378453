//! Store construction from configuration.

use std::sync::Arc;

use tracing::info;

use assethub_core::config::{DatabaseBackend, DatabaseConfig};
use assethub_core::result::AppResult;

use crate::connection::connect_pool;
use crate::memory::MemoryStore;
use crate::migration::run_migrations;
use crate::postgres::PostgresStore;
use crate::store::AssetStore;

/// Build the configured asset store.
///
/// The postgres backend connects, optionally migrates, and fails fast when
/// the database is unreachable.
pub async fn connect_store(config: &DatabaseConfig) -> AppResult<Arc<dyn AssetStore>> {
    match config.backend {
        DatabaseBackend::Memory => {
            info!("Using in-memory asset store");
            Ok(Arc::new(MemoryStore::new()))
        }
        DatabaseBackend::Postgres => {
            let pool = connect_pool(config).await?;
            if config.run_migrations {
                run_migrations(&pool).await?;
            }
            info!("Using PostgreSQL asset store");
            Ok(Arc::new(PostgresStore::new(pool)))
        }
    }
}
