//! PostgreSQL pool construction.

use std::time::Duration;

use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::info;

use assethub_core::config::DatabaseConfig;
use assethub_core::error::{AppError, ErrorKind};
use assethub_core::result::AppResult;

/// Open a pool sized and timed by `config`.
///
/// Fails fast when no URL is configured or the server is unreachable.
pub async fn connect_pool(config: &DatabaseConfig) -> AppResult<PgPool> {
    if config.url.trim().is_empty() {
        return Err(AppError::configuration(
            "database.url is required for the postgres backend",
        ));
    }

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.connect_timeout_seconds))
        .idle_timeout(Duration::from_secs(config.idle_timeout_seconds))
        .connect(&config.url)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to connect to PostgreSQL", e)
        })?;

    info!(
        max_connections = config.max_connections,
        min_connections = config.min_connections,
        "Connected to PostgreSQL"
    );
    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_connect_requires_url() {
        let config = DatabaseConfig {
            url: "   ".into(),
            ..DatabaseConfig::default()
        };
        let err = connect_pool(&config).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Configuration);
    }
}
