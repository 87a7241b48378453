//! sqlx repositories, one per table.
//!
//! Read methods run against the pool; write methods that take part in an
//! asset mutation accept a `&mut PgConnection` so the caller owns the
//! transaction.

pub mod asset;
pub mod event;
pub mod folder;
pub mod intent;
pub mod settings;
pub mod version;

pub use asset::AssetRepository;
pub use event::EventRepository;
pub use folder::FolderRepository;
pub use intent::IntentRepository;
pub use settings::SettingsRepository;
pub use version::VersionRepository;

use assethub_core::error::{AppError, ErrorKind};

/// Name of the unique constraint violated by `err`, if any.
pub(crate) fn unique_violation(err: &sqlx::Error) -> Option<&str> {
    match err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            Some(db_err.constraint().unwrap_or_default())
        }
        _ => None,
    }
}

/// Wrap a sqlx error as a database error.
pub(crate) fn db_error(message: &'static str) -> impl FnOnce(sqlx::Error) -> AppError {
    move |e| AppError::with_source(ErrorKind::Database, message, e)
}
