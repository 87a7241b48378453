//! HTTP request handlers.

pub mod asset;
pub mod folder;
pub mod health;
pub mod serve;
pub mod settings;
pub mod upload;
pub mod version;

use bytes::Bytes;
use serde::de::DeserializeOwned;

use assethub_core::error::AppError;

/// Parse an optional JSON body, falling back to `T::default()` when empty.
pub(crate) fn json_or_default<T>(body: &Bytes) -> Result<T, AppError>
where
    T: DeserializeOwned + Default,
{
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body)
        .map_err(|e| AppError::validation(format!("Invalid JSON body: {e}")))
}
