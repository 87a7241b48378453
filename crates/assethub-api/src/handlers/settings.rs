//! Storage settings handlers.

use axum::Json;
use axum::extract::State;

use assethub_entity::settings::StorageSettings;

use crate::dto::request::SetStorageBackendRequest;
use crate::dto::response::ApiResponse;
use crate::error::ApiError;
use crate::extractors::Actor;
use crate::state::AppState;

/// GET /api/settings/storage
pub async fn get_storage(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<StorageSettings>>, ApiError> {
    let settings = state.settings_service.current().await?;
    Ok(Json(ApiResponse::ok(settings)))
}

/// PUT /api/settings/storage
pub async fn set_storage(
    State(state): State<AppState>,
    Actor(ctx): Actor,
    Json(req): Json<SetStorageBackendRequest>,
) -> Result<Json<ApiResponse<StorageSettings>>, ApiError> {
    let settings = state
        .settings_service
        .set_backend(&ctx, req.backend)
        .await?;
    Ok(Json(ApiResponse::ok(settings)))
}
