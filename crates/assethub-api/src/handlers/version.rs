//! Version handlers.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use bytes::Bytes;
use uuid::Uuid;

use assethub_core::error::AppError;
use assethub_entity::asset::AssetVersion;
use assethub_service::asset::StorageVersionRequest;

use crate::dto::request::RestoreRequest;
use crate::dto::response::ApiResponse;
use crate::error::ApiError;
use crate::extractors::Actor;
use crate::handlers::json_or_default;
use crate::state::AppState;

/// GET /api/versions/{id}
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<AssetVersion>>, ApiError> {
    let version = state
        .asset_service
        .get_version(id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Version {id} not found")))?;
    Ok(Json(ApiResponse::ok(version)))
}

/// POST /api/versions
///
/// Commits a version over bytes that already sit in a backend.
pub async fn create(
    State(state): State<AppState>,
    Actor(ctx): Actor,
    Json(req): Json<StorageVersionRequest>,
) -> Result<(StatusCode, Json<ApiResponse<AssetVersion>>), ApiError> {
    let version = state
        .asset_service
        .create_version_from_storage_id(&ctx, req)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(version))))
}

/// POST /api/versions/{id}/restore
pub async fn restore(
    State(state): State<AppState>,
    Actor(ctx): Actor,
    Path(id): Path<Uuid>,
    body: Bytes,
) -> Result<Json<ApiResponse<AssetVersion>>, ApiError> {
    let req: RestoreRequest = json_or_default(&body)?;
    let version = state
        .asset_service
        .restore_version(&ctx, id, req.label)
        .await?;
    Ok(Json(ApiResponse::ok(version)))
}
