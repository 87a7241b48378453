//! Folder directory handlers.

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;

use assethub_core::error::AppError;
use assethub_entity::folder::Folder;
use assethub_service::folder::{
    CreateFolderByNameRequest, CreateFolderRequest, UpdateFolderRequest,
};

use crate::dto::request::{ParentQuery, PathQuery};
use crate::dto::response::ApiResponse;
use crate::error::ApiError;
use crate::extractors::Actor;
use crate::state::AppState;

/// GET /api/folders?parent=...
pub async fn list_children(
    State(state): State<AppState>,
    Query(query): Query<ParentQuery>,
) -> Result<Json<ApiResponse<Vec<Folder>>>, ApiError> {
    let folders = state
        .folder_service
        .list_children(query.parent.as_deref())
        .await?;
    Ok(Json(ApiResponse::ok(folders)))
}

/// GET /api/folders/lookup?path=...
pub async fn lookup(
    State(state): State<AppState>,
    Query(query): Query<PathQuery>,
) -> Result<Json<ApiResponse<Folder>>, ApiError> {
    let folder = state
        .folder_service
        .get(&query.path)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Folder '{}' not found", query.path)))?;
    Ok(Json(ApiResponse::ok(folder)))
}

/// POST /api/folders
pub async fn create(
    State(state): State<AppState>,
    Actor(ctx): Actor,
    Json(req): Json<CreateFolderRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Folder>>), ApiError> {
    let folder = state.folder_service.create_by_path(&ctx, req).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(folder))))
}

/// POST /api/folders/by-name
pub async fn create_by_name(
    State(state): State<AppState>,
    Actor(ctx): Actor,
    Json(req): Json<CreateFolderByNameRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Folder>>), ApiError> {
    let folder = state.folder_service.create_by_name(&ctx, req).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(folder))))
}

/// PATCH /api/folders
pub async fn update(
    State(state): State<AppState>,
    Actor(ctx): Actor,
    Json(req): Json<UpdateFolderRequest>,
) -> Result<Json<ApiResponse<Folder>>, ApiError> {
    let folder = state.folder_service.update(&ctx, req).await?;
    Ok(Json(ApiResponse::ok(folder)))
}
