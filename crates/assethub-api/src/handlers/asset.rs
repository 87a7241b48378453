//! Asset handlers: listing, lookup, lifecycle and relocation.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use uuid::Uuid;

use assethub_core::error::AppError;
use assethub_entity::asset::{Asset, AssetVersion, PublishedAsset};
use assethub_entity::event::AssetEvent;
use assethub_service::asset::{CreateAssetRequest, MoveAssetRequest, RenameAssetRequest};

use crate::dto::request::{AssetKeyRequest, AssetLookupQuery, FolderQuery};
use crate::dto::response::ApiResponse;
use crate::error::ApiError;
use crate::extractors::Actor;
use crate::state::AppState;

/// GET /api/assets?folder=...
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<FolderQuery>,
) -> Result<Json<ApiResponse<Vec<Asset>>>, ApiError> {
    let assets = state
        .asset_service
        .list_assets_in_folder(&query.folder)
        .await?;
    Ok(Json(ApiResponse::ok(assets)))
}

/// GET /api/assets/published?folder=...
pub async fn list_published(
    State(state): State<AppState>,
    Query(query): Query<FolderQuery>,
) -> Result<Json<ApiResponse<Vec<PublishedAsset>>>, ApiError> {
    let assets = state
        .asset_service
        .list_published_assets_in_folder(&query.folder)
        .await?;
    Ok(Json(ApiResponse::ok(assets)))
}

/// POST /api/assets
pub async fn create(
    State(state): State<AppState>,
    Actor(ctx): Actor,
    Json(req): Json<CreateAssetRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Asset>>), ApiError> {
    let asset = state.asset_service.create_asset(&ctx, req).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(asset))))
}

/// GET /api/assets/lookup?folder=...&basename=...
pub async fn lookup(
    State(state): State<AppState>,
    Query(query): Query<AssetLookupQuery>,
) -> Result<Json<ApiResponse<Asset>>, ApiError> {
    let asset = state
        .asset_service
        .get_asset(&query.folder, &query.basename)
        .await?
        .ok_or_else(|| {
            AppError::not_found(format!(
                "Asset '{}' not found in '{}'",
                query.basename, query.folder
            ))
        })?;
    Ok(Json(ApiResponse::ok(asset)))
}

/// GET /api/assets/{id}
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Asset>>, ApiError> {
    let asset = state
        .asset_service
        .get_asset_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Asset {id} not found")))?;
    Ok(Json(ApiResponse::ok(asset)))
}

/// GET /api/assets/{id}/versions
pub async fn versions(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<AssetVersion>>>, ApiError> {
    if state.asset_service.get_asset_by_id(id).await?.is_none() {
        return Err(AppError::not_found(format!("Asset {id} not found")).into());
    }
    let versions = state.asset_service.get_versions(id).await?;
    Ok(Json(ApiResponse::ok(versions)))
}

/// GET /api/assets/{id}/published
pub async fn published(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<AssetVersion>>, ApiError> {
    let version = state
        .asset_service
        .get_published_version(id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Asset {id} has no published version")))?;
    Ok(Json(ApiResponse::ok(version)))
}

/// GET /api/assets/{id}/history
pub async fn history(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<AssetEvent>>>, ApiError> {
    let events = state.event_log.history(id).await?;
    Ok(Json(ApiResponse::ok(events)))
}

/// POST /api/assets/publish
pub async fn publish(
    State(state): State<AppState>,
    Actor(ctx): Actor,
    Json(req): Json<AssetKeyRequest>,
) -> Result<Json<ApiResponse<AssetVersion>>, ApiError> {
    let version = state
        .asset_service
        .publish_draft(&ctx, &req.folder_path, &req.basename)
        .await?;
    Ok(Json(ApiResponse::ok(version)))
}

/// POST /api/assets/move
pub async fn move_asset(
    State(state): State<AppState>,
    Actor(ctx): Actor,
    Json(req): Json<MoveAssetRequest>,
) -> Result<Json<ApiResponse<Asset>>, ApiError> {
    let asset = state.asset_service.move_asset(&ctx, req).await?;
    Ok(Json(ApiResponse::ok(asset)))
}

/// POST /api/assets/rename
pub async fn rename(
    State(state): State<AppState>,
    Actor(ctx): Actor,
    Json(req): Json<RenameAssetRequest>,
) -> Result<Json<ApiResponse<Asset>>, ApiError> {
    let asset = state.asset_service.rename_asset(&ctx, req).await?;
    Ok(Json(ApiResponse::ok(asset)))
}
