//! Upload intent handlers.

use axum::Json;
use axum::extract::{FromRequest, Multipart, Path, Request, State};
use axum::http::{StatusCode, header};
use bytes::Bytes;
use uuid::Uuid;

use assethub_core::error::AppError;
use assethub_service::upload::{FinishUploadRequest, FinishedUpload, StartUploadRequest, UploadTicket};
use assethub_storage::InlineBlob;

use crate::dto::response::ApiResponse;
use crate::error::ApiError;
use crate::extractors::Actor;
use crate::handlers::json_or_default;
use crate::state::AppState;

/// POST /api/uploads
pub async fn start(
    State(state): State<AppState>,
    Actor(ctx): Actor,
    Json(req): Json<StartUploadRequest>,
) -> Result<(StatusCode, Json<ApiResponse<UploadTicket>>), ApiError> {
    let ticket = state.upload_service.start_upload(&ctx, req).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(ticket))))
}

/// POST /api/uploads/{id}/blob
///
/// Accepts either a raw body or a multipart form whose first field holds
/// the file. The response body is what the client passes back to finish.
pub async fn push_blob(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    request: Request,
) -> Result<Json<ApiResponse<InlineBlob>>, ApiError> {
    let content_type = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let (data, content_type) = match content_type {
        Some(ct) if ct.starts_with("multipart/form-data") => {
            let mut multipart = Multipart::from_request(request, &state)
                .await
                .map_err(|e| AppError::validation(e.body_text()))?;
            let field = multipart
                .next_field()
                .await
                .map_err(|e| AppError::validation(e.body_text()))?
                .ok_or_else(|| AppError::validation("Multipart body has no file field"))?;
            let field_type = field.content_type().map(str::to_string);
            let data = field
                .bytes()
                .await
                .map_err(|e| AppError::validation(e.body_text()))?;
            (data, field_type)
        }
        other => {
            let data = Bytes::from_request(request, &state)
                .await
                .map_err(|e| AppError::validation(e.body_text()))?;
            (data, other)
        }
    };

    let blob = state
        .upload_service
        .accept_inline_blob(id, data, content_type)
        .await?;
    Ok(Json(ApiResponse::ok(blob)))
}

/// POST /api/uploads/{id}/finish
pub async fn finish(
    State(state): State<AppState>,
    Actor(ctx): Actor,
    Path(id): Path<Uuid>,
    body: Bytes,
) -> Result<(StatusCode, Json<ApiResponse<FinishedUpload>>), ApiError> {
    let req: FinishUploadRequest = json_or_default(&body)?;
    let finished = state.upload_service.finish_upload(&ctx, id, req).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(finished))))
}
