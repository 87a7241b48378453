//! Public read path: serves published versions to anonymous readers.

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use uuid::Uuid;

use assethub_core::error::{AppError, ErrorKind};
use assethub_service::ServeOutcome;
use assethub_service::serving::REDIRECT_CACHE_CONTROL;
use assethub_storage::mime::DEFAULT_CONTENT_TYPE;

use crate::error::ApiError;
use crate::state::AppState;

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, "Not Found").into_response()
}

fn build(builder: axum::http::response::Builder, body: Body) -> Result<Response, ApiError> {
    builder
        .body(body)
        .map_err(|e| AppError::internal(format!("Failed to build response: {e}")).into())
}

/// GET {base}/v/{version_id}
///
/// Small versions are streamed with an immutable cache policy, larger ones
/// redirect to a short-lived download URL. Anything not published is 404.
pub async fn serve_version(
    State(state): State<AppState>,
    Path(version_id): Path<String>,
) -> Result<Response, ApiError> {
    let Ok(version_id) = Uuid::parse_str(&version_id) else {
        return Ok(not_found());
    };

    match state.serving_service.resolve_for_serving(version_id).await? {
        ServeOutcome::Blob {
            storage_ref,
            content_type,
            size,
            cache_control,
        } => {
            let stream = match state.serving_service.open(&storage_ref).await {
                Ok(stream) => stream,
                Err(e) if e.kind == ErrorKind::NotFound => {
                    tracing::warn!(version_id = %version_id, "Published version has no bytes");
                    return Ok(not_found());
                }
                Err(e) => return Err(e.into()),
            };
            build(
                Response::builder()
                    .status(StatusCode::OK)
                    .header(header::CONTENT_TYPE, content_type)
                    .header(header::CONTENT_LENGTH, size)
                    .header(header::CACHE_CONTROL, cache_control),
                Body::from_stream(stream),
            )
        }
        ServeOutcome::Redirect {
            location,
            cache_control,
        } => build(
            Response::builder()
                .status(StatusCode::FOUND)
                .header(header::LOCATION, location)
                .header(header::CACHE_CONTROL, cache_control),
            Body::empty(),
        ),
        ServeOutcome::NotServable => Ok(not_found()),
    }
}

/// GET {base}/blobs/{blob_id}
///
/// Streams an inline blob; the redirect target for inline versions whose
/// size is unknown or above the direct-serve threshold. Only blobs backing a
/// published version are served.
pub async fn serve_blob(
    State(state): State<AppState>,
    Path(blob_id): Path<String>,
) -> Result<Response, ApiError> {
    let stream = match state.serving_service.open_published_blob(&blob_id).await {
        Ok(Some(stream)) => stream,
        Ok(None) => return Ok(not_found()),
        Err(e) if matches!(e.kind, ErrorKind::NotFound | ErrorKind::Validation) => {
            return Ok(not_found());
        }
        Err(e) => return Err(e.into()),
    };
    build(
        Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, DEFAULT_CONTENT_TYPE)
            .header(header::CACHE_CONTROL, REDIRECT_CACHE_CONTROL),
        Body::from_stream(stream),
    )
}
