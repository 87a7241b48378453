//! Health check handler.

use axum::Json;
use axum::extract::State;

use assethub_core::error::AppError;

use crate::dto::response::{ApiResponse, HealthResponse, ProviderHealth};
use crate::error::ApiError;
use crate::state::AppState;

/// GET /api/health
pub async fn health(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<HealthResponse>>, ApiError> {
    if !state.store.health_check().await.unwrap_or(false) {
        return Err(AppError::service_unavailable("Metadata store is unreachable").into());
    }

    let storage: Vec<ProviderHealth> = state
        .storage
        .health_check_all()
        .await
        .into_iter()
        .map(|(role, healthy)| ProviderHealth {
            role: role.to_string(),
            healthy,
        })
        .collect();
    let status = if storage.iter().all(|p| p.healthy) {
        "ok"
    } else {
        "degraded"
    };

    Ok(Json(ApiResponse::ok(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        store: state.store.backend_name().to_string(),
        storage,
    })))
}
