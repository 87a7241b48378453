//! Route definitions for the AssetHub HTTP API.
//!
//! Management routes are mounted under `/api`; the public read path is
//! mounted under the configured serving base path.

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{get, post},
};

use crate::handlers;
use crate::middleware;
use crate::state::AppState;

/// Build the Axum router with all routes and request logging.
pub fn build_router(state: AppState) -> Router {
    let max_upload = usize::try_from(state.config.storage.upload.max_inline_upload_bytes)
        .unwrap_or(usize::MAX);
    let serve_base = state.config.serving.normalized_base_path();

    let api_routes = Router::new()
        .merge(health_routes())
        .merge(folder_routes())
        .merge(asset_routes())
        .merge(version_routes())
        .merge(upload_routes(max_upload))
        .merge(settings_routes());

    let router = Router::new().nest("/api", api_routes);
    let router = if serve_base == "/" {
        router.merge(serve_routes())
    } else {
        router.nest(&serve_base, serve_routes())
    };

    router
        .layer(axum_middleware::from_fn(middleware::logging::request_logging))
        .with_state(state)
}

fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health::health))
}

fn folder_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/folders",
            get(handlers::folder::list_children)
                .post(handlers::folder::create)
                .patch(handlers::folder::update),
        )
        .route("/folders/lookup", get(handlers::folder::lookup))
        .route("/folders/by-name", post(handlers::folder::create_by_name))
}

fn asset_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/assets",
            get(handlers::asset::list).post(handlers::asset::create),
        )
        .route("/assets/published", get(handlers::asset::list_published))
        .route("/assets/lookup", get(handlers::asset::lookup))
        .route("/assets/publish", post(handlers::asset::publish))
        .route("/assets/move", post(handlers::asset::move_asset))
        .route("/assets/rename", post(handlers::asset::rename))
        .route("/assets/{id}", get(handlers::asset::get))
        .route("/assets/{id}/versions", get(handlers::asset::versions))
        .route("/assets/{id}/published", get(handlers::asset::published))
        .route("/assets/{id}/history", get(handlers::asset::history))
}

fn version_routes() -> Router<AppState> {
    Router::new()
        .route("/versions", post(handlers::version::create))
        .route("/versions/{id}", get(handlers::version::get))
        .route("/versions/{id}/restore", post(handlers::version::restore))
}

fn upload_routes(max_upload: usize) -> Router<AppState> {
    Router::new()
        .route("/uploads", post(handlers::upload::start))
        .route(
            "/uploads/{id}/blob",
            post(handlers::upload::push_blob).layer(DefaultBodyLimit::max(max_upload)),
        )
        .route("/uploads/{id}/finish", post(handlers::upload::finish))
}

fn settings_routes() -> Router<AppState> {
    Router::new().route(
        "/settings/storage",
        get(handlers::settings::get_storage).put(handlers::settings::set_storage),
    )
}

fn serve_routes() -> Router<AppState> {
    Router::new()
        .route("/v/{version_id}", get(handlers::serve::serve_version))
        .route("/blobs/{blob_id}", get(handlers::serve::serve_blob))
}
