//! Application builder: wires router, middleware and state into an Axum app.

use std::future::IntoFuture;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tokio::sync::Notify;
use tower_http::trace::TraceLayer;

use assethub_core::config::AppConfig;
use assethub_core::error::AppError;
use assethub_database::connect_store;
use assethub_service::RequestContext;
use assethub_storage::StorageManager;
use assethub_worker::{CronScheduler, IntentSweepJob};

use crate::middleware::cors::build_cors_layer;
use crate::router::build_router;
use crate::state::AppState;

/// Builds the complete Axum application with all routes and middleware.
pub fn build_app(state: AppState) -> Router {
    let cors = build_cors_layer(&state.config.server.cors);
    build_router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Connect backends, wire services and seed the records every deployment
/// needs (storage settings, root folder).
pub async fn bootstrap(config: AppConfig) -> Result<AppState, AppError> {
    let store = connect_store(&config.database).await?;
    let storage = Arc::new(StorageManager::from_config(&config).await?);
    let state = AppState::new(config, store, storage)?;

    let ctx = RequestContext::system();
    state.settings_service.seed().await?;
    state.folder_service.ensure_root(&ctx).await?;
    Ok(state)
}

/// Runs the AssetHub server until a shutdown signal arrives.
pub async fn run_server(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting AssetHub server...");

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let grace = Duration::from_secs(config.server.shutdown_grace_seconds);
    let state = bootstrap(config).await?;

    // ── Background jobs ──────────────────────────────────────────
    let mut scheduler = if state.config.worker.enabled {
        let scheduler = CronScheduler::new(state.config.worker.clone()).await?;
        scheduler
            .register_intent_sweep(IntentSweepJob::new(state.upload_service.as_ref().clone()))
            .await?;
        scheduler.start().await?;
        Some(scheduler)
    } else {
        tracing::info!("Background worker disabled");
        None
    };

    // ── HTTP server ──────────────────────────────────────────────
    let app = build_app(state);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;

    tracing::info!("AssetHub server listening on {}", addr);

    let stopping = Arc::new(Notify::new());
    let signal = Arc::clone(&stopping);
    let server = axum::serve(listener, app).with_graceful_shutdown(async move {
        shutdown_signal().await;
        signal.notify_one();
    });
    let drain_deadline = async {
        stopping.notified().await;
        tokio::time::sleep(grace).await;
    };

    tokio::select! {
        result = server.into_future() => {
            result.map_err(|e| AppError::internal(format!("Server error: {e}")))?;
        }
        () = drain_deadline => {
            tracing::warn!(grace_seconds = grace.as_secs(), "Graceful shutdown timed out");
        }
    }

    if let Some(scheduler) = scheduler.as_mut() {
        scheduler.shutdown().await?;
    }
    tracing::info!("AssetHub server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
