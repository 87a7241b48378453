//! Shared test helpers for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use bytes::Bytes;
use serde_json::{Value, json};
use tower::ServiceExt;

use assethub_api::{AppState, build_app};
use assethub_core::config::AppConfig;
use assethub_database::MemoryStore;
use assethub_service::RequestContext;
use assethub_storage::StorageManager;
use assethub_storage::providers::MemoryStorageProvider;

/// Presign base of the fake external object store.
pub const EXTERNAL_BASE: &str = "https://s3.test";

/// Test application context
pub struct TestApp {
    /// The Axum router for making test requests
    pub router: Router,
    /// Wired services for direct setup and inspection
    pub state: AppState,
}

impl TestApp {
    /// Create a new test application over in-memory backends
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    /// Create a test application after adjusting the default configuration
    pub async fn with_config(adjust: impl FnOnce(&mut AppConfig)) -> Self {
        let mut config = AppConfig::default();
        config.worker.enabled = false;
        adjust(&mut config);

        let storage = StorageManager::with_providers(
            Arc::new(MemoryStorageProvider::new()),
            Some(Arc::new(MemoryStorageProvider::with_presign_base(EXTERNAL_BASE))),
            &config,
        );
        let state = AppState::new(config, Arc::new(MemoryStore::new()), Arc::new(storage))
            .expect("Failed to build state");
        state.settings_service.seed().await.expect("Failed to seed settings");
        state
            .folder_service
            .ensure_root(&RequestContext::system())
            .await
            .expect("Failed to create root folder");

        Self {
            router: build_app(state.clone()),
            state,
        }
    }

    /// Make a JSON request, optionally attributed to an actor
    pub async fn request(
        &self,
        method: &str,
        path: &str,
        body: Option<Value>,
        actor: Option<&str>,
    ) -> TestResponse {
        let body = body
            .map(|b| Bytes::from(serde_json::to_vec(&b).expect("Failed to serialize body")))
            .unwrap_or_default();
        self.send(method, path, body, Some("application/json"), actor).await
    }

    /// Make a request with a raw body
    pub async fn send(
        &self,
        method: &str,
        path: &str,
        body: Bytes,
        content_type: Option<&str>,
        actor: Option<&str>,
    ) -> TestResponse {
        let mut req = Request::builder().method(method).uri(path);
        if let Some(content_type) = content_type {
            req = req.header("Content-Type", content_type);
        }
        if let Some(actor) = actor {
            req = req.header("X-Actor", actor);
        }
        let req = req.body(Body::from(body)).expect("Failed to build request");

        let response = self
            .router
            .clone()
            .oneshot(req)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let headers = response.headers().clone();
        let raw = axum::body::to_bytes(response.into_body(), 64 * 1024 * 1024)
            .await
            .expect("Failed to read body");
        let body: Value = serde_json::from_slice(&raw).unwrap_or(Value::Null);

        TestResponse {
            status,
            headers,
            body,
            raw,
        }
    }

    /// Create a folder at `path`
    pub async fn create_folder(&self, path: &str) -> Value {
        let response = self
            .request("POST", "/api/folders", Some(json!({ "path": path })), None)
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
        response.data().clone()
    }

    /// Commit a version over an already stored blob or object
    pub async fn commit_version(&self, body: Value) -> Value {
        let response = self.request("POST", "/api/versions", Some(body), None).await;
        assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
        response.data().clone()
    }

    /// Run the inline upload protocol end to end and return the finish payload
    pub async fn upload_inline(
        &self,
        folder: &str,
        basename: &str,
        bytes: &'static [u8],
        content_type: &str,
        publish: bool,
    ) -> Value {
        let ticket = self
            .request(
                "POST",
                "/api/uploads",
                Some(json!({
                    "folder_path": folder,
                    "basename": basename,
                    "filename": basename,
                    "publish": publish,
                })),
                None,
            )
            .await;
        assert_eq!(ticket.status, StatusCode::CREATED, "{:?}", ticket.body);
        let intent_id = ticket.data()["intent_id"].as_str().unwrap().to_string();

        let blob = self
            .send(
                "POST",
                &format!("/api/uploads/{intent_id}/blob"),
                Bytes::from_static(bytes),
                Some(content_type),
                None,
            )
            .await;
        assert_eq!(blob.status, StatusCode::OK, "{:?}", blob.body);

        let finished = self
            .request(
                "POST",
                &format!("/api/uploads/{intent_id}/finish"),
                Some(json!({ "upload_response": blob.data() })),
                None,
            )
            .await;
        assert_eq!(finished.status, StatusCode::CREATED, "{:?}", finished.body);
        finished.data().clone()
    }
}

/// Test response wrapper
pub struct TestResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// Response headers
    pub headers: HeaderMap,
    /// Parsed JSON body (`Null` when not JSON)
    pub body: Value,
    /// Raw body bytes
    pub raw: Bytes,
}

impl TestResponse {
    /// The `data` member of a success envelope
    pub fn data(&self) -> &Value {
        &self.body["data"]
    }

    /// The `error` code of an error body
    pub fn error_code(&self) -> &str {
        self.body["error"].as_str().unwrap_or_default()
    }

    /// A response header as a string
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}
