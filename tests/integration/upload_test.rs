//! Integration tests for the upload intent protocol and storage settings.

mod helpers;

use axum::http::StatusCode;
use bytes::Bytes;
use serde_json::{Value, json};

async fn start(app: &helpers::TestApp, basename: &str, publish: bool) -> Value {
    let response = app
        .request(
            "POST",
            "/api/uploads",
            Some(json!({
                "folder_path": "media",
                "basename": basename,
                "filename": "Poster.PNG",
                "content_type": "image/png",
                "publish": publish,
                "label": "first cut",
            })),
            Some("ana"),
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
    response.data().clone()
}

#[tokio::test]
async fn test_inline_upload_roundtrip() {
    let app = helpers::TestApp::new().await;

    let ticket = start(&app, "poster.png", true).await;
    assert_eq!(ticket["backend"], "inline");
    assert_eq!(ticket["upload_method"], "POST");
    assert_eq!(ticket["backend_key"], Value::Null);
    let intent_id = ticket["intent_id"].as_str().unwrap();
    assert_eq!(
        ticket["upload_url"],
        format!("http://localhost:8080/api/uploads/{intent_id}/blob")
    );

    let blob = app
        .send(
            "POST",
            &format!("/api/uploads/{intent_id}/blob"),
            Bytes::from_static(b"abc"),
            Some("image/png"),
            None,
        )
        .await;
    assert_eq!(blob.status, StatusCode::OK);
    assert_eq!(blob.data()["size"], 3);
    assert_eq!(
        blob.data()["sha256"],
        "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
    );

    let finished = app
        .request(
            "POST",
            &format!("/api/uploads/{intent_id}/finish"),
            Some(json!({ "upload_response": blob.data() })),
            Some("ana"),
        )
        .await;
    assert_eq!(finished.status, StatusCode::CREATED);
    assert_eq!(finished.data()["version"], 1);

    let version_id = finished.data()["version_id"].as_str().unwrap();
    let version = app
        .request("GET", &format!("/api/versions/{version_id}"), None, None)
        .await;
    assert_eq!(version.data()["state"], "published");
    assert_eq!(version.data()["size"], 3);
    assert_eq!(version.data()["content_type"], "image/png");
    assert_eq!(version.data()["original_filename"], "Poster.PNG");
    assert_eq!(version.data()["label"], "first cut");
    assert_eq!(version.data()["created_by"], "ana");
}

#[tokio::test]
async fn test_finish_twice_conflicts() {
    let app = helpers::TestApp::new().await;
    let ticket = start(&app, "a.png", false).await;
    let intent_id = ticket["intent_id"].as_str().unwrap();

    let blob = app
        .send(
            "POST",
            &format!("/api/uploads/{intent_id}/blob"),
            Bytes::from_static(b"png"),
            Some("image/png"),
            None,
        )
        .await;
    let body = json!({ "upload_response": blob.data() });

    let first = app
        .request("POST", &format!("/api/uploads/{intent_id}/finish"), Some(body.clone()), None)
        .await;
    assert_eq!(first.status, StatusCode::CREATED);

    let second = app
        .request("POST", &format!("/api/uploads/{intent_id}/finish"), Some(body), None)
        .await;
    assert_eq!(second.status, StatusCode::CONFLICT);
    assert_eq!(second.error_code(), "CONFLICT");

    let late_bytes = app
        .send(
            "POST",
            &format!("/api/uploads/{intent_id}/blob"),
            Bytes::from_static(b"more"),
            None,
            None,
        )
        .await;
    assert_eq!(late_bytes.status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_finish_inline_requires_upload_response() {
    let app = helpers::TestApp::new().await;
    let ticket = start(&app, "a.png", false).await;
    let intent_id = ticket["intent_id"].as_str().unwrap();

    let response = app
        .request("POST", &format!("/api/uploads/{intent_id}/finish"), None, None)
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_finish_rejects_unpushed_blob_id() {
    let app = helpers::TestApp::new().await;
    let ticket = start(&app, "a.png", true).await;
    let intent_id = ticket["intent_id"].as_str().unwrap();
    let finish = format!("/api/uploads/{intent_id}/finish");

    let forged = app
        .request(
            "POST",
            &finish,
            Some(json!({ "upload_response": { "storage_id": "does-not-exist", "size": 3 } })),
            None,
        )
        .await;
    assert_eq!(forged.status, StatusCode::BAD_REQUEST);
    assert_eq!(forged.error_code(), "INVALID_ARGUMENT");

    let missing = app
        .request("GET", "/api/assets/lookup?folder=media&basename=a.png", None, None)
        .await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);

    let blob = app
        .send(
            "POST",
            &format!("/api/uploads/{intent_id}/blob"),
            Bytes::from_static(b"png"),
            Some("image/png"),
            None,
        )
        .await;
    let finished = app
        .request("POST", &finish, Some(json!({ "upload_response": blob.data() })), None)
        .await;
    assert_eq!(finished.status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_unknown_intent() {
    let app = helpers::TestApp::new().await;

    let response = app
        .request(
            "POST",
            "/api/uploads/00000000-0000-0000-0000-000000000000/finish",
            Some(json!({})),
            None,
        )
        .await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_expired_intent_is_gone() {
    let app = helpers::TestApp::with_config(|config| {
        config.storage.upload.intent_ttl_seconds = 0;
    })
    .await;
    let ticket = start(&app, "a.png", false).await;
    let intent_id = ticket["intent_id"].as_str().unwrap();

    let response = app
        .send(
            "POST",
            &format!("/api/uploads/{intent_id}/blob"),
            Bytes::from_static(b"png"),
            None,
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::GONE);
    assert_eq!(response.error_code(), "EXPIRED");

    let swept = app.state.upload_service.sweep_expired().await.unwrap();
    assert_eq!(swept, 1);
}

#[tokio::test]
async fn test_multipart_blob_push() {
    let app = helpers::TestApp::new().await;
    let ticket = start(&app, "notes.txt", true).await;
    let intent_id = ticket["intent_id"].as_str().unwrap();

    let boundary = "XBOUNDARYX";
    let body = format!(
        "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"notes.txt\"\r\n\
         Content-Type: text/plain\r\n\r\nhello\r\n--{boundary}--\r\n"
    );
    let blob = app
        .send(
            "POST",
            &format!("/api/uploads/{intent_id}/blob"),
            Bytes::from(body),
            Some(&format!("multipart/form-data; boundary={boundary}")),
            None,
        )
        .await;

    assert_eq!(blob.status, StatusCode::OK, "{:?}", blob.body);
    assert_eq!(blob.data()["size"], 5);
    assert_eq!(blob.data()["content_type"], "text/plain");
}

#[tokio::test]
async fn test_inline_size_limit() {
    let app = helpers::TestApp::with_config(|config| {
        config.storage.upload.max_inline_upload_bytes = 4;
    })
    .await;
    let ticket = start(&app, "a.bin", false).await;
    let intent_id = ticket["intent_id"].as_str().unwrap();

    let response = app
        .send(
            "POST",
            &format!("/api/uploads/{intent_id}/blob"),
            Bytes::from_static(b"too large"),
            Some("application/octet-stream"),
            None,
        )
        .await;

    assert!(response.status.is_client_error());
}

#[tokio::test]
async fn test_external_upload_flow() {
    let app = helpers::TestApp::new().await;

    let settings = app.request("GET", "/api/settings/storage", None, None).await;
    assert_eq!(settings.data()["backend"], "inline");

    let switched = app
        .request(
            "PUT",
            "/api/settings/storage",
            Some(json!({ "backend": "external" })),
            Some("ops"),
        )
        .await;
    assert_eq!(switched.status, StatusCode::OK);
    assert_eq!(switched.data()["backend"], "external");
    assert_eq!(switched.data()["updated_by"], "ops");

    let ticket = start(&app, "poster.png", true).await;
    let intent_id = ticket["intent_id"].as_str().unwrap();
    assert_eq!(ticket["backend"], "external");
    assert_eq!(ticket["upload_method"], "PUT");
    assert_eq!(ticket["backend_key"], format!("assets/{intent_id}.png"));
    assert_eq!(
        ticket["upload_url"],
        format!("{}/assets/{intent_id}.png?X-Method=PUT&X-Expires=3600", helpers::EXTERNAL_BASE)
    );

    let inline_push = app
        .send(
            "POST",
            &format!("/api/uploads/{intent_id}/blob"),
            Bytes::from_static(b"png"),
            None,
            None,
        )
        .await;
    assert_eq!(inline_push.status, StatusCode::BAD_REQUEST);

    let finished = app
        .request(
            "POST",
            &format!("/api/uploads/{intent_id}/finish"),
            Some(json!({ "size": 1234, "content_type": "image/png" })),
            None,
        )
        .await;
    assert_eq!(finished.status, StatusCode::CREATED);

    let version_id = finished.data()["version_id"].as_str().unwrap();
    let version = app
        .request("GET", &format!("/api/versions/{version_id}"), None, None)
        .await;
    assert_eq!(
        version.data()["storage_ref"],
        json!({ "kind": "external", "key": format!("assets/{intent_id}.png") })
    );
    assert_eq!(version.data()["size"], 1234);
}
