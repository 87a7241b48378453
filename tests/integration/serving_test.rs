//! Integration tests for the public read path.

mod helpers;

use axum::http::StatusCode;
use serde_json::json;

const TWENTY_MIB: i64 = 20 * 1024 * 1024;

#[tokio::test]
async fn test_small_published_version_is_streamed() {
    let app = helpers::TestApp::new().await;
    let finished = app
        .upload_inline("site", "hello.txt", b"hello world", "text/plain", true)
        .await;
    let version_id = finished["version_id"].as_str().unwrap();

    let response = app
        .send("GET", &format!("/files/v/{version_id}"), Default::default(), None, None)
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.raw.as_ref(), b"hello world");
    assert_eq!(response.header("content-type"), Some("text/plain"));
    assert_eq!(response.header("content-length"), Some("11"));
    assert_eq!(
        response.header("cache-control"),
        Some("public, max-age=31536000, immutable")
    );
}

#[tokio::test]
async fn test_large_external_version_redirects() {
    let app = helpers::TestApp::new().await;
    let version = app
        .commit_version(json!({
            "folder_path": "video",
            "basename": "intro.mp4",
            "backend": "external",
            "storage_id": "assets/intro.mp4",
            "publish": true,
            "payload": { "size": TWENTY_MIB + 1, "content_type": "video/mp4" },
        }))
        .await;
    let version_id = version["id"].as_str().unwrap();

    let response = app
        .send("GET", &format!("/files/v/{version_id}"), Default::default(), None, None)
        .await;

    assert_eq!(response.status, StatusCode::FOUND);
    assert_eq!(
        response.header("location"),
        Some("https://s3.test/assets/intro.mp4?X-Method=GET&X-Expires=300")
    );
    assert_eq!(response.header("cache-control"), Some("public, max-age=60"));
}

#[tokio::test]
async fn test_unknown_size_redirects_to_inline_blob() {
    let app = helpers::TestApp::new().await;
    let blob = app
        .state
        .storage
        .write_inline_blob(bytes::Bytes::from_static(b"raw bytes"), None)
        .await
        .unwrap();
    let version = app
        .commit_version(json!({
            "folder_path": "misc",
            "basename": "blob.bin",
            "storage_id": blob.storage_id,
            "publish": true,
        }))
        .await;
    let version_id = version["id"].as_str().unwrap();

    let response = app
        .send("GET", &format!("/files/v/{version_id}"), Default::default(), None, None)
        .await;
    assert_eq!(response.status, StatusCode::FOUND);
    let location = response.header("location").unwrap().to_string();
    assert_eq!(
        location,
        format!("http://localhost:8080/files/blobs/{}", blob.storage_id)
    );

    let path = location.trim_start_matches("http://localhost:8080");
    let followed = app.send("GET", path, Default::default(), None, None).await;
    assert_eq!(followed.status, StatusCode::OK);
    assert_eq!(followed.raw.as_ref(), b"raw bytes");
    assert_eq!(followed.header("cache-control"), Some("public, max-age=60"));
}

#[tokio::test]
async fn test_blob_route_hides_unpublished_bytes() {
    let app = helpers::TestApp::new().await;
    let first = app
        .upload_inline("site", "page.html", b"old release", "text/html", true)
        .await;
    let current = app
        .upload_inline("site", "page.html", b"current release", "text/html", true)
        .await;
    let draft = app
        .upload_inline("site", "page.html", b"unpublished draft", "text/html", false)
        .await;

    let mut blob_ids = Vec::new();
    for finished in [&first, &current, &draft] {
        let version_id = finished["version_id"].as_str().unwrap();
        let version = app
            .request("GET", &format!("/api/versions/{version_id}"), None, None)
            .await;
        blob_ids.push(version.data()["storage_ref"]["id"].as_str().unwrap().to_string());
    }

    for (blob_id, expected) in blob_ids
        .iter()
        .zip([StatusCode::NOT_FOUND, StatusCode::OK, StatusCode::NOT_FOUND])
    {
        let response = app
            .send("GET", &format!("/files/blobs/{blob_id}"), Default::default(), None, None)
            .await;
        assert_eq!(response.status, expected, "{blob_id}");
    }
}

#[tokio::test]
async fn test_unpublished_and_unknown_versions_are_not_found() {
    let app = helpers::TestApp::new().await;
    let first = app
        .upload_inline("site", "a.txt", b"one", "text/plain", true)
        .await;
    app.upload_inline("site", "a.txt", b"two", "text/plain", true)
        .await;
    let draft = app
        .upload_inline("site", "a.txt", b"three", "text/plain", false)
        .await;

    for id in [
        first["version_id"].as_str().unwrap(),
        draft["version_id"].as_str().unwrap(),
        "00000000-0000-0000-0000-000000000000",
        "not-a-uuid",
    ] {
        let response = app
            .send("GET", &format!("/files/v/{id}"), Default::default(), None, None)
            .await;
        assert_eq!(response.status, StatusCode::NOT_FOUND, "{id}");
    }

    let missing_blob = app
        .send("GET", "/files/blobs/nope", Default::default(), None, None)
        .await;
    assert_eq!(missing_blob.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_custom_serving_base_path() {
    let app = helpers::TestApp::with_config(|config| {
        config.serving.base_path = "media/".into();
    })
    .await;
    let finished = app
        .upload_inline("site", "a.txt", b"abc", "text/plain", true)
        .await;
    let version_id = finished["version_id"].as_str().unwrap();

    let response = app
        .send("GET", &format!("/media/v/{version_id}"), Default::default(), None, None)
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let old = app
        .send("GET", &format!("/files/v/{version_id}"), Default::default(), None, None)
        .await;
    assert_eq!(old.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_health() {
    let app = helpers::TestApp::new().await;

    let response = app.request("GET", "/api/health", None, None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.data()["status"], "ok");
    assert_eq!(response.data()["store"], "memory");
    assert_eq!(response.data()["storage"].as_array().unwrap().len(), 2);
}
