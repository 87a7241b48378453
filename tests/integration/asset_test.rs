//! Integration tests for assets, versions and history.

mod helpers;

use axum::http::StatusCode;
use serde_json::{Value, json};

fn inline_version(folder: &str, basename: &str, blob: &str, publish: bool) -> Value {
    json!({
        "folder_path": folder,
        "basename": basename,
        "storage_id": blob,
        "publish": publish,
        "payload": { "size": 4, "content_type": "text/plain" },
    })
}

fn event_types(history: &Value) -> Vec<String> {
    history
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["event_type"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_create_asset_and_duplicate() {
    let app = helpers::TestApp::new().await;

    let created = app
        .request(
            "POST",
            "/api/assets",
            Some(json!({ "folder_path": "/docs/", "basename": " readme.md " })),
            Some("ana"),
        )
        .await;
    assert_eq!(created.status, StatusCode::CREATED);
    assert_eq!(created.data()["folder_path"], "docs");
    assert_eq!(created.data()["basename"], "readme.md");
    assert_eq!(created.data()["version_counter"], 0);
    assert_eq!(created.data()["published_version_id"], Value::Null);

    let duplicate = app
        .request(
            "POST",
            "/api/assets",
            Some(json!({ "folder_path": "docs", "basename": "readme.md" })),
            None,
        )
        .await;
    assert_eq!(duplicate.status, StatusCode::CONFLICT);
    assert_eq!(duplicate.error_code(), "ALREADY_EXISTS");
}

#[tokio::test]
async fn test_invalid_basename_is_rejected() {
    let app = helpers::TestApp::new().await;

    let response = app
        .request(
            "POST",
            "/api/assets",
            Some(json!({ "folder_path": "docs", "basename": "a/b" })),
            None,
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.error_code(), "INVALID_ARGUMENT");
}

#[tokio::test]
async fn test_draft_then_publish_lifecycle() {
    let app = helpers::TestApp::new().await;

    let v1 = app
        .commit_version(inline_version("site", "logo.svg", "blob-1", true))
        .await;
    assert_eq!(v1["version"], 1);
    assert_eq!(v1["state"], "published");

    let v2 = app
        .commit_version(inline_version("site", "logo.svg", "blob-2", false))
        .await;
    assert_eq!(v2["version"], 2);
    assert_eq!(v2["state"], "draft");

    let asset_id = v1["asset_id"].as_str().unwrap();
    let published = app
        .request("GET", &format!("/api/assets/{asset_id}/published"), None, None)
        .await;
    assert_eq!(published.data()["id"], v1["id"]);

    let publish = app
        .request(
            "POST",
            "/api/assets/publish",
            Some(json!({ "folder_path": "site", "basename": "logo.svg" })),
            Some("bo"),
        )
        .await;
    assert_eq!(publish.status, StatusCode::OK);
    assert_eq!(publish.data()["id"], v2["id"]);
    assert_eq!(publish.data()["state"], "published");
    assert_eq!(publish.data()["published_by"], "bo");

    let versions = app
        .request("GET", &format!("/api/assets/{asset_id}/versions"), None, None)
        .await;
    let states: Vec<&str> = versions
        .data()
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v["state"].as_str().unwrap())
        .collect();
    assert_eq!(states, vec!["archived", "published"]);

    let asset = app
        .request("GET", &format!("/api/assets/{asset_id}"), None, None)
        .await;
    assert_eq!(asset.data()["published_version_id"], v2["id"]);
    assert_eq!(asset.data()["draft_version_id"], Value::Null);
}

#[tokio::test]
async fn test_publish_without_draft_is_not_found() {
    let app = helpers::TestApp::new().await;
    app.commit_version(inline_version("site", "a.txt", "blob-1", true))
        .await;

    let response = app
        .request(
            "POST",
            "/api/assets/publish",
            Some(json!({ "folder_path": "site", "basename": "a.txt" })),
            None,
        )
        .await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_restore_creates_new_published_version() {
    let app = helpers::TestApp::new().await;
    let v1 = app
        .commit_version(inline_version("site", "a.txt", "blob-1", true))
        .await;
    app.commit_version(inline_version("site", "a.txt", "blob-2", true))
        .await;

    let v1_id = v1["id"].as_str().unwrap();
    let restored = app
        .request(
            "POST",
            &format!("/api/versions/{v1_id}/restore"),
            Some(json!({ "label": "rollback" })),
            None,
        )
        .await;
    assert_eq!(restored.status, StatusCode::OK);
    assert_eq!(restored.data()["version"], 3);
    assert_eq!(restored.data()["state"], "published");
    assert_eq!(restored.data()["label"], "rollback");
    assert_eq!(restored.data()["storage_ref"], json!({ "kind": "inline", "id": "blob-1" }));

    let original = app
        .request("GET", &format!("/api/versions/{v1_id}"), None, None)
        .await;
    assert_eq!(original.data()["state"], "archived");

    let asset_id = v1["asset_id"].as_str().unwrap();
    let history = app
        .request("GET", &format!("/api/assets/{asset_id}/history"), None, None)
        .await;
    assert_eq!(
        event_types(history.data()),
        vec!["create", "publish", "publish", "restore"]
    );
}

#[tokio::test]
async fn test_restore_without_body_and_unknown_version() {
    let app = helpers::TestApp::new().await;
    let v1 = app
        .commit_version(inline_version("site", "a.txt", "blob-1", true))
        .await;

    let v1_id = v1["id"].as_str().unwrap();
    let restored = app
        .send(
            "POST",
            &format!("/api/versions/{v1_id}/restore"),
            Default::default(),
            None,
            None,
        )
        .await;
    assert_eq!(restored.status, StatusCode::OK);
    assert_eq!(restored.data()["version"], 2);
    assert_eq!(restored.data()["label"], "Restored from v1");

    let missing = app
        .request(
            "POST",
            "/api/versions/00000000-0000-0000-0000-000000000000/restore",
            None,
            None,
        )
        .await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_move_and_rename() {
    let app = helpers::TestApp::new().await;
    let v1 = app
        .commit_version(inline_version("inbox", "scan.pdf", "blob-1", true))
        .await;

    let moved = app
        .request(
            "POST",
            "/api/assets/move",
            Some(json!({
                "from_folder_path": "inbox",
                "basename": "scan.pdf",
                "to_folder_path": "archive/2026",
            })),
            None,
        )
        .await;
    assert_eq!(moved.status, StatusCode::OK);
    assert_eq!(moved.data()["folder_path"], "archive/2026");

    let renamed = app
        .request(
            "POST",
            "/api/assets/rename",
            Some(json!({
                "folder_path": "archive/2026",
                "basename": "scan.pdf",
                "new_basename": "invoice.pdf",
            })),
            None,
        )
        .await;
    assert_eq!(renamed.status, StatusCode::OK);
    assert_eq!(renamed.data()["basename"], "invoice.pdf");
    assert_eq!(renamed.data()["id"], v1["asset_id"]);

    let old = app
        .request("GET", "/api/assets/lookup?folder=inbox&basename=scan.pdf", None, None)
        .await;
    assert_eq!(old.status, StatusCode::NOT_FOUND);

    let listed = app
        .request("GET", "/api/assets/published?folder=archive/2026", None, None)
        .await;
    let names: Vec<&str> = listed
        .data()
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["basename"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["invoice.pdf"]);

    let asset_id = v1["asset_id"].as_str().unwrap();
    let history = app
        .request("GET", &format!("/api/assets/{asset_id}/history"), None, None)
        .await;
    assert_eq!(
        event_types(history.data()),
        vec!["create", "publish", "move", "rename"]
    );
}

#[tokio::test]
async fn test_rename_onto_existing_asset_conflicts() {
    let app = helpers::TestApp::new().await;
    app.commit_version(inline_version("d", "a.txt", "blob-1", true))
        .await;
    app.commit_version(inline_version("d", "b.txt", "blob-2", true))
        .await;

    let response = app
        .request(
            "POST",
            "/api/assets/rename",
            Some(json!({ "folder_path": "d", "basename": "a.txt", "new_basename": "b.txt" })),
            None,
        )
        .await;

    assert_eq!(response.status, StatusCode::CONFLICT);
    assert_eq!(response.error_code(), "ALREADY_EXISTS");
}

#[tokio::test]
async fn test_listing_separates_drafts_from_published() {
    let app = helpers::TestApp::new().await;
    app.commit_version(inline_version("d", "live.txt", "blob-1", true))
        .await;
    app.commit_version(inline_version("d", "wip.txt", "blob-2", false))
        .await;

    let all = app.request("GET", "/api/assets?folder=d", None, None).await;
    assert_eq!(all.data().as_array().unwrap().len(), 2);

    let published = app
        .request("GET", "/api/assets/published?folder=d", None, None)
        .await;
    let rows = published.data().as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["basename"], "live.txt");
    assert_eq!(rows[0]["version"], 1);
}

#[tokio::test]
async fn test_unknown_asset_endpoints() {
    let app = helpers::TestApp::new().await;
    let id = "00000000-0000-0000-0000-000000000001";

    for path in [
        format!("/api/assets/{id}"),
        format!("/api/assets/{id}/versions"),
        format!("/api/assets/{id}/published"),
        format!("/api/assets/{id}/history"),
        format!("/api/versions/{id}"),
    ] {
        let response = app.request("GET", &path, None, None).await;
        assert_eq!(response.status, StatusCode::NOT_FOUND, "{path}");
    }
}
