//! Integration tests for the folder directory.

mod helpers;

use axum::http::StatusCode;
use serde_json::json;

#[tokio::test]
async fn test_create_folder_normalizes_path() {
    let app = helpers::TestApp::new().await;

    let response = app
        .request(
            "POST",
            "/api/folders",
            Some(json!({ "path": "/Kanban//Backlog/" })),
            Some("ana"),
        )
        .await;

    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.data()["path"], "Kanban/Backlog");
    assert_eq!(response.data()["name"], "Backlog");
    assert_eq!(response.data()["depth"], 2);
    assert_eq!(response.data()["created_by"], "ana");
}

#[tokio::test]
async fn test_create_duplicate_folder_conflicts() {
    let app = helpers::TestApp::new().await;
    app.create_folder("docs").await;

    let response = app
        .request("POST", "/api/folders", Some(json!({ "path": "docs/" })), None)
        .await;

    assert_eq!(response.status, StatusCode::CONFLICT);
    assert_eq!(response.error_code(), "ALREADY_EXISTS");
}

#[tokio::test]
async fn test_create_folder_rejects_bad_paths() {
    let app = helpers::TestApp::new().await;

    for path in ["", "a/../b", "a/./b"] {
        let response = app
            .request("POST", "/api/folders", Some(json!({ "path": path })), None)
            .await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST, "path {path:?}");
        assert_eq!(response.error_code(), "INVALID_ARGUMENT");
    }
}

#[tokio::test]
async fn test_create_by_name_picks_free_slug() {
    let app = helpers::TestApp::new().await;
    app.create_folder("boards").await;

    let mut paths = Vec::new();
    for _ in 0..3 {
        let response = app
            .request(
                "POST",
                "/api/folders/by-name",
                Some(json!({ "parent_path": "boards", "name": "Sprint Review" })),
                None,
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED);
        assert_eq!(response.data()["name"], "Sprint Review");
        paths.push(response.data()["path"].as_str().unwrap().to_string());
    }

    assert_eq!(
        paths,
        vec![
            "boards/sprint-review",
            "boards/sprint-review-2",
            "boards/sprint-review-3"
        ]
    );
}

#[tokio::test]
async fn test_lookup_and_list_children() {
    let app = helpers::TestApp::new().await;
    for path in ["a", "a/x", "a/y", "a/y/deep", "b"] {
        app.create_folder(path).await;
    }

    let found = app.request("GET", "/api/folders/lookup?path=a/y", None, None).await;
    assert_eq!(found.status, StatusCode::OK);
    assert_eq!(found.data()["path"], "a/y");

    let missing = app.request("GET", "/api/folders/lookup?path=nope", None, None).await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
    assert_eq!(missing.error_code(), "NOT_FOUND");

    let children = app.request("GET", "/api/folders?parent=a", None, None).await;
    assert_eq!(children.status, StatusCode::OK);
    let paths: Vec<&str> = children
        .data()
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["path"].as_str().unwrap())
        .collect();
    assert_eq!(paths, vec!["a/x", "a/y"]);

    let roots = app.request("GET", "/api/folders", None, None).await;
    let paths: Vec<&str> = roots
        .data()
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["path"].as_str().unwrap())
        .collect();
    assert_eq!(paths, vec!["a", "b"]);
}

#[tokio::test]
async fn test_move_folder_carries_subtree_and_assets() {
    let app = helpers::TestApp::new().await;
    app.create_folder("projects/alpha").await;
    app.create_folder("projects/alpha/specs").await;
    app.request(
        "POST",
        "/api/assets",
        Some(json!({ "folder_path": "projects/alpha/specs", "basename": "plan.md" })),
        None,
    )
    .await;

    let response = app
        .request(
            "PATCH",
            "/api/folders",
            Some(json!({ "path": "projects/alpha", "new_path": "archive/alpha" })),
            Some("bo"),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.data()["path"], "archive/alpha");

    let moved = app
        .request("GET", "/api/folders/lookup?path=archive/alpha/specs", None, None)
        .await;
    assert_eq!(moved.status, StatusCode::OK);
    assert_eq!(moved.data()["depth"], 3);

    let asset = app
        .request(
            "GET",
            "/api/assets/lookup?folder=archive/alpha/specs&basename=plan.md",
            None,
            None,
        )
        .await;
    assert_eq!(asset.status, StatusCode::OK);

    let asset_id = asset.data()["id"].as_str().unwrap();
    let history = app
        .request("GET", &format!("/api/assets/{asset_id}/history"), None, None)
        .await;
    let last = history.data().as_array().unwrap().last().unwrap().clone();
    assert_eq!(last["event_type"], "move");
    assert_eq!(last["from_folder_path"], "projects/alpha/specs");
    assert_eq!(last["to_folder_path"], "archive/alpha/specs");
    assert_eq!(last["created_by"], "bo");
}

#[tokio::test]
async fn test_move_folder_into_itself_is_rejected() {
    let app = helpers::TestApp::new().await;
    app.create_folder("a").await;

    let response = app
        .request(
            "PATCH",
            "/api/folders",
            Some(json!({ "path": "a", "new_path": "a/b" })),
            None,
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}
