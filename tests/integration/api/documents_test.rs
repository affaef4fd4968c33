//! Document lifecycle endpoint tests
//!
//! Creation, listing, fetching with catch-up, historical snapshots and import

use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use crate::common::{create_document, rect_json, test_app};

#[tokio::test]
async fn test_health() {
    let (server, _) = test_app(None);
    let response = server.get("/health").await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>(), json!({ "status": "ok" }));
}

#[tokio::test]
async fn test_create_document() {
    let (server, _) = test_app(None);
    let response = server
        .post("/documents")
        .json(&json!({ "width": 800, "height": 600, "title": "Board" }))
        .await;
    response.assert_status(StatusCode::CREATED);

    let doc = response.json::<Value>();
    assert_eq!(doc["version"], 0);
    assert_eq!(doc["width"], 800);
    assert_eq!(doc["title"], "Board");
    assert_eq!(doc["schemaVersion"], 1);
    assert_eq!(doc["nodes"], json!([]));
}

#[tokio::test]
async fn test_create_document_rejects_bad_stage() {
    let (server, _) = test_app(None);
    let response = server
        .post("/documents")
        .json(&json!({ "width": 0, "height": 10000 }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let body = response.json::<Value>();
    let paths: Vec<&str> = body["issues"]
        .as_array()
        .unwrap()
        .iter()
        .map(|issue| issue["path"].as_str().unwrap())
        .collect();
    assert_eq!(paths, vec!["width", "height"]);
}

#[tokio::test]
async fn test_create_document_malformed_body() {
    let (server, _) = test_app(None);
    let response = server
        .post("/documents")
        .json(&json!({ "width": "wide" }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body = response.json::<Value>();
    assert_contains!(body["error"].as_str().unwrap(), "invalid request body");
}

#[tokio::test]
async fn test_list_documents() {
    let (server, _) = test_app(None);
    let a = create_document(&server, 100, 100).await;
    let b = create_document(&server, 100, 100).await;

    let mut expected = vec![a, b];
    expected.sort();
    let listed: Vec<String> = server.get("/documents").await.json();
    assert_eq!(listed, expected);
}

#[tokio::test]
async fn test_fetch_unknown_document() {
    let (server, _) = test_app(None);
    let response = server.get("/documents/does-not-exist").await;
    response.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(response.json::<Value>()["status"], 404);
}

#[tokio::test]
async fn test_fetch_with_since_version() {
    let (server, _) = test_app(None);
    let id = create_document(&server, 800, 600).await;
    for (i, x) in [0u32, 120, 240].iter().enumerate() {
        server
            .post(&format!("/documents/{}/operations", id))
            .json(&json!({ "ops": [{ "type": "add", "node": rect_json(&format!("r{}", i), *x, 0, 100, 100, "red") }] }))
            .await
            .assert_status_ok();
    }

    let body = server
        .get(&format!("/documents/{}", id))
        .add_query_param("sinceVersion", 1)
        .await
        .json::<Value>();
    assert_eq!(body["version"], 3);
    assert_eq!(body["snapshot"]["version"], 3);
    let since = body["operationsSince"].as_array().unwrap();
    assert_eq!(since.len(), 2);
    assert_eq!(since[0]["version"], 1);
    assert_eq!(since[0]["ops"][0]["node"]["id"], "r1");
    assert!(since[1]["appliedAt"].is_string());

    let plain = server.get(&format!("/documents/{}", id)).await.json::<Value>();
    assert_eq!(plain["operationsSince"], json!([]));

    server
        .get(&format!("/documents/{}", id))
        .add_query_param("sinceVersion", 9)
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_snapshot_at_version() {
    let (server, _) = test_app(None);
    let id = create_document(&server, 800, 600).await;
    server
        .post(&format!("/documents/{}/operations", id))
        .json(&json!({ "ops": [{ "type": "add", "node": rect_json("a", 0, 0, 10, 10, "red") }] }))
        .await
        .assert_status_ok();
    server
        .post(&format!("/documents/{}/operations", id))
        .json(&json!({ "ops": [{ "type": "remove", "id": "a" }] }))
        .await
        .assert_status_ok();

    let v1 = server.get(&format!("/documents/{}/versions/1", id)).await.json::<Value>();
    assert_eq!(v1["version"], 1);
    assert_eq!(v1["nodes"][0]["id"], "a");

    let v2 = server.get(&format!("/documents/{}/versions/2", id)).await.json::<Value>();
    assert_eq!(v2["nodes"], json!([]));

    server
        .get(&format!("/documents/{}/versions/3", id))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_import_legacy_document() {
    let (server, _) = test_app(None);
    let payload = json!({
        "id": "legacy-board",
        "width": 640,
        "height": 480,
        "nodes": [
            { "id": "g", "type": "frame", "x": 0, "y": 0, "width": 300, "height": 300, "children": ["r", "ghost"] },
            rect_json("r", 10, 10, 50, 50, "#abc")
        ]
    });

    let response = server.post("/documents/import").json(&payload).await;
    response.assert_status(StatusCode::CREATED);
    let doc = response.json::<Value>();
    assert_eq!(doc["schemaVersion"], 1);
    assert_eq!(doc["version"], 0);
    assert_eq!(doc["nodes"][0]["children"], json!(["r"]));
    assert_eq!(doc["nodes"][1]["parentId"], "g");

    server
        .post("/documents/import")
        .json(&payload)
        .await
        .assert_status(StatusCode::CONFLICT);

    let newer = json!({ "id": "x", "width": 10, "height": 10, "schemaVersion": 99, "nodes": [] });
    let response = server.post("/documents/import").json(&newer).await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["issues"][0]["path"], "schemaVersion");
}

#[tokio::test]
async fn test_unknown_route_is_json_404() {
    let (server, _) = test_app(None);
    let response = server.get("/nowhere").await;
    response.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(response.json::<Value>()["status"], 404);
}
