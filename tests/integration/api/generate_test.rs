//! Generation endpoint tests

use std::sync::Arc;

use axum::http::StatusCode;
use serde_json::{json, Value};
use xfcanvas::backend::generation::GenerationError;

use crate::common::{create_document, rect_json, test_app, ScriptedGenerator};

fn scripted(response: Result<Value, GenerationError>) -> Option<Arc<dyn xfcanvas::backend::generation::OperationGenerator>> {
    Some(Arc::new(ScriptedGenerator { response }))
}

#[tokio::test]
async fn test_generate_without_generator() {
    let (server, _) = test_app(None);
    let id = create_document(&server, 800, 600).await;

    let response = server
        .post(&format!("/documents/{}/generate", id))
        .json(&json!({ "instruction": "add a title" }))
        .await;
    response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_generate_applies_ops() {
    let ops = json!([{ "type": "add", "node": rect_json("hero", 0, 0, 800, 200, "#112233") }]);
    let (server, _) = test_app(scripted(Ok(ops)));
    let id = create_document(&server, 800, 600).await;

    let response = server
        .post(&format!("/documents/{}/generate", id))
        .json(&json!({ "instruction": "add a hero banner", "palette": ["#112233"] }))
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["version"], 1);

    let doc = server.get(&format!("/documents/{}", id)).await.json::<Value>();
    assert_eq!(doc["snapshot"]["nodes"][0]["id"], "hero");
}

#[tokio::test]
async fn test_generate_invalid_output() {
    let (server, _) = test_app(scripted(Ok(json!({ "not": "a list" }))));
    let id = create_document(&server, 800, 600).await;

    let response = server
        .post(&format!("/documents/{}/generate", id))
        .json(&json!({ "instruction": "anything" }))
        .await;
    response.assert_status(StatusCode::BAD_GATEWAY);

    let doc = server.get(&format!("/documents/{}", id)).await.json::<Value>();
    assert_eq!(doc["version"], 0);
}

#[tokio::test]
async fn test_generate_upstream_failure() {
    let (server, _) = test_app(scripted(Err(GenerationError::Unauthorized)));
    let id = create_document(&server, 800, 600).await;

    server
        .post(&format!("/documents/{}/generate", id))
        .json(&json!({ "instruction": "anything" }))
        .await
        .assert_status(StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_generate_rejects_bad_request() {
    let (server, _) = test_app(scripted(Ok(json!([]))));
    let id = create_document(&server, 800, 600).await;

    let response = server
        .post(&format!("/documents/{}/generate", id))
        .json(&json!({ "instruction": "   ", "palette": ["not-a-color"] }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert!(response.json::<Value>()["issues"].as_array().unwrap().len() >= 2);
}
