//! End-to-end editing sessions
//!
//! Each scenario drives the public HTTP surface the way an editor client
//! would, with a live listener where subscribers are involved.

use std::time::Duration;

use axum::http::StatusCode;
use axum_test::TestServer;
use futures_util::{Stream, StreamExt};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tokio_tungstenite::connect_async;
use xfcanvas::backend::routes::create_router;

use crate::common::{create_document, rect_json, spawn_live_server, test_app, text_json};

async fn add(server: &TestServer, id: &str, node: Value) -> u64 {
    let response = server
        .post(&format!("/documents/{}/operations", id))
        .json(&json!({ "ops": [{ "type": "add", "node": node }] }))
        .await;
    response.assert_status_ok();
    response.json::<Value>()["version"].as_u64().unwrap()
}

async fn snapshot(server: &TestServer, id: &str) -> Value {
    server.get(&format!("/documents/{}", id)).await.json::<Value>()["snapshot"].clone()
}

fn ids(doc: &Value) -> Vec<String> {
    doc["nodes"]
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n["id"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_grouping_a_single_node_fails() {
    let (server, _) = test_app(None);
    let id = create_document(&server, 800, 600).await;
    assert_eq!(snapshot(&server, &id).await["version"], 0);

    assert_eq!(add(&server, &id, rect_json("R1", 0, 0, 100, 100, "#ff0000")).await, 1);
    let before = snapshot(&server, &id).await;

    let response = server
        .post(&format!("/documents/{}/group", id))
        .json(&json!({ "nodeIds": ["R1"] }))
        .await;
    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);

    assert_eq!(snapshot(&server, &id).await, before);
}

#[tokio::test]
async fn test_group_then_remove_container() {
    let (server, _) = test_app(None);
    let id = create_document(&server, 800, 600).await;

    assert_eq!(add(&server, &id, rect_json("R1", 40, 40, 100, 100, "#ff0000")).await, 1);
    assert_eq!(add(&server, &id, text_json("T1", 200, 60, "Title")).await, 2);

    let response = server
        .post(&format!("/documents/{}/group", id))
        .json(&json!({ "nodeIds": ["R1", "T1"] }))
        .await;
    response.assert_status_ok();
    let body = response.json::<Value>();
    assert_eq!(body["version"], 3);
    let container = body["containerId"].as_str().unwrap().to_string();

    let doc = snapshot(&server, &id).await;
    let frame = doc["nodes"]
        .as_array()
        .unwrap()
        .iter()
        .find(|n| n["id"] == container.as_str())
        .unwrap();
    assert_eq!(frame["children"], json!(["R1", "T1"]));

    let response = server
        .post(&format!("/documents/{}/operations", id))
        .json(&json!({ "ops": [{ "type": "remove", "id": container }] }))
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["version"], 4);

    let remaining = ids(&snapshot(&server, &id).await);
    assert!(remaining.is_empty(), "left behind: {:?}", remaining);
}

#[tokio::test]
async fn test_two_subscribers_see_third_party_edit() {
    let (addr, state) = spawn_live_server().await;
    // The third party posts through an in-process server over the same state
    let client = TestServer::new(create_router(state.clone())).unwrap();
    let doc = state.service.create_document(800, 600, None).unwrap();
    let url = format!("ws://{}/documents/{}/subscribe", addr, doc.id);

    let (mut alice, _) = connect_async(url.clone()).await.unwrap();
    let (mut bob, _) = connect_async(url).await.unwrap();

    for socket in [&mut alice, &mut bob] {
        let hello = read_json(socket).await;
        assert_eq!(hello["type"], "hello");
        assert_eq!(hello["version"], 0);
    }

    let ops = json!([{ "type": "add", "node": rect_json("R1", 0, 0, 100, 100, "#ff0000") }]);
    let response = client
        .post(&format!("/documents/{}/operations", doc.id))
        .json(&json!({ "ops": ops }))
        .await;
    response.assert_status_ok();

    let seen_by_alice = read_json(&mut alice).await;
    let seen_by_bob = read_json(&mut bob).await;
    assert_eq!(seen_by_alice["type"], "ops");
    assert_eq!(seen_by_alice["version"], 1);
    assert_eq!(seen_by_alice, seen_by_bob);
    assert_eq!(seen_by_alice["ops"][0]["node"]["id"], "R1");

    // Nothing else is queued for either subscriber
    for socket in [&mut alice, &mut bob] {
        let extra = tokio::time::timeout(Duration::from_millis(100), socket.next()).await;
        assert!(extra.is_err(), "unexpected frame: {:?}", extra);
    }
}

async fn read_json<S>(socket: &mut S) -> Value
where
    S: Stream<Item = Result<tokio_tungstenite::tungstenite::Message, tokio_tungstenite::tungstenite::Error>> + Unpin,
{
    let message = tokio::time::timeout(Duration::from_secs(5), socket.next())
        .await
        .expect("timed out waiting for a frame")
        .expect("stream ended")
        .unwrap();
    serde_json::from_str(message.to_text().unwrap()).unwrap()
}
