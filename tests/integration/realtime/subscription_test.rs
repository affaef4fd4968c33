//! Document subscription tests
//!
//! Each test binds a real listener so the upgrade, hello and fan-out run
//! through the same code path a browser client would hit.

use std::net::SocketAddr;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use pretty_assertions::assert_eq;
use serde_json::Value;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use xfcanvas::shared::{Node, Operation};

use crate::common::spawn_live_server;

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

const READ_TIMEOUT: Duration = Duration::from_secs(5);

async fn connect(addr: SocketAddr, doc_id: &str) -> Socket {
    let url = format!("ws://{}/documents/{}/subscribe", addr, doc_id);
    let (socket, _) = connect_async(url).await.unwrap();
    socket
}

/// Next frame, failing the test if none arrives in time
async fn next_message(socket: &mut Socket) -> Message {
    tokio::time::timeout(READ_TIMEOUT, socket.next())
        .await
        .expect("timed out waiting for a frame")
        .expect("stream ended")
        .unwrap()
}

async fn next_json(socket: &mut Socket) -> Value {
    let message = next_message(socket).await;
    serde_json::from_str(message.to_text().unwrap()).unwrap()
}

#[tokio::test]
async fn test_hello_then_ops() {
    let (addr, state) = spawn_live_server().await;
    let doc = state.service.create_document(800, 600, None).unwrap();
    let mut socket = connect(addr, &doc.id).await;

    let hello = next_json(&mut socket).await;
    assert_eq!(hello["type"], "hello");
    assert_eq!(hello["version"], 0);
    assert_eq!(hello["snapshot"]["id"], doc.id.as_str());

    state
        .service
        .submit(&doc.id, vec![Operation::add(Node::rect("a", 0, 0, 10, 10, "red"))])
        .await
        .unwrap();

    let ops = next_json(&mut socket).await;
    assert_eq!(ops["type"], "ops");
    assert_eq!(ops["version"], 1);
    assert_eq!(ops["ops"][0]["type"], "add");
    assert_eq!(ops["ops"][0]["node"]["id"], "a");

    socket.close(None).await.unwrap();
}

#[tokio::test]
async fn test_unknown_document_closes_with_4404() {
    let (addr, _) = spawn_live_server().await;
    let mut socket = connect(addr, "missing").await;

    match next_message(&mut socket).await {
        Message::Close(Some(frame)) => assert_eq!(u16::from(frame.code), 4404),
        other => panic!("expected a close frame, got {:?}", other),
    }
}

#[tokio::test]
async fn test_every_subscriber_gets_each_batch_once() {
    let (addr, state) = spawn_live_server().await;
    let doc = state.service.create_document(800, 600, None).unwrap();

    let mut first = connect(addr, &doc.id).await;
    let mut second = connect(addr, &doc.id).await;
    assert_eq!(next_json(&mut first).await["type"], "hello");
    assert_eq!(next_json(&mut second).await["type"], "hello");
    assert_eq!(state.service.broadcaster().subscriber_count(&doc.id), 2);

    state
        .service
        .submit(&doc.id, vec![Operation::add(Node::rect("a", 0, 0, 10, 10, "red"))])
        .await
        .unwrap();
    state
        .service
        .submit(&doc.id, vec![Operation::remove("a")])
        .await
        .unwrap();

    for socket in [&mut first, &mut second] {
        let one = next_json(socket).await;
        let two = next_json(socket).await;
        assert_eq!((one["version"].clone(), two["version"].clone()), (1.into(), 2.into()));
        assert_eq!(two["ops"][0]["type"], "remove");
    }
}

#[tokio::test]
async fn test_closing_unsubscribes() {
    let (addr, state) = spawn_live_server().await;
    let doc = state.service.create_document(800, 600, None).unwrap();

    let mut socket = connect(addr, &doc.id).await;
    next_json(&mut socket).await;
    assert_eq!(state.service.broadcaster().subscriber_count(&doc.id), 1);

    socket.close(None).await.unwrap();
    // Drain until the server acknowledges the close
    while let Ok(Some(_)) = tokio::time::timeout(READ_TIMEOUT, socket.next()).await {}

    let deadline = tokio::time::Instant::now() + READ_TIMEOUT;
    while state.service.broadcaster().subscriber_count(&doc.id) > 0 {
        assert!(tokio::time::Instant::now() < deadline, "subscriber was never removed");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

#[tokio::test]
async fn test_late_subscriber_starts_from_current_version() {
    let (addr, state) = spawn_live_server().await;
    let doc = state.service.create_document(800, 600, None).unwrap();
    for i in 0..3 {
        state
            .service
            .submit(&doc.id, vec![Operation::add(Node::rect(format!("r{}", i), 0, 0, 10, 10, "red"))])
            .await
            .unwrap();
    }

    let mut socket = connect(addr, &doc.id).await;
    let hello = next_json(&mut socket).await;
    assert_eq!(hello["version"], 3);
    assert_eq!(hello["snapshot"]["nodes"].as_array().unwrap().len(), 3);
}
