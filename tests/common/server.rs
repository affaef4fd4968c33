//! Test server helpers
//!
//! `test_app` gives an in-process `axum_test::TestServer` for HTTP round
//! trips; `spawn_live_server` binds a real listener for WebSocket tests.

use std::net::SocketAddr;
use std::sync::Arc;

use axum_test::TestServer;
use futures_util::future::BoxFuture;
use serde_json::{json, Value};
use xfcanvas::backend::generation::{GenerationError, GenerationRequest, OperationGenerator};
use xfcanvas::backend::routes::create_router;
use xfcanvas::backend::{build_state, AppState, ServerConfig};

/// Generator that always answers with the same payload
pub struct ScriptedGenerator {
    pub response: Result<Value, GenerationError>,
}

impl OperationGenerator for ScriptedGenerator {
    fn generate(&self, request: GenerationRequest) -> BoxFuture<'static, Result<Value, GenerationError>> {
        tracing::debug!("scripted generator asked: {}", request.instruction);
        let response = self.response.clone();
        Box::pin(async move { response })
    }
}

pub fn test_state(generator: Option<Arc<dyn OperationGenerator>>) -> AppState {
    let config = ServerConfig {
        subscriber_buffer: 32,
        generation_timeout_secs: 5,
        ..ServerConfig::default()
    };
    build_state(config, generator)
}

/// In-process server over fresh state
pub fn test_app(generator: Option<Arc<dyn OperationGenerator>>) -> (TestServer, AppState) {
    let state = test_state(generator);
    let server = TestServer::new(create_router(state.clone())).unwrap();
    (server, state)
}

/// Serve fresh state on an ephemeral local port
pub async fn spawn_live_server() -> (SocketAddr, AppState) {
    let state = test_state(None);
    let app = create_router(state.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, state)
}

/// Create a document over HTTP and return its id
pub async fn create_document(server: &TestServer, width: u32, height: u32) -> String {
    let response = server
        .post("/documents")
        .json(&json!({ "width": width, "height": height }))
        .await;
    response.assert_status(axum::http::StatusCode::CREATED);
    response.json::<Value>()["id"].as_str().unwrap().to_string()
}

pub fn rect_json(id: &str, x: u32, y: u32, width: u32, height: u32, fill: &str) -> Value {
    json!({
        "id": id,
        "type": "rect",
        "x": x,
        "y": y,
        "width": width,
        "height": height,
        "fill": fill
    })
}

pub fn text_json(id: &str, x: u32, y: u32, text: &str) -> Value {
    json!({
        "id": id,
        "type": "text",
        "x": x,
        "y": y,
        "width": 120,
        "height": 24,
        "text": text
    })
}
