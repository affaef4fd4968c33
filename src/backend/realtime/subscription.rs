/**
 * Document Subscription Handler
 *
 * This module implements `GET /documents/{id}/subscribe`, a WebSocket that
 * streams a document's `hello` snapshot followed by every applied batch.
 *
 * # Connection States
 *
 * ```text
 * Connecting --(document resolves, hello queued)--> Subscribed --> Closed
 *      \-----------(unknown document, close 4404)---------------> Closed
 * ```
 *
 * The server never reads application data from the socket; inbound frames
 * are only watched for close and disconnect.
 */

use axum::{
    extract::{
        ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};

use crate::backend::collab::service::DocumentService;
use crate::backend::realtime::broadcast::SubscriberId;
use crate::backend::error::BackendError;

/// Close code sent when the requested document does not exist
pub const CLOSE_DOCUMENT_NOT_FOUND: u16 = 4404;

/// Close code sent when the subscription cannot be set up
pub const CLOSE_INTERNAL_ERROR: u16 = 1011;

/// Lifecycle of one subscriber connection
///
/// Only `Subscribed` holds a broadcaster registration, so it is the only
/// state whose exit has something to unregister.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Subscribed(SubscriberId),
    Closed,
}

struct Connection {
    doc_id: String,
    state: ConnectionState,
}

impl Connection {
    fn new(doc_id: String) -> Self {
        Self {
            doc_id,
            state: ConnectionState::Connecting,
        }
    }

    fn subscribed(&mut self, subscriber: SubscriberId) {
        tracing::debug!("[Realtime] {}: {:?} -> Subscribed({})", self.doc_id, self.state, subscriber);
        self.state = ConnectionState::Subscribed(subscriber);
    }

    /// Move to `Closed`, unregistering if subscribed; closing twice is a no-op
    fn close(&mut self, service: &DocumentService) {
        match std::mem::replace(&mut self.state, ConnectionState::Closed) {
            ConnectionState::Subscribed(subscriber) => {
                service.unsubscribe(&self.doc_id, subscriber);
                tracing::info!("[Realtime] Subscriber {} left {}", subscriber, self.doc_id);
            }
            ConnectionState::Connecting => {
                tracing::debug!("[Realtime] {}: closed before subscribing", self.doc_id);
            }
            ConnectionState::Closed => {}
        }
    }
}

/// Upgrade to a WebSocket subscribed to `doc_id`
pub async fn handle_document_subscription(
    ws: WebSocketUpgrade,
    State(service): State<DocumentService>,
    Path(doc_id): Path<String>,
) -> Response {
    tracing::info!("[Realtime] Subscription request for {}", doc_id);
    ws.on_upgrade(move |socket| run_subscription(socket, service, doc_id))
}

async fn run_subscription(socket: WebSocket, service: DocumentService, doc_id: String) {
    let mut connection = Connection::new(doc_id.clone());
    let (mut sender, mut receiver) = socket.split();

    let (tx, mut rx) = service.broadcaster().channel();
    let subscriber = match service.subscribe(&doc_id, tx).await {
        Ok(subscriber) => subscriber,
        Err(e) => {
            let code = match e {
                BackendError::NotFound { .. } => CLOSE_DOCUMENT_NOT_FOUND,
                _ => CLOSE_INTERNAL_ERROR,
            };
            tracing::warn!("[Realtime] Refusing subscription to {}: {}", doc_id, e);
            let frame = CloseFrame {
                code,
                reason: e.message().into(),
            };
            let _ = sender.send(Message::Close(Some(frame))).await;
            connection.close(&service);
            return;
        }
    };
    connection.subscribed(subscriber);

    loop {
        tokio::select! {
            frame = rx.recv() => {
                let Some(frame) = frame else {
                    // dropped by the broadcaster as lagging
                    tracing::info!("[Realtime] Subscriber {} on {} was dropped", subscriber, doc_id);
                    break;
                };
                if sender.send(Message::Text(frame.as_ref().into())).await.is_err() {
                    tracing::debug!("[Realtime] Subscriber {} on {} went away mid-send", subscriber, doc_id);
                    break;
                }
            }
            inbound = receiver.next() => {
                match inbound {
                    Some(Ok(Message::Close(close))) => {
                        if let Some(close) = close {
                            tracing::debug!("[Realtime] {} closed with code {} `{}`", doc_id, close.code, close.reason);
                        }
                        break;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::debug!("[Realtime] {} disconnected abruptly: {}", doc_id, e);
                        break;
                    }
                    None => break,
                }
            }
        }
    }

    connection.close(&service);
    let _ = sender.close().await;
}
