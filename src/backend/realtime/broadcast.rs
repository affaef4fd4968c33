/**
 * Document Broadcasting
 *
 * This module fans applied batches out to every live subscriber of a
 * document.
 *
 * # Delivery
 *
 * Each subscriber owns a bounded `tokio::sync::mpsc` channel of
 * pre-serialized text frames. A message is serialized once per broadcast
 * and handed to every subscriber with `try_send`, so a slow viewer can
 * never stall the writer: a full or closed channel is dropped from the
 * registry and its connection task ends when it drains.
 *
 * # Ordering
 *
 * Broadcasts for one document happen while its writer lock is held, so
 * frames reach every channel in version order with no gaps.
 */

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use thiserror::Error;
use tokio::sync::mpsc;

use crate::shared::{Document, SyncMessage};

/// Pre-serialized JSON text frame
pub type Frame = Arc<str>;

/// Identifier handed out per subscription
pub type SubscriberId = u64;

/// Default per-subscriber queue depth
pub const DEFAULT_SUBSCRIBER_BUFFER: usize = 256;

#[derive(Debug, Error)]
pub enum BroadcastError {
    #[error("failed to serialize sync message: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The subscriber went away before its greeting could be queued
    #[error("subscriber channel closed before hello was delivered")]
    Disconnected,
}

#[derive(Debug)]
struct Subscriber {
    id: SubscriberId,
    tx: mpsc::Sender<Frame>,
}

/// Per-document registry of subscriber channels
#[derive(Debug, Clone)]
pub struct Broadcaster {
    inner: Arc<BroadcasterInner>,
}

#[derive(Debug)]
struct BroadcasterInner {
    buffer: usize,
    next_id: AtomicU64,
    subscribers: Mutex<HashMap<String, Vec<Subscriber>>>,
}

impl Default for Broadcaster {
    fn default() -> Self {
        Self::new(DEFAULT_SUBSCRIBER_BUFFER)
    }
}

impl Broadcaster {
    pub fn new(buffer: usize) -> Self {
        Self {
            inner: Arc::new(BroadcasterInner {
                buffer: buffer.max(1),
                next_id: AtomicU64::new(1),
                subscribers: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// A channel sized for this broadcaster
    pub fn channel(&self) -> (mpsc::Sender<Frame>, mpsc::Receiver<Frame>) {
        mpsc::channel(self.inner.buffer)
    }

    /// Register `tx` for `doc_id` and queue its hello frame
    ///
    /// Callers must hold the document's writer lock so that no batch can be
    /// broadcast between reading `snapshot` and registering the channel.
    pub fn subscribe(
        &self,
        doc_id: &str,
        tx: mpsc::Sender<Frame>,
        snapshot: &Arc<Document>,
    ) -> Result<SubscriberId, BroadcastError> {
        let hello = serialize(&SyncMessage::hello(Arc::clone(snapshot)))?;
        tx.try_send(hello).map_err(|_| BroadcastError::Disconnected)?;

        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.lock()
            .entry(doc_id.to_string())
            .or_default()
            .push(Subscriber { id, tx });

        tracing::info!(
            "[Realtime] Subscriber {} joined {} at version {}",
            id,
            doc_id,
            snapshot.version
        );
        Ok(id)
    }

    /// Deliver `message` to every subscriber of `doc_id`
    ///
    /// Returns how many subscribers accepted the frame.
    pub fn broadcast(&self, doc_id: &str, message: &SyncMessage) -> usize {
        let frame = match serialize(message) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::error!("[Realtime] Dropping broadcast for {}: {}", doc_id, e);
                return 0;
            }
        };

        let mut registry = self.lock();
        let Some(subscribers) = registry.get_mut(doc_id) else {
            tracing::debug!("[Realtime] No subscribers for {}", doc_id);
            return 0;
        };

        subscribers.retain(|subscriber| match subscriber.tx.try_send(frame.clone()) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(
                    "[Realtime] Subscriber {} on {} is lagging, disconnecting",
                    subscriber.id,
                    doc_id
                );
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::debug!("[Realtime] Subscriber {} on {} closed", subscriber.id, doc_id);
                false
            }
        });

        let delivered = subscribers.len();
        if delivered == 0 {
            registry.remove(doc_id);
        }
        tracing::debug!(
            "[Realtime] Version {} of {} sent to {} subscribers",
            message.version(),
            doc_id,
            delivered
        );
        delivered
    }

    pub fn unsubscribe(&self, doc_id: &str, id: SubscriberId) {
        let mut registry = self.lock();
        if let Some(subscribers) = registry.get_mut(doc_id) {
            subscribers.retain(|subscriber| subscriber.id != id);
            if subscribers.is_empty() {
                registry.remove(doc_id);
            }
        }
    }

    pub fn subscriber_count(&self, doc_id: &str) -> usize {
        self.lock().get(doc_id).map_or(0, Vec::len)
    }

    /// Forget channels whose receiver is gone; returns how many were removed
    pub fn prune_closed(&self) -> usize {
        let mut registry = self.lock();
        let mut removed = 0;
        registry.retain(|_, subscribers| {
            let before = subscribers.len();
            subscribers.retain(|subscriber| !subscriber.tx.is_closed());
            removed += before - subscribers.len();
            !subscribers.is_empty()
        });
        removed
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Vec<Subscriber>>> {
        self.inner
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

fn serialize(message: &SyncMessage) -> Result<Frame, serde_json::Error> {
    Ok(Arc::from(serde_json::to_string(message)?))
}
