/**
 * Document Service
 *
 * This module is the single write path for documents. Every mutation, from
 * a client batch, a composite intent or the generator, goes through
 * [`DocumentService::submit_with`], which holds the document's writer lock
 * across read-snapshot, apply, append-history, replace-snapshot and
 * broadcast.
 *
 * # Locking
 *
 * Each document id has its own `tokio::sync::Mutex`. Batches for one
 * document are strictly serialized; different documents never contend.
 * Readers do not take the lock: they see whichever `Arc<Document>` the
 * store currently holds.
 *
 * # Write Order
 *
 * The history entry is appended before the snapshot is swapped. A reader
 * that loads the snapshot first and the history second therefore never
 * finds a snapshot newer than the history, only the reverse, which
 * [`DocumentService::fetch`] trims away.
 */

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use axum::http::StatusCode;
use chrono::Utc;
use serde::Serialize;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::backend::collab::store::{DocumentRepository, InMemoryStore};
use crate::backend::error::BackendError;
use crate::backend::realtime::broadcast::{Broadcaster, Frame, SubscriberId};
use crate::shared::document::MAX_STAGE_DIMENSION;
use crate::shared::engine::{align_children, apply_operations, group, normalize, replay, ungroup};
use crate::shared::validation::validate_document;
use crate::shared::{Document, FieldIssue, HistoryEntry, Operation, SyncMessage, ValidationError};

/// Outcome of a submitted batch
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Applied {
    /// Document version after the batch
    pub version: u64,
    /// Operations that were applied, in order
    pub ops: Vec<Operation>,
}

/// Snapshot plus the history a client needs to catch up
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Fetched {
    pub snapshot: Arc<Document>,
    pub operations_since: Vec<HistoryEntry>,
    pub version: u64,
}

#[derive(Clone)]
pub struct DocumentService {
    inner: Arc<ServiceInner>,
}

struct ServiceInner {
    store: Arc<dyn DocumentRepository>,
    broadcaster: Broadcaster,
    writers: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl std::fmt::Debug for DocumentService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentService")
            .field("broadcaster", &self.inner.broadcaster)
            .finish_non_exhaustive()
    }
}

impl DocumentService {
    pub fn new(store: Arc<dyn DocumentRepository>, broadcaster: Broadcaster) -> Self {
        Self {
            inner: Arc::new(ServiceInner {
                store,
                broadcaster,
                writers: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Service over a fresh in-memory store
    pub fn in_memory(subscriber_buffer: usize) -> Self {
        Self::new(Arc::new(InMemoryStore::new()), Broadcaster::new(subscriber_buffer))
    }

    pub fn broadcaster(&self) -> &Broadcaster {
        &self.inner.broadcaster
    }

    /// Create an empty document at version 0
    pub fn create_document(
        &self,
        width: u32,
        height: u32,
        title: Option<String>,
    ) -> Result<Arc<Document>, BackendError> {
        let mut issues = Vec::new();
        for (field, size) in [("width", width), ("height", height)] {
            if size == 0 || size > MAX_STAGE_DIMENSION {
                issues.push(FieldIssue::new(
                    field,
                    format!("must be between 1 and {}", MAX_STAGE_DIMENSION),
                ));
            }
        }
        if !issues.is_empty() {
            return Err(ValidationError::new(issues).into());
        }

        let title = title.map(|t| t.trim().to_string()).filter(|t| !t.is_empty());
        let doc = Document::new(Uuid::new_v4().to_string(), width, height, title, Utc::now());
        let doc = self.inner.store.create(doc)?;
        tracing::info!("[Collab] Created document {} ({}x{})", doc.id, width, height);
        Ok(doc)
    }

    /// Register an externally supplied document
    ///
    /// The payload is validated and migrated, its hierarchy normalized, and
    /// it starts a fresh history at version 0.
    pub fn import_document(&self, value: &serde_json::Value) -> Result<Arc<Document>, BackendError> {
        let mut doc = normalize(validate_document(value)?);
        doc.version = 0;
        let doc = self.inner.store.create(doc)?;
        tracing::info!("[Collab] Imported document {} with {} nodes", doc.id, doc.len());
        Ok(doc)
    }

    pub fn list(&self) -> Result<Vec<String>, BackendError> {
        Ok(self.inner.store.list()?)
    }

    /// Current snapshot
    pub fn get(&self, id: &str) -> Result<Arc<Document>, BackendError> {
        Ok(self.inner.store.get(id)?)
    }

    /// Current snapshot plus every batch applied at or after `since`
    pub fn fetch(&self, id: &str, since: Option<u64>) -> Result<Fetched, BackendError> {
        let snapshot = self.inner.store.get(id)?;
        let version = snapshot.version;

        let operations_since = match since {
            None => Vec::new(),
            Some(since) if since > version => {
                return Err(BackendError::handler(
                    StatusCode::BAD_REQUEST,
                    format!("sinceVersion {} is ahead of current version {}", since, version),
                ));
            }
            Some(since) => {
                let mut history = self.inner.store.history_since(id, since)?;
                history.retain(|entry| entry.version < version);
                history
            }
        };

        Ok(Fetched {
            snapshot,
            operations_since,
            version,
        })
    }

    /// Reconstruct the document as it was at `version`
    pub fn snapshot_at(&self, id: &str, version: u64) -> Result<Document, BackendError> {
        let current = self.inner.store.get(id)?;
        if version > current.version {
            return Err(BackendError::handler(
                StatusCode::BAD_REQUEST,
                format!("version {} is ahead of current version {}", version, current.version),
            ));
        }
        let genesis = self.inner.store.genesis(id)?;
        let mut history = self.inner.store.history_since(id, 0)?;
        history.retain(|entry| entry.version < version);
        Ok(replay((*genesis).clone(), &history))
    }

    /// Apply a validated batch
    pub async fn submit(&self, id: &str, ops: Vec<Operation>) -> Result<Applied, BackendError> {
        let (applied, ()) = self.submit_with(id, move |_| Ok((ops, ()))).await?;
        Ok(applied)
    }

    /// Plan a batch against the locked snapshot, then apply it
    ///
    /// `plan` sees the snapshot the batch will be applied to. An empty plan
    /// leaves the document and its version untouched.
    pub async fn submit_with<T, F>(&self, id: &str, plan: F) -> Result<(Applied, T), BackendError>
    where
        F: FnOnce(&Document) -> Result<(Vec<Operation>, T), BackendError>,
    {
        let writer = self.writer(id)?;
        let _guard = writer.lock().await;

        let current = self.inner.store.get(id)?;
        let (ops, extra) = plan(&current)?;
        if ops.is_empty() {
            return Ok((
                Applied {
                    version: current.version,
                    ops,
                },
                extra,
            ));
        }

        let at = Utc::now();
        let next = apply_operations((*current).clone(), &ops, at);
        self.inner.store.append_history(
            id,
            HistoryEntry {
                version: current.version,
                ops: ops.clone(),
                applied_at: at,
            },
        )?;
        let next = self.inner.store.replace_snapshot(next)?;

        let delivered = self
            .inner
            .broadcaster
            .broadcast(id, &SyncMessage::ops(ops.clone(), next.version));
        tracing::info!(
            "[Collab] Applied {} ops to {} -> version {} ({} subscribers)",
            ops.len(),
            id,
            next.version,
            delivered
        );

        Ok((
            Applied {
                version: next.version,
                ops,
            },
            extra,
        ))
    }

    /// Group `node_ids` under a new frame; returns the frame's id
    pub async fn group(&self, id: &str, node_ids: &[String]) -> Result<(Applied, String), BackendError> {
        let container_id = format!("frame-{}", Uuid::new_v4());
        self.submit_with(id, |doc| {
            let ops = group(doc, node_ids, container_id.clone())?;
            Ok((ops, container_id.clone()))
        })
        .await
    }

    /// Dissolve a container, keeping its children
    pub async fn ungroup(&self, id: &str, container_id: &str) -> Result<Applied, BackendError> {
        let (applied, ()) = self
            .submit_with(id, |doc| Ok((ungroup(doc, container_id)?, ())))
            .await?;
        Ok(applied)
    }

    /// Lay out a container's children according to its alignment
    pub async fn align(&self, id: &str, container_id: &str) -> Result<Applied, BackendError> {
        let (applied, ()) = self
            .submit_with(id, |doc| Ok((align_children(doc, container_id)?, ())))
            .await?;
        Ok(applied)
    }

    /// Register a subscriber and queue its hello
    ///
    /// Runs under the writer lock so the hello snapshot and the first
    /// delta the subscriber sees are consecutive versions.
    pub async fn subscribe(&self, id: &str, tx: mpsc::Sender<Frame>) -> Result<SubscriberId, BackendError> {
        let writer = self.writer(id)?;
        let _guard = writer.lock().await;

        let snapshot = self.inner.store.get(id)?;
        self.inner
            .broadcaster
            .subscribe(id, tx, &snapshot)
            .map_err(|e| BackendError::handler(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
    }

    pub fn unsubscribe(&self, id: &str, subscriber: SubscriberId) {
        self.inner.broadcaster.unsubscribe(id, subscriber);
    }

    /// Writer lock for an existing document
    fn writer(&self, id: &str) -> Result<Arc<tokio::sync::Mutex<()>>, BackendError> {
        // Unknown ids never get a lock entry.
        self.inner.store.get(id)?;
        let mut writers = self.inner.writers.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(writers.entry(id.to_string()).or_default().clone())
    }
}
