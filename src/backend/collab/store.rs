/**
 * Document Store
 *
 * This module holds the single authoritative registry of documents: for
 * each id, the genesis document, the current snapshot and the append-only
 * operation history.
 *
 * # Persistence Seam
 *
 * `DocumentRepository` is the contract any backing storage must satisfy.
 * `InMemoryStore` is the volatile implementation the server runs with;
 * swapping it does not change engine or broadcaster behavior.
 *
 * # Snapshots
 *
 * Snapshots are stored as `Arc<Document>` and replaced wholesale, so a
 * reader either sees the previous snapshot or the next one, never a
 * partially-updated structure.
 */

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use thiserror::Error;

use crate::shared::{Document, HistoryEntry};

/// Store-level failures
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("document '{id}' not found")]
    NotFound { id: String },

    #[error("document '{id}' already exists")]
    AlreadyExists { id: String },

    /// A snapshot was offered out of order
    #[error("snapshot for '{id}' has version {offered}, expected {expected}")]
    VersionConflict { id: String, expected: u64, offered: u64 },

    /// A history entry was appended out of order
    #[error("history entry for '{id}' has version {offered}, expected {expected}")]
    HistoryGap { id: String, expected: u64, offered: u64 },

    #[error("document store lock poisoned")]
    Poisoned,
}

impl StoreError {
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }
}

/// Persistence contract for documents and their history
///
/// Implementations must keep `history[i].version == i` and only accept a
/// snapshot whose version is exactly one past the current one.
pub trait DocumentRepository: Send + Sync {
    /// Register a new document at version 0 with an empty history
    fn create(&self, doc: Document) -> Result<Arc<Document>, StoreError>;

    /// Current snapshot
    fn get(&self, id: &str) -> Result<Arc<Document>, StoreError>;

    /// Install the engine's output as the current snapshot
    fn replace_snapshot(&self, doc: Document) -> Result<Arc<Document>, StoreError>;

    /// Append one applied batch
    fn append_history(&self, id: &str, entry: HistoryEntry) -> Result<(), StoreError>;

    /// Every batch appended at or after `version`
    fn history_since(&self, id: &str, version: u64) -> Result<Vec<HistoryEntry>, StoreError>;

    /// The document as it was created
    fn genesis(&self, id: &str) -> Result<Arc<Document>, StoreError>;

    /// Ids of every registered document
    fn list(&self) -> Result<Vec<String>, StoreError>;
}

#[derive(Debug)]
struct StoredDocument {
    genesis: Arc<Document>,
    snapshot: Arc<Document>,
    history: Vec<HistoryEntry>,
}

/// Volatile, process-lifetime document registry
#[derive(Debug, Default)]
pub struct InMemoryStore {
    documents: RwLock<HashMap<String, StoredDocument>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read<T>(&self, id: &str, f: impl FnOnce(&StoredDocument) -> T) -> Result<T, StoreError> {
        let docs = self.documents.read().map_err(|_| StoreError::Poisoned)?;
        docs.get(id).map(f).ok_or_else(|| StoreError::not_found(id))
    }

    fn write<T>(
        &self,
        id: &str,
        f: impl FnOnce(&mut StoredDocument) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut docs = self.documents.write().map_err(|_| StoreError::Poisoned)?;
        let stored = docs.get_mut(id).ok_or_else(|| StoreError::not_found(id))?;
        f(stored)
    }
}

impl DocumentRepository for InMemoryStore {
    fn create(&self, doc: Document) -> Result<Arc<Document>, StoreError> {
        if doc.version != 0 {
            return Err(StoreError::VersionConflict {
                id: doc.id,
                expected: 0,
                offered: doc.version,
            });
        }

        let mut docs = self.documents.write().map_err(|_| StoreError::Poisoned)?;
        if docs.contains_key(&doc.id) {
            return Err(StoreError::AlreadyExists { id: doc.id });
        }

        let doc = Arc::new(doc);
        docs.insert(
            doc.id.clone(),
            StoredDocument {
                genesis: doc.clone(),
                snapshot: doc.clone(),
                history: Vec::new(),
            },
        );
        tracing::info!("[Collab] Registered document {}", doc.id);
        Ok(doc)
    }

    fn get(&self, id: &str) -> Result<Arc<Document>, StoreError> {
        self.read(id, |stored| stored.snapshot.clone())
    }

    fn replace_snapshot(&self, doc: Document) -> Result<Arc<Document>, StoreError> {
        let id = doc.id.clone();
        self.write(&id, |stored| {
            let expected = stored.snapshot.version + 1;
            if doc.version != expected {
                return Err(StoreError::VersionConflict {
                    id: doc.id.clone(),
                    expected,
                    offered: doc.version,
                });
            }
            let doc = Arc::new(doc);
            stored.snapshot = doc.clone();
            Ok(doc)
        })
    }

    fn append_history(&self, id: &str, entry: HistoryEntry) -> Result<(), StoreError> {
        self.write(id, |stored| {
            let expected = stored.history.len() as u64;
            if entry.version != expected {
                return Err(StoreError::HistoryGap {
                    id: id.to_string(),
                    expected,
                    offered: entry.version,
                });
            }
            stored.history.push(entry);
            Ok(())
        })
    }

    fn history_since(&self, id: &str, version: u64) -> Result<Vec<HistoryEntry>, StoreError> {
        self.read(id, |stored| {
            let start = usize::try_from(version).unwrap_or(usize::MAX).min(stored.history.len());
            stored.history[start..].to_vec()
        })
    }

    fn genesis(&self, id: &str) -> Result<Arc<Document>, StoreError> {
        self.read(id, |stored| stored.genesis.clone())
    }

    fn list(&self) -> Result<Vec<String>, StoreError> {
        let docs = self.documents.read().map_err(|_| StoreError::Poisoned)?;
        let mut ids: Vec<String> = docs.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }
}
