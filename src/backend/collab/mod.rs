//! Collaborative Document Module
//!
//! This module contains all server-side functionality for shared canvas
//! documents:
//! - The document registry (snapshots, genesis, append-only history)
//! - The serialized write path and per-document writer locks
//! - HTTP handlers for document creation, catch-up and mutation
//!
//! # Architecture
//!
//! - **`store`** - `DocumentRepository` trait and the in-memory store
//! - **`service`** - `DocumentService`, the only code that mutates documents
//! - **`handlers`** - Axum handlers over the service
//!
//! # Example
//!
//! ```rust,no_run
//! use xfcanvas::backend::collab::DocumentService;
//!
//! # async fn example() -> Result<(), xfcanvas::backend::BackendError> {
//! let service = DocumentService::in_memory(256);
//! let doc = service.create_document(800, 600, Some("Board".into()))?;
//! let fetched = service.fetch(&doc.id, Some(0))?;
//! assert_eq!(fetched.version, 0);
//! # Ok(())
//! # }
//! ```

/// Document registry
pub mod store;

/// Serialized document mutation
pub mod service;

/// HTTP handlers
pub mod handlers;

/// Re-export commonly used types
pub use service::{Applied, DocumentService, Fetched};
pub use store::{DocumentRepository, InMemoryStore, StoreError};
