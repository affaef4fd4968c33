//! Backend Module
//!
//! This module contains all server-side code for xfcanvas: the document
//! store, the serialized write path, real-time fan-out and the HTTP and
//! WebSocket surface.
//!
//! This module is only compiled when the `ssr` feature is enabled.
//!
//! # Architecture
//!
//! - **`server`** - Server initialization, application state, configuration
//! - **`routes`** - HTTP route configuration and router assembly
//! - **`collab`** - Document store, `DocumentService` and HTTP handlers
//! - **`realtime`** - Subscriber fan-out and the WebSocket handler
//! - **`generation`** - Seam for an external operation generator
//! - **`error`** - Backend-specific error types
//!
//! # Module Structure
//!
//! ```text
//! backend/
//! ├── mod.rs          - Module exports and documentation
//! ├── server/         - Server initialization and state
//! ├── routes/         - Route configuration
//! ├── collab/         - Documents and the write path
//! ├── realtime/       - Fan-out and subscriptions
//! ├── generation/     - Generator trait and apply path
//! └── error/          - Error types
//! ```
//!
//! # Concurrency
//!
//! - One `tokio::sync::Mutex` per document serializes its batches
//! - Snapshots are `Arc<Document>` swapped whole, so readers never lock
//! - Each subscriber has its own bounded channel; a full one is dropped
//!
//! # Error Handling
//!
//! Handlers return `BackendError`, which maps every failure to an HTTP
//! status and a JSON body. Validation failures carry per-field issues.

/// Server setup and configuration
#[cfg(feature = "ssr")]
pub mod server;

/// Route configuration
#[cfg(feature = "ssr")]
pub mod routes;

/// Documents, history and the serialized write path
#[cfg(feature = "ssr")]
pub mod collab;

/// Real-time update system
#[cfg(feature = "ssr")]
pub mod realtime;

/// External operation generation
#[cfg(feature = "ssr")]
pub mod generation;

/// Backend error types
#[cfg(feature = "ssr")]
pub mod error;

/// Re-export commonly used types
#[cfg(feature = "ssr")]
pub use collab::{DocumentRepository, DocumentService, InMemoryStore};
#[cfg(feature = "ssr")]
pub use error::BackendError;
#[cfg(feature = "ssr")]
pub use realtime::Broadcaster;
#[cfg(feature = "ssr")]
pub use server::{build_state, create_app, AppState, ServerConfig};
