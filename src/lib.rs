//! xfcanvas - Main Library
//!
//! xfcanvas is a collaborative canvas server. Several people, and an
//! optional automated assistant, edit one shared document: a tree of
//! positioned graphic nodes. The server holds the authoritative copy,
//! applies edits one batch at a time and streams each applied batch to
//! every connected viewer.
//!
//! # Module Structure
//!
//! - **`shared`** - Document model and the pure operation engine
//!   - Nodes, documents, operations and history entries
//!   - Validation of untrusted payloads
//!   - Operation application, group/ungroup planning, container layout
//!   - Sync messages sent to subscribers
//!
//! - **`backend`** - Server-side code (only compiled with `ssr` feature)
//!   - In-memory document store with append-only history
//!   - Per-document serialized write path
//!   - WebSocket fan-out and HTTP API on Axum
//!
//! # Feature Flags
//!
//! - **`ssr`** (default) - enables the backend and the server binary. Without
//!   it the crate is the engine alone, usable for replaying history offline.
//!
//! # Usage
//!
//! ```rust
//! use chrono::Utc;
//! use xfcanvas::shared::engine::apply_operations;
//! use xfcanvas::shared::{Document, Node, Operation};
//!
//! let doc = Document::new("doc-1", 800, 600, None, Utc::now());
//! let doc = apply_operations(doc, &[Operation::add(Node::rect("r1", 0, 0, 100, 100, "#ff0000"))], Utc::now());
//! assert_eq!(doc.version, 1);
//! ```
//!
//! # Consistency Model
//!
//! Edits are applied sequentially in arrival order; there is no automatic
//! merging of conflicting concurrent edits. An operation that references a
//! node deleted by an earlier batch is a silent no-op.

/// Shared types and the operation engine
pub mod shared;

/// Backend server-side code
#[cfg(feature = "ssr")]
pub mod backend;
