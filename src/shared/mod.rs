//! Shared Module
//!
//! This module contains the document model and the pure operation engine.
//! Nothing here touches shared state or I/O, so the same types serve the
//! server, tests and any client that wants to replay history locally.
//!
//! # Overview
//!
//! - **`node`** / **`document`** - data model and tree accessors
//! - **`operation`** - serializable mutation intents and history entries
//! - **`validation`** - checks untrusted payloads before they reach the engine
//! - **`engine`** - applies operations; group, ungroup and layout planning
//! - **`event`** - messages pushed to live subscribers
//! - **`error`** - validation and engine error types

/// Node data structure
pub mod node;

/// Document data structure and hierarchy accessors
pub mod document;

/// Operation and history types
pub mod operation;

/// Payload validation
pub mod validation;

/// Operation engine
pub mod engine;

/// Subscriber messages
pub mod event;

/// Shared error types
pub mod error;

/// Re-export commonly used types for convenience
pub use document::Document;
pub use error::{EngineError, FieldIssue, SharedError, ValidationError};
pub use event::SyncMessage;
pub use node::{Alignment, Node, NodeKind, NodePatch};
pub use operation::{HistoryEntry, Operation};
