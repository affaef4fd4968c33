//! Real-time Update Module
//!
//! This module pushes document changes to live viewers over WebSockets.
//!
//! # Architecture
//!
//! - **`broadcast`** - per-document subscriber registry and fan-out
//! - **`subscription`** - WebSocket handler and connection state machine
//!
//! # Message Flow
//!
//! A subscriber first receives `{"type":"hello","version":n,"snapshot":{...}}`
//! and then one `{"type":"ops","ops":[...],"version":m}` frame per applied
//! batch, with `m` counting up from `n + 1` without gaps. A subscriber that
//! falls more than one channel's worth of frames behind is disconnected and
//! is expected to reconnect, or to catch up through
//! `GET /documents/{id}?sinceVersion=n`.

/// Subscriber registry and fan-out
pub mod broadcast;

/// WebSocket subscription handler
pub mod subscription;

// Re-export commonly used types and functions
pub use broadcast::{Broadcaster, Frame, SubscriberId};
pub use subscription::handle_document_subscription;
