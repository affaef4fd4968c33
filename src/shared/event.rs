/**
 * Sync Messages
 *
 * This module defines the messages pushed to document subscribers. A new
 * subscriber receives exactly one `hello` carrying the latest snapshot,
 * then one `ops` message per applied batch, in version order with no gaps.
 *
 * ```json
 * {"type":"hello","version":3,"snapshot":{...}}
 * {"type":"ops","ops":[...],"version":4}
 * ```
 */
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::shared::document::Document;
use crate::shared::operation::Operation;

/// Message delivered over a document subscription
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SyncMessage {
    /// Greeting with the full snapshot the subscriber starts from
    Hello { version: u64, snapshot: Arc<Document> },
    /// One applied batch and the version it produced
    Ops { ops: Vec<Operation>, version: u64 },
}

impl SyncMessage {
    /// Greeting for a snapshot, sharing it rather than copying
    pub fn hello(snapshot: Arc<Document>) -> Self {
        Self::Hello {
            version: snapshot.version,
            snapshot,
        }
    }

    /// Delta for a batch that produced `version`
    pub fn ops(ops: Vec<Operation>, version: u64) -> Self {
        Self::Ops { ops, version }
    }

    pub fn version(&self) -> u64 {
        match self {
            Self::Hello { version, .. } | Self::Ops { version, .. } => *version,
        }
    }
}
