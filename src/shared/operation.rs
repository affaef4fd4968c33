/**
 * Document Operations
 *
 * An operation is an atomic, serializable intent against exactly one
 * document. The ordered sequence of every batch applied since creation
 * fully determines the current document when replayed from empty.
 *
 * # Wire Format
 *
 * Operations are tagged by `type` with camelCase fields:
 * ```json
 * {"type":"add","node":{...}}
 * {"type":"update","id":"r1","patch":{"fill":"blue"}}
 * {"type":"remove","id":"r1"}
 * {"type":"reorder","id":"r1","zIndex":3}
 * {"type":"reparent","id":"r1","parentId":"frame-1"}
 * {"type":"addChild","parentId":"frame-1","childId":"r1"}
 * {"type":"removeChild","parentId":"frame-1","childId":"r1"}
 * ```
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::shared::node::{Node, NodePatch};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Operation {
    /// Append a node as-is; the caller assigns a unique id
    Add { node: Node },
    /// Shallow-merge attributes onto an existing node
    Update { id: String, patch: NodePatch },
    /// Delete a node and all of its transitive descendants
    Remove { id: String },
    /// Change stacking order; stored in the node's `y` coordinate
    Reorder { id: String, z_index: u32 },
    /// Move a node under a new parent, or to the root when `parent_id` is absent
    Reparent {
        id: String,
        #[serde(default)]
        parent_id: Option<String>,
    },
    /// Append one id to a parent's children list
    AddChild { parent_id: String, child_id: String },
    /// Remove one id from a parent's children list
    RemoveChild { parent_id: String, child_id: String },
}

impl Operation {
    pub fn add(node: Node) -> Self {
        Self::Add { node }
    }

    pub fn update(id: impl Into<String>, patch: NodePatch) -> Self {
        Self::Update { id: id.into(), patch }
    }

    pub fn remove(id: impl Into<String>) -> Self {
        Self::Remove { id: id.into() }
    }

    pub fn reorder(id: impl Into<String>, z_index: u32) -> Self {
        Self::Reorder { id: id.into(), z_index }
    }

    pub fn reparent(id: impl Into<String>, parent_id: Option<String>) -> Self {
        Self::Reparent { id: id.into(), parent_id }
    }

    pub fn add_child(parent_id: impl Into<String>, child_id: impl Into<String>) -> Self {
        Self::AddChild {
            parent_id: parent_id.into(),
            child_id: child_id.into(),
        }
    }

    pub fn remove_child(parent_id: impl Into<String>, child_id: impl Into<String>) -> Self {
        Self::RemoveChild {
            parent_id: parent_id.into(),
            child_id: child_id.into(),
        }
    }

    /// Short tag used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Add { .. } => "add",
            Self::Update { .. } => "update",
            Self::Remove { .. } => "remove",
            Self::Reorder { .. } => "reorder",
            Self::Reparent { .. } => "reparent",
            Self::AddChild { .. } => "addChild",
            Self::RemoveChild { .. } => "removeChild",
        }
    }
}

/// One appended batch in a document's history
///
/// `version` is the document version the batch was applied to, so an
/// entry's position in the history equals its `version`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub version: u64,
    pub ops: Vec<Operation>,
    pub applied_at: DateTime<Utc>,
}
