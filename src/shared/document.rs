/**
 * Canvas Document Model
 *
 * A document is an insertion-ordered arena of nodes keyed by id plus
 * stage metadata and a version counter. All hierarchy accessors work on
 * ids, so cascading delete and cycle detection reduce to set operations
 * over the arena.
 *
 * # Invariants
 *
 * - parent/child relations form a forest (no cycles, no self-parenting)
 * - each child id appears in at most one children list
 * - a node's `parentId` equals the id of the node whose list contains it
 *
 * The engine restores these after every operation; see
 * [`crate::shared::engine::apply`].
 */

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::shared::node::Node;

/// Schema version stamped on documents created by this build
pub const SCHEMA_VERSION: u32 = 1;

/// Largest accepted stage width or height
pub const MAX_STAGE_DIMENSION: u32 = 8192;

/// Complete collaboratively-edited artifact
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Stage width
    pub width: u32,
    /// Stage height
    pub height: u32,
    #[serde(with = "node_list")]
    pub nodes: IndexMap<String, Node>,
    /// Number of mutation batches applied since creation
    pub version: u64,
    pub schema_version: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document {
    /// Create an empty document at version 0
    pub fn new(
        id: impl Into<String>,
        width: u32,
        height: u32,
        title: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            title,
            width,
            height,
            nodes: IndexMap::new(),
            version: 0,
            schema_version: SCHEMA_VERSION,
            created_at,
            updated_at: created_at,
        }
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nodes without a parent, in insertion order
    pub fn roots(&self) -> Vec<&Node> {
        self.nodes.values().filter(|node| node.parent_id.is_none()).collect()
    }

    /// Children listed by `id`, resolved against the arena
    ///
    /// Ids in the list that no longer resolve are skipped.
    pub fn children_of(&self, id: &str) -> Vec<&Node> {
        self.nodes
            .get(id)
            .map(|node| node.child_ids().iter().filter_map(|child| self.nodes.get(child)).collect())
            .unwrap_or_default()
    }

    /// Transitive closure over children lists, excluding `id` itself
    ///
    /// Order is breadth-first. A visited set keeps the walk finite even if
    /// the arena were ever handed a cyclic structure.
    pub fn descendants_of(&self, id: &str) -> Vec<String> {
        let mut seen: HashSet<&str> = HashSet::from([id]);
        let mut queue: Vec<&str> = vec![id];
        let mut out = Vec::new();
        let mut cursor = 0;

        while cursor < queue.len() {
            let current = queue[cursor];
            cursor += 1;
            let Some(node) = self.nodes.get(current) else {
                continue;
            };
            for child in node.child_ids() {
                if self.nodes.contains_key(child.as_str()) && seen.insert(child.as_str()) {
                    queue.push(child.as_str());
                    out.push(child.clone());
                }
            }
        }

        out
    }

    /// Whether `node_id` may be placed under `new_parent_id`
    ///
    /// False when the new parent is the node itself or one of its
    /// descendants. Consult before trusting any reparent.
    pub fn can_reparent(&self, node_id: &str, new_parent_id: &str) -> bool {
        if node_id == new_parent_id {
            return false;
        }
        !self.descendants_of(node_id).iter().any(|id| id == new_parent_id)
    }

    /// Id of the node whose children list contains `id`
    pub fn owner_of(&self, id: &str) -> Option<&str> {
        self.nodes
            .values()
            .find(|node| node.child_ids().iter().any(|child| child == id))
            .map(|node| node.id.as_str())
    }
}

/// Serialize the arena as a JSON array so the wire shape stays a list
mod node_list {
    use indexmap::IndexMap;
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::shared::node::Node;

    pub fn serialize<S>(nodes: &IndexMap<String, Node>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_seq(nodes.values())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<IndexMap<String, Node>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let list = Vec::<Node>::deserialize(deserializer)?;
        Ok(list.into_iter().map(|node| (node.id.clone(), node)).collect())
    }
}
