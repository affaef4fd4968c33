/**
 * Composite Intents
 *
 * Group and ungroup are not primitive operations: each is planned against
 * the current snapshot and emitted as one batch of primitives, so it is
 * applied atomically and replays like any other edit.
 */

use std::collections::HashSet;

use crate::shared::document::Document;
use crate::shared::error::EngineError;
use crate::shared::node::{Node, NodePatch};
use crate::shared::operation::Operation;

/// Margin added around the selection's bounding box
pub const GROUP_PADDING: u32 = 20;

/// Plan a group of `node_ids` under a new container with id `container_id`
///
/// Emits one `add` for the container, one `reparent` per selected node and
/// one `update` seeding the container's children list. When every selected
/// node shares the same parent the container is created under it.
pub fn group(doc: &Document, node_ids: &[String], container_id: impl Into<String>) -> Result<Vec<Operation>, EngineError> {
    let mut seen = HashSet::new();
    let ids: Vec<&String> = node_ids.iter().filter(|id| seen.insert(id.as_str())).collect();
    if ids.len() < 2 {
        return Err(EngineError::GroupTooSmall { count: ids.len() });
    }

    let mut selected = Vec::with_capacity(ids.len());
    for id in &ids {
        match doc.node(id) {
            Some(node) => selected.push(node),
            None => return Err(EngineError::UnknownNode { id: (*id).clone() }),
        }
    }

    let min_x = selected.iter().map(|n| n.x).min().unwrap_or(0);
    let min_y = selected.iter().map(|n| n.y).min().unwrap_or(0);
    let max_right = selected.iter().map(|n| n.right()).max().unwrap_or(0);
    let max_bottom = selected.iter().map(|n| n.bottom()).max().unwrap_or(0);

    let x = min_x.saturating_sub(GROUP_PADDING);
    let y = min_y.saturating_sub(GROUP_PADDING);
    let width = max_right.saturating_add(GROUP_PADDING) - x;
    let height = max_bottom.saturating_add(GROUP_PADDING) - y;

    let container_id = container_id.into();
    let mut container = Node::frame(container_id.clone(), x, y, width, height);
    let first_parent = &selected[0].parent_id;
    if first_parent.is_some() && selected.iter().all(|n| &n.parent_id == first_parent) {
        container.parent_id = first_parent.clone();
    }

    let mut ops = Vec::with_capacity(ids.len() + 2);
    ops.push(Operation::add(container));
    for id in &ids {
        ops.push(Operation::reparent((*id).clone(), Some(container_id.clone())));
    }
    ops.push(Operation::update(
        container_id,
        NodePatch::children(ids.into_iter().cloned().collect()),
    ));

    tracing::debug!("[Engine] Planned group of {} ops", ops.len());
    Ok(ops)
}

/// Plan dissolving a container
///
/// Emits one `reparent` per listed child to the root, followed by a
/// `remove` of the now-childless container. Children of a nested container
/// land at the root too, not under the container's own parent.
pub fn ungroup(doc: &Document, container_id: &str) -> Result<Vec<Operation>, EngineError> {
    let container = doc.node(container_id).ok_or_else(|| EngineError::UnknownNode {
        id: container_id.to_string(),
    })?;
    let children = container.child_ids();
    if children.is_empty() {
        return Err(EngineError::NotAContainer {
            id: container_id.to_string(),
        });
    }

    let mut ops: Vec<Operation> = children
        .iter()
        .map(|child| Operation::reparent(child.clone(), None))
        .collect();
    ops.push(Operation::remove(container_id));
    Ok(ops)
}
