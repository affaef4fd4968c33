/**
 * Operation Application
 *
 * Pure, deterministic and total application of validated operations to a
 * document. A reference to a node that no longer exists turns that single
 * operation into a no-op, so a stale edit racing a delete never aborts the
 * rest of its batch.
 *
 * # Hierarchy Bookkeeping
 *
 * Children lists are the authoritative record of the tree. After every
 * operation [`reconcile`] re-derives each node's `parentId` from those
 * lists, prunes ids that no longer resolve, enforces single ownership and
 * breaks any cycle, so a node's listed children and each child's declared
 * parent always agree once an operation completes.
 */

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};

use crate::shared::document::Document;
use crate::shared::operation::{HistoryEntry, Operation};

/// Apply one operation, returning the updated document
///
/// The version is left untouched; batches bump it in [`apply_operations`].
pub fn apply_operation(mut doc: Document, op: &Operation) -> Document {
    apply_in_place(&mut doc, op);
    doc
}

/// Fold a batch left-to-right, then bump the version exactly once
///
/// `at` becomes the modification timestamp. It is a parameter rather than
/// a clock read so that replaying history reproduces snapshots exactly.
/// An empty batch returns the document unchanged.
pub fn apply_operations(mut doc: Document, ops: &[Operation], at: DateTime<Utc>) -> Document {
    if ops.is_empty() {
        return doc;
    }
    for op in ops {
        apply_in_place(&mut doc, op);
    }
    doc.version += 1;
    doc.updated_at = at;
    doc
}

/// Replay history entries on top of a snapshot
///
/// Entries older than the snapshot's version are skipped, so this can be
/// handed a full history and a mid-way snapshot alike.
pub fn replay(mut doc: Document, history: &[HistoryEntry]) -> Document {
    for entry in history {
        if entry.version < doc.version {
            continue;
        }
        doc = apply_operations(doc, &entry.ops, entry.applied_at);
    }
    doc
}

/// Restore hierarchy invariants on an externally supplied document
pub fn normalize(mut doc: Document) -> Document {
    reconcile(&mut doc);
    doc
}

fn apply_in_place(doc: &mut Document, op: &Operation) {
    match op {
        Operation::Add { node } => {
            if doc.contains(&node.id) {
                tracing::debug!("[Engine] add: node '{}' already exists, skipping", node.id);
                return;
            }
            let mut node = node.clone();
            let parent = node.parent_id.take();
            let id = node.id.clone();
            doc.nodes.insert(id.clone(), node);

            if let Some(parent) = parent {
                if doc.contains(&parent) && doc.can_reparent(&id, &parent) {
                    push_child(doc, &parent, &id);
                }
            }
        }
        Operation::Update { id, patch } => {
            let Some(node) = doc.node(id) else {
                tracing::debug!("[Engine] update: node '{}' is gone, skipping", id);
                return;
            };
            if let Some(field) = node.emptied_required_field(patch) {
                tracing::debug!("[Engine] update: would empty required '{}' on '{}', skipping", field, id);
                return;
            }
            let mut patch = patch.clone();
            if let Some(children) = patch.children.take() {
                let accepted = accept_children(doc, id, children);
                for child in &accepted {
                    detach(doc, child);
                }
                patch.children = Some(accepted);
            }
            if let Some(node) = doc.nodes.get_mut(id) {
                node.apply_patch(&patch);
            }
        }
        Operation::Remove { id } => {
            if !doc.contains(id) {
                tracing::debug!("[Engine] remove: node '{}' is gone, skipping", id);
                return;
            }
            let mut doomed: HashSet<String> = doc.descendants_of(id).into_iter().collect();
            doomed.insert(id.clone());
            doc.nodes.retain(|node_id, _| !doomed.contains(node_id));
        }
        Operation::Reorder { id, z_index } => {
            // y doubles as the stacking order; there is no separate z field
            if let Some(node) = doc.nodes.get_mut(id) {
                node.y = *z_index;
            }
        }
        Operation::Reparent { id, parent_id } => {
            if !doc.contains(id) {
                return;
            }
            match parent_id {
                Some(parent) => {
                    if !doc.contains(parent) || !doc.can_reparent(id, parent) {
                        tracing::debug!("[Engine] reparent: '{}' under '{}' refused", id, parent);
                        return;
                    }
                    detach(doc, id);
                    push_child(doc, parent, id);
                }
                None => detach(doc, id),
            }
        }
        Operation::AddChild { parent_id, child_id } => {
            if !doc.contains(parent_id) || !doc.contains(child_id) {
                return;
            }
            if doc
                .node(parent_id)
                .is_some_and(|parent| parent.child_ids().contains(child_id))
            {
                return;
            }
            if !doc.can_reparent(child_id, parent_id) {
                tracing::debug!("[Engine] addChild: '{}' under '{}' would cycle", child_id, parent_id);
                return;
            }
            detach(doc, child_id);
            push_child(doc, parent_id, child_id);
        }
        Operation::RemoveChild { parent_id, child_id } => {
            if let Some(children) = doc.nodes.get_mut(parent_id).and_then(|node| node.children.as_mut()) {
                children.retain(|child| child != child_id);
            }
        }
    }

    reconcile(doc);
}

/// Filter a proposed children list down to ids that can legally move under `owner`
fn accept_children(doc: &Document, owner: &str, proposed: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    proposed
        .into_iter()
        .filter(|child| doc.contains(child) && doc.can_reparent(child, owner) && seen.insert(child.clone()))
        .collect()
}

/// Remove `id` from every children list
fn detach(doc: &mut Document, id: &str) {
    for node in doc.nodes.values_mut() {
        if let Some(children) = node.children.as_mut() {
            children.retain(|child| child != id);
        }
    }
}

fn push_child(doc: &mut Document, parent: &str, child: &str) {
    if let Some(node) = doc.nodes.get_mut(parent) {
        node.children.get_or_insert_with(Vec::new).push(child.to_string());
    }
}

/// Re-derive parent links from children lists
fn reconcile(doc: &mut Document) {
    let ids: HashSet<String> = doc.nodes.keys().cloned().collect();
    let mut owner: HashMap<String, String> = HashMap::new();

    // First claim in document order wins; dangling and self references drop out.
    for node in doc.nodes.values_mut() {
        let node_id = &node.id;
        if let Some(children) = node.children.as_mut() {
            children.retain(|child| {
                if child == node_id || !ids.contains(child) || owner.contains_key(child) {
                    return false;
                }
                owner.insert(child.clone(), node_id.clone());
                true
            });
        }
    }

    let mut cuts = Vec::new();
    for id in doc.nodes.keys() {
        let mut cursor = id;
        let mut steps = 0;
        while let Some(parent) = owner.get(cursor) {
            if parent == id {
                cuts.push(id.clone());
                break;
            }
            cursor = parent;
            steps += 1;
            if steps > ids.len() {
                break;
            }
        }
        if let Some(cut) = cuts.last() {
            if cut == id {
                owner.remove(id);
            }
        }
    }
    for id in &cuts {
        tracing::warn!("[Engine] Breaking parent cycle at '{}'", id);
        detach(doc, id);
    }

    for node in doc.nodes.values_mut() {
        node.parent_id = owner.get(&node.id).cloned();
    }
}
