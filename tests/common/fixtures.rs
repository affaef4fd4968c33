//! Document fixtures and proptest strategies
//!
//! Random operations draw node ids from a small fixed pool so that
//! references collide often: updates hit live nodes, removes cascade and
//! reparent attempts regularly try to create cycles.

use chrono::{DateTime, TimeZone, Utc};
use proptest::prelude::*;
use xfcanvas::shared::engine::apply_operations;
use xfcanvas::shared::{Alignment, Document, Node, NodePatch, Operation};

/// Ids random operations may reference
pub const ID_POOL: [&str; 8] = ["n0", "n1", "n2", "n3", "n4", "n5", "n6", "n7"];

/// Fixed clock so replays compare equal
pub fn at(second: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000 + second, 0)
        .single()
        .unwrap_or_else(Utc::now)
}

pub fn empty_document() -> Document {
    Document::new("doc-test", 800, 600, None, at(0))
}

/// Apply `batches` in order, one version per batch
pub fn build(batches: &[Vec<Operation>]) -> Document {
    batches
        .iter()
        .enumerate()
        .fold(empty_document(), |doc, (i, batch)| apply_operations(doc, batch, at(i as i64 + 1)))
}

fn pool_id() -> impl Strategy<Value = String> {
    prop::sample::select(ID_POOL.to_vec()).prop_map(str::to_string)
}

fn arb_node() -> impl Strategy<Value = Node> {
    (
        pool_id(),
        any::<bool>(),
        0u32..500,
        0u32..500,
        1u32..200,
        1u32..200,
        prop::option::of(pool_id()),
    )
        .prop_map(|(id, frame, x, y, width, height, parent)| {
            let mut node = if frame {
                Node::frame(id, x, y, width, height)
            } else {
                Node::rect(id, x, y, width, height, "#336699")
            };
            node.parent_id = parent;
            node
        })
}

fn arb_patch() -> impl Strategy<Value = NodePatch> {
    prop_oneof![
        (0u32..500, 0u32..500).prop_map(|(x, y)| NodePatch::position(x, y)),
        prop::collection::vec(pool_id(), 0..4).prop_map(NodePatch::children),
        prop::sample::select(vec![Alignment::Horizontal, Alignment::Vertical, Alignment::Grid]).prop_map(|a| {
            NodePatch {
                alignment: Some(a),
                ..NodePatch::default()
            }
        }),
    ]
}

/// Any primitive operation over the id pool
pub fn arb_operation() -> impl Strategy<Value = Operation> {
    prop_oneof![
        3 => arb_node().prop_map(Operation::add),
        2 => (pool_id(), arb_patch()).prop_map(|(id, patch)| Operation::update(id, patch)),
        1 => pool_id().prop_map(Operation::remove),
        1 => (pool_id(), 0u32..1000).prop_map(|(id, z)| Operation::reorder(id, z)),
        2 => (pool_id(), prop::option::of(pool_id())).prop_map(|(id, parent)| Operation::reparent(id, parent)),
        2 => (pool_id(), pool_id()).prop_map(|(parent, child)| Operation::add_child(parent, child)),
        1 => (pool_id(), pool_id()).prop_map(|(parent, child)| Operation::remove_child(parent, child)),
    ]
}

/// A non-empty batch
pub fn arb_batch() -> impl Strategy<Value = Vec<Operation>> {
    prop::collection::vec(arb_operation(), 1..6)
}

/// A short history of non-empty batches
pub fn arb_history() -> impl Strategy<Value = Vec<Vec<Operation>>> {
    prop::collection::vec(arb_batch(), 0..12)
}
