//! Container layout
//!
//! When a container's alignment is a positional layout, child positions are
//! recomputed from the container's geometry and the children's sizes. The
//! result is a batch of `update` operations, one per child that moves.

use crate::shared::document::Document;
use crate::shared::error::EngineError;
use crate::shared::node::{Alignment, Node, NodePatch};
use crate::shared::operation::Operation;

/// Inset between the container edge and the first child
pub const LAYOUT_PADDING: u32 = 10;

/// Space between neighbouring children
pub const LAYOUT_GAP: u32 = 10;

/// Compute `(id, x, y)` for each child under the given alignment
pub fn layout_positions(alignment: Alignment, container: &Node, children: &[&Node]) -> Vec<(String, u32, u32)> {
    let origin_x = container.x.saturating_add(LAYOUT_PADDING);
    let origin_y = container.y.saturating_add(LAYOUT_PADDING);
    let inner_right = container.right().saturating_sub(LAYOUT_PADDING);

    let mut cursor_x = origin_x;
    let mut cursor_y = origin_y;
    let mut row_height = 0;
    let mut out = Vec::with_capacity(children.len());

    for child in children {
        match alignment {
            Alignment::None => return Vec::new(),
            Alignment::Horizontal => {
                out.push((child.id.clone(), cursor_x, origin_y));
                cursor_x = cursor_x.saturating_add(child.width).saturating_add(LAYOUT_GAP);
            }
            Alignment::Vertical => {
                out.push((child.id.clone(), origin_x, cursor_y));
                cursor_y = cursor_y.saturating_add(child.height).saturating_add(LAYOUT_GAP);
            }
            Alignment::Grid => {
                if cursor_x > origin_x && cursor_x.saturating_add(child.width) > inner_right {
                    cursor_x = origin_x;
                    cursor_y = cursor_y.saturating_add(row_height).saturating_add(LAYOUT_GAP);
                    row_height = 0;
                }
                out.push((child.id.clone(), cursor_x, cursor_y));
                cursor_x = cursor_x.saturating_add(child.width).saturating_add(LAYOUT_GAP);
                row_height = row_height.max(child.height);
            }
        }
    }

    out
}

/// Plan the batch that lays out `container_id`'s children
///
/// Children already in place produce no operation, so an aligned container
/// yields an empty batch.
pub fn align_children(doc: &Document, container_id: &str) -> Result<Vec<Operation>, EngineError> {
    let container = doc.node(container_id).ok_or_else(|| EngineError::UnknownNode {
        id: container_id.to_string(),
    })?;
    let alignment = container.alignment.unwrap_or_default();
    let children = doc.children_of(container_id);

    let ops = layout_positions(alignment, container, &children)
        .into_iter()
        .zip(children.iter())
        .filter(|((_, x, y), child)| child.x != *x || child.y != *y)
        .map(|((id, x, y), _)| Operation::update(id, NodePatch::position(x, y)))
        .collect();
    Ok(ops)
}
