//! Join view positions.
//!
//! The join view keeps base relation access in the foreground. Structural
//! pass-through operators (a `Hash` feeding a hash join, a `Sort` or `Materialize`
//! wrapping a scan, ...) are hidden and their child is pulled up to take their
//! place, so scans end up directly under the join that consumes them.
//!
//! A node is hidden when it is not the root, has no relation name, has exactly one
//! child and is not a Gather. Ids are still handed out to every node in the same
//! pre-order walk as the plan view; parent, level and gather context are computed
//! against the nearest displayed ancestor only.

use tracing::{debug, trace};

use crate::plan::PlanNode;
use crate::position::{Position, Visited, BASE_ID};

/// Context inherited from the nearest displayed ancestor.
#[derive(Clone, Copy)]
struct Anchor {
    id: Option<usize>,
    /// Level the next displayed descendant gets.
    child_level: usize,
    /// Gather context the next displayed descendant gets.
    below_gather: bool,
}

/// Assigns join view positions to every node under `root` and returns how many
/// of them are displayed.
pub fn resolve_join_view(root: &mut PlanNode) -> usize {
    let mut next_id = BASE_ID;
    let mut displayed = 0;
    let mut visited = Visited::new();
    let anchor = Anchor {
        id: None,
        child_level: 0,
        below_gather: false,
    };
    resolve_node(root, anchor, true, &mut next_id, &mut displayed, &mut visited);
    debug!(
        count = next_id - BASE_ID,
        displayed, "resolved join view"
    );
    displayed
}

/// Whether `node` is hidden in the join view.
pub fn is_suppressed(node: &PlanNode, is_root: bool) -> bool {
    !is_root && !node.has_relation() && node.children.len() == 1 && !node.is_gather
}

fn resolve_node(
    node: &mut PlanNode,
    anchor: Anchor,
    is_root: bool,
    next_id: &mut usize,
    displayed: &mut usize,
    visited: &mut Visited,
) {
    visited.enter(node);

    let id = *next_id;
    *next_id += 1;

    let shown = !is_suppressed(node, is_root);
    node.positions.join = Position {
        id,
        parent: anchor.id,
        level: anchor.child_level,
        below_gather: anchor.below_gather,
        display: shown,
    };
    trace!(id, shown, level = anchor.child_level, node_type = %node.node_type, "join position");

    let child_anchor = if shown {
        *displayed += 1;
        Anchor {
            id: Some(id),
            child_level: anchor.child_level + 1,
            below_gather: anchor.below_gather || node.is_gather,
        }
    } else {
        anchor
    };

    for child in node.children.iter_mut() {
        resolve_node(child, child_anchor, false, next_id, displayed, visited);
    }
}
