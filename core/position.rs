//! Plan view positions.
//!
//! A [`Position`] places one node inside one view. The plan view is the plain
//! structural pre-order walk of the tree: every node is shown and nested under its
//! parent operator.

use std::collections::HashSet;

use tracing::{debug, trace};

use crate::plan::PlanNode;
use crate::pgex_assert;

/// The first id handed out in every view.
pub const BASE_ID: usize = 0;

/// Which flattening of the plan tree is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum ViewKind {
    #[default]
    Plan,
    Join,
}

impl ViewKind {
    pub fn from_join_view(join_view: bool) -> Self {
        if join_view {
            ViewKind::Join
        } else {
            ViewKind::Plan
        }
    }
}

/// A node's placement within one view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    /// Sequential id, unique within the view and assigned in traversal order.
    pub id: usize,
    /// Id of the displayed ancestor; `None` for the root.
    pub parent: Option<usize>,
    pub level: usize,
    /// Some strict ancestor in this view is a Gather.
    pub below_gather: bool,
    pub display: bool,
}

/// The two per-view positions of a node. Each resolver only ever writes its own slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct ViewPositions {
    pub(crate) plan: Position,
    pub(crate) join: Position,
}

impl ViewPositions {
    pub(crate) fn get(&self, view: ViewKind) -> &Position {
        match view {
            ViewKind::Plan => &self.plan,
            ViewKind::Join => &self.join,
        }
    }
}

/// Tracks node identities seen during a walk so that a malformed tree is reported
/// instead of looping.
pub(crate) struct Visited(HashSet<*const PlanNode>);

impl Visited {
    pub(crate) fn new() -> Self {
        Self(HashSet::new())
    }

    pub(crate) fn enter(&mut self, node: &PlanNode) {
        let first_visit = self.0.insert(node as *const PlanNode);
        pgex_assert!(
            first_visit,
            "plan node {:?} reached twice while resolving positions, the plan is not a tree",
            node.node_type
        );
    }
}

/// Assigns plan view positions to every node under `root` and returns how many
/// nodes were numbered.
pub fn resolve_plan_view(root: &mut PlanNode) -> usize {
    let mut next_id = BASE_ID;
    let mut visited = Visited::new();
    resolve_node(root, None, 0, false, &mut next_id, &mut visited);
    let count = next_id - BASE_ID;
    debug!(count, "resolved plan view");
    count
}

fn resolve_node(
    node: &mut PlanNode,
    parent: Option<usize>,
    level: usize,
    below_gather: bool,
    next_id: &mut usize,
    visited: &mut Visited,
) {
    visited.enter(node);

    let id = *next_id;
    *next_id += 1;
    node.positions.plan = Position {
        id,
        parent,
        level,
        below_gather,
        display: true,
    };
    trace!(id, level, below_gather, node_type = %node.node_type, "plan position");

    let children_below_gather = below_gather || node.is_gather;
    for child in node.children.iter_mut() {
        resolve_node(
            child,
            Some(id),
            level + 1,
            children_below_gather,
            next_id,
            visited,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> PlanNode {
        PlanNode::new("Hash Join")
            .child(PlanNode::new("Seq Scan").relation("orders"))
            .child(
                PlanNode::new("Hash").child(
                    PlanNode::new("Gather")
                        .gather(2)
                        .child(PlanNode::new("Seq Scan").relation("customers")),
                ),
            )
    }

    #[test]
    fn test_ids_follow_pre_order() {
        let mut root = sample();
        assert_eq!(resolve_plan_view(&mut root), 5);

        let p = |n: &PlanNode| n.positions.plan;
        assert_eq!(p(&root).id, 0);
        assert_eq!(p(&root.children[0]).id, 1);
        assert_eq!(p(&root.children[1]).id, 2);
        assert_eq!(p(&root.children[1].children[0]).id, 3);
        assert_eq!(p(&root.children[1].children[0].children[0]).id, 4);
    }

    #[test]
    fn test_parent_and_level() {
        let mut root = sample();
        resolve_plan_view(&mut root);

        assert_eq!(root.positions.plan.parent, None);
        assert_eq!(root.positions.plan.level, 0);
        let hash = &root.children[1];
        assert_eq!(hash.positions.plan.parent, Some(0));
        assert_eq!(hash.positions.plan.level, 1);
        let scan = &hash.children[0].children[0];
        assert_eq!(scan.positions.plan.parent, Some(3));
        assert_eq!(scan.positions.plan.level, 3);
    }

    #[test]
    fn test_below_gather_excludes_gather_itself() {
        let mut root = sample();
        resolve_plan_view(&mut root);

        let gather = &root.children[1].children[0];
        assert!(!gather.positions.plan.below_gather);
        assert!(gather.children[0].positions.plan.below_gather);
        assert!(!root.children[0].positions.plan.below_gather);
    }

    #[test]
    fn test_plan_view_displays_everything() {
        let mut root = sample();
        resolve_plan_view(&mut root);
        assert!(root.positions.plan.display);
        assert!(root.children[1].positions.plan.display);
    }

    #[test]
    fn test_plan_view_does_not_touch_join_positions() {
        let mut root = sample();
        resolve_plan_view(&mut root);
        assert_eq!(root.children[0].positions.join, Position::default());
    }

    #[test]
    #[should_panic(expected = "internal consistency violation")]
    fn test_visiting_a_node_twice_is_fatal() {
        let node = PlanNode::new("Result");
        let mut visited = Visited::new();
        visited.enter(&node);
        visited.enter(&node);
    }
}
