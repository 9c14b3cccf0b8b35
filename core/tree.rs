use tracing::debug;

use crate::assert::assert_send_sync;
use crate::join_view::resolve_join_view;
use crate::plan::PlanNode;
use crate::position::{resolve_plan_view, ViewKind};
use crate::render::{render_detail, render_line, RenderContext};

/// A plan tree with both views resolved.
///
/// Construction is the only place positions are written. Afterwards the tree is
/// read-only and may be shared freely.
#[derive(Debug, Clone)]
pub struct PlanTree {
    root: PlanNode,
    len: usize,
    join_displayed: usize,
}

assert_send_sync!(PlanTree);

impl PlanTree {
    pub fn new(mut root: PlanNode) -> Self {
        let len = resolve_plan_view(&mut root);
        let join_displayed = resolve_join_view(&mut root);
        debug!(len, join_displayed, "plan tree ready");
        Self {
            root,
            len,
            join_displayed,
        }
    }

    pub fn root(&self) -> &PlanNode {
        &self.root
    }

    /// Number of nodes in the tree.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Whether the plan carries runtime statistics.
    pub fn is_analyzed(&self) -> bool {
        self.root.analyzed.is_some()
    }

    /// Every node in pre-order.
    pub fn nodes(&self) -> PreOrder<'_> {
        PreOrder {
            stack: vec![&self.root],
        }
    }

    /// The node whose position in `view` has the given id.
    pub fn node(&self, view: ViewKind, id: usize) -> Option<&PlanNode> {
        self.nodes().find(|n| n.position(view).id == id)
    }

    /// Number of lines `view` shows.
    pub fn line_count(&self, view: ViewKind) -> usize {
        match view {
            ViewKind::Plan => self.len,
            ViewKind::Join => self.join_displayed,
        }
    }

    /// Displayed nodes of `view` in display order.
    pub fn visible(&self, view: ViewKind) -> impl Iterator<Item = &PlanNode> + '_ {
        // pre-order is id order in both views
        self.nodes().filter(move |n| n.display(view))
    }

    /// The node shown on `line` of `view`.
    pub fn line_node(&self, view: ViewKind, line: usize) -> Option<&PlanNode> {
        self.visible(view).nth(line)
    }

    /// The line `node` is shown on in `view`, if it is shown at all.
    pub fn line_of(&self, view: ViewKind, node: &PlanNode) -> Option<usize> {
        let id = node.position(view).id;
        self.visible(view).position(|n| n.position(view).id == id)
    }

    /// Renders every visible line of the active view, top to bottom.
    pub fn render_frame(&self, ctx: &RenderContext) -> String {
        let view = ctx.view();
        self.visible(view)
            .enumerate()
            .map(|(line, node)| render_line(node, line, node.position(view), ctx))
            .collect()
    }

    /// Renders the detail panel of the node under the cursor.
    pub fn render_cursor_detail(&self, ctx: &RenderContext) -> Option<String> {
        self.line_node(ctx.view(), ctx.cursor)
            .map(|node| render_detail(node, ctx))
    }
}

/// Depth-first pre-order walk over a plan tree.
pub struct PreOrder<'a> {
    stack: Vec<&'a PlanNode>,
}

impl<'a> Iterator for PreOrder<'a> {
    type Item = &'a PlanNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}
