//! Render engine: one aligned line per plan node plus a detail block.

use std::fmt;

use unicode_width::UnicodeWidthStr;

use crate::format::{
    annotate_rows, annotate_time, group_digits, group_digits_float, row_deviation, RowDeviation,
};
use crate::plan::PlanNode;
use crate::position::{Position, ViewKind};
use crate::style::{StyleSet, Styles};

/// Width of one statistic field.
pub const STAT_COLUMN_WIDTH: usize = 15;

const PARALLEL_BAR: &str = "┃┃ ";
const PARALLEL_BLANK: &str = "   ";
const NOT_ANALYZED: &str = "- ";
/// Launched-worker counts above this are shown as this.
const MAX_SHOWN_WORKERS: u32 = 99;

/// Which statistic overlay fills the right hand side of each line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum StatDisplay {
    #[default]
    Rows,
    Buffers,
    Cost,
    Time,
    None,
}

impl StatDisplay {
    pub const ALL: [StatDisplay; 5] = [
        StatDisplay::Rows,
        StatDisplay::Buffers,
        StatDisplay::Cost,
        StatDisplay::Time,
        StatDisplay::None,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StatDisplay::Rows => "rows",
            StatDisplay::Buffers => "buffers",
            StatDisplay::Cost => "cost",
            StatDisplay::Time => "time",
            StatDisplay::None => "none",
        }
    }

    /// Column headings for the two statistic fields.
    pub fn headings(&self) -> Option<(&'static str, &'static str)> {
        match self {
            StatDisplay::Rows => Some(("planned", "actual")),
            StatDisplay::Buffers => Some(("total", "read")),
            StatDisplay::Cost => Some(("startup", "total")),
            StatDisplay::Time => Some(("startup", "total")),
            StatDisplay::None => None,
        }
    }
}

impl fmt::Display for StatDisplay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything a single frame needs to know about the user's interaction state.
#[derive(Debug, Clone)]
pub struct RenderContext<'a> {
    /// Index of the focused line.
    pub cursor: usize,
    /// Pinned node whose children are highlighted, independent of the cursor.
    pub selected: Option<&'a PlanNode>,
    pub join_view: bool,
    pub indent: bool,
    pub display_parallel: bool,
    pub stat_display: StatDisplay,
    /// Terminal columns available.
    pub width: usize,
    /// Runtime statistics exist for this plan.
    pub analyzed: bool,
    /// Append the planned/actual row estimate to the detail panel.
    pub row_deviation: bool,
    pub styles: &'a StyleSet,
}

impl<'a> RenderContext<'a> {
    pub fn new(styles: &'a StyleSet) -> Self {
        Self {
            cursor: 0,
            selected: None,
            join_view: false,
            indent: true,
            display_parallel: false,
            stat_display: StatDisplay::Rows,
            width: 80,
            analyzed: false,
            row_deviation: false,
            styles,
        }
    }

    pub fn view(&self) -> ViewKind {
        ViewKind::from_join_view(self.join_view)
    }

    /// Picks the style tier for the line at `line` whose node sits at `position`.
    fn styles_for(&self, line: usize, position: &Position) -> &'a Styles {
        if self.cursor == line {
            return &self.styles.cursor;
        }
        let selected_id = self.selected.map(|s| s.position(self.view()).id);
        if selected_id.is_some() && position.parent == selected_id {
            &self.styles.child_of_selected
        } else {
            &self.styles.normal
        }
    }
}

/// Display width of `s` on a terminal, ignoring escape sequences.
pub fn visible_width(s: &str) -> usize {
    UnicodeWidthStr::width(strip_escapes(s).as_str())
}

fn strip_escapes(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\x1b' {
            out.push(c);
            continue;
        }
        match chars.next() {
            // CSI: parameters and intermediates up to a final byte in @..~
            Some('[') => {
                for c in chars.by_ref() {
                    if ('@'..='~').contains(&c) {
                        break;
                    }
                }
            }
            // OSC: terminated by BEL or ST
            Some(']') => {
                while let Some(c) = chars.next() {
                    if c == '\x07' {
                        break;
                    }
                    if c == '\x1b' && chars.peek() == Some(&'\\') {
                        chars.next();
                        break;
                    }
                }
            }
            _ => {}
        }
    }
    out
}

/// Renders the line at index `line` of the active view for `node`.
///
/// `position` must be the node's position in the view selected by `ctx`.
pub fn render_line(node: &PlanNode, line: usize, position: &Position, ctx: &RenderContext) -> String {
    let styles = ctx.styles_for(line, position);

    let mut buf = String::new();
    buf.push_str(&styles.gutter.render(&format!("{:>2} ", line + 1)));

    if ctx.display_parallel {
        let workers = node.launched_workers().min(MAX_SHOWN_WORKERS);
        if position.below_gather {
            buf.push_str(&styles.gutter.render(PARALLEL_BAR));
        } else if workers > 0 {
            buf.push_str(&styles.workers.render(&format!("{workers:02} ")));
        } else {
            buf.push_str(PARALLEL_BLANK);
        }
    }

    if ctx.indent {
        buf.push_str(&styles.everything.render(&"  ".repeat(position.level)));
    }

    if ctx.join_view && node.has_relation() {
        let abbrev = node.abbrev_name();
        if abbrev.is_empty() {
            buf.push_str(&styles.node_name.render(&node.name()));
        } else {
            buf.push_str(&styles.node_name.render(abbrev));
        }
        buf.push_str(" - ");
        buf.push_str(&styles.relation.render(&node.relation_name));
    } else {
        buf.push_str(&styles.node_name.render(&node.name()));
    }

    let needed = ctx.width.saturating_sub(visible_width(&buf));
    let columns = match ctx.stat_display {
        StatDisplay::Rows => Some(rows_columns(node, ctx.analyzed)),
        StatDisplay::Buffers => Some(buffers_columns(node, ctx.analyzed)),
        StatDisplay::Cost => Some(cost_columns(node)),
        StatDisplay::Time => Some(time_columns(node, ctx.analyzed)),
        StatDisplay::None => None,
    };
    match columns {
        Some(columns) => buf.push_str(&styles.value.render(&format!("{columns:>needed$}"))),
        None => buf.push_str(&styles.everything.render(&" ".repeat(needed))),
    }

    buf.push('\n');
    buf
}

fn two_columns(left: &str, right: &str) -> String {
    let width = STAT_COLUMN_WIDTH;
    format!("{left:>width$}{right:>width$}")
}

fn rows_columns(node: &PlanNode, analyzed: bool) -> String {
    let planned = group_digits(clamp_i64(node.plan_rows));
    let actual = match node.analyzed.as_ref() {
        Some(a) if analyzed => annotate_rows(node, a.actual_rows, a.actual_loops),
        _ => NOT_ANALYZED.to_string(),
    };
    two_columns(&planned, &actual)
}

fn buffers_columns(node: &PlanNode, analyzed: bool) -> String {
    match node.analyzed.as_ref() {
        Some(a) if analyzed => {
            let total = a.shared_buffers_read.saturating_add(a.shared_buffers_hit);
            two_columns(
                &group_digits(clamp_i64(total)),
                &group_digits(clamp_i64(a.shared_buffers_read)),
            )
        }
        _ => two_columns(NOT_ANALYZED, NOT_ANALYZED),
    }
}

fn cost_columns(node: &PlanNode) -> String {
    two_columns(
        &group_digits_float(node.startup_cost),
        &group_digits_float(node.total_cost),
    )
}

fn time_columns(node: &PlanNode, analyzed: bool) -> String {
    match node.analyzed.as_ref() {
        Some(a) if analyzed => two_columns(
            &group_digits_float(a.startup_time),
            &annotate_time(node, a.total_time, a.actual_loops),
        ),
        _ => two_columns(NOT_ANALYZED, NOT_ANALYZED),
    }
}

fn clamp_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

/// Renders the detail panel for `node`.
pub fn render_detail(node: &PlanNode, ctx: &RenderContext) -> String {
    let normal = &ctx.styles.normal;
    let detail = &ctx.styles.detail;
    let mut buf = String::new();

    let abbrev = node.abbrev_name();
    if !abbrev.is_empty() {
        buf.push_str(&normal.node_name.render(abbrev));
        buf.push_str(" - ");
    }
    buf.push_str(&normal.node_name.render(&node.name()));
    buf.push('\n');
    buf.push_str(&"-".repeat(ctx.width));
    buf.push('\n');

    let mut line = |label: &str, value: String| {
        buf.push_str(&format!("{}{}\n", detail.label.render(label), value));
    };

    if let Some(a) = node.analyzed.as_ref() {
        if a.temp_read_blocks > 0 {
            line("Temp Read Blocks: ", detail.warning.render(&a.temp_read_blocks.to_string()));
        }
        if a.temp_write_blocks > 0 {
            line("Temp Write Blocks: ", detail.warning.render(&a.temp_write_blocks.to_string()));
        }
    }
    if ctx.analyzed {
        line(
            "Actual Loops: ",
            normal.everything.render(&node.actual_loops().to_string()),
        );
    }
    if !node.relation_name.is_empty() {
        line("Relation Name: ", normal.relation.render(&node.relation_name));
    }
    if !node.index_name.is_empty() {
        line("Index Name: ", normal.everything.render(&node.index_name));
    }
    if !node.index_cond.is_empty() {
        line("Index Cond: ", normal.everything.render(&node.index_cond));
    }
    if !node.filter.is_empty() {
        line("Filter: ", normal.everything.render(&node.filter));
    }
    if ctx.row_deviation && ctx.analyzed {
        if let Some(a) = node.analyzed.as_ref() {
            let deviation = row_deviation(node.plan_rows, a.actual_rows);
            let style = match deviation {
                RowDeviation::Severe(_) => &detail.warning,
                RowDeviation::Caution(_) => &detail.caution,
                RowDeviation::Normal(_) | RowDeviation::Undefined => &normal.everything,
            };
            line("Row Estimate: ", style.render(&deviation.label()));
        }
    }

    buf
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::Analyzed;
    use crate::style::StyleRef;
    use crate::PlanTree;

    fn analyzed(rows: u64, loops: u64) -> Analyzed {
        Analyzed {
            actual_rows: rows,
            actual_loops: loops,
            ..Default::default()
        }
    }

    fn line_of(tree: &PlanTree, ctx: &RenderContext, line: usize) -> String {
        let view = ctx.view();
        let node = tree.line_node(view, line).expect("line exists");
        render_line(node, line, node.position(view), ctx)
    }

    #[test]
    fn test_visible_width_ignores_escapes() {
        assert_eq!(visible_width("\x1b[1;31mabc\x1b[0m"), 3);
        assert_eq!(visible_width("┃┃ "), 3);
        assert_eq!(visible_width("\x1b]8;;http://x\x07link\x1b]8;;\x1b\\"), 4);
        assert_eq!(visible_width("(3) → 40"), 8);
    }

    #[test]
    fn test_rows_nested_loop_inner_leads_with_loops() {
        let tree = PlanTree::new(
            PlanNode::new("Nested Loop")
                .analyzed(analyzed(40, 1))
                .child(PlanNode::new("Seq Scan").relationship("Outer").analyzed(analyzed(3, 1)))
                .child(
                    PlanNode::new("Index Scan")
                        .relationship("Inner")
                        .analyzed(analyzed(40, 3)),
                ),
        );
        let styles = StyleSet::plain();
        let mut ctx = RenderContext::new(&styles);
        ctx.analyzed = true;

        let inner = line_of(&tree, &ctx, 2);
        assert!(inner.trim_end().ends_with("(3) → 40"), "{inner:?}");
        let outer = line_of(&tree, &ctx, 1);
        assert!(outer.trim_end().ends_with(" 3"), "{outer:?}");
        assert!(!outer.contains('('));
    }

    #[test]
    fn test_rows_without_analyze_uses_placeholder() {
        let tree = PlanTree::new(PlanNode::new("Seq Scan").relation("t").rows(1234));
        let styles = StyleSet::plain();
        let ctx = RenderContext::new(&styles);
        let line = line_of(&tree, &ctx, 0);
        assert!(line.ends_with(&format!("{:>15}{:>15}\n", "1_234", "- ")));
    }

    #[test]
    fn test_line_fills_width_exactly() {
        let tree = PlanTree::new(PlanNode::new("Seq Scan").rows(10).analyzed(analyzed(10, 1)));
        let styles = StyleSet::plain();
        let mut ctx = RenderContext::new(&styles);
        ctx.analyzed = true;
        for stat in StatDisplay::ALL {
            ctx.stat_display = stat;
            let line = line_of(&tree, &ctx, 0);
            assert_eq!(visible_width(line.trim_end_matches('\n')), 80, "{stat}");
        }
    }

    #[test]
    fn test_narrow_width_clamps() {
        let tree = PlanTree::new(PlanNode::new("Seq Scan").rows(10));
        let styles = StyleSet::plain();
        let mut ctx = RenderContext::new(&styles);
        ctx.width = 5;
        ctx.stat_display = StatDisplay::None;
        assert_eq!(line_of(&tree, &ctx, 0), " 1 Seq Scan\n");

        ctx.stat_display = StatDisplay::Cost;
        let line = line_of(&tree, &ctx, 0);
        assert!(line.starts_with(" 1 Seq Scan"));
        assert!(line.ends_with(&format!("{:>15}{:>15}\n", "0.00", "0.00")));
    }

    #[test]
    fn test_width_measured_on_visible_text() {
        let tree = PlanTree::new(PlanNode::new("Seq Scan").rows(10));
        let styles = StyleSet {
            normal: Styles {
                node_name: StyleRef::new(|s: &str| format!("\x1b[1m{s}\x1b[0m")),
                ..Default::default()
            },
            cursor: Styles {
                node_name: StyleRef::new(|s: &str| format!("\x1b[7m{s}\x1b[0m")),
                ..Default::default()
            },
            ..Default::default()
        };
        let ctx = RenderContext::new(&styles);
        let line = line_of(&tree, &ctx, 0);
        assert!(line.contains("\x1b[7mSeq Scan"));
        assert_eq!(visible_width(line.trim_end_matches('\n')), 80);
    }

    #[test]
    fn test_buffers_and_time_columns() {
        let tree = PlanTree::new(PlanNode::new("Seq Scan").analyzed(Analyzed {
            shared_buffers_read: 1500,
            shared_buffers_hit: 500,
            startup_time: 0.5,
            total_time: 1234.5,
            actual_loops: 1,
            ..Default::default()
        }));
        let styles = StyleSet::plain();
        let mut ctx = RenderContext::new(&styles);
        ctx.analyzed = true;
        ctx.stat_display = StatDisplay::Buffers;
        assert!(line_of(&tree, &ctx, 0).ends_with(&format!("{:>15}{:>15}\n", "2_000", "1_500")));
        ctx.stat_display = StatDisplay::Time;
        assert!(line_of(&tree, &ctx, 0).ends_with(&format!("{:>15}{:>15}\n", "0.50", "1_234.50")));
    }

    #[test]
    fn test_frame_without_analyze_hides_node_statistics() {
        let tree = PlanTree::new(PlanNode::new("Seq Scan").rows(10).analyzed(Analyzed {
            actual_rows: 10,
            actual_loops: 1,
            shared_buffers_hit: 3,
            total_time: 5.0,
            ..Default::default()
        }));
        let styles = StyleSet::plain();
        let mut ctx = RenderContext::new(&styles);
        ctx.analyzed = false;
        let placeholders = format!("{:>15}{:>15}\n", "- ", "- ");

        ctx.stat_display = StatDisplay::Rows;
        assert!(line_of(&tree, &ctx, 0).ends_with(&format!("{:>15}{:>15}\n", "10", "- ")));
        ctx.stat_display = StatDisplay::Buffers;
        assert!(line_of(&tree, &ctx, 0).ends_with(&placeholders));
        ctx.stat_display = StatDisplay::Time;
        assert!(line_of(&tree, &ctx, 0).ends_with(&placeholders));
    }

    #[test]
    fn test_time_without_analyze_uses_placeholder() {
        let tree = PlanTree::new(PlanNode::new("Seq Scan"));
        let styles = StyleSet::plain();
        let mut ctx = RenderContext::new(&styles);
        ctx.stat_display = StatDisplay::Time;
        assert!(line_of(&tree, &ctx, 0).ends_with(&format!("{:>15}{:>15}\n", "- ", "- ")));
    }

    #[test]
    fn test_highlight_tiers() {
        let tree = PlanTree::new(
            PlanNode::new("Hash Join")
                .child(PlanNode::new("Seq Scan").relation("a"))
                .child(PlanNode::new("Hash").child(PlanNode::new("Seq Scan").relation("b"))),
        );
        let styles = StyleSet {
            cursor: Styles {
                gutter: StyleRef::new(|s: &str| format!("C{s}")),
                ..Default::default()
            },
            child_of_selected: Styles {
                gutter: StyleRef::new(|s: &str| format!("K{s}")),
                ..Default::default()
            },
            normal: Styles {
                gutter: StyleRef::new(|s: &str| format!("N{s}")),
                ..Default::default()
            },
            ..Default::default()
        };
        let mut ctx = RenderContext::new(&styles);
        ctx.cursor = 1;
        ctx.selected = Some(tree.root());

        assert!(line_of(&tree, &ctx, 0).starts_with("N"));
        assert!(line_of(&tree, &ctx, 1).starts_with("C"));
        assert!(line_of(&tree, &ctx, 2).starts_with("K"));
        assert!(line_of(&tree, &ctx, 3).starts_with("N"));

        ctx.join_view = true;
        // Hash is hidden, so the second scan is now a child of the root on line 2
        assert!(line_of(&tree, &ctx, 2).starts_with("K"));
    }

    #[test]
    fn test_indent_and_parallel_column() {
        let tree = PlanTree::new(
            PlanNode::new("Gather")
                .gather(2)
                .analyzed(Analyzed {
                    launched_workers: 2,
                    ..Default::default()
                })
                .child(PlanNode::new("Seq Scan").relation("t")),
        );
        let styles = StyleSet::plain();
        let mut ctx = RenderContext::new(&styles);
        ctx.display_parallel = true;
        ctx.stat_display = StatDisplay::None;
        assert!(line_of(&tree, &ctx, 0).starts_with(" 1 02 Gather"));
        assert!(line_of(&tree, &ctx, 1).starts_with(" 2 ┃┃   Seq Scan"));

        ctx.indent = false;
        ctx.display_parallel = false;
        assert!(line_of(&tree, &ctx, 1).starts_with(" 2 Seq Scan"));
    }

    #[test]
    fn test_parallel_column_keeps_width_with_many_workers() {
        let tree = PlanTree::new(
            PlanNode::new("Gather")
                .gather(128)
                .analyzed(Analyzed {
                    launched_workers: 128,
                    ..Default::default()
                })
                .child(PlanNode::new("Seq Scan").relation("t")),
        );
        let styles = StyleSet::plain();
        let mut ctx = RenderContext::new(&styles);
        ctx.display_parallel = true;
        ctx.indent = false;
        ctx.stat_display = StatDisplay::None;
        assert!(line_of(&tree, &ctx, 0).starts_with(" 1 99 Gather"));
        assert!(line_of(&tree, &ctx, 1).starts_with(" 2 ┃┃ Seq Scan"));
    }

    #[test]
    fn test_join_view_name_without_abbreviation() {
        let tree = PlanTree::new(PlanNode::new("Tid Scan").relation("t"));
        let styles = StyleSet::plain();
        let mut ctx = RenderContext::new(&styles);
        ctx.join_view = true;
        assert!(line_of(&tree, &ctx, 0).starts_with(" 1 Tid Scan - t"));
    }

    #[test]
    fn test_detail_order() {
        let node = PlanNode::new("Index Scan")
            .relation("orders")
            .index("orders_pkey")
            .index_cond("(id = 1)")
            .filter("(status = 'open')")
            .analyzed(Analyzed {
                actual_loops: 4,
                temp_read_blocks: 7,
                temp_write_blocks: 9,
                ..Default::default()
            });
        let styles = StyleSet::plain();
        let mut ctx = RenderContext::new(&styles);
        ctx.width = 10;
        ctx.analyzed = true;

        let detail = render_detail(&node, &ctx);
        let expected = "IS - Index Scan\n\
                        ----------\n\
                        Temp Read Blocks: 7\n\
                        Temp Write Blocks: 9\n\
                        Actual Loops: 4\n\
                        Relation Name: orders\n\
                        Index Name: orders_pkey\n\
                        Index Cond: (id = 1)\n\
                        Filter: (status = 'open')\n";
        assert_eq!(detail, expected);
    }

    #[test]
    fn test_detail_skips_empty_fields() {
        let node = PlanNode::new("Aggregate").partial_mode("Finalize");
        let styles = StyleSet::plain();
        let mut ctx = RenderContext::new(&styles);
        ctx.width = 3;
        assert_eq!(render_detail(&node, &ctx), "Finalize Aggregate\n---\n");
    }

    #[test]
    fn test_detail_row_estimate_is_opt_in() {
        let node = PlanNode::new("Seq Scan").rows(5).analyzed(analyzed(100, 1));
        let styles = StyleSet::plain();
        let mut ctx = RenderContext::new(&styles);
        ctx.width = 1;
        ctx.analyzed = true;
        assert!(!render_detail(&node, &ctx).contains("Row Estimate"));

        ctx.row_deviation = true;
        assert!(render_detail(&node, &ctx).ends_with("Row Estimate: 5.0%\n"));

        let empty = PlanNode::new("Seq Scan").rows(5).analyzed(analyzed(0, 1));
        assert!(render_detail(&empty, &ctx).ends_with("Row Estimate: undefined\n"));
    }
}
