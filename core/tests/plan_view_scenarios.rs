// End to end scenarios: EXPLAIN JSON in, rendered frame out.

use pgex_core::{
    parse_explain, render_line, PlanTree, RenderContext, Result, StatDisplay, StyleSet, ViewKind,
};

const PARALLEL_SCAN: &str = r#"
[
  {
    "Plan": {
      "Node Type": "Gather",
      "Startup Cost": 1000.0,
      "Total Cost": 12345.67,
      "Plan Rows": 1000,
      "Workers Planned": 2,
      "Workers Launched": 2,
      "Actual Startup Time": 0.4,
      "Actual Total Time": 41.25,
      "Actual Rows": 950,
      "Actual Loops": 1,
      "Plans": [
        {
          "Node Type": "Seq Scan",
          "Parent Relationship": "Outer",
          "Relation Name": "orders",
          "Plan Rows": 1000,
          "Actual Rows": 950,
          "Actual Loops": 1
        }
      ]
    }
  }
]"#;

fn lines(frame: &str) -> Vec<&str> {
    frame.lines().collect()
}

#[test]
fn gather_scenario_in_plan_view() -> Result<()> {
    let tree = PlanTree::new(parse_explain(PARALLEL_SCAN)?);
    let styles = StyleSet::plain();
    let mut ctx = RenderContext::new(&styles);
    ctx.display_parallel = true;
    ctx.stat_display = StatDisplay::Rows;
    ctx.analyzed = tree.is_analyzed();
    ctx.width = 60;

    let frame = tree.render_frame(&ctx);
    let lines = lines(&frame);
    assert_eq!(lines.len(), 2);

    assert!(lines[0].starts_with(" 1 02 Gather"), "{:?}", lines[0]);
    assert!(lines[0].ends_with(&format!("{:>15}{:>15}", "1_000", "950")));

    assert!(lines[1].starts_with(" 2 ┃┃   Seq Scan"), "{:?}", lines[1]);
    assert!(lines[1].ends_with(&format!("{:>15}{:>15}", "1_000", "950")));
    Ok(())
}

#[test]
fn gather_scenario_in_join_view() -> Result<()> {
    let tree = PlanTree::new(parse_explain(PARALLEL_SCAN)?);
    let styles = StyleSet::plain();
    let mut ctx = RenderContext::new(&styles);
    ctx.join_view = true;
    ctx.analyzed = true;

    let frame = tree.render_frame(&ctx);
    let lines = lines(&frame);
    assert_eq!(lines.len(), 2);
    assert!(lines[1].starts_with(" 2   SS - orders"), "{:?}", lines[1]);
    Ok(())
}

#[test]
fn narrow_terminal_still_renders() -> Result<()> {
    let tree = PlanTree::new(parse_explain(PARALLEL_SCAN)?);
    let styles = StyleSet::plain();
    let mut ctx = RenderContext::new(&styles);
    ctx.width = 3;
    ctx.display_parallel = true;

    for stat in StatDisplay::ALL {
        ctx.stat_display = stat;
        let frame = tree.render_frame(&ctx);
        assert_eq!(frame.lines().count(), 2);
    }
    Ok(())
}

#[test]
fn rendering_the_same_line_twice_is_identical() -> Result<()> {
    let tree = PlanTree::new(parse_explain(PARALLEL_SCAN)?);
    let styles = StyleSet::plain();
    let mut ctx = RenderContext::new(&styles);
    ctx.analyzed = true;
    ctx.selected = Some(tree.root());
    ctx.stat_display = StatDisplay::Time;

    let node = tree.line_node(ViewKind::Plan, 1).expect("second line");
    let first = render_line(node, 1, node.position(ViewKind::Plan), &ctx);
    let second = render_line(node, 1, node.position(ViewKind::Plan), &ctx);
    assert_eq!(first, second);
    Ok(())
}

#[test]
fn nested_loop_inner_rows_carry_loop_count() -> Result<()> {
    let tree = PlanTree::new(parse_explain(
        r#"[{"Plan": {"Node Type": "Nested Loop", "Plan Rows": 40, "Actual Rows": 40, "Actual Loops": 1,
            "Plans": [
              {"Node Type": "Seq Scan", "Parent Relationship": "Outer", "Relation Name": "a",
               "Plan Rows": 3, "Actual Rows": 3, "Actual Loops": 1},
              {"Node Type": "Index Scan", "Parent Relationship": "Inner", "Relation Name": "b",
               "Plan Rows": 10, "Actual Rows": 40, "Actual Loops": 3}
            ]}}]"#,
    )?);
    let styles = StyleSet::plain();
    let mut ctx = RenderContext::new(&styles);
    ctx.analyzed = true;

    let frame = tree.render_frame(&ctx);
    let lines = lines(&frame);
    assert!(lines[2].ends_with("(3) → 40"), "{:?}", lines[2]);
    assert!(lines[1].ends_with(&format!("{:>15}{:>15}", "3", "3")));
    Ok(())
}
