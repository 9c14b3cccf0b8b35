//! Decoding of PostgreSQL `EXPLAIN (FORMAT JSON)` output.
//!
//! Accepts the array PostgreSQL prints as well as a single statement object, and
//! the output of plain EXPLAIN as well as EXPLAIN ANALYZE. Analyzed statistics are
//! attached to a node exactly when it reports "Actual Loops".

use serde::Deserialize;
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::plan::{is_gather_type, Analyzed, ParentRelationship, PlanNode};

#[derive(Deserialize)]
#[serde(untagged)]
enum Document {
    Statements(Vec<Statement>),
    Statement(Statement),
}

#[derive(Deserialize)]
struct Statement {
    #[serde(rename = "Plan")]
    plan: Option<RawPlan>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct RawPlan {
    #[serde(rename = "Node Type")]
    node_type: String,
    #[serde(rename = "Partial Mode")]
    partial_mode: String,
    #[serde(rename = "Plans")]
    plans: Vec<RawPlan>,
    #[serde(rename = "Parent Relationship")]
    parent_relationship: String,

    #[serde(rename = "Plan Rows")]
    plan_rows: f64,
    #[serde(rename = "Startup Cost")]
    startup_cost: f64,
    #[serde(rename = "Total Cost")]
    total_cost: f64,
    #[serde(rename = "Relation Name")]
    relation_name: String,
    #[serde(rename = "Index Name")]
    index_name: String,
    #[serde(rename = "Index Cond")]
    index_cond: String,
    #[serde(rename = "Filter")]
    filter: String,
    #[serde(rename = "Workers Planned")]
    workers_planned: u32,

    #[serde(rename = "Actual Rows")]
    actual_rows: f64,
    #[serde(rename = "Actual Loops")]
    actual_loops: Option<f64>,
    #[serde(rename = "Workers Launched")]
    workers_launched: u32,
    #[serde(rename = "Shared Read Blocks")]
    shared_read_blocks: u64,
    #[serde(rename = "Shared Hit Blocks")]
    shared_hit_blocks: u64,
    #[serde(rename = "Temp Read Blocks")]
    temp_read_blocks: u64,
    #[serde(rename = "Temp Written Blocks")]
    temp_written_blocks: u64,
    #[serde(rename = "Actual Startup Time")]
    actual_startup_time: f64,
    #[serde(rename = "Actual Total Time")]
    actual_total_time: f64,
}

/// Decodes the first statement of an EXPLAIN JSON document into a plan tree root.
pub fn parse_explain(input: &str) -> Result<PlanNode> {
    let document: Document = serde_json::from_str(input.trim())?;
    let statement = match document {
        Document::Statements(statements) => {
            debug!(statements = statements.len(), "decoded EXPLAIN document");
            statements.into_iter().next().ok_or(Error::EmptyDocument)?
        }
        Document::Statement(statement) => statement,
    };
    let plan = statement.plan.ok_or(Error::MissingPlan(0))?;
    Ok(convert(plan, false))
}

// PostgreSQL reports averaged row counts with decimals on newer versions
fn count(value: f64) -> u64 {
    if value.is_finite() && value > 0.0 {
        value.round() as u64
    } else {
        0
    }
}

fn convert(raw: RawPlan, parent_is_nested_loop: bool) -> PlanNode {
    trace!(node_type = %raw.node_type, children = raw.plans.len(), "converting plan node");

    let analyzed = raw.actual_loops.map(|loops| Analyzed {
        actual_rows: count(raw.actual_rows),
        actual_loops: count(loops),
        launched_workers: raw.workers_launched,
        shared_buffers_read: raw.shared_read_blocks,
        shared_buffers_hit: raw.shared_hit_blocks,
        temp_read_blocks: raw.temp_read_blocks,
        temp_write_blocks: raw.temp_written_blocks,
        startup_time: raw.actual_startup_time,
        total_time: raw.actual_total_time,
    });

    let is_nested_loop = raw.node_type == "Nested Loop";
    let children = raw
        .plans
        .into_iter()
        .map(|child| convert(child, is_nested_loop))
        .collect();

    PlanNode {
        is_gather: is_gather_type(&raw.node_type),
        node_type: raw.node_type,
        partial_mode: raw.partial_mode,
        children,
        plan_rows: count(raw.plan_rows),
        startup_cost: raw.startup_cost,
        total_cost: raw.total_cost,
        relation_name: raw.relation_name,
        index_name: raw.index_name,
        index_cond: raw.index_cond,
        filter: raw.filter,
        planned_workers: raw.workers_planned,
        parent_relationship: ParentRelationship::from(raw.parent_relationship.as_str()),
        parent_is_nested_loop,
        analyzed,
        ..Default::default()
    }
}
