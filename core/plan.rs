use std::fmt;

use crate::position::{Position, ViewKind, ViewPositions};

/// How a plan node relates to its parent operator.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ParentRelationship {
    #[default]
    None,
    Outer,
    Inner,
    Member,
    InitPlan,
    SubPlan,
    Subquery,
    Other(String),
}

impl ParentRelationship {
    pub fn as_str(&self) -> &str {
        match self {
            ParentRelationship::None => "",
            ParentRelationship::Outer => "Outer",
            ParentRelationship::Inner => "Inner",
            ParentRelationship::Member => "Member",
            ParentRelationship::InitPlan => "InitPlan",
            ParentRelationship::SubPlan => "SubPlan",
            ParentRelationship::Subquery => "Subquery",
            ParentRelationship::Other(s) => s,
        }
    }
}

impl From<&str> for ParentRelationship {
    fn from(value: &str) -> Self {
        match value {
            "" => ParentRelationship::None,
            "Outer" => ParentRelationship::Outer,
            "Inner" => ParentRelationship::Inner,
            "Member" => ParentRelationship::Member,
            "InitPlan" => ParentRelationship::InitPlan,
            "SubPlan" => ParentRelationship::SubPlan,
            "Subquery" => ParentRelationship::Subquery,
            other => ParentRelationship::Other(other.to_string()),
        }
    }
}

impl fmt::Display for ParentRelationship {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Runtime statistics, present only when the plan was actually executed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Analyzed {
    pub actual_rows: u64,
    pub actual_loops: u64,
    pub launched_workers: u32,
    pub shared_buffers_read: u64,
    pub shared_buffers_hit: u64,
    pub temp_read_blocks: u64,
    pub temp_write_blocks: u64,
    /// Milliseconds until the first row was produced.
    pub startup_time: f64,
    /// Milliseconds until the last row was produced, per loop.
    pub total_time: f64,
}

/// One execution plan operator.
///
/// Children are owned and kept in plan order. Once a node is handed to
/// [`crate::PlanTree::new`] it is never mutated again; the two view positions are
/// filled in exactly once during that construction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlanNode {
    pub node_type: String,
    pub partial_mode: String,
    pub children: Vec<PlanNode>,

    pub plan_rows: u64,
    pub startup_cost: f64,
    pub total_cost: f64,
    pub relation_name: String,
    pub index_name: String,
    pub index_cond: String,
    pub filter: String,
    pub is_gather: bool,
    pub planned_workers: u32,
    pub parent_relationship: ParentRelationship,
    pub parent_is_nested_loop: bool,

    pub analyzed: Option<Analyzed>,

    pub(crate) positions: ViewPositions,
}

impl PlanNode {
    pub fn new(node_type: impl Into<String>) -> Self {
        let node_type = node_type.into();
        let is_gather = is_gather_type(&node_type);
        Self {
            node_type,
            is_gather,
            ..Default::default()
        }
    }

    pub fn partial_mode(mut self, mode: impl Into<String>) -> Self {
        self.partial_mode = mode.into();
        self
    }

    pub fn relation(mut self, name: impl Into<String>) -> Self {
        self.relation_name = name.into();
        self
    }

    pub fn index(mut self, name: impl Into<String>) -> Self {
        self.index_name = name.into();
        self
    }

    pub fn index_cond(mut self, cond: impl Into<String>) -> Self {
        self.index_cond = cond.into();
        self
    }

    pub fn filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = filter.into();
        self
    }

    pub fn rows(mut self, plan_rows: u64) -> Self {
        self.plan_rows = plan_rows;
        self
    }

    pub fn cost(mut self, startup: f64, total: f64) -> Self {
        self.startup_cost = startup;
        self.total_cost = total;
        self
    }

    pub fn gather(mut self, planned_workers: u32) -> Self {
        self.is_gather = true;
        self.planned_workers = planned_workers;
        self
    }

    pub fn relationship(mut self, relationship: impl Into<ParentRelationship>) -> Self {
        self.parent_relationship = relationship.into();
        self
    }

    pub fn analyzed(mut self, analyzed: Analyzed) -> Self {
        self.analyzed = Some(analyzed);
        self
    }

    /// Appends a child. Children of a "Nested Loop" are flagged so that inner-side
    /// statistics can be loop annotated.
    pub fn child(mut self, mut child: PlanNode) -> Self {
        child.parent_is_nested_loop = self.node_type == "Nested Loop";
        self.children.push(child);
        self
    }

    /// The operator name, qualified by the partial mode when there is one.
    pub fn name(&self) -> String {
        format!("{} {}", self.partial_mode, self.node_type)
            .trim()
            .to_string()
    }

    /// Short operator code shown next to the relation name in the join view.
    pub fn abbrev_name(&self) -> &'static str {
        match self.node_type.as_str() {
            "Index Only Scan" => "IOS",
            "Index Scan" => "IS",
            "Seq Scan" => "SS",
            "Bitmap Heap Scan" => "BHS",
            _ => "",
        }
    }

    pub fn has_relation(&self) -> bool {
        !self.relation_name.is_empty()
    }

    /// True when the node runs once per outer row of a nested loop.
    pub fn is_nested_loop_inner(&self) -> bool {
        self.parent_is_nested_loop && self.parent_relationship == ParentRelationship::Inner
    }

    /// Loop count, or zero for a plan that was not executed.
    pub fn actual_loops(&self) -> u64 {
        self.analyzed.as_ref().map_or(0, |a| a.actual_loops)
    }

    pub fn launched_workers(&self) -> u32 {
        self.analyzed.as_ref().map_or(0, |a| a.launched_workers)
    }

    pub fn position(&self, view: ViewKind) -> &Position {
        self.positions.get(view)
    }

    pub fn display(&self, view: ViewKind) -> bool {
        self.position(view).display
    }
}

pub(crate) fn is_gather_type(node_type: &str) -> bool {
    matches!(node_type, "Gather" | "Gather Merge")
}
