//! Position and view engine for query execution plans.
//!
//! A [`PlanTree`] takes ownership of a parsed plan, numbers every node once for the
//! structural plan view and once for the join view, and then renders aligned
//! terminal lines and detail panels for whatever interaction state the caller
//! passes in a [`RenderContext`].
mod assert;
mod error;
pub mod explain_json;
pub mod format;
pub mod join_view;
mod plan;
pub mod position;
pub mod render;
pub mod style;
mod tree;

pub use error::{Error, Result};
pub use explain_json::parse_explain;
pub use format::{group_digits, group_digits_float, row_deviation, RowDeviation};
pub use plan::{Analyzed, ParentRelationship, PlanNode};
pub use position::{Position, ViewKind};
pub use render::{render_detail, render_line, visible_width, RenderContext, StatDisplay};
pub use style::{DetailStyles, Paint, Plain, StyleRef, StyleSet, Styles};
pub use tree::{PlanTree, PreOrder};
