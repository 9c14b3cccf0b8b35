//! Number formatting shared by the render engine.
//!
//! Digits are grouped with `_` rather than `,` or `.` so the output reads the same
//! whatever the user's locale uses as a decimal mark.

use crate::plan::PlanNode;

const GROUP_SEPARATOR: char = '_';

/// Groups the digits of `value` in threes from the right: `1234567` -> `1_234_567`.
pub fn group_digits(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value < 0 {
        out.push('-');
    }
    push_grouped(&mut out, &digits);
    out
}

/// Same grouping as [`group_digits`] on the integer part, with exactly two decimals.
pub fn group_digits_float(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut out = String::with_capacity(fixed.len() + int_part.len() / 3 + 1);
    // -0.001 rounds to 0.00; don't print a sign for it
    if value < 0.0 && fixed.bytes().any(|b| b.is_ascii_digit() && b != b'0') {
        out.push('-');
    }
    push_grouped(&mut out, int_part);
    out.push('.');
    out.push_str(frac_part);
    out
}

fn push_grouped(out: &mut String, digits: &str) {
    let len = digits.len();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(GROUP_SEPARATOR);
        }
        out.push(c);
    }
}

fn group_count(value: u64) -> String {
    group_digits(i64::try_from(value).unwrap_or(i64::MAX))
}

/// Actual rows annotated with the loop count.
///
/// Inner children of a nested loop run once per outer row, so the loop count leads:
/// `(3) → 40`. Otherwise a count above one trails the rows: `40(3)`.
pub fn annotate_rows(node: &PlanNode, actual_rows: u64, loops: u64) -> String {
    let rows = group_count(actual_rows);
    if node.is_nested_loop_inner() {
        format!("({}) → {}", group_count(loops), rows)
    } else if loops > 1 {
        format!("{}({})", rows, group_count(loops))
    } else {
        rows
    }
}

/// Total time, prefixed with the loop count for nested loop inner children.
pub fn annotate_time(node: &PlanNode, total_time: f64, loops: u64) -> String {
    let time = group_digits_float(total_time);
    if node.is_nested_loop_inner() {
        format!("({})→{}", group_count(loops), time)
    } else {
        time
    }
}

/// How far the planner's row estimate is from what actually came out.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RowDeviation {
    /// No rows came out, so there is nothing to compare against.
    Undefined,
    /// Estimate below 10% of actual.
    Severe(f64),
    /// Estimate below 50% of actual.
    Caution(f64),
    Normal(f64),
}

impl RowDeviation {
    pub fn percent(&self) -> Option<f64> {
        match self {
            RowDeviation::Undefined => None,
            RowDeviation::Severe(p) | RowDeviation::Caution(p) | RowDeviation::Normal(p) => {
                Some(*p)
            }
        }
    }

    pub fn label(&self) -> String {
        match self.percent() {
            Some(p) => format!("{p:.1}%"),
            None => "undefined".to_string(),
        }
    }
}

/// Planned rows as a percentage of actual rows.
pub fn row_deviation(planned: u64, actual: u64) -> RowDeviation {
    if actual == 0 {
        return RowDeviation::Undefined;
    }
    let percent = planned as f64 * 100.0 / actual as f64;
    if percent < 10.0 {
        RowDeviation::Severe(percent)
    } else if percent < 50.0 {
        RowDeviation::Caution(percent)
    } else {
        RowDeviation::Normal(percent)
    }
}
