//! Outlier Report
//! What the cleaner found and changed, column by column.

use super::rules::{ColumnRule, Range};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Policy {
    /// Bounds derived from the interquartile range.
    Adaptive,
    /// Bounds from a configured physical range.
    FixedRange,
}

/// Repair applied to the flagged cells of a column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Repair {
    None,
    Clipped,
    ModeSubstituted { value: f64 },
    DefaultSubstituted { value: f64 },
}

/// A cell that fell outside the bounds, with its pre-repair value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FlaggedValue {
    pub row: usize,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnReport {
    pub column: String,
    pub policy: Policy,
    /// Bounds actually applied; `None` when the check did not run.
    pub bounds: Option<Range>,
    pub sign_corrected: bool,
    pub flagged: Vec<FlaggedValue>,
    pub repair: Repair,
    /// Column was empty or entirely `NaN`.
    pub degenerate: bool,
    /// Column absent from the table.
    pub missing: bool,
}

impl ColumnReport {
    pub fn new(rule: &ColumnRule) -> Self {
        Self {
            column: rule.column.clone(),
            policy: match rule.expected_range {
                Some(_) => Policy::FixedRange,
                None => Policy::Adaptive,
            },
            bounds: None,
            sign_corrected: false,
            flagged: Vec::new(),
            repair: Repair::None,
            degenerate: false,
            missing: false,
        }
    }

    pub fn flagged_rows(&self) -> Vec<usize> {
        self.flagged.iter().map(|f| f.row).collect()
    }

    /// True if the column was modified in any way.
    pub fn changed(&self) -> bool {
        self.sign_corrected || !self.flagged.is_empty()
    }
}

/// Per-column results of one cleaning run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OutlierReport {
    pub columns: Vec<ColumnReport>,
}

impl OutlierReport {
    pub fn push(&mut self, report: ColumnReport) {
        self.columns.push(report);
    }

    pub fn get(&self, column: &str) -> Option<&ColumnReport> {
        self.columns.iter().find(|c| c.column == column)
    }

    /// Rows flagged in `column`, empty if the column was not checked.
    pub fn flagged_rows(&self, column: &str) -> Vec<usize> {
        self.get(column).map(|c| c.flagged_rows()).unwrap_or_default()
    }

    pub fn total_flagged(&self) -> usize {
        self.columns.iter().map(|c| c.flagged.len()).sum()
    }

    pub fn is_clean(&self) -> bool {
        self.columns.iter().all(|c| !c.changed())
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
