//! Channel statistics split by the value of a key column.
//!
//! Used to compare module output on rows where the panels were cleaned
//! against rows where they were not.

use super::calculator::{StatsCalculator, StatsError, SummaryTable};
use crate::cleaning::CLEANING;
use crate::data::SensorTable;
use std::fmt;

/// Module output channels compared across the cleaning flag.
pub const CLEANING_IMPACT_COLUMNS: [&str; 2] = ["ModA", "ModB"];

/// Statistics for the rows sharing one key value.
#[derive(Debug, Clone)]
pub struct KeyGroup {
    pub key: f64,
    pub rows: usize,
    pub summary: SummaryTable,
}

#[derive(Debug, Clone)]
pub struct GroupedStats {
    pub key_column: String,
    /// Ordered by ascending key.
    pub groups: Vec<KeyGroup>,
}

impl GroupedStats {
    pub fn group(&self, key: f64) -> Option<&KeyGroup> {
        self.groups.iter().find(|g| g.key == key)
    }
}

impl fmt::Display for GroupedStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for g in &self.groups {
            writeln!(f, "{} = {} ({} rows)", self.key_column, g.key, g.rows)?;
            write!(f, "{}", g.summary)?;
        }
        Ok(())
    }
}

/// Describe `columns` separately for each distinct value of `key_column`.
/// Rows whose key is `NaN` belong to no group.
pub fn group_stats(
    table: &SensorTable,
    key_column: &str,
    columns: &[&str],
) -> Result<GroupedStats, StatsError> {
    let keys = table
        .column(key_column)
        .ok_or_else(|| StatsError::MissingColumn(key_column.to_string()))?;
    let series = columns
        .iter()
        .map(|name| {
            table
                .column(name)
                .map(|values| (*name, values))
                .ok_or_else(|| StatsError::MissingColumn(name.to_string()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut distinct: Vec<f64> = keys.iter().copied().filter(|k| !k.is_nan()).collect();
    distinct.sort_by(|a, b| a.total_cmp(b));
    distinct.dedup();

    let groups = distinct
        .into_iter()
        .map(|key| {
            let rows: Vec<usize> = (0..keys.len()).filter(|&r| keys[r] == key).collect();
            let columns = series
                .iter()
                .map(|(name, values)| {
                    let picked: Vec<f64> = rows.iter().map(|&r| values[r]).collect();
                    let mut stats = StatsCalculator::compute_descriptive_stats(&picked);
                    stats.column = name.to_string();
                    stats
                })
                .collect();
            KeyGroup {
                key,
                rows: rows.len(),
                summary: SummaryTable { columns },
            }
        })
        .collect();

    Ok(GroupedStats {
        key_column: key_column.to_string(),
        groups,
    })
}

/// ModA/ModB statistics for cleaned versus uncleaned rows.
pub fn cleaning_impact(table: &SensorTable) -> Result<GroupedStats, StatsError> {
    group_stats(table, CLEANING, &CLEANING_IMPACT_COLUMNS)
}
