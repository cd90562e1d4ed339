//! Monthly and hourly profiles derived from the timestamp on the fly.

use super::calculator::StatsError;
use crate::data::SensorTable;
use chrono::{Datelike, NaiveDateTime, Timelike};
use std::collections::BTreeMap;

fn grouped_means<F>(
    table: &SensorTable,
    column: &str,
    key: F,
) -> Result<Vec<(u32, f64)>, StatsError>
where
    F: Fn(&NaiveDateTime) -> u32,
{
    let values = table
        .column(column)
        .ok_or_else(|| StatsError::MissingColumn(column.to_string()))?;

    let mut groups: BTreeMap<u32, (f64, usize)> = BTreeMap::new();
    for (ts, v) in table.timestamps().iter().zip(values) {
        if v.is_nan() {
            continue;
        }
        let entry = groups.entry(key(ts)).or_insert((0.0, 0));
        entry.0 += v;
        entry.1 += 1;
    }

    Ok(groups
        .into_iter()
        .map(|(k, (sum, count))| (k, sum / count as f64))
        .collect())
}

/// Mean of `column` per calendar month (1-12), months without data omitted.
pub fn monthly_means(table: &SensorTable, column: &str) -> Result<Vec<(u32, f64)>, StatsError> {
    grouped_means(table, column, |ts| ts.month())
}

/// Mean of `column` per hour of day (0-23), hours without data omitted.
pub fn hourly_means(table: &SensorTable, column: &str) -> Result<Vec<(u32, f64)>, StatsError> {
    grouped_means(table, column, |ts| ts.hour())
}
