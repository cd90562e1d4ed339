//! Data Cleaner Module
//! Sign correction and outlier repair driven by a [`RuleSet`].

use super::report::{ColumnReport, FlaggedValue, OutlierReport, Repair};
use super::rules::{ColumnRule, Range, RuleSet, CLEANING};
use crate::data::SensorTable;
use crate::stats::StatsCalculator;
use thiserror::Error;

/// IQR multiplier for the adaptive bounds.
pub const IQR_FACTOR: f64 = 1.5;

/// Replacement for the cleaning flag when the column has no mode.
pub const CLEANING_DEFAULT: f64 = 0.0;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CleanError {
    #[error("Column {0} is empty or all-NaN")]
    DegenerateColumn(String),
}

/// Applies per-column validation rules to a sensor table.
pub struct DataCleaner;

impl DataCleaner {
    /// Clean every column named in `rules` and report what changed.
    ///
    /// Columns without a rule pass through untouched; rules for columns the
    /// table does not have are skipped.
    pub fn clean(mut table: SensorTable, rules: &RuleSet) -> (SensorTable, OutlierReport) {
        let mut report = OutlierReport::default();

        for rule in rules.iter() {
            match table.column_mut(&rule.column) {
                Some(values) => report.push(Self::check_negative_and_outliers(values, rule)),
                None => {
                    log::warn!("Column {} not present; skipping", rule.column);
                    let mut skipped = ColumnReport::new(rule);
                    skipped.missing = true;
                    report.push(skipped);
                }
            }
        }

        log::info!(
            "Cleaned {} columns, {} values out of bounds",
            report.columns.len(),
            report.total_flagged()
        );
        (table, report)
    }

    /// Validate one column in place.
    pub fn check_negative_and_outliers(values: &mut [f64], rule: &ColumnRule) -> ColumnReport {
        let mut report = ColumnReport::new(rule);

        if let Err(e) = Self::ensure_populated(&rule.column, values) {
            log::warn!("{e}; leaving it unchanged");
            report.degenerate = true;
            return report;
        }

        if !rule.allow_negative && values.iter().any(|v| *v < 0.0) {
            log::info!("Negative values found in {}. Converting to positive.", rule.column);
            values.iter_mut().for_each(|v| *v = v.abs());
            report.sign_corrected = true;
        }

        let bounds = match rule.expected_range {
            Some(range) => range,
            None => match Self::iqr_bounds(&rule.column, values) {
                Ok(range) => range,
                Err(e) => {
                    log::warn!("{e}; skipping outlier check");
                    report.degenerate = true;
                    return report;
                }
            },
        };
        report.bounds = Some(bounds);
        report.flagged = Self::outside(values, bounds);

        if report.flagged.is_empty() {
            return report;
        }

        report.repair = if rule.expected_range.is_some() && rule.column == CLEANING {
            Self::substitute_mode(values, &report.flagged)
        } else {
            log::info!(
                "{} values in {} outside [{}, {}]; capping",
                report.flagged.len(),
                rule.column,
                bounds.low,
                bounds.high
            );
            Self::clip(values, bounds);
            Repair::Clipped
        };

        report
    }

    /// `[Q1 - 1.5 IQR, Q3 + 1.5 IQR]` over the non-`NaN` values.
    pub fn iqr_bounds(column: &str, values: &[f64]) -> Result<Range, CleanError> {
        let (q1, q3) = StatsCalculator::quartiles(values)
            .ok_or_else(|| CleanError::DegenerateColumn(column.to_string()))?;
        let iqr = q3 - q1;
        Ok(Range::new(q1 - IQR_FACTOR * iqr, q3 + IQR_FACTOR * iqr))
    }

    fn ensure_populated(column: &str, values: &[f64]) -> Result<(), CleanError> {
        if values.iter().all(|v| v.is_nan()) {
            return Err(CleanError::DegenerateColumn(column.to_string()));
        }
        Ok(())
    }

    /// Cells outside `bounds`. `NaN` never compares outside.
    fn outside(values: &[f64], bounds: Range) -> Vec<FlaggedValue> {
        values
            .iter()
            .enumerate()
            .filter(|(_, v)| **v < bounds.low || **v > bounds.high)
            .map(|(row, v)| FlaggedValue { row, value: *v })
            .collect()
    }

    fn clip(values: &mut [f64], bounds: Range) {
        for v in values.iter_mut() {
            if *v < bounds.low {
                *v = bounds.low;
            } else if *v > bounds.high {
                *v = bounds.high;
            }
        }
    }

    /// Replace flagged cells with the column mode, or the fixed default when
    /// there is none.
    fn substitute_mode(values: &mut [f64], flagged: &[FlaggedValue]) -> Repair {
        let (value, repair) = match StatsCalculator::mode(values) {
            Some(value) => {
                log::info!("Outliers in {CLEANING} replaced with mode value {value}.");
                (value, Repair::ModeSubstituted { value })
            }
            None => {
                log::warn!("No mode found for {CLEANING}; using {CLEANING_DEFAULT}");
                (
                    CLEANING_DEFAULT,
                    Repair::DefaultSubstituted {
                        value: CLEANING_DEFAULT,
                    },
                )
            }
        };

        for f in flagged {
            values[f.row] = value;
        }
        repair
    }
}
