//! Statistics Calculator Module
//! Descriptive statistics, quantiles and modes over sensor channels.

use crate::data::SensorTable;
use rayon::prelude::*;
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StatsError {
    #[error("Column {0} not found")]
    MissingColumn(String),
    #[error("{what} needs at least {needed} usable rows, found {found}")]
    InsufficientData {
        what: String,
        needed: usize,
        found: usize,
    },
}

/// Descriptive statistics for a single channel (the `describe()` table
/// without its count row; `count` is still kept for callers).
#[derive(Debug, Clone)]
pub struct ColumnStats {
    pub column: String,
    pub count: usize,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub p25: f64,
    pub median: f64,
    pub p75: f64,
    pub max: f64,
}

impl Default for ColumnStats {
    fn default() -> Self {
        Self {
            column: String::new(),
            count: 0,
            mean: f64::NAN,
            std: f64::NAN,
            min: f64::NAN,
            p25: f64::NAN,
            median: f64::NAN,
            p75: f64::NAN,
            max: f64::NAN,
        }
    }
}

/// One bar of a histogram.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistogramBin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

/// Summary statistics for every channel of a table.
#[derive(Debug, Clone, Default)]
pub struct SummaryTable {
    pub columns: Vec<ColumnStats>,
}

impl SummaryTable {
    pub fn get(&self, column: &str) -> Option<&ColumnStats> {
        self.columns.iter().find(|s| s.column == column)
    }
}

impl fmt::Display for SummaryTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:<14}{:>12}{:>12}{:>12}{:>12}{:>12}{:>12}{:>12}",
            "", "mean", "std", "min", "25%", "50%", "75%", "max"
        )?;
        for s in &self.columns {
            writeln!(
                f,
                "{:<14}{:>12.3}{:>12.3}{:>12.3}{:>12.3}{:>12.3}{:>12.3}{:>12.3}",
                s.column, s.mean, s.std, s.min, s.p25, s.median, s.p75, s.max
            )?;
        }
        Ok(())
    }
}

/// Handles statistical calculations.
pub struct StatsCalculator;

impl StatsCalculator {
    /// Compute descriptive statistics, ignoring `NaN` cells.
    pub fn compute_descriptive_stats(values: &[f64]) -> ColumnStats {
        let sorted = Self::sorted_finite(values);
        let n = sorted.len();
        if n == 0 {
            return ColumnStats::default();
        }

        let mean = sorted.iter().sum::<f64>() / n as f64;
        let variance = if n > 1 {
            sorted.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1) as f64
        } else {
            f64::NAN
        };

        ColumnStats {
            column: String::new(),
            count: n,
            mean,
            std: variance.sqrt(),
            min: sorted[0],
            p25: Self::percentile(&sorted, 25.0),
            median: Self::percentile(&sorted, 50.0),
            p75: Self::percentile(&sorted, 75.0),
            max: sorted[n - 1],
        }
    }

    /// Calculate percentile using linear interpolation (NumPy compatible).
    pub fn percentile(sorted_values: &[f64], p: f64) -> f64 {
        let n = sorted_values.len();
        if n == 0 {
            return f64::NAN;
        }
        if n == 1 {
            return sorted_values[0];
        }

        let rank = (p / 100.0) * (n - 1) as f64;
        let lower = rank.floor() as usize;
        let upper = (rank.ceil() as usize).min(n - 1);
        let frac = rank - lower as f64;

        if lower == upper {
            sorted_values[lower]
        } else {
            sorted_values[lower] * (1.0 - frac) + sorted_values[upper] * frac
        }
    }

    /// First and third quartiles of the non-`NaN` values, or `None` when
    /// there are none.
    pub fn quartiles(values: &[f64]) -> Option<(f64, f64)> {
        let sorted = Self::sorted_finite(values);
        if sorted.is_empty() {
            return None;
        }
        Some((
            Self::percentile(&sorted, 25.0),
            Self::percentile(&sorted, 75.0),
        ))
    }

    /// Most frequent non-`NaN` value. Ties resolve to the smallest value.
    pub fn mode(values: &[f64]) -> Option<f64> {
        let sorted = Self::sorted_finite(values);
        let first = *sorted.first()?;

        let mut best = (first, 0usize);
        let mut current = (first, 0usize);
        for &v in &sorted {
            if v == current.0 {
                current.1 += 1;
            } else {
                current = (v, 1);
            }
            if current.1 > best.1 {
                best = current;
            }
        }
        Some(best.0)
    }

    /// Equal-width histogram over the non-`NaN` values.
    pub fn histogram(values: &[f64], bins: usize) -> Vec<HistogramBin> {
        let sorted = Self::sorted_finite(values);
        if sorted.is_empty() || bins == 0 {
            return Vec::new();
        }

        let min = sorted[0];
        let max = sorted[sorted.len() - 1];
        let width = if max > min { (max - min) / bins as f64 } else { 1.0 };

        let mut out: Vec<HistogramBin> = (0..bins)
            .map(|i| HistogramBin {
                start: min + i as f64 * width,
                end: min + (i + 1) as f64 * width,
                count: 0,
            })
            .collect();

        for v in sorted {
            let idx = (((v - min) / width) as usize).min(bins - 1);
            out[idx].count += 1;
        }
        out
    }

    /// Describe every channel of the table, columns computed in parallel.
    pub fn describe(table: &SensorTable) -> SummaryTable {
        let columns = table
            .columns()
            .par_iter()
            .map(|col| {
                let mut stats = Self::compute_descriptive_stats(&col.values);
                stats.column = col.name.clone();
                stats
            })
            .collect();

        SummaryTable { columns }
    }

    /// Values sorted ascending with `NaN` removed. Infinities are kept.
    fn sorted_finite(values: &[f64]) -> Vec<f64> {
        let mut sorted: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
        sorted.sort_by(|a, b| a.total_cmp(b));
        sorted
    }
}
