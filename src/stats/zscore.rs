//! Z-score outlier analysis over a cleaned table.

use super::calculator::StatsError;
use crate::data::SensorTable;
use statrs::statistics::Statistics;

/// Variables screened by default.
pub const ZSCORE_VARIABLES: [&str; 5] = ["Tamb", "GHI", "WS", "RH", "BP"];

/// |z| above this marks a row as an outlier.
pub const DEFAULT_THRESHOLD: f64 = 3.0;

#[derive(Debug, Clone)]
pub struct VariableZScores {
    pub column: String,
    pub mean: f64,
    pub std: f64,
    /// One score per row in [`ZScoreAnalysis::rows`].
    pub scores: Vec<f64>,
    /// Table row indices whose |z| exceeds the threshold.
    pub outliers: Vec<usize>,
}

#[derive(Debug, Clone)]
pub struct ZScoreAnalysis {
    pub threshold: f64,
    /// Table rows that had a value for every screened variable.
    pub rows: Vec<usize>,
    pub variables: Vec<VariableZScores>,
}

impl ZScoreAnalysis {
    pub fn get(&self, column: &str) -> Option<&VariableZScores> {
        self.variables.iter().find(|v| v.column == column)
    }
}

/// Rows where every listed column holds a non-`NaN` value.
pub fn complete_rows(table: &SensorTable, columns: &[&str]) -> Result<Vec<usize>, StatsError> {
    let series = columns
        .iter()
        .map(|name| {
            table
                .column(name)
                .ok_or_else(|| StatsError::MissingColumn(name.to_string()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok((0..table.height())
        .filter(|&row| series.iter().all(|s| !s[row].is_nan()))
        .collect())
}

/// Standardise each variable over the complete rows and flag |z| > threshold.
pub fn zscore_analysis(
    table: &SensorTable,
    variables: &[&str],
    threshold: f64,
) -> Result<ZScoreAnalysis, StatsError> {
    let rows = complete_rows(table, variables)?;
    let mut out = Vec::with_capacity(variables.len());

    for name in variables {
        let column = table
            .column(name)
            .ok_or_else(|| StatsError::MissingColumn(name.to_string()))?;
        let kept: Vec<f64> = rows.iter().map(|&r| column[r]).collect();

        let mean = kept.iter().mean();
        let std = kept.iter().std_dev();
        let scores: Vec<f64> = kept.iter().map(|v| (v - mean) / std).collect();

        let outliers = rows
            .iter()
            .zip(&scores)
            .filter(|(_, z)| z.abs() > threshold)
            .map(|(&row, _)| row)
            .collect();

        out.push(VariableZScores {
            column: name.to_string(),
            mean,
            std,
            scores,
            outliers,
        });
    }

    Ok(ZScoreAnalysis {
        threshold,
        rows,
        variables: out,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use chrono::{Duration, NaiveDate};

    fn table(columns: &[(&str, Vec<f64>)]) -> SensorTable {
        let n = columns.first().map(|(_, v)| v.len()).unwrap_or(0);
        let start = NaiveDate::from_ymd_opt(2022, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
        let mut t = SensorTable::new((0..n).map(|i| start + Duration::minutes(i as i64)).collect());
        for (name, values) in columns {
            t.insert_column(name, values.clone()).unwrap();
        }
        t
    }

    #[test]
    fn drops_incomplete_rows() {
        let t = table(&[("A", vec![1.0, f64::NAN, 3.0]), ("B", vec![1.0, 2.0, f64::NAN])]);
        assert_eq!(complete_rows(&t, &["A", "B"]).unwrap(), vec![0]);
        assert_eq!(complete_rows(&t, &["A"]).unwrap(), vec![0, 2]);
        assert!(matches!(
            complete_rows(&t, &["C"]),
            Err(StatsError::MissingColumn(_))
        ));
    }

    #[test]
    fn flags_extreme_value() {
        let mut ghi = vec![10.0; 20];
        ghi.push(1000.0);
        let t = table(&[("GHI", ghi)]);

        let analysis = zscore_analysis(&t, &["GHI"], DEFAULT_THRESHOLD).unwrap();
        let ghi = analysis.get("GHI").unwrap();

        assert_eq!(ghi.outliers, vec![20]);
        assert_eq!(ghi.scores.len(), 21);
        assert_abs_diff_eq!(ghi.scores.iter().sum::<f64>(), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn constant_column_has_no_outliers() {
        let t = table(&[("BP", vec![998.0; 5])]);
        let analysis = zscore_analysis(&t, &["BP"], DEFAULT_THRESHOLD).unwrap();
        assert!(analysis.get("BP").unwrap().outliers.is_empty());
    }
}
