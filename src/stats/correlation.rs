//! Pearson correlation and simple linear regression between channels.

use super::calculator::StatsError;
use crate::data::SensorTable;
use statrs::statistics::Statistics;
use std::fmt;

/// Irradiance and module temperature channels.
pub const SOLAR_TEMPERATURE_COLUMNS: [&str; 5] = ["GHI", "DNI", "DHI", "TModA", "TModB"];

/// Humidity, ambient temperature and irradiance.
pub const CLIMATE_COLUMNS: [&str; 3] = ["RH", "Tamb", "GHI"];

/// Square correlation matrix; `values[i][j]` pairs `columns[i]` with `columns[j]`.
#[derive(Debug, Clone)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    pub values: Vec<Vec<f64>>,
}

impl CorrelationMatrix {
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.columns.iter().position(|c| c == a)?;
        let j = self.columns.iter().position(|c| c == b)?;
        Some(self.values[i][j])
    }
}

impl fmt::Display for CorrelationMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:<8}", "")?;
        for c in &self.columns {
            write!(f, "{:>8}", c)?;
        }
        writeln!(f)?;
        for (name, row) in self.columns.iter().zip(&self.values) {
            write!(f, "{:<8}", name)?;
            for v in row {
                write!(f, "{:>8.2}", v)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Ordinary least squares fit `y = slope * x + intercept`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
    pub r_squared: f64,
    pub n: usize,
}

impl LinearFit {
    pub fn predict(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

/// Rows where both values are present.
fn paired(xs: &[f64], ys: &[f64]) -> (Vec<f64>, Vec<f64>) {
    xs.iter()
        .zip(ys)
        .filter(|(x, y)| !x.is_nan() && !y.is_nan())
        .map(|(x, y)| (*x, *y))
        .unzip()
}

/// Pearson correlation over pairwise-complete rows. `NaN` when undefined.
pub fn pearson(xs: &[f64], ys: &[f64]) -> f64 {
    let (x, y) = paired(xs, ys);
    if x.len() < 2 {
        return f64::NAN;
    }
    let cov = x.iter().covariance(y.iter());
    cov / (x.iter().std_dev() * y.iter().std_dev())
}

pub fn correlation_matrix(
    table: &SensorTable,
    columns: &[&str],
) -> Result<CorrelationMatrix, StatsError> {
    let series = columns
        .iter()
        .map(|name| {
            table
                .column(name)
                .ok_or_else(|| StatsError::MissingColumn(name.to_string()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let values: Vec<Vec<f64>> = series
        .iter()
        .map(|a| series.iter().map(|b| pearson(a, b)).collect())
        .collect();

    Ok(CorrelationMatrix {
        columns: columns.iter().map(|c| c.to_string()).collect(),
        values,
    })
}

/// Fit `y_column` against `x_column` over rows where both are present.
pub fn linear_regression(
    table: &SensorTable,
    x_column: &str,
    y_column: &str,
) -> Result<LinearFit, StatsError> {
    let xs = table
        .column(x_column)
        .ok_or_else(|| StatsError::MissingColumn(x_column.to_string()))?;
    let ys = table
        .column(y_column)
        .ok_or_else(|| StatsError::MissingColumn(y_column.to_string()))?;

    let (x, y) = paired(xs, ys);
    let n = x.len();
    let insufficient = || StatsError::InsufficientData {
        what: format!("regression {y_column} ~ {x_column}"),
        needed: 2,
        found: n,
    };
    if n < 2 {
        return Err(insufficient());
    }

    let x_mean = x.iter().mean();
    let y_mean = y.iter().mean();
    let sxx: f64 = x.iter().map(|v| (v - x_mean).powi(2)).sum();
    if sxx == 0.0 {
        return Err(insufficient());
    }
    let sxy: f64 = x.iter().zip(&y).map(|(a, b)| (a - x_mean) * (b - y_mean)).sum();

    let slope = sxy / sxx;
    let intercept = y_mean - slope * x_mean;

    let ss_tot: f64 = y.iter().map(|v| (v - y_mean).powi(2)).sum();
    let ss_res: f64 = x
        .iter()
        .zip(&y)
        .map(|(a, b)| (b - (slope * a + intercept)).powi(2))
        .sum();
    let r_squared = if ss_tot == 0.0 { 1.0 } else { 1.0 - ss_res / ss_tot };

    Ok(LinearFit {
        slope,
        intercept,
        r_squared,
        n,
    })
}
