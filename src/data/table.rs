//! Sensor Table Module
//! Column-oriented storage for timestamped sensor observations.
//!
//! Missing numeric cells are kept as `NaN` so that every channel has exactly
//! one value per timestamp.

use chrono::NaiveDateTime;
use polars::prelude::*;
use std::fs::File;
use std::path::Path;
use thiserror::Error;

/// Name of the timestamp column in input and output files.
pub const TIMESTAMP: &str = "Timestamp";

/// Format used when writing timestamps back out.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Error, Debug)]
pub enum TableError {
    #[error("Column {column} has {actual} rows, expected {expected}")]
    LengthMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A single named numeric channel.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorColumn {
    pub name: String,
    pub values: Vec<f64>,
}

/// Timestamped sensor observations, one value per channel per row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SensorTable {
    timestamps: Vec<NaiveDateTime>,
    columns: Vec<SensorColumn>,
}

impl SensorTable {
    pub fn new(timestamps: Vec<NaiveDateTime>) -> Self {
        Self {
            timestamps,
            columns: Vec::new(),
        }
    }

    /// Builder form of [`SensorTable::insert_column`].
    pub fn with_column(mut self, name: &str, values: Vec<f64>) -> Result<Self, TableError> {
        self.insert_column(name, values)?;
        Ok(self)
    }

    /// Add a channel, replacing any existing channel with the same name.
    pub fn insert_column(&mut self, name: &str, values: Vec<f64>) -> Result<(), TableError> {
        if values.len() != self.height() {
            return Err(TableError::LengthMismatch {
                column: name.to_string(),
                expected: self.height(),
                actual: values.len(),
            });
        }

        match self.columns.iter_mut().find(|c| c.name == name) {
            Some(existing) => existing.values = values,
            None => self.columns.push(SensorColumn {
                name: name.to_string(),
                values,
            }),
        }
        Ok(())
    }

    /// Remove a channel. Returns `true` if it was present.
    pub fn drop_column(&mut self, name: &str) -> bool {
        let before = self.columns.len();
        self.columns.retain(|c| c.name != name);
        self.columns.len() != before
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.values.as_slice())
    }

    /// Mutable access to a channel's values. The row count cannot change.
    pub fn column_mut(&mut self, name: &str) -> Option<&mut [f64]> {
        self.columns
            .iter_mut()
            .find(|c| c.name == name)
            .map(|c| c.values.as_mut_slice())
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    /// Channel names in insertion order (the timestamp is not included).
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn columns(&self) -> &[SensorColumn] {
        &self.columns
    }

    pub fn timestamps(&self) -> &[NaiveDateTime] {
        &self.timestamps
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Convert to a Polars DataFrame. `NaN` cells become nulls.
    pub fn to_dataframe(&self) -> Result<DataFrame, TableError> {
        let stamps: Vec<String> = self
            .timestamps
            .iter()
            .map(|t| t.format(TIMESTAMP_FORMAT).to_string())
            .collect();

        let mut columns = Vec::with_capacity(self.columns.len() + 1);
        columns.push(Column::new(TIMESTAMP.into(), stamps));

        for col in &self.columns {
            let values: Vec<Option<f64>> = col
                .values
                .iter()
                .map(|v| if v.is_nan() { None } else { Some(*v) })
                .collect();
            columns.push(Column::new(col.name.as_str().into(), values));
        }

        Ok(DataFrame::new(columns)?)
    }

    /// Write the table as CSV with a header row.
    pub fn write_csv(&self, path: &Path) -> Result<(), TableError> {
        let mut df = self.to_dataframe()?;
        let mut file = File::create(path)?;
        CsvWriter::new(&mut file)
            .include_header(true)
            .finish(&mut df)?;
        Ok(())
    }
}
