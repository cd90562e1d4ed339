//! CSV Data Loader Module
//! Reads raw site CSV files with Polars and turns them into a [`SensorTable`].

use super::table::{SensorTable, TableError, TIMESTAMP};
use chrono::{NaiveDate, NaiveDateTime};
use polars::prelude::*;
use std::path::Path;
use thiserror::Error;

/// Free-text column that is empty in every site file.
pub const COMMENTS: &str = "Comments";

/// Columns every site file must provide.
pub const REQUIRED_COLUMNS: [&str; 16] = [
    "Timestamp",
    "GHI",
    "DNI",
    "DHI",
    "Tamb",
    "RH",
    "WS",
    "WSgust",
    "WSstdev",
    "WD",
    "WDstdev",
    "BP",
    "Cleaning",
    "Precipitation",
    "TModA",
    "TModB",
];

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Data unavailable at {location}: {reason}")]
    DataUnavailable { location: String, reason: String },
    #[error("Schema mismatch: missing columns {missing:?}")]
    SchemaMismatch { missing: Vec<String> },
    #[error("Invalid timestamp '{value}' at row {row}")]
    InvalidTimestamp { row: usize, value: String },
    #[error("Failed to load CSV: {0}")]
    CsvError(#[from] PolarsError),
    #[error(transparent)]
    Table(#[from] TableError),
}

/// Handles CSV file loading with Polars.
pub struct DataLoader;

impl DataLoader {
    /// Load a site CSV file from disk.
    pub fn load_csv(path: &Path) -> Result<SensorTable, LoaderError> {
        if !path.is_file() {
            return Err(LoaderError::DataUnavailable {
                location: path.display().to_string(),
                reason: "file not found".to_string(),
            });
        }

        // Every column is read as text and coerced afterwards, so a column
        // that only looks integral early on keeps its later decimals.
        let df = LazyCsvReader::new(path)
            .with_infer_schema_length(Some(0))
            .with_ignore_errors(true)
            .finish()?
            .collect()?;

        log::debug!("Read {} rows x {} columns from {}", df.height(), df.width(), path.display());
        Self::from_dataframe(df)
    }

    /// Validate a raw DataFrame and convert it to a [`SensorTable`].
    ///
    /// The timestamp column is parsed, `Comments` is dropped and every other
    /// column is coerced to `f64` with unparseable cells becoming `NaN`.
    pub fn from_dataframe(df: DataFrame) -> Result<SensorTable, LoaderError> {
        let names: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();

        let missing: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .filter(|required| !names.iter().any(|n| n == *required))
            .map(|s| s.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(LoaderError::SchemaMismatch { missing });
        }

        let timestamps = Self::parse_timestamps(&df)?;
        let mut table = SensorTable::new(timestamps);

        for name in &names {
            if name == TIMESTAMP {
                continue;
            }
            if name == COMMENTS {
                log::debug!("Dropping {COMMENTS} column");
                continue;
            }

            let column = df.column(name)?;
            let as_f64 = column.cast(&DataType::Float64)?;
            let coerced = as_f64.null_count().saturating_sub(column.null_count());
            if coerced > 0 {
                log::warn!("{coerced} non-numeric cells in {name} set to NaN");
            }

            let values: Vec<f64> = as_f64
                .f64()?
                .into_iter()
                .map(|v| v.unwrap_or(f64::NAN))
                .collect();
            table.insert_column(name, values)?;
        }

        Ok(table)
    }

    /// Parse a single ISO-like timestamp.
    pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
        let raw = raw.trim();
        DATETIME_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
            .or_else(|| {
                NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                    .ok()
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
            })
    }

    fn parse_timestamps(df: &DataFrame) -> Result<Vec<NaiveDateTime>, LoaderError> {
        let as_str = df.column(TIMESTAMP)?.cast(&DataType::String)?;
        let ca = as_str.str()?;

        ca.into_iter()
            .enumerate()
            .map(|(row, raw)| {
                raw.and_then(Self::parse_timestamp)
                    .ok_or_else(|| LoaderError::InvalidTimestamp {
                        row,
                        value: raw.unwrap_or_default().to_string(),
                    })
            })
            .collect()
    }
}
