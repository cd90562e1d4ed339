//! Statistics module - descriptive statistics and analyses over cleaned tables

mod calculator;
pub mod correlation;
pub mod grouped;
pub mod temporal;
pub mod wind;
pub mod zscore;

pub use calculator::{ColumnStats, HistogramBin, StatsCalculator, StatsError, SummaryTable};
