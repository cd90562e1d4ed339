//! Cleaning module - per-column sign correction and outlier repair

mod cleaner;
mod report;
mod rules;

pub use cleaner::{CleanError, DataCleaner, CLEANING_DEFAULT, IQR_FACTOR};
pub use report::{ColumnReport, FlaggedValue, OutlierReport, Policy, Repair};
pub use rules::{ColumnRule, Range, RuleSet, ALLOW_NEGATIVE, CLEANING};
