//! Solarscope - solar site sensor log cleaning & analysis
//!
//! Loads the raw meteorological logs of the benin, sierraleone and togo
//! sites, repairs negative and out-of-range readings with a fixed per-site
//! rule table, and computes summary statistics over the cleaned data.

pub mod cleaning;
pub mod config;
pub mod data;
pub mod pipeline;
pub mod stats;

pub use cleaning::{DataCleaner, OutlierReport, RuleSet};
pub use config::Config;
pub use data::{DataLoader, SensorTable, Site};
pub use pipeline::{CleanedSite, PipelineContext, PipelineError};
