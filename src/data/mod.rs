//! Data module - site files, CSV loading and the in-memory sensor table

mod fetch;
mod loader;
mod site;
mod table;

pub use fetch::{ensure_cached, source_url, FetchOutcome};
pub use loader::{DataLoader, LoaderError, COMMENTS, REQUIRED_COLUMNS};
pub use site::{Site, UnknownSite};
pub use table::{SensorColumn, SensorTable, TableError, TIMESTAMP, TIMESTAMP_FORMAT};
