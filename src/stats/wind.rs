//! Wind direction sectors (wind-rose data) and speed distribution.

use super::calculator::{HistogramBin, StatsCalculator, StatsError};
use crate::data::SensorTable;

pub const DEFAULT_SECTORS: usize = 12;
pub const DEFAULT_SPEED_BINS: usize = 30;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindSector {
    pub start_deg: f64,
    pub end_deg: f64,
    pub count: usize,
    /// `NaN` for sectors with no observations.
    pub mean_speed: f64,
}

impl WindSector {
    /// Share of all observations falling in this sector.
    pub fn frequency(&self, total: usize) -> f64 {
        if total == 0 {
            0.0
        } else {
            self.count as f64 / total as f64
        }
    }
}

/// Bucket rows into `sectors` equal direction sectors starting at north.
pub fn wind_sectors(table: &SensorTable, sectors: usize) -> Result<Vec<WindSector>, StatsError> {
    let wd = table
        .column("WD")
        .ok_or_else(|| StatsError::MissingColumn("WD".to_string()))?;
    let ws = table
        .column("WS")
        .ok_or_else(|| StatsError::MissingColumn("WS".to_string()))?;

    if sectors == 0 {
        return Ok(Vec::new());
    }

    let width = 360.0 / sectors as f64;
    let mut sums = vec![(0usize, 0.0f64); sectors];

    for (dir, speed) in wd.iter().zip(ws) {
        if dir.is_nan() || speed.is_nan() {
            continue;
        }
        let idx = ((dir.rem_euclid(360.0) / width) as usize).min(sectors - 1);
        sums[idx].0 += 1;
        sums[idx].1 += speed;
    }

    Ok(sums
        .into_iter()
        .enumerate()
        .map(|(i, (count, total))| WindSector {
            start_deg: i as f64 * width,
            end_deg: (i + 1) as f64 * width,
            count,
            mean_speed: if count == 0 { f64::NAN } else { total / count as f64 },
        })
        .collect())
}

/// Histogram of wind speed.
pub fn speed_distribution(
    table: &SensorTable,
    bins: usize,
) -> Result<Vec<HistogramBin>, StatsError> {
    let ws = table
        .column("WS")
        .ok_or_else(|| StatsError::MissingColumn("WS".to_string()))?;
    Ok(StatsCalculator::histogram(ws, bins))
}
