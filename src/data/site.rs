//! Measurement sites.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown site '{0}' (expected benin, sierraleone or togo)")]
pub struct UnknownSite(pub String);

/// One of the three monitored solar sites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Site {
    Benin,
    SierraLeone,
    Togo,
}

impl Site {
    pub const ALL: [Site; 3] = [Site::Benin, Site::SierraLeone, Site::Togo];

    /// Stable lowercase key used in file names and configuration.
    pub fn key(&self) -> &'static str {
        match self {
            Site::Benin => "benin",
            Site::SierraLeone => "sierraleone",
            Site::Togo => "togo",
        }
    }

    /// Human readable label handed to report consumers.
    pub fn label(&self) -> &'static str {
        match self {
            Site::Benin => "Benin",
            Site::SierraLeone => "Sierra Leone",
            Site::Togo => "Togo",
        }
    }
}

impl fmt::Display for Site {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Site {
    type Err = UnknownSite;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '-' && *c != '_')
            .collect::<String>()
            .to_ascii_lowercase();

        match normalized.as_str() {
            "benin" => Ok(Site::Benin),
            "sierraleone" => Ok(Site::SierraLeone),
            "togo" => Ok(Site::Togo),
            _ => Err(UnknownSite(s.to_string())),
        }
    }
}
