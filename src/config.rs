//! Configuration file support.
//!
//! Every field has a default, so running without a file reproduces the
//! standard three-site setup.

use crate::data::Site;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Where downloaded raw files are kept.
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,
    /// Where cleaned tables and reports are written.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default)]
    pub fetch: FetchSettings,
    #[serde(default)]
    pub analysis: AnalysisSettings,
    #[serde(default = "default_sites")]
    pub sites: Vec<SiteSource>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchSettings {
    /// `{id}` is replaced with the site's file id.
    #[serde(default = "default_url_template")]
    pub url_template: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisSettings {
    #[serde(default = "default_zscore_threshold")]
    pub zscore_threshold: f64,
}

/// Where a site's raw file lives in the content store and in the cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteSource {
    pub site: Site,
    pub file_id: String,
    pub file_name: String,
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from("temp_data")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("results")
}

fn default_url_template() -> String {
    "https://drive.google.com/uc?export=download&confirm=t&id={id}".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_zscore_threshold() -> f64 {
    3.0
}

fn default_sites() -> Vec<SiteSource> {
    vec![
        SiteSource {
            site: Site::Benin,
            file_id: "1fpqN0RjgTaXGcz-LoueOy0nlvGa_BbWV".to_string(),
            file_name: "benin-malanville.csv".to_string(),
        },
        SiteSource {
            site: Site::SierraLeone,
            file_id: "1uV5DbK2XOHdzYZewJw31nxSuFuOCOZ9B".to_string(),
            file_name: "sierraleone-bumbuna.csv".to_string(),
        },
        SiteSource {
            site: Site::Togo,
            file_id: "1UFoqU5jN6OYt64Fy0kpFYrzj3pITXMQR".to_string(),
            file_name: "togo-dapaong_qc.csv".to_string(),
        },
    ]
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            url_template: default_url_template(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl FetchSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            zscore_threshold: default_zscore_threshold(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_dir: default_cache_dir(),
            output_dir: default_output_dir(),
            fetch: FetchSettings::default(),
            analysis: AnalysisSettings::default(),
            sites: default_sites(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Load from `path` if given, otherwise use the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => Self::from_file(p),
            None => Ok(Self::default()),
        }
    }

    pub fn source(&self, site: Site) -> Option<&SiteSource> {
        self.sites.iter().find(|s| s.site == site)
    }
}
