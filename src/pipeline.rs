//! Site Pipeline
//! Fetch, load and clean each site independently.
//!
//! All state lives in a [`PipelineContext`] built by the caller; a failure on
//! one site is returned for that site only.

use crate::cleaning::{DataCleaner, OutlierReport, RuleSet};
use crate::config::{Config, SiteSource};
use crate::data::{
    ensure_cached, source_url, DataLoader, FetchOutcome, LoaderError, SensorTable, Site, TableError,
};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("{site}: no source configured")]
    NoSource { site: Site },
    #[error("{site}: {source}")]
    Load {
        site: Site,
        #[source]
        source: LoaderError,
    },
    #[error("{site}: failed to write {path}: {reason}")]
    Output {
        site: Site,
        path: PathBuf,
        reason: String,
    },
}

/// A cleaned site table together with its outlier report.
#[derive(Debug, Clone)]
pub struct CleanedSite {
    pub site: Site,
    pub table: SensorTable,
    pub report: OutlierReport,
}

impl CleanedSite {
    /// Write `<site>_clean.csv` and `<site>_outliers.json` into `dir`.
    pub fn write_outputs(&self, dir: &Path) -> Result<(PathBuf, PathBuf), PipelineError> {
        let output_err = |path: &Path, reason: String| PipelineError::Output {
            site: self.site,
            path: path.to_path_buf(),
            reason,
        };

        fs::create_dir_all(dir).map_err(|e| output_err(dir, e.to_string()))?;

        let csv_path = dir.join(format!("{}_clean.csv", self.site.key()));
        self.table
            .write_csv(&csv_path)
            .map_err(|e: TableError| output_err(&csv_path, e.to_string()))?;

        let json_path = dir.join(format!("{}_outliers.json", self.site.key()));
        let json = self
            .report
            .to_json()
            .map_err(|e| output_err(&json_path, e.to_string()))?;
        fs::write(&json_path, json).map_err(|e| output_err(&json_path, e.to_string()))?;

        Ok((csv_path, json_path))
    }
}

/// Explicit pipeline state passed to every stage.
#[derive(Debug, Clone, Default)]
pub struct PipelineContext {
    config: Config,
}

impl PipelineContext {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn source(&self, site: Site) -> Result<&SiteSource, PipelineError> {
        self.config
            .source(site)
            .ok_or(PipelineError::NoSource { site })
    }

    /// Local cache location of a site's raw file.
    pub fn cache_path(&self, site: Site) -> Result<PathBuf, PipelineError> {
        let source = self.source(site)?;
        Ok(self.config.cache_dir.join(&source.file_name))
    }

    /// Download the raw file unless it is already cached.
    pub fn fetch(&self, site: Site) -> Result<PathBuf, PipelineError> {
        let source = self.source(site)?;
        let dest = self.cache_path(site)?;
        let url = source_url(&self.config.fetch.url_template, &source.file_id);

        let outcome = ensure_cached(&url, &dest, self.config.fetch.timeout())
            .map_err(|source| PipelineError::Load { site, source })?;
        if let FetchOutcome::Downloaded { bytes } = outcome {
            log::info!("Fetched {} ({bytes} bytes) for {}", dest.display(), site.label());
        }
        Ok(dest)
    }

    /// Fetch (if needed) and load the raw table.
    pub fn load(&self, site: Site) -> Result<SensorTable, PipelineError> {
        let path = self.fetch(site)?;
        log::info!("Loading {} data from {}", site.label(), path.display());
        DataLoader::load_csv(&path).map_err(|source| PipelineError::Load { site, source })
    }

    /// Clean an already loaded table with the site's rule table.
    pub fn clean(&self, site: Site, table: SensorTable) -> CleanedSite {
        log::info!("Applying checks for {}", site.label());
        let (table, report) = DataCleaner::clean(table, &RuleSet::for_site(site));
        CleanedSite {
            site,
            table,
            report,
        }
    }

    pub fn run(&self, site: Site) -> Result<CleanedSite, PipelineError> {
        let table = self.load(site)?;
        Ok(self.clean(site, table))
    }

    /// Run each site in turn. Every site gets a result, whatever happens to
    /// the others.
    pub fn run_all(&self, sites: &[Site]) -> Vec<(Site, Result<CleanedSite, PipelineError>)> {
        sites
            .iter()
            .map(|&site| {
                let result = self.run(site);
                if let Err(e) = &result {
                    log::error!("{e}");
                }
                (site, result)
            })
            .collect()
    }
}
