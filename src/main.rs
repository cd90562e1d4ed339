//! Solarscope - batch cleaning and analysis of solar site sensor logs.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use solarscope::stats::correlation::{self, CLIMATE_COLUMNS, SOLAR_TEMPERATURE_COLUMNS};
use solarscope::stats::{grouped, temporal, wind, zscore, StatsCalculator};
use solarscope::{CleanedSite, Config, PipelineContext, Site};
use std::path::PathBuf;

/// Channels profiled by month and hour.
const PROFILE_COLUMNS: [&str; 4] = ["GHI", "Tamb", "DHI", "DNI"];

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Cli {
    /// TOML configuration file; built-in defaults are used when omitted.
    #[clap(long, global = true)]
    config: Option<PathBuf>,
    /// Sites to process (benin, sierraleone, togo). Defaults to all.
    #[clap(long = "site", global = true)]
    sites: Vec<Site>,
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch, clean and write cleaned tables plus outlier reports.
    Clean {
        #[clap(long)]
        out: Option<PathBuf>,
    },
    /// Print summary statistics of the cleaned data.
    Summary,
    /// Print z-score outlier counts.
    Zscore {
        #[clap(long)]
        threshold: Option<f64>,
    },
    /// Print correlation matrices and RH regressions.
    Correlate,
    /// Print monthly/hourly profiles, wind sectors and the wind speed distribution.
    Profile,
    /// Compare ModA/ModB statistics for cleaned and uncleaned rows.
    CleaningImpact,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())
        .with_context(|| format!("Failed to load config {:?}", cli.config))?;
    let sites = if cli.sites.is_empty() {
        Site::ALL.to_vec()
    } else {
        cli.sites.clone()
    };

    let ctx = PipelineContext::new(config);
    let mut failed = 0;

    for (site, result) in ctx.run_all(&sites) {
        let cleaned = match result {
            Ok(c) => c,
            Err(e) => {
                eprintln!("{e}");
                failed += 1;
                continue;
            }
        };

        if let Err(e) = report(&ctx, &cli.command, &cleaned) {
            eprintln!("{site}: {e:#}");
            failed += 1;
        }
    }

    if failed > 0 {
        bail!("{failed} of {} sites failed", sites.len());
    }
    Ok(())
}

fn report(ctx: &PipelineContext, command: &Command, cleaned: &CleanedSite) -> Result<()> {
    let label = cleaned.site.label();
    let table = &cleaned.table;

    match command {
        Command::Clean { out } => {
            let dir = out.clone().unwrap_or_else(|| ctx.config().output_dir.clone());
            let (csv, json) = cleaned.write_outputs(&dir)?;
            println!(
                "{label}: {} rows, {} values repaired -> {}, {}",
                table.height(),
                cleaned.report.total_flagged(),
                csv.display(),
                json.display()
            );
        }
        Command::Summary => {
            println!("{label} Summary Statistics:");
            println!("{}", StatsCalculator::describe(table));
        }
        Command::Zscore { threshold } => {
            let threshold = threshold.unwrap_or(ctx.config().analysis.zscore_threshold);
            let analysis = zscore::zscore_analysis(table, &zscore::ZSCORE_VARIABLES, threshold)?;
            println!(
                "{label} Outliers (|z| > {threshold}) over {} rows:",
                analysis.rows.len()
            );
            for v in &analysis.variables {
                println!(
                    "  {:<6} {:>8} (mean {:.2}, std {:.2})",
                    v.column,
                    v.outliers.len(),
                    v.mean,
                    v.std
                );
            }
        }
        Command::Correlate => {
            println!("{label} - Correlation Matrix (Solar Radiation & Temperature)");
            println!(
                "{}",
                correlation::correlation_matrix(table, &SOLAR_TEMPERATURE_COLUMNS)?
            );
            println!("{label} - Correlation Matrix (RH, Tamb, GHI)");
            println!("{}", correlation::correlation_matrix(table, &CLIMATE_COLUMNS)?);
            for (x, y) in [("RH", "GHI"), ("RH", "Tamb")] {
                let fit = correlation::linear_regression(table, x, y)?;
                println!(
                    "{label} - Linear Regression {y} ~ {x}: \
                     slope {:.4}, intercept {:.4}, R^2 {:.4}",
                    fit.slope, fit.intercept, fit.r_squared
                );
            }
        }
        Command::Profile => {
            for column in PROFILE_COLUMNS {
                println!("{label} - {column} by Month");
                for (month, mean) in temporal::monthly_means(table, column)? {
                    println!("  {month:>2} {mean:>10.2}");
                }
                println!("{label} - {column} by Hour");
                for (hour, mean) in temporal::hourly_means(table, column)? {
                    println!("  {hour:>2} {mean:>10.2}");
                }
            }

            let sectors = wind::wind_sectors(table, wind::DEFAULT_SECTORS)?;
            let total: usize = sectors.iter().map(|s| s.count).sum();
            println!("{label} - Wind Direction Sectors");
            for s in &sectors {
                println!(
                    "  {:>5.0}-{:<5.0} {:>6.1}%  mean WS {:.2}",
                    s.start_deg,
                    s.end_deg,
                    100.0 * s.frequency(total),
                    s.mean_speed
                );
            }

            println!("{label} - Wind Speed Distribution");
            for bin in wind::speed_distribution(table, wind::DEFAULT_SPEED_BINS)? {
                println!("  {:>6.2}-{:<6.2} {:>8}", bin.start, bin.end, bin.count);
            }
        }
        Command::CleaningImpact => {
            println!("{label} - Impact of Cleaning on ModA/ModB");
            print!("{}", grouped::cleaning_impact(table)?);
        }
    }
    Ok(())
}
