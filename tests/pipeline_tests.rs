//! End-to-end tests for the site pipeline.
//!
//! Raw files are placed in a temporary cache directory so no network access
//! is needed; the content store URL points at a closed local port.

use solarscope::cleaning::{Policy, Repair, RuleSet, ALLOW_NEGATIVE, CLEANING};
use solarscope::config::{Config, SiteSource};
use solarscope::data::{LoaderError, COMMENTS};
use solarscope::stats::{grouped, temporal, StatsCalculator};
use solarscope::{PipelineContext, PipelineError, Site};
use std::fs;
use std::path::Path;

const HEADER: &str = "Timestamp,GHI,DNI,DHI,ModA,ModB,Tamb,RH,WS,WSgust,WSstdev,WD,WDstdev,BP,Cleaning,Precipitation,TModA,TModB,Comments";

/// Twelve rows with a handful of deliberate problems:
/// negative irradiance, RH above 100, a stray cleaning flag, wind direction
/// over 360, low pressure and a module reading far above the rest.
fn raw_csv() -> String {
    let rows = [
        "2021-08-09 00:01,-1.2,-0.2,-1.1,0.0,0.0,26.2,93.4,0.0,0.4,0.1,122.1,0.0,998,0,0.0,26.3,26.2,",
        "2021-08-09 06:00,12.0,3.0,9.0,10.0,10.0,24.0,97.0,1.1,1.5,0.3,130.0,2.0,997,0,0.0,24.5,24.4,",
        "2021-08-09 08:00,180.0,90.0,80.0,170.0,168.0,25.0,120.0,1.8,2.4,0.4,135.0,3.0,997,0,0.0,28.0,27.9,",
        "2021-08-09 10:00,520.0,300.0,200.0,510.0,505.0,28.0,80.0,2.5,3.1,0.5,140.0,4.0,996,0,0.0,40.0,39.5,",
        "2021-08-09 12:00,1350.0,600.0,300.0,800.0,790.0,31.0,65.0,3.0,3.8,0.6,400.0,5.0,995,7,0.0,52.0,51.0,",
        "2021-08-09 14:00,700.0,450.0,250.0,690.0,680.0,32.0,60.0,3.2,4.0,0.6,150.0,5.5,994,0,0.0,48.0,47.0,",
        "2021-08-09 16:00,400.0,250.0,150.0,390.0,385.0,30.0,66.0,2.7,3.4,0.5,160.0,5.0,994,0,0.1,42.0,41.5,",
        "2021-08-09 18:00,60.0,20.0,40.0,55.0,54.0,27.0,75.0,2.0,2.6,0.4,170.0,4.0,995,1,0.0,30.0,29.8,",
        "2021-08-09 20:00,0.0,0.0,0.0,0.0,0.0,26.0,85.0,1.5,2.0,0.3,180.0,3.0,996,0,0.0,26.5,26.4,",
        "2021-08-09 22:00,0.0,0.0,0.0,0.0,0.0,25.5,90.0,1.0,1.6,0.2,190.0,2.5,850,0,0.0,26.0,25.9,",
        "2021-08-10 00:00,0.0,0.0,0.0,9000.0,0.0,25.0,92.0,0.5,1.0,0.1,200.0,2.0,997,0,0.0,25.6,25.5,",
        "2021-08-10 02:00,0.0,0.0,0.0,0.0,0.0,24.8,93.0,0.3,0.8,0.1,210.0,1.5,998,0,,25.3,25.2,",
    ];
    format!("{HEADER}\n{}\n", rows.join("\n"))
}

fn config_for(cache_dir: &Path) -> Config {
    let mut config = Config::default();
    config.cache_dir = cache_dir.to_path_buf();
    config.fetch.url_template = "http://127.0.0.1:9/{id}".to_string();
    config.fetch.timeout_secs = 2;
    config.sites = Site::ALL
        .iter()
        .map(|site| SiteSource {
            site: *site,
            file_id: site.key().to_string(),
            file_name: format!("{}.csv", site.key()),
        })
        .collect();
    config
}

fn seed(cache_dir: &Path, site: Site) {
    fs::write(cache_dir.join(format!("{}.csv", site.key())), raw_csv()).unwrap();
}

#[test]
fn cleans_cached_file_without_fetching() {
    let dir = tempfile::tempdir().unwrap();
    seed(dir.path(), Site::Togo);
    let ctx = PipelineContext::new(config_for(dir.path()));

    let cleaned = ctx.run(Site::Togo).unwrap();
    let table = &cleaned.table;

    assert_eq!(table.height(), 12);
    assert!(!table.has_column(COMMENTS));

    // Whole-column sign correction on GHI, then the (0, 1000) cap.
    let ghi = table.column("GHI").unwrap();
    assert_eq!(ghi[0], 1.2);
    assert_eq!(ghi[4], 1000.0);

    assert_eq!(table.column("RH").unwrap()[2], 100.0);
    assert_eq!(table.column("WD").unwrap()[4], 360.0);
    assert_eq!(table.column("BP").unwrap()[9], 900.0);
    assert_eq!(table.column(CLEANING).unwrap()[4], 0.0);
    assert_eq!(table.column("TModA").unwrap()[4], 50.0);

    let report = &cleaned.report;
    assert_eq!(report.flagged_rows("GHI"), vec![4]);
    assert_eq!(report.flagged_rows("RH"), vec![2]);
    assert_eq!(report.flagged_rows(CLEANING), vec![4]);
    assert_eq!(report.get(CLEANING).unwrap().repair, Repair::ModeSubstituted { value: 0.0 });
    assert_eq!(report.get("ModA").unwrap().policy, Policy::Adaptive);
    assert_eq!(report.flagged_rows("ModA"), vec![10]);

    // The blank precipitation cell stays missing.
    assert!(table.column("Precipitation").unwrap()[11].is_nan());
}

#[test]
fn benin_uses_fixed_ghi_range() {
    let dir = tempfile::tempdir().unwrap();
    seed(dir.path(), Site::Benin);
    let ctx = PipelineContext::new(config_for(dir.path()));

    let cleaned = ctx.run(Site::Benin).unwrap();
    let ghi = cleaned.report.get("GHI").unwrap();

    assert_eq!(ghi.policy, Policy::FixedRange);
    assert!(ghi.flagged.is_empty());
    assert_eq!(cleaned.table.column("GHI").unwrap()[4], 1350.0);
    assert_eq!(cleaned.report.get("DNI").unwrap().policy, Policy::Adaptive);
}

#[test]
fn cleaned_values_respect_their_rules() {
    let dir = tempfile::tempdir().unwrap();
    for site in Site::ALL {
        seed(dir.path(), site);
    }
    let ctx = PipelineContext::new(config_for(dir.path()));

    for site in Site::ALL {
        let cleaned = ctx.run(site).unwrap();
        let rules = RuleSet::for_site(site);

        for rule in rules.iter() {
            let values = cleaned.table.column(&rule.column).unwrap();
            let finite: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();

            if !ALLOW_NEGATIVE.contains(&rule.column.as_str()) {
                assert!(finite.iter().all(|v| *v >= 0.0), "{site} {}", rule.column);
            }

            let bounds = cleaned.report.get(&rule.column).unwrap().bounds.unwrap();
            assert!(
                finite.iter().all(|v| *v >= bounds.low && *v <= bounds.high),
                "{site} {} outside {:?}",
                rule.column,
                bounds
            );
        }
    }
}

#[test]
fn second_pass_is_a_fixed_point() {
    let dir = tempfile::tempdir().unwrap();
    seed(dir.path(), Site::SierraLeone);
    let ctx = PipelineContext::new(config_for(dir.path()));

    let first = ctx.run(Site::SierraLeone).unwrap();
    let second = ctx.clean(Site::SierraLeone, first.table.clone());

    assert!(second.report.is_clean());
    for name in first.table.column_names() {
        let a = first.table.column(name).unwrap();
        let b = second.table.column(name).unwrap();
        for (x, y) in a.iter().zip(b) {
            assert!(x == y || (x.is_nan() && y.is_nan()), "{name} changed");
        }
    }
}

#[test]
fn one_failing_site_does_not_stop_the_others() {
    let dir = tempfile::tempdir().unwrap();
    seed(dir.path(), Site::Benin);
    seed(dir.path(), Site::Togo);
    let ctx = PipelineContext::new(config_for(dir.path()));

    let results = ctx.run_all(&Site::ALL);

    assert_eq!(results.len(), 3);
    assert!(results[0].1.is_ok());
    assert!(matches!(
        &results[1].1,
        Err(PipelineError::Load {
            site: Site::SierraLeone,
            source: LoaderError::DataUnavailable { .. }
        })
    ));
    assert!(results[2].1.is_ok());
}

#[test]
fn schema_mismatch_is_reported_per_site() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("benin.csv"), "Timestamp,GHI\n2021-08-09 00:01,1\n").unwrap();
    let ctx = PipelineContext::new(config_for(dir.path()));

    match ctx.run(Site::Benin) {
        Err(PipelineError::Load {
            source: LoaderError::SchemaMismatch { missing },
            ..
        }) => assert!(missing.contains(&"Cleaning".to_string())),
        other => panic!("expected schema mismatch, got {other:?}"),
    }
}

#[test]
fn unconfigured_site_has_no_source() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config_for(dir.path());
    config.sites.retain(|s| s.site != Site::Togo);
    let ctx = PipelineContext::new(config);

    assert!(matches!(
        ctx.run(Site::Togo),
        Err(PipelineError::NoSource { site: Site::Togo })
    ));
}

#[test]
fn writes_clean_csv_and_report() {
    let dir = tempfile::tempdir().unwrap();
    seed(dir.path(), Site::Togo);
    let ctx = PipelineContext::new(config_for(dir.path()));
    let cleaned = ctx.run(Site::Togo).unwrap();

    let out = dir.path().join("results");
    let (csv, json) = cleaned.write_outputs(&out).unwrap();

    let reloaded = solarscope::DataLoader::load_csv(&csv).unwrap();
    assert_eq!(reloaded.height(), cleaned.table.height());
    assert_eq!(reloaded.column("GHI").unwrap(), cleaned.table.column("GHI").unwrap());

    let report: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(json).unwrap()).unwrap();
    let columns = report["columns"].as_array().unwrap();
    assert_eq!(columns.len(), RuleSet::for_site(Site::Togo).len());
    assert_eq!(columns[0]["column"], "GHI");
}

#[test]
fn summary_statistics_cover_every_channel() {
    let dir = tempfile::tempdir().unwrap();
    seed(dir.path(), Site::Togo);
    let ctx = PipelineContext::new(config_for(dir.path()));
    let cleaned = ctx.run(Site::Togo).unwrap();

    let summary = StatsCalculator::describe(&cleaned.table);
    assert_eq!(summary.columns.len(), cleaned.table.column_names().len());
    let rh = summary.get("RH").unwrap();
    assert_eq!(rh.max, 100.0);
    assert_eq!(summary.get("Precipitation").unwrap().count, 11);
}

#[test]
fn cleaning_impact_and_profiles_on_cleaned_data() {
    let dir = tempfile::tempdir().unwrap();
    seed(dir.path(), Site::Togo);
    let ctx = PipelineContext::new(config_for(dir.path()));
    let cleaned = ctx.run(Site::Togo).unwrap();

    let impact = grouped::cleaning_impact(&cleaned.table).unwrap();
    let keys: Vec<f64> = impact.groups.iter().map(|g| g.key).collect();
    assert_eq!(keys, vec![0.0, 1.0]);
    assert_eq!(impact.group(0.0).unwrap().rows, 11);
    let flagged = impact.group(1.0).unwrap();
    assert_eq!(flagged.rows, 1);
    assert_eq!(flagged.summary.get("ModA").unwrap().mean, 55.0);
    assert_eq!(flagged.summary.get("ModB").unwrap().mean, 54.0);

    for column in ["GHI", "Tamb", "DHI", "DNI"] {
        let months = temporal::monthly_means(&cleaned.table, column).unwrap();
        assert_eq!(months.len(), 1, "{column}");
        let hours = temporal::hourly_means(&cleaned.table, column).unwrap();
        assert_eq!(hours.len(), 11, "{column}");
    }
}
