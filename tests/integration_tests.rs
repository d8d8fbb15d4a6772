use std::env;
use std::fs;
use std::path::PathBuf;

use ev_city_report::PipelineError;
use ev_city_report::analyzers::analyzer::{Analysis, PipelineContext, analyze};
use ev_city_report::analyzers::types::CityAggregate;
use ev_city_report::analyzers::utility::pearson;
use ev_city_report::charts::map::Outline;
use ev_city_report::charts::render_all;
use ev_city_report::config::ReportConfig;
use ev_city_report::report::write_report;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

fn context(vehicles: &str, zips: &str) -> PipelineContext {
    PipelineContext {
        vehicles_path: fixture(vehicles),
        zips_path: fixture(zips),
        config: ReportConfig::default(),
    }
}

fn run() -> Analysis {
    analyze(&context("vehicles.csv", "zips.csv")).expect("Failed to analyze fixtures")
}

fn city<'a>(analysis: &'a Analysis, name: &str) -> Option<&'a CityAggregate> {
    analysis.aggregates.iter().find(|a| a.city == name)
}

fn scratch_dir(name: &str) -> PathBuf {
    let dir = env::temp_dir().join(format!("ev_city_report_{name}_{}", std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    dir
}

#[test]
fn test_full_pipeline() {
    let analysis = run();

    assert_eq!(analysis.stats.vehicle_rows, 11);
    assert_eq!(analysis.stats.geo_rows, 4);
    assert_eq!(analysis.stats.clean.zero_msrp, 1);
    assert_eq!(analysis.stats.clean.zero_range, 1);
    assert_eq!(analysis.stats.clean.wrong_state, 1);
    assert_eq!(analysis.stats.clean.kept, 8);
    assert_eq!(analysis.stats.cities, 5);
    assert_eq!(analysis.stats.cities_without_coordinates, 2);
}

#[test]
fn test_cleaned_rows_are_positive_and_in_state() {
    let analysis = run();

    assert!(!analysis.vehicles.is_empty());
    for vehicle in &analysis.vehicles {
        assert!(vehicle.base_msrp > 0.0);
        assert!(vehicle.electric_range > 0.0);
        assert_eq!(vehicle.state, "WA");
    }
}

#[test]
fn test_left_join_keeps_every_cleaned_row() {
    let join = run().stats.join;

    assert_eq!(join.joined, 8);
    assert_eq!(join.matched, 6);
    assert_eq!(join.missing_zip, 1);
    assert_eq!(join.unmatched, 1);
}

#[test]
fn test_counts_sum_to_joined_rows() {
    let analysis = run();
    let total: usize = analysis.aggregates.iter().map(|a| a.city_ev_count).sum();

    assert_eq!(total, analysis.stats.join.joined);
}

#[test]
fn test_seattle_averages() {
    let analysis = run();
    let seattle = city(&analysis, "Seattle").unwrap();

    assert_eq!(seattle.city_ev_count, 2);
    assert_eq!(seattle.average_base_msrp, 45000.0);
    assert_eq!(seattle.average_electric_range, 250.0);
    assert!((seattle.lat.unwrap() - 47.61).abs() < 1e-9);
    assert!((seattle.long.unwrap() + 122.33).abs() < 1e-9);
}

#[test]
fn test_zero_msrp_row_is_in_no_aggregate() {
    let analysis = run();

    assert!(city(&analysis, "Zeroville").is_none());
    assert!(city(&analysis, "Portland").is_none());
    for aggregate in &analysis.aggregates {
        assert!(aggregate.average_base_msrp > 0.0);
    }
}

#[test]
fn test_unmatched_cities_have_no_coordinates() {
    let analysis = run();

    for name in ["Olympia", "Bellevue"] {
        let aggregate = city(&analysis, name).unwrap();
        assert_eq!(aggregate.city_ev_count, 1);
        assert_eq!(aggregate.coordinates(), None);
    }
}

#[test]
fn test_aggregates_ordered_by_count_then_name() {
    let analysis = run();
    let order: Vec<_> = analysis.aggregates.iter().map(|a| a.city.as_str()).collect();

    assert_eq!(order, ["Spokane", "Seattle", "Bellevue", "Olympia", "Tacoma"]);
}

#[test]
fn test_analysis_is_idempotent() {
    let first = run();
    let second = run();

    assert_eq!(first.aggregates, second.aggregates);
    assert_eq!(first.correlations, second.correlations);
}

#[test]
fn test_correlations_are_bounded_and_symmetric() {
    let analysis = run();
    let counts: Vec<f64> = analysis
        .aggregates
        .iter()
        .map(|a| a.city_ev_count as f64)
        .collect();
    let msrp: Vec<f64> = analysis
        .aggregates
        .iter()
        .map(|a| a.average_base_msrp)
        .collect();

    for column in analysis.correlations.columns() {
        let r = column.r.expect("Correlation should be defined");
        assert!((-1.0..=1.0).contains(&r));
        assert_eq!(column.sample_count, 5);
    }

    let forward = pearson(&msrp, &counts).unwrap();
    let backward = pearson(&counts, &msrp).unwrap();
    assert!((forward - backward).abs() < 1e-12);
    assert_eq!(analysis.correlations.msrp_vs_count.r, Some(forward));
}

#[test]
fn test_export_headers_and_formats() {
    let analysis = analyze(&context("vehicles_export.csv", "zips.csv")).unwrap();
    let seattle = city(&analysis, "Seattle").unwrap();

    assert_eq!(seattle.city_ev_count, 2);
    assert_eq!(seattle.average_base_msrp, 45000.0);
    assert!(seattle.coordinates().is_some());
}

#[test]
fn test_duplicate_geo_zip_is_rejected() {
    let result = analyze(&context("vehicles.csv", "zips_duplicate.csv"));

    match result {
        Err(PipelineError::DuplicateZip(zip)) => assert_eq!(zip.to_string(), "98101"),
        other => panic!("expected DuplicateZip, got {other:?}"),
    }
}

#[test]
fn test_missing_input_file() {
    let result = analyze(&context("vehicles.csv", "no_such_file.csv"));
    assert!(matches!(result, Err(PipelineError::Io { .. })));
}

#[test]
fn test_render_all_writes_every_chart() {
    let analysis = run();
    let dir = scratch_dir("charts");
    fs::create_dir_all(&dir).unwrap();

    let outcome = render_all(&analysis, &ReportConfig::default(), None, &dir);

    assert!(outcome.failed.is_empty(), "{:?}", outcome.failed_names());
    assert_eq!(outcome.rendered.len(), 6);
    for chart in &outcome.rendered {
        let svg = fs::read_to_string(&chart.path).unwrap();
        assert!(svg.contains("<svg"), "{} is not an SVG", chart.name);
    }

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_write_report_with_outline() {
    let dir = scratch_dir("report");
    let outline_path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("assets/washington.geojson");
    let outline = Outline::load(&outline_path).unwrap();

    let outcome = write_report(&context("vehicles.csv", "zips.csv"), &dir, Some(&outline)).unwrap();
    assert!(outcome.failed.is_empty());

    for file in [
        "city_aggregates.csv",
        "correlations.csv",
        "summary.json",
        "report.md",
        "city_density_map.svg",
    ] {
        assert!(dir.join(file).exists(), "{file} was not written");
    }

    let aggregates = fs::read_to_string(dir.join("city_aggregates.csv")).unwrap();
    assert_eq!(aggregates.lines().count(), 6);
    assert!(aggregates.contains("Seattle,2,45000.0,250.0,"));

    let correlations = fs::read_to_string(dir.join("correlations.csv")).unwrap();
    let lines: Vec<_> = correlations.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("\"corr(average_base_msrp, city_ev_count)\""));

    let report = fs::read_to_string(dir.join("report.md")).unwrap();
    assert!(report.contains("**Correlation Coefficients**"));
    assert!(report.contains("![Electric Vehicles by City](city_density_map.svg)"));

    let summary: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(dir.join("summary.json")).unwrap()).unwrap();
    assert_eq!(summary["target_state"], "WA");
    assert_eq!(summary["stats"]["clean"]["kept"], 8);

    fs::remove_dir_all(&dir).unwrap();
}
