//! Prose write-up of a run, rendered as Markdown.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use crate::analyzers::analyzer::{Analysis, PipelineContext, analyze};
use crate::analyzers::correlation::Correlation;
use crate::analyzers::grade::direction;
use crate::charts::map::Outline;
use crate::charts::{ChartArtifact, RenderOutcome, render_all};
use crate::config::ReportConfig;
use crate::output::{Summary, print_correlations, write_aggregates, write_correlations, write_json};

/// Runs the pipeline and writes every report artifact into `output_dir`:
/// the charts, `city_aggregates.csv`, `correlations.csv`, `summary.json` and
/// `report.md`.
///
/// Chart failures do not abort the run; they are returned in the outcome.
///
/// # Errors
///
/// Fails on any input error or if an output file cannot be written.
pub fn write_report(
    ctx: &PipelineContext,
    output_dir: &Path,
    outline: Option<&Outline>,
) -> Result<RenderOutcome> {
    let config = &ctx.config;
    let analysis = analyze(ctx)?;

    fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create {}", output_dir.display()))?;

    write_aggregates(&output_dir.join("city_aggregates.csv"), &analysis.aggregates)?;
    write_correlations(&output_dir.join("correlations.csv"), &analysis.correlations)?;
    print_correlations(&analysis.correlations);

    let outcome = render_all(&analysis, config, outline, output_dir);

    let mut summary = Summary::new(&analysis, &config.target_state, config.top_cities);
    summary.charts = outcome
        .rendered
        .iter()
        .map(|c| c.path.display().to_string())
        .collect();
    summary.failed_charts = outcome
        .failed
        .iter()
        .map(|(name, e)| format!("{name}: {e}"))
        .collect();
    write_json(&output_dir.join("summary.json"), &summary)?;

    let report_path = output_dir.join("report.md");
    let markdown = render_markdown(&analysis, &outcome.rendered, config, output_dir);
    fs::write(&report_path, markdown)
        .with_context(|| format!("failed to write {}", report_path.display()))?;

    info!(
        charts = outcome.rendered.len(),
        failed = outcome.failed.len(),
        report = %report_path.display(),
        "Report written"
    );

    Ok(outcome)
}

/// Renders `report.md`. Chart links are made relative to `report_dir`.
pub fn render_markdown(
    analysis: &Analysis,
    charts: &[ChartArtifact],
    config: &ReportConfig,
    report_dir: &Path,
) -> String {
    let stats = &analysis.stats;
    let mut md = String::new();

    let _ = writeln!(
        md,
        "# Electric Vehicle Registrations by City ({})\n",
        config.target_state
    );

    md.push_str("## Data\n\n");
    let _ = writeln!(
        md,
        "{} vehicle registrations were loaded, of which {} ({:.1}%) have a known base MSRP, \
         a known electric range and a registration in {}. {} rows were dropped for a zero \
         MSRP, {} for a zero range and {} for being registered elsewhere.\n",
        stats.vehicle_rows,
        stats.clean.kept,
        stats.kept_pct(),
        config.target_state,
        stats.clean.zero_msrp,
        stats.clean.zero_range,
        stats.clean.wrong_state,
    );
    let _ = writeln!(
        md,
        "{} of the remaining vehicles ({:.1}%) were matched to postal code coordinates \
         from a table of {} codes; {} had no postal code and {} had a code missing from \
         the table. They span {} cities, {} of which have no coordinates and are absent \
         from the map.\n",
        stats.join.matched,
        stats.matched_pct(),
        stats.geo_rows,
        stats.join.missing_zip,
        stats.join.unmatched,
        stats.cities,
        stats.cities_without_coordinates,
    );

    write_top_cities(&mut md, analysis, config.top_cities);
    write_distributions(&mut md, analysis);
    write_correlation_section(&mut md, analysis, config.significance_level);

    if !charts.is_empty() {
        md.push_str("## Charts\n\n");
        for chart in charts {
            let link = chart
                .path
                .strip_prefix(report_dir)
                .unwrap_or(&chart.path)
                .display();
            let _ = writeln!(md, "### {}\n\n![{}]({})\n", chart.title, chart.title, link);
        }
    }

    md
}

fn write_top_cities(md: &mut String, analysis: &Analysis, n: usize) {
    let top = analysis.top_cities(n);
    if top.is_empty() {
        return;
    }

    md.push_str("## Where the vehicles are\n\n");
    let _ = writeln!(
        md,
        "The {} cities with the most registrations hold {:.1}% of all vehicles. {} leads \
         with {} vehicles.\n",
        top.len(),
        analysis.stats.share_of(top),
        top[0].city,
        top[0].city_ev_count,
    );

    md.push_str("| City | Vehicles | Avg. base MSRP | Avg. electric range |\n");
    md.push_str("|---|---:|---:|---:|\n");
    for city in top {
        let _ = writeln!(
            md,
            "| {} | {} | {:.0} | {:.1} |",
            city.city, city.city_ev_count, city.average_base_msrp, city.average_electric_range
        );
    }
    md.push('\n');
}

fn write_distributions(md: &mut String, analysis: &Analysis) {
    let (Some(msrp), Some(range)) = (analysis.msrp_summary, analysis.range_summary) else {
        return;
    };

    md.push_str("## Price and range\n\n");
    let _ = writeln!(
        md,
        "Base MSRP averages ${:.0} (standard deviation ${:.0}) and runs from ${:.0} to \
         ${:.0}. Electric range averages {:.1} miles (standard deviation {:.1}) and runs \
         from {:.0} to {:.0} miles.\n",
        msrp.mean, msrp.stddev, msrp.min, msrp.max, range.mean, range.stddev, range.min, range.max,
    );
}

fn write_correlation_section(md: &mut String, analysis: &Analysis, alpha: f64) {
    md.push_str("## Correlations\n\n");
    md.push_str(&analysis.correlations.to_markdown());
    md.push('\n');

    for column in analysis.correlations.columns() {
        let _ = writeln!(md, "{}\n", describe(column, alpha));
    }
}

/// One sentence interpreting a correlation.
pub fn describe(correlation: &Correlation, alpha: f64) -> String {
    let (Some(r), Some(strength)) = (correlation.r, correlation.strength) else {
        return format!(
            "`{}` is undefined: it needs at least two cities with varying values.",
            correlation.label
        );
    };

    let significance = match correlation.p_value {
        Some(p) if correlation.is_significant(alpha) => {
            format!("significant at the {alpha} level (p = {p:.4})")
        }
        Some(p) => format!("not significant at the {alpha} level (p = {p:.4})"),
        None => "too few cities to test for significance".to_string(),
    };

    format!(
        "`{}` = {} over {} cities: a {} {} relationship, {}.",
        correlation.label,
        correlation.display_r(),
        correlation.sample_count,
        strength,
        direction(r),
        significance
    )
}
