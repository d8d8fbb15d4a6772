//! SVG rendering of the report charts.
//!
//! Every chart renders independently: a failure is logged and recorded in
//! [`RenderOutcome::failed`] while the remaining charts still render.

pub mod histogram;
pub mod map;
pub mod scatter;

use std::fmt;
use std::path::{Path, PathBuf};

use tracing::{error, info};

use crate::analyzers::analyzer::Analysis;
use crate::config::ReportConfig;
use crate::error::{PipelineError, Result};
use histogram::HistogramSpec;
use map::Outline;
use scatter::ScatterSpec;

pub const FONT: &str = "sans-serif";

/// A chart written to disk.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartArtifact {
    pub name: &'static str,
    pub title: &'static str,
    pub path: PathBuf,
}

#[derive(Debug, Default)]
pub struct RenderOutcome {
    pub rendered: Vec<ChartArtifact>,
    pub failed: Vec<(&'static str, PipelineError)>,
}

impl RenderOutcome {
    fn record(&mut self, name: &'static str, title: &'static str, path: PathBuf, result: Result<()>) {
        match result {
            Ok(()) => {
                info!(chart = name, path = %path.display(), "Chart rendered");
                self.rendered.push(ChartArtifact { name, title, path });
            }
            Err(e) => {
                error!(chart = name, error = %e, "Chart failed");
                self.failed.push((name, e));
            }
        }
    }

    pub fn failed_names(&self) -> Vec<&'static str> {
        self.failed.iter().map(|(name, _)| *name).collect()
    }
}

pub(crate) fn render_error(chart: &str, err: impl fmt::Display) -> PipelineError {
    PipelineError::Render {
        chart: chart.to_string(),
        message: err.to_string(),
    }
}

fn chart_path(out_dir: &Path, name: &str) -> PathBuf {
    out_dir.join(format!("{name}.svg"))
}

/// Renders the density map, the three histograms and the two scatter plots.
#[tracing::instrument(skip_all, fields(out_dir = %out_dir.display()))]
pub fn render_all(
    analysis: &Analysis,
    config: &ReportConfig,
    outline: Option<&Outline>,
    out_dir: &Path,
) -> RenderOutcome {
    let size = (config.chart_width, config.chart_height);
    let mut outcome = RenderOutcome::default();

    let counts: Vec<f64> = analysis
        .aggregates
        .iter()
        .map(|a| a.city_ev_count as f64)
        .collect();
    let msrp: Vec<f64> = analysis.vehicles.iter().map(|v| v.base_msrp).collect();
    let range: Vec<f64> = analysis
        .vehicles
        .iter()
        .map(|v| v.electric_range)
        .collect();

    let (name, title) = ("city_density_map", "Electric Vehicles by City");
    let path = chart_path(out_dir, name);
    let result = map::render(&path, name, title, &analysis.aggregates, outline, size);
    outcome.record(name, title, path, result);

    let histograms = [
        HistogramSpec {
            name: "city_ev_count_histogram",
            title: "Vehicles per City",
            x_desc: "city_ev_count",
            domain: None,
            bins: config.histogram_bins,
        },
        HistogramSpec {
            name: "base_msrp_histogram",
            title: "Base MSRP",
            x_desc: "base_msrp (USD)",
            domain: Some(config.msrp_domain),
            bins: config.histogram_bins,
        },
        HistogramSpec {
            name: "electric_range_histogram",
            title: "Electric Range",
            x_desc: "electric_range (miles)",
            domain: None,
            bins: config.histogram_bins,
        },
    ];

    for (spec, values) in histograms.iter().zip([&counts, &msrp, &range]) {
        let path = chart_path(out_dir, spec.name);
        let result = histogram::render(&path, spec, values, size);
        outcome.record(spec.name, spec.title, path, result);
    }

    let scatters = [
        (
            ScatterSpec {
                name: "msrp_vs_count_scatter",
                title: "Average Base MSRP vs Vehicles per City",
                x_desc: "average_base_msrp (USD)",
                y_desc: "city_ev_count",
                domain: Some(config.msrp_scatter_domain),
            },
            analysis
                .aggregates
                .iter()
                .map(|a| (a.average_base_msrp, a.city_ev_count as f64))
                .collect::<Vec<_>>(),
        ),
        (
            ScatterSpec {
                name: "range_vs_count_scatter",
                title: "Average Electric Range vs Vehicles per City",
                x_desc: "average_electric_range (miles)",
                y_desc: "city_ev_count",
                domain: None,
            },
            analysis
                .aggregates
                .iter()
                .map(|a| (a.average_electric_range, a.city_ev_count as f64))
                .collect::<Vec<_>>(),
        ),
    ];

    for (spec, points) in &scatters {
        let path = chart_path(out_dir, spec.name);
        let result = scatter::render(&path, spec, points, size);
        outcome.record(spec.name, spec.title, path, result);
    }

    outcome
}
