//! Output formatting and persistence for the report tables.
//!
//! Supports pretty-printing, JSON serialization, and CSV export.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use csv::WriterBuilder;
use serde::Serialize;
use tracing::{debug, info};

use crate::analyzers::analyzer::Analysis;
use crate::analyzers::correlation::{CorrelationTable, format_coefficient};
use crate::analyzers::types::CityAggregate;
use crate::stats::{ColumnSummary, PipelineStats};

/// Machine-readable summary of a run, written as `summary.json`.
#[derive(Debug, Serialize)]
pub struct Summary<'a> {
    pub generated_at: DateTime<Utc>,
    pub target_state: &'a str,
    pub stats: &'a PipelineStats,
    pub base_msrp: Option<ColumnSummary>,
    pub electric_range: Option<ColumnSummary>,
    pub correlations: &'a CorrelationTable,
    pub top_cities: &'a [CityAggregate],
    pub charts: Vec<String>,
    pub failed_charts: Vec<String>,
}

impl<'a> Summary<'a> {
    pub fn new(analysis: &'a Analysis, target_state: &'a str, top_cities: usize) -> Self {
        Summary {
            generated_at: Utc::now(),
            target_state,
            stats: &analysis.stats,
            base_msrp: analysis.msrp_summary,
            electric_range: analysis.range_summary,
            correlations: &analysis.correlations,
            top_cities: analysis.top_cities(top_cities),
            charts: Vec::new(),
            failed_charts: Vec::new(),
        }
    }
}

/// Logs the city aggregates using Rust's debug pretty-print format.
pub fn print_pretty(aggregates: &[CityAggregate]) {
    debug!("{:#?}", aggregates);
}

/// Logs the correlation table under its caption.
pub fn print_correlations(table: &CorrelationTable) {
    info!("\n{}", table.to_markdown());
    for column in table.columns() {
        info!(
            label = %column.label,
            r = %column.display_r(),
            p_value = ?column.p_value,
            strength = column.strength.unwrap_or("undefined"),
            cities = column.sample_count,
            "Correlation"
        );
    }
}

/// Logs a value as pretty-printed JSON.
pub fn print_json(value: &impl Serialize) -> Result<()> {
    info!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Writes one CSV row per city, in presentation order.
pub fn write_aggregates(path: &Path, aggregates: &[CityAggregate]) -> Result<()> {
    let mut writer = WriterBuilder::new()
        .has_headers(true)
        .from_path(path)
        .with_context(|| format!("failed to create {}", path.display()))?;

    for aggregate in aggregates {
        writer.serialize(aggregate)?;
    }
    writer.flush()?;

    debug!(path = %path.display(), rows = aggregates.len(), "City aggregates written");
    Ok(())
}

/// Writes the single-row correlation table with values rounded to four decimals.
pub fn write_correlations(path: &Path, table: &CorrelationTable) -> Result<()> {
    let mut writer = WriterBuilder::new()
        .from_path(path)
        .with_context(|| format!("failed to create {}", path.display()))?;

    let [a, b] = table.columns();
    writer.write_record([a.label.as_str(), b.label.as_str()])?;
    writer.write_record([format_coefficient(a.r), format_coefficient(b.r)])?;
    writer.flush()?;

    Ok(())
}

pub fn write_json(path: &Path, value: &impl Serialize) -> Result<()> {
    let body = serde_json::to_vec_pretty(value)?;
    fs::write(path, body).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}
