use std::path::PathBuf;

use tracing::info;

use crate::analyzers::aggregate::aggregate_by_city;
use crate::analyzers::clean::{GeoIndex, clean_vehicles};
use crate::analyzers::correlation::CorrelationTable;
use crate::analyzers::join::left_join;
use crate::analyzers::types::{CityAggregate, VehicleRecord};
use crate::config::ReportConfig;
use crate::error::Result;
use crate::loader::{load_geo, load_vehicles};
use crate::stats::{ColumnSummary, PipelineStats};

/// Inputs threaded through every stage of a run.
#[derive(Debug, Clone)]
pub struct PipelineContext {
    pub vehicles_path: PathBuf,
    pub zips_path: PathBuf,
    pub config: ReportConfig,
}

/// Everything the reporting stage reads. Built once, never mutated.
#[derive(Debug, Clone)]
pub struct Analysis {
    /// Cleaned vehicle table.
    pub vehicles: Vec<VehicleRecord>,
    pub aggregates: Vec<CityAggregate>,
    pub correlations: CorrelationTable,
    pub stats: PipelineStats,
    pub msrp_summary: Option<ColumnSummary>,
    pub range_summary: Option<ColumnSummary>,
}

impl Analysis {
    pub fn top_cities(&self, n: usize) -> &[CityAggregate] {
        &self.aggregates[..n.min(self.aggregates.len())]
    }
}

/// Loads, cleans, joins and aggregates the two input tables.
///
/// # Errors
///
/// Any input error (missing file or column, malformed row, repeated geo key)
/// aborts the run.
#[tracing::instrument(skip_all, fields(
    vehicles = %ctx.vehicles_path.display(),
    zips = %ctx.zips_path.display(),
    target_state = %ctx.config.target_state,
))]
pub fn analyze(ctx: &PipelineContext) -> Result<Analysis> {
    let raw_vehicles = load_vehicles(&ctx.vehicles_path)?;
    let geo = load_geo(&ctx.zips_path)?;

    let mut stats = PipelineStats {
        vehicle_rows: raw_vehicles.len(),
        geo_rows: geo.len(),
        ..Default::default()
    };

    let (vehicles, clean_stats) = clean_vehicles(raw_vehicles, &ctx.config.target_state);
    stats.clean = clean_stats;

    let index = GeoIndex::build(&geo)?;
    let (joined, join_stats) = left_join(&vehicles, &index);
    stats.join = join_stats;

    let aggregates = aggregate_by_city(&joined);
    stats.cities = aggregates.len();
    stats.cities_without_coordinates = aggregates
        .iter()
        .filter(|a| a.coordinates().is_none())
        .count();

    let correlations = CorrelationTable::from_aggregates(&aggregates);

    let msrp: Vec<f64> = vehicles.iter().map(|v| v.base_msrp).collect();
    let range: Vec<f64> = vehicles.iter().map(|v| v.electric_range).collect();

    info!(
        cities = stats.cities,
        kept_pct = %format!("{:.1}", stats.kept_pct()),
        msrp_r = %correlations.msrp_vs_count.display_r(),
        range_r = %correlations.range_vs_count.display_r(),
        "Analysis complete"
    );

    Ok(Analysis {
        msrp_summary: ColumnSummary::from_values(&msrp),
        range_summary: ColumnSummary::from_values(&range),
        vehicles,
        aggregates,
        correlations,
        stats,
    })
}
