use serde::Serialize;

use crate::analyzers::clean::CleanStats;
use crate::analyzers::join::JoinStats;
use crate::analyzers::types::CityAggregate;
use crate::analyzers::utility::{mean, min_max, stddev};

/// Row accounting for one pipeline run.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct PipelineStats {
    pub vehicle_rows: usize,
    pub geo_rows: usize,
    pub clean: CleanStats,
    pub join: JoinStats,
    pub cities: usize,
    pub cities_without_coordinates: usize,
}

impl PipelineStats {
    pub fn pct(part: usize, total: usize) -> f64 {
        if total == 0 {
            0.0
        } else {
            (part as f64 / total as f64) * 100.0
        }
    }

    pub fn kept_pct(&self) -> f64 {
        Self::pct(self.clean.kept, self.vehicle_rows)
    }

    pub fn matched_pct(&self) -> f64 {
        Self::pct(self.join.matched, self.join.joined)
    }

    /// Share of all joined vehicles registered in the given cities.
    pub fn share_of(&self, cities: &[CityAggregate]) -> f64 {
        let count = cities.iter().map(|c| c.city_ev_count).sum();
        Self::pct(count, self.join.joined)
    }
}

/// Descriptive statistics of one numeric column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ColumnSummary {
    pub count: usize,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    pub stddev: f64,
}

impl ColumnSummary {
    pub fn from_values(values: &[f64]) -> Option<Self> {
        let (min, max) = min_max(values)?;
        let avg = mean(values);

        Some(Self {
            count: values.len(),
            mean: avg,
            min,
            max,
            stddev: stddev(values, avg),
        })
    }
}
