//! Report settings.
//!
//! Stored as a JSON object on disk; every field is optional and falls back
//! to its default:
//! ```json
//! {
//!   "target_state": "WA",
//!   "histogram_bins": 40,
//!   "msrp_domain": { "min": 0, "max": 150000 }
//! }
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// A closed numeric interval used to clamp chart axes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Domain {
    pub min: f64,
    pub max: f64,
}

impl Domain {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    pub fn width(&self) -> f64 {
        self.max - self.min
    }

    /// Smallest domain covering `values`, widened by one unit on each side
    /// when all values are equal. `None` for empty input.
    pub fn covering(values: &[f64]) -> Option<Self> {
        let (min, max) = crate::analyzers::utility::min_max(values)?;
        if min == max {
            Some(Self::new(min - 1.0, max + 1.0))
        } else {
            Some(Self::new(min, max))
        }
    }

    /// Extends both ends by `fraction` of the width.
    pub fn padded(&self, fraction: f64) -> Self {
        let pad = self.width() * fraction;
        Self::new(self.min - pad, self.max + pad)
    }
}

/// X and Y domains of a scatter plot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScatterDomain {
    pub x: Domain,
    pub y: Domain,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Jurisdiction vehicles must be registered in to survive cleaning.
    pub target_state: String,
    pub histogram_bins: usize,
    /// Axis clamp for the `base_msrp` histogram.
    pub msrp_domain: Domain,
    /// Axis clamp for the MSRP-vs-count scatter plot.
    pub msrp_scatter_domain: ScatterDomain,
    pub chart_width: u32,
    pub chart_height: u32,
    /// Number of cities listed in the narrative and summary.
    pub top_cities: usize,
    pub significance_level: f64,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            target_state: "WA".to_string(),
            histogram_bins: 30,
            msrp_domain: Domain::new(0.0, 200_000.0),
            msrp_scatter_domain: ScatterDomain {
                x: Domain::new(30_000.0, 110_000.0),
                y: Domain::new(0.0, 200.0),
            },
            chart_width: 1024,
            chart_height: 768,
            top_cities: 10,
            significance_level: 0.05,
        }
    }
}

impl ReportConfig {
    /// Loads the config from a JSON file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("invalid config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects settings that would make charts impossible to draw.
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(self.histogram_bins > 0, "histogram_bins must be positive");
        anyhow::ensure!(
            self.chart_width > 0 && self.chart_height > 0,
            "chart dimensions must be positive"
        );
        for (name, domain) in [
            ("msrp_domain", self.msrp_domain),
            ("msrp_scatter_domain.x", self.msrp_scatter_domain.x),
            ("msrp_scatter_domain.y", self.msrp_scatter_domain.y),
        ] {
            anyhow::ensure!(domain.min < domain.max, "{name} must have min < max");
        }
        anyhow::ensure!(
            self.significance_level > 0.0 && self.significance_level < 1.0,
            "significance_level must be in (0, 1)"
        );
        Ok(())
    }
}
