//! Pearson correlations between city-level averages and vehicle counts.
//!
//! Coefficients come from [`pearson`]; significance is a two-tailed p-value
//! from Student's t distribution with `n - 2` degrees of freedom (`statrs`).

use serde::Serialize;
use statrs::distribution::{ContinuousCDF, StudentsT};

use crate::analyzers::grade::strength;
use crate::analyzers::types::CityAggregate;
use crate::analyzers::utility::pearson;

pub const MSRP_VS_COUNT: &str = "corr(average_base_msrp, city_ev_count)";
pub const RANGE_VS_COUNT: &str = "corr(average_electric_range, city_ev_count)";

/// One bivariate correlation. `r` is `None` when it is undefined (fewer than
/// two cities or a constant series).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Correlation {
    pub label: String,
    pub sample_count: usize,
    pub r: Option<f64>,
    pub p_value: Option<f64>,
    pub strength: Option<&'static str>,
}

impl Correlation {
    pub fn calculate(label: &str, x: &[f64], y: &[f64]) -> Self {
        let r = pearson(x, y);

        Self {
            label: label.to_string(),
            sample_count: x.len().min(y.len()),
            r,
            p_value: r.and_then(|r| p_value_for_r(r, x.len())),
            strength: r.map(strength),
        }
    }

    /// Coefficient rounded to four decimals, or `n/a`.
    pub fn display_r(&self) -> String {
        format_coefficient(self.r)
    }

    pub fn is_significant(&self, alpha: f64) -> bool {
        self.p_value.is_some_and(|p| p < alpha)
    }
}

/// Two-tailed p-value for a Pearson `r` over `n` pairs. `None` below three pairs.
pub fn p_value_for_r(r: f64, n: usize) -> Option<f64> {
    if n < 3 {
        return None;
    }

    if r.abs() >= 1.0 {
        return Some(0.0);
    }

    let df = (n - 2) as f64;
    let t_stat = r * df.sqrt() / (1.0 - r * r).sqrt();

    StudentsT::new(0.0, 1.0, df)
        .ok()
        .map(|t| (2.0 * (1.0 - t.cdf(t_stat.abs()))).clamp(0.0, 1.0))
}

pub fn format_coefficient(r: Option<f64>) -> String {
    match r {
        Some(r) => format!("{r:.4}"),
        None => "n/a".to_string(),
    }
}

/// The "Correlation Coefficients" summary table: a single row of two values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationTable {
    pub msrp_vs_count: Correlation,
    pub range_vs_count: Correlation,
}

impl CorrelationTable {
    pub const CAPTION: &'static str = "Correlation Coefficients";

    pub fn from_aggregates(aggregates: &[CityAggregate]) -> Self {
        let counts: Vec<f64> = aggregates.iter().map(|a| a.city_ev_count as f64).collect();
        let msrp: Vec<f64> = aggregates.iter().map(|a| a.average_base_msrp).collect();
        let range: Vec<f64> = aggregates
            .iter()
            .map(|a| a.average_electric_range)
            .collect();

        Self {
            msrp_vs_count: Correlation::calculate(MSRP_VS_COUNT, &msrp, &counts),
            range_vs_count: Correlation::calculate(RANGE_VS_COUNT, &range, &counts),
        }
    }

    pub fn columns(&self) -> [&Correlation; 2] {
        [&self.msrp_vs_count, &self.range_vs_count]
    }

    /// Markdown rendering with the caption as a bold title line.
    pub fn to_markdown(&self) -> String {
        let [a, b] = self.columns();
        format!(
            "**{}**\n\n| {} | {} |\n|---:|---:|\n| {} | {} |\n",
            Self::CAPTION,
            a.label,
            b.label,
            a.display_r(),
            b.display_r()
        )
    }
}
