use std::path::Path;

use plotters::prelude::*;

use crate::charts::{FONT, render_error};
use crate::config::Domain;
use crate::error::{PipelineError, Result};

#[derive(Debug, Clone)]
pub struct HistogramSpec {
    pub name: &'static str,
    pub title: &'static str,
    pub x_desc: &'static str,
    /// Axis clamp; values outside are not counted. `None` covers the data.
    pub domain: Option<Domain>,
    pub bins: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

/// Counts `values` into `bins` equal-width bins spanning `domain`.
///
/// Values outside the domain are skipped; the upper edge belongs to the
/// last bin.
pub fn bin_values(values: &[f64], domain: Domain, bins: usize) -> Vec<Bin> {
    let bins = bins.max(1);
    let width = domain.width() / bins as f64;

    let mut counts = vec![0usize; bins];
    for &v in values {
        if !domain.contains(v) {
            continue;
        }
        let idx = if width > 0.0 {
            (((v - domain.min) / width) as usize).min(bins - 1)
        } else {
            0
        };
        counts[idx] += 1;
    }

    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| Bin {
            lower: domain.min + width * i as f64,
            upper: domain.min + width * (i + 1) as f64,
            count,
        })
        .collect()
}

/// Renders a histogram of `values` to an SVG file.
///
/// # Errors
///
/// [`PipelineError::EmptyDataset`] when no value falls inside the domain,
/// [`PipelineError::Render`] when the backend fails.
pub fn render(path: &Path, spec: &HistogramSpec, values: &[f64], size: (u32, u32)) -> Result<()> {
    let empty = || PipelineError::EmptyDataset(spec.name.to_string());

    let domain = match spec.domain {
        Some(domain) => domain,
        None => Domain::covering(values).ok_or_else(empty)?,
    };

    let bins = bin_values(values, domain, spec.bins);
    if bins.iter().all(|b| b.count == 0) {
        return Err(empty());
    }

    draw(path, spec, domain, &bins, size).map_err(|e| render_error(spec.name, format!("{e:#}")))
}

fn draw(
    path: &Path,
    spec: &HistogramSpec,
    domain: Domain,
    bins: &[Bin],
    size: (u32, u32),
) -> anyhow::Result<()> {
    let y_max = bins.iter().map(|b| b.count).max().unwrap_or(0).max(1) as f64 * 1.05;

    let root = SVGBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(spec.title, (FONT, 24).into_font())
        .margin(20)
        .x_label_area_size(45)
        .y_label_area_size(60)
        .build_cartesian_2d(domain.min..domain.max, 0f64..y_max)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_desc(spec.x_desc)
        .y_desc("count")
        .x_label_formatter(&|v| format!("{v:.0}"))
        .y_label_formatter(&|v| format!("{v:.0}"))
        .draw()?;

    chart.draw_series(bins.iter().filter(|b| b.count > 0).map(|b| {
        Rectangle::new(
            [(b.lower, 0.0), (b.upper, b.count as f64)],
            BLUE.mix(0.6).filled(),
        )
    }))?;

    root.present()?;
    Ok(())
}
