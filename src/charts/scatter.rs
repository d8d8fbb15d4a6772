use std::path::Path;

use plotters::prelude::*;

use crate::analyzers::utility::{LinearFit, linear_fit};
use crate::charts::{FONT, render_error};
use crate::config::{Domain, ScatterDomain};
use crate::error::{PipelineError, Result};

#[derive(Debug, Clone)]
pub struct ScatterSpec {
    pub name: &'static str,
    pub title: &'static str,
    pub x_desc: &'static str,
    pub y_desc: &'static str,
    /// Axis clamp; points outside are hidden. `None` covers the data.
    pub domain: Option<ScatterDomain>,
}

/// Portion of the trend line inside `domain`, as its two end points.
pub fn clip_line(fit: LinearFit, domain: ScatterDomain) -> Option<((f64, f64), (f64, f64))> {
    let (x, y) = (domain.x, domain.y);

    let (lo, hi) = if fit.slope == 0.0 {
        if !y.contains(fit.intercept) {
            return None;
        }
        (x.min, x.max)
    } else {
        let xa = (y.min - fit.intercept) / fit.slope;
        let xb = (y.max - fit.intercept) / fit.slope;
        (x.min.max(xa.min(xb)), x.max.min(xa.max(xb)))
    };

    (lo < hi).then(|| ((lo, fit.at(lo)), (hi, fit.at(hi))))
}

/// Renders `(x, y)` points with a least-squares trend line.
///
/// The fit uses every point, including those hidden by the domain clamp.
/// No line is drawn when the points admit no fit.
///
/// # Errors
///
/// [`PipelineError::EmptyDataset`] when no point is visible,
/// [`PipelineError::Render`] when the backend fails.
pub fn render(
    path: &Path,
    spec: &ScatterSpec,
    points: &[(f64, f64)],
    size: (u32, u32),
) -> Result<()> {
    let empty = || PipelineError::EmptyDataset(spec.name.to_string());

    let domain = match spec.domain {
        Some(domain) => domain,
        None => {
            let xs: Vec<f64> = points.iter().map(|p| p.0).collect();
            let ys: Vec<f64> = points.iter().map(|p| p.1).collect();
            ScatterDomain {
                x: Domain::covering(&xs).ok_or_else(empty)?.padded(0.05),
                y: Domain::covering(&ys).ok_or_else(empty)?.padded(0.05),
            }
        }
    };

    let visible: Vec<(f64, f64)> = points
        .iter()
        .copied()
        .filter(|&(x, y)| domain.x.contains(x) && domain.y.contains(y))
        .collect();
    if visible.is_empty() {
        return Err(empty());
    }

    let trend = linear_fit(points).and_then(|f| clip_line(f, domain));

    draw(path, spec, domain, &visible, trend, size)
        .map_err(|e| render_error(spec.name, format!("{e:#}")))
}

fn draw(
    path: &Path,
    spec: &ScatterSpec,
    domain: ScatterDomain,
    points: &[(f64, f64)],
    trend: Option<((f64, f64), (f64, f64))>,
    size: (u32, u32),
) -> anyhow::Result<()> {
    let root = SVGBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(spec.title, (FONT, 24).into_font())
        .margin(20)
        .x_label_area_size(45)
        .y_label_area_size(60)
        .build_cartesian_2d(domain.x.min..domain.x.max, domain.y.min..domain.y.max)?;

    chart
        .configure_mesh()
        .x_desc(spec.x_desc)
        .y_desc(spec.y_desc)
        .x_label_formatter(&|v| format!("{v:.0}"))
        .y_label_formatter(&|v| format!("{v:.0}"))
        .draw()?;

    chart.draw_series(
        points
            .iter()
            .map(|&(x, y)| Circle::new((x, y), 3, BLUE.mix(0.7).filled())),
    )?;

    if let Some((a, b)) = trend {
        chart.draw_series(LineSeries::new([a, b], RED.stroke_width(2)))?;
    }

    root.present()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::fs;

    fn domain() -> ScatterDomain {
        ScatterDomain {
            x: Domain::new(30_000.0, 110_000.0),
            y: Domain::new(0.0, 200.0),
        }
    }

    #[test]
    fn test_clip_line_inside_domain() {
        let fit = LinearFit {
            slope: 0.0,
            intercept: 50.0,
        };
        assert_eq!(
            clip_line(fit, domain()),
            Some(((30_000.0, 50.0), (110_000.0, 50.0)))
        );
    }

    #[test]
    fn test_clip_line_trims_to_y_range() {
        // y = 0.005x - 150 crosses y=0 at x=30000 and y=200 at x=70000
        let fit = LinearFit {
            slope: 0.005,
            intercept: -150.0,
        };
        let ((x0, y0), (x1, y1)) = clip_line(fit, domain()).unwrap();

        assert!((x0 - 30_000.0).abs() < 1e-6);
        assert!(y0.abs() < 1e-6);
        assert!((x1 - 70_000.0).abs() < 1e-6);
        assert!((y1 - 200.0).abs() < 1e-6);
    }

    #[test]
    fn test_clip_line_outside_domain() {
        let fit = LinearFit {
            slope: 0.0,
            intercept: 500.0,
        };
        assert_eq!(clip_line(fit, domain()), None);
    }

    #[test]
    fn test_render_hidden_points_are_empty() {
        let spec = ScatterSpec {
            name: "clamped_scatter",
            title: "Clamped",
            x_desc: "x",
            y_desc: "y",
            domain: Some(domain()),
        };
        let path = env::temp_dir().join("ev_city_report_clamped_scatter.svg");

        let result = render(&path, &spec, &[(845_000.0, 1.0), (20_000.0, 900.0)], (640, 480));
        assert!(matches!(result, Err(PipelineError::EmptyDataset(_))));
    }

    #[test]
    fn test_render_writes_svg_with_trend_line() {
        let spec = ScatterSpec {
            name: "range_scatter",
            title: "Range",
            x_desc: "average_electric_range",
            y_desc: "city_ev_count",
            domain: None,
        };
        let path = env::temp_dir().join("ev_city_report_range_scatter.svg");
        let _ = fs::remove_file(&path);

        render(
            &path,
            &spec,
            &[(100.0, 2.0), (200.0, 4.0), (300.0, 6.0)],
            (640, 480),
        )
        .unwrap();

        let svg = fs::read_to_string(&path).unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("<polyline"));
        fs::remove_file(&path).unwrap();
    }
}
