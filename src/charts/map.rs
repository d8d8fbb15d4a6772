//! Geographic density map: one marker per city at its mean coordinate,
//! sized by vehicle count, over a region outline.

use std::path::Path;

use geojson::{GeoJson, Value};
use plotters::prelude::*;
use tracing::{debug, warn};

use crate::analyzers::types::CityAggregate;
use crate::charts::{FONT, render_error};
use crate::config::Domain;
use crate::error::{PipelineError, Result};

/// Largest marker radius in pixels, used for the city with the most vehicles.
pub const MAX_RADIUS: f64 = 30.0;

/// Region boundary as `(long, lat)` rings.
#[derive(Debug, Clone, PartialEq)]
pub struct Outline {
    pub rings: Vec<Vec<(f64, f64)>>,
}

impl Outline {
    /// Loads polygon and line rings from a GeoJSON file.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read, is not GeoJSON, or holds no polygon
    /// or line geometry.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| PipelineError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_geojson(&text).map_err(|message| PipelineError::Outline {
            path: path.to_path_buf(),
            message,
        })
    }

    pub fn from_geojson(text: &str) -> std::result::Result<Self, String> {
        let geojson: GeoJson = text.parse().map_err(|e: geojson::Error| e.to_string())?;

        let mut rings = Vec::new();
        match geojson {
            GeoJson::Geometry(geometry) => collect_rings(&geometry.value, &mut rings),
            GeoJson::Feature(feature) => {
                if let Some(geometry) = feature.geometry {
                    collect_rings(&geometry.value, &mut rings);
                }
            }
            GeoJson::FeatureCollection(collection) => {
                for geometry in collection.features.into_iter().filter_map(|f| f.geometry) {
                    collect_rings(&geometry.value, &mut rings);
                }
            }
        }

        rings.retain(|r| r.len() >= 2);
        if rings.is_empty() {
            return Err("no polygon or line geometry found".to_string());
        }

        Ok(Self { rings })
    }

    /// A closed rectangle, used when no outline file is given.
    pub fn rectangle(long: Domain, lat: Domain) -> Self {
        Self {
            rings: vec![vec![
                (long.min, lat.min),
                (long.max, lat.min),
                (long.max, lat.max),
                (long.min, lat.max),
                (long.min, lat.min),
            ]],
        }
    }

    fn vertices(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.rings.iter().flatten().copied()
    }
}

fn collect_rings(value: &Value, rings: &mut Vec<Vec<(f64, f64)>>) {
    match value {
        Value::Polygon(polygon) => rings.extend(polygon.iter().map(|ring| to_ring(ring))),
        Value::MultiPolygon(polygons) => {
            for polygon in polygons {
                rings.extend(polygon.iter().map(|ring| to_ring(ring)));
            }
        }
        Value::LineString(line) => rings.push(to_ring(line)),
        Value::MultiLineString(lines) => rings.extend(lines.iter().map(|line| to_ring(line))),
        Value::GeometryCollection(geometries) => {
            for geometry in geometries {
                collect_rings(&geometry.value, rings);
            }
        }
        _ => debug!("Skipping point geometry in outline"),
    }
}

fn to_ring<P: AsRef<[f64]>>(positions: &[P]) -> Vec<(f64, f64)> {
    positions
        .iter()
        .map(AsRef::as_ref)
        .filter(|p| p.len() >= 2)
        .map(|p| (p[0], p[1]))
        .collect()
}

/// Marker radius whose area is proportional to `count`, never below one
/// pixel.
pub fn marker_radius(count: usize, max_count: usize) -> i32 {
    if max_count == 0 {
        return 1;
    }
    let radius = MAX_RADIUS * (count as f64 / max_count as f64).sqrt();
    radius.round().max(1.0) as i32
}

/// Renders the density map to an SVG file.
///
/// Cities without coordinates are left off the map.
///
/// # Errors
///
/// [`PipelineError::EmptyDataset`] when no city has coordinates,
/// [`PipelineError::Render`] when the backend fails.
pub fn render(
    path: &Path,
    name: &str,
    title: &str,
    aggregates: &[CityAggregate],
    outline: Option<&Outline>,
    size: (u32, u32),
) -> Result<()> {
    let mut points: Vec<(f64, f64, usize)> = aggregates
        .iter()
        .filter_map(|a| a.coordinates().map(|(lat, long)| (long, lat, a.city_ev_count)))
        .collect();

    let skipped = aggregates.len() - points.len();
    if skipped > 0 {
        warn!(skipped, "Cities without coordinates left off the map");
    }
    if points.is_empty() {
        return Err(PipelineError::EmptyDataset(name.to_string()));
    }

    let longs: Vec<f64> = points.iter().map(|p| p.0).collect();
    let lats: Vec<f64> = points.iter().map(|p| p.1).collect();
    let fallback;
    let outline = match outline {
        Some(outline) => outline,
        None => {
            let (Some(long), Some(lat)) = (Domain::covering(&longs), Domain::covering(&lats))
            else {
                return Err(PipelineError::EmptyDataset(name.to_string()));
            };
            fallback = Outline::rectangle(long.padded(0.02), lat.padded(0.02));
            &fallback
        }
    };

    let (all_longs, all_lats): (Vec<f64>, Vec<f64>) = outline
        .vertices()
        .chain(points.iter().map(|p| (p.0, p.1)))
        .unzip();
    let (Some(long_domain), Some(lat_domain)) =
        (Domain::covering(&all_longs), Domain::covering(&all_lats))
    else {
        return Err(PipelineError::EmptyDataset(name.to_string()));
    };

    // biggest markers first so smaller cities stay visible on top
    points.sort_by(|a, b| b.2.cmp(&a.2));
    let max_count = points[0].2;

    draw(
        path,
        title,
        outline,
        &points,
        max_count,
        long_domain.padded(0.05),
        lat_domain.padded(0.05),
        size,
    )
    .map_err(|e| render_error(name, format!("{e:#}")))
}

#[allow(clippy::too_many_arguments)]
fn draw(
    path: &Path,
    title: &str,
    outline: &Outline,
    points: &[(f64, f64, usize)],
    max_count: usize,
    long: Domain,
    lat: Domain,
    size: (u32, u32),
) -> anyhow::Result<()> {
    let root = SVGBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, (FONT, 24).into_font())
        .margin(20)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(long.min..long.max, lat.min..lat.max)?;

    chart
        .configure_mesh()
        .disable_mesh()
        .x_desc("longitude")
        .y_desc("latitude")
        .x_label_formatter(&|v| format!("{v:.1}"))
        .y_label_formatter(&|v| format!("{v:.1}"))
        .draw()?;

    chart.draw_series(
        outline
            .rings
            .iter()
            .map(|ring| PathElement::new(ring.clone(), BLACK.stroke_width(1))),
    )?;

    chart.draw_series(points.iter().map(|&(x, y, count)| {
        Circle::new(
            (x, y),
            marker_radius(count, max_count),
            RED.mix(0.45).filled(),
        )
    }))?;

    root.present()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::fs;

    fn city(name: &str, count: usize, coords: Option<(f64, f64)>) -> CityAggregate {
        CityAggregate {
            city: name.to_string(),
            city_ev_count: count,
            average_base_msrp: 50000.0,
            average_electric_range: 200.0,
            lat: coords.map(|c| c.0),
            long: coords.map(|c| c.1),
        }
    }

    #[test]
    fn test_marker_area_is_proportional() {
        assert_eq!(marker_radius(100, 100), 30);
        assert_eq!(marker_radius(25, 100), 15);
        assert_eq!(marker_radius(4, 16), 15);
        assert_eq!(marker_radius(1, 1000), 1);
        assert_eq!(marker_radius(0, 0), 1);
    }

    #[test]
    fn test_outline_from_polygon_feature() {
        let text = r#"{
            "type": "Feature",
            "properties": { "name": "Region" },
            "geometry": {
                "type": "Polygon",
                "coordinates": [[[-124.7, 48.4], [-117.0, 49.0], [-117.0, 46.0], [-124.7, 48.4]]]
            }
        }"#;

        let outline = Outline::from_geojson(text).unwrap();
        assert_eq!(outline.rings.len(), 1);
        assert_eq!(outline.rings[0][0], (-124.7, 48.4));
        assert_eq!(outline.rings[0].len(), 4);
    }

    #[test]
    fn test_outline_rejects_points_only() {
        let text = r#"{ "type": "Point", "coordinates": [-122.3, 47.6] }"#;
        assert!(Outline::from_geojson(text).is_err());
        assert!(Outline::from_geojson("not json").is_err());
    }

    #[test]
    fn test_rectangle_is_closed() {
        let outline = Outline::rectangle(Domain::new(-124.0, -117.0), Domain::new(45.5, 49.0));
        let ring = &outline.rings[0];
        assert_eq!(ring.first(), ring.last());
        assert_eq!(ring.len(), 5);
    }

    #[test]
    fn test_render_without_coordinates_fails() {
        let path = env::temp_dir().join("ev_city_report_empty_map.svg");
        let result = render(
            &path,
            "city_density_map",
            "Map",
            &[city("Orphan", 3, None)],
            None,
            (640, 480),
        );
        assert!(matches!(result, Err(PipelineError::EmptyDataset(_))));
    }

    #[test]
    fn test_render_writes_svg() {
        let path = env::temp_dir().join("ev_city_report_map.svg");
        let _ = fs::remove_file(&path);

        render(
            &path,
            "city_density_map",
            "Map",
            &[
                city("Seattle", 40, Some((47.61, -122.33))),
                city("Spokane", 10, Some((47.66, -117.43))),
                city("Orphan", 2, None),
            ],
            None,
            (640, 480),
        )
        .unwrap();

        assert!(fs::read_to_string(&path).unwrap().contains("<svg"));
        fs::remove_file(&path).unwrap();
    }
}
