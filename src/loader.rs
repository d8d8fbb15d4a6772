//! CSV loading for the vehicle registration and postal code tables.
//!
//! Rows are deserialized into raw string structs first and then coerced
//! field by field, so every failure can name its file, line and column.

use std::fs::File;
use std::path::Path;

use csv::StringRecord;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::analyzers::types::{GeoRecord, VehicleRecord};
use crate::error::{PipelineError, Result};
use crate::parser::{ZipCode, parse_number};

/// Required vehicle columns with the header spellings accepted for each.
/// Spellings are matched against the trimmed, lowercased header.
const VEHICLE_COLUMNS: &[(&str, &[&str])] = &[
    ("city", &["city"]),
    ("state", &["state"]),
    ("zip_code", &["zip_code", "postal code", "postal_code", "zip"]),
    ("base_msrp", &["base_msrp", "base msrp"]),
    ("electric_range", &["electric_range", "electric range"]),
];

const GEO_COLUMNS: &[(&str, &[&str])] = &[
    ("zip", &["zip", "zip_code", "postal code"]),
    ("lat", &["lat", "latitude"]),
    ("lng", &["lng", "long", "longitude"]),
];

#[derive(Debug, Deserialize)]
struct RawVehicleRow {
    city: String,
    state: String,
    zip_code: String,
    base_msrp: String,
    electric_range: String,
}

#[derive(Debug, Deserialize)]
struct RawGeoRow {
    zip: String,
    lat: String,
    lng: String,
}

/// Loads the vehicle registration table.
///
/// # Errors
///
/// Fails if the file is missing, a required column is absent, or any row
/// carries an unparseable zip code or number.
#[tracing::instrument(skip_all, fields(path = %path.display()))]
pub fn load_vehicles(path: &Path) -> Result<Vec<VehicleRecord>> {
    let mut rows = Vec::new();

    for_each_row(path, VEHICLE_COLUMNS, |line, raw: RawVehicleRow| {
        let zip_code = ZipCode::parse_optional(&raw.zip_code).map_err(|e| {
            PipelineError::InvalidZip {
                path: path.to_path_buf(),
                line,
                value: e.0,
            }
        })?;

        rows.push(VehicleRecord {
            city: raw.city,
            state: raw.state,
            zip_code,
            base_msrp: number(path, line, "base_msrp", &raw.base_msrp)?,
            electric_range: number(path, line, "electric_range", &raw.electric_range)?,
        });
        Ok(())
    })?;

    info!(rows = rows.len(), "Vehicle table loaded");
    Ok(rows)
}

/// Loads the postal code table, projected to `zip`, `lat` and `long`.
///
/// # Errors
///
/// Fails if the file is missing, a required column is absent, or any row has
/// an empty or unparseable zip code or coordinate.
#[tracing::instrument(skip_all, fields(path = %path.display()))]
pub fn load_geo(path: &Path) -> Result<Vec<GeoRecord>> {
    let mut rows = Vec::new();

    for_each_row(path, GEO_COLUMNS, |line, raw: RawGeoRow| {
        let zip_code: ZipCode = raw.zip.parse().map_err(|_| PipelineError::InvalidZip {
            path: path.to_path_buf(),
            line,
            value: raw.zip.clone(),
        })?;

        rows.push(GeoRecord {
            zip_code,
            lat: number(path, line, "lat", &raw.lat)?,
            long: number(path, line, "lng", &raw.lng)?,
        });
        Ok(())
    })?;

    info!(rows = rows.len(), "Geo table loaded");
    Ok(rows)
}

fn for_each_row<T, F>(path: &Path, columns: &[(&'static str, &[&str])], mut f: F) -> Result<()>
where
    T: DeserializeOwned,
    F: FnMut(u64, T) -> Result<()>,
{
    let csv_error = |source| PipelineError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let file = File::open(path).map_err(|source| PipelineError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(file);

    let headers = canonical_headers(rdr.headers().map_err(csv_error)?, columns);
    debug!(columns = headers.len(), "CSV headers read");

    for &(column, _) in columns {
        if !headers.iter().any(|h| h == column) {
            return Err(PipelineError::MissingColumn {
                path: path.to_path_buf(),
                column,
            });
        }
    }
    rdr.set_headers(headers.clone());

    for result in rdr.records() {
        let record = result.map_err(csv_error)?;
        let line = record.position().map_or(0, csv::Position::line);
        let raw: T = record.deserialize(Some(&headers)).map_err(csv_error)?;
        f(line, raw)?;
    }

    Ok(())
}

/// Renames every recognised header to its canonical column name. The first
/// header matching a column wins; anything else is kept, trimmed and
/// lowercased.
fn canonical_headers(raw: &StringRecord, columns: &[(&'static str, &[&str])]) -> StringRecord {
    let mut claimed: Vec<&str> = Vec::with_capacity(columns.len());

    raw.iter()
        .map(|header| {
            let normalized = header.trim().to_lowercase();
            let canonical = columns
                .iter()
                .find(|(column, spellings)| {
                    !claimed.contains(column) && spellings.contains(&normalized.as_str())
                })
                .map(|&(column, _)| column);

            match canonical {
                Some(column) => {
                    claimed.push(column);
                    column.to_string()
                }
                None => normalized,
            }
        })
        .collect()
}

fn number(path: &Path, line: u64, column: &'static str, raw: &str) -> Result<f64> {
    parse_number(raw).ok_or_else(|| PipelineError::InvalidNumber {
        path: path.to_path_buf(),
        line,
        column,
        value: raw.to_string(),
    })
}
