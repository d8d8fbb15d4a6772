//! Data types used by the aggregation pipeline.

use serde::{Deserialize, Serialize};

use crate::parser::ZipCode;

/// A single vehicle registration after explicit field parsing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VehicleRecord {
    pub city: String,
    pub state: String,
    pub zip_code: Option<ZipCode>,
    pub base_msrp: f64,
    pub electric_range: f64,
}

/// Geocoordinates for one postal code, projected down from the source table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GeoRecord {
    pub zip_code: ZipCode,
    pub lat: f64,
    pub long: f64,
}

/// A cleaned vehicle row with the coordinates of its postal code, if any.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JoinedRecord {
    pub city: String,
    pub zip_code: Option<ZipCode>,
    pub base_msrp: f64,
    pub electric_range: f64,
    pub lat: Option<f64>,
    pub long: Option<f64>,
}

/// Per-city rollup of vehicle counts and averaged attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityAggregate {
    pub city: String,
    pub city_ev_count: usize,
    pub average_base_msrp: f64,
    pub average_electric_range: f64,
    pub lat: Option<f64>,
    pub long: Option<f64>,
}

impl CityAggregate {
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        Some((self.lat?, self.long?))
    }
}
