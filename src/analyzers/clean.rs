use std::collections::HashMap;
use std::collections::hash_map::Entry;

use serde::Serialize;
use tracing::{debug, info};

use crate::analyzers::types::{GeoRecord, VehicleRecord};
use crate::error::{PipelineError, Result};
use crate::parser::ZipCode;

/// Row counts for the vehicle filter. Each dropped row is counted under the
/// first predicate it fails, checked in field order.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CleanStats {
    pub input_rows: usize,
    pub zero_msrp: usize,
    pub zero_range: usize,
    pub wrong_state: usize,
    pub kept: usize,
}

impl CleanStats {
    pub fn dropped(&self) -> usize {
        self.input_rows - self.kept
    }
}

/// Keeps the vehicles with a positive price, a positive range and the
/// target state. Rows failing any predicate are dropped, not reported.
#[tracing::instrument(skip(records), fields(input_rows = records.len()))]
pub fn clean_vehicles(
    records: Vec<VehicleRecord>,
    target_state: &str,
) -> (Vec<VehicleRecord>, CleanStats) {
    let target_state = target_state.trim();
    let mut stats = CleanStats {
        input_rows: records.len(),
        ..Default::default()
    };

    let kept: Vec<VehicleRecord> = records
        .into_iter()
        .filter(|r| {
            // negated so NaN and negative values are dropped too
            if !(r.base_msrp > 0.0) {
                stats.zero_msrp += 1;
                false
            } else if !(r.electric_range > 0.0) {
                stats.zero_range += 1;
                false
            } else if r.state.trim() != target_state {
                stats.wrong_state += 1;
                false
            } else {
                true
            }
        })
        .collect();

    stats.kept = kept.len();
    info!(
        kept = stats.kept,
        zero_msrp = stats.zero_msrp,
        zero_range = stats.zero_range,
        wrong_state = stats.wrong_state,
        "Vehicle table cleaned"
    );

    (kept, stats)
}

/// Postal code lookup built from the projected geo table.
#[derive(Debug, Default, Clone)]
pub struct GeoIndex {
    coordinates: HashMap<ZipCode, (f64, f64)>,
}

impl GeoIndex {
    /// Builds the index, rejecting repeated keys so the join can never fan out.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::DuplicateZip`] for the first repeated key.
    pub fn build(records: &[GeoRecord]) -> Result<Self> {
        let mut coordinates = HashMap::with_capacity(records.len());

        for record in records {
            match coordinates.entry(record.zip_code) {
                Entry::Occupied(_) => return Err(PipelineError::DuplicateZip(record.zip_code)),
                Entry::Vacant(slot) => {
                    slot.insert((record.lat, record.long));
                }
            }
        }

        debug!(keys = coordinates.len(), "Geo index built");
        Ok(Self { coordinates })
    }

    /// `(lat, long)` for a postal code.
    pub fn get(&self, zip_code: ZipCode) -> Option<(f64, f64)> {
        self.coordinates.get(&zip_code).copied()
    }

    pub fn len(&self) -> usize {
        self.coordinates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coordinates.is_empty()
    }
}
