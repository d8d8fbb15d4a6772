use serde::Serialize;
use tracing::{info, warn};

use crate::analyzers::clean::GeoIndex;
use crate::analyzers::types::{JoinedRecord, VehicleRecord};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct JoinStats {
    pub joined: usize,
    pub matched: usize,
    /// Vehicles with an empty postal code.
    pub missing_zip: usize,
    /// Vehicles whose postal code is absent from the geo table.
    pub unmatched: usize,
}

/// Left-joins cleaned vehicles to their postal code coordinates.
///
/// Every vehicle yields exactly one output row; rows without a match keep
/// `None` coordinates.
#[tracing::instrument(skip_all, fields(vehicles = vehicles.len(), geo_keys = geo.len()))]
pub fn left_join(vehicles: &[VehicleRecord], geo: &GeoIndex) -> (Vec<JoinedRecord>, JoinStats) {
    let mut stats = JoinStats::default();

    let joined: Vec<JoinedRecord> = vehicles
        .iter()
        .map(|v| {
            let coordinates = match v.zip_code {
                Some(zip) => {
                    let found = geo.get(zip);
                    if found.is_some() {
                        stats.matched += 1;
                    } else {
                        stats.unmatched += 1;
                    }
                    found
                }
                None => {
                    stats.missing_zip += 1;
                    None
                }
            };

            JoinedRecord {
                city: v.city.clone(),
                zip_code: v.zip_code,
                base_msrp: v.base_msrp,
                electric_range: v.electric_range,
                lat: coordinates.map(|c| c.0),
                long: coordinates.map(|c| c.1),
            }
        })
        .collect();

    stats.joined = joined.len();

    if stats.unmatched + stats.missing_zip > 0 {
        warn!(
            unmatched = stats.unmatched,
            missing_zip = stats.missing_zip,
            "Some vehicles have no coordinates"
        );
    }
    info!(joined = stats.joined, matched = stats.matched, "Join complete");

    (joined, stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::types::GeoRecord;
    use crate::parser::ZipCode;

    fn vehicle(city: &str, zip: Option<u32>) -> VehicleRecord {
        VehicleRecord {
            city: city.to_string(),
            state: "WA".to_string(),
            zip_code: zip.and_then(ZipCode::new),
            base_msrp: 40000.0,
            electric_range: 200.0,
        }
    }

    fn index() -> GeoIndex {
        GeoIndex::build(&[
            GeoRecord {
                zip_code: ZipCode::new(98101).unwrap(),
                lat: 47.61,
                long: -122.33,
            },
            GeoRecord {
                zip_code: ZipCode::new(98402).unwrap(),
                lat: 47.25,
                long: -122.44,
            },
        ])
        .unwrap()
    }

    #[test]
    fn test_join_preserves_cardinality() {
        let vehicles = vec![
            vehicle("Seattle", Some(98101)),
            vehicle("Seattle", Some(98101)),
            vehicle("Tacoma", Some(98402)),
            vehicle("Yakima", Some(98901)),
            vehicle("Unknown", None),
        ];

        let (joined, stats) = left_join(&vehicles, &index());

        assert_eq!(joined.len(), vehicles.len());
        assert_eq!(
            stats,
            JoinStats {
                joined: 5,
                matched: 3,
                missing_zip: 1,
                unmatched: 1,
            }
        );
    }

    #[test]
    fn test_join_keeps_unmatched_rows_with_null_coordinates() {
        let (joined, _) = left_join(&[vehicle("Yakima", Some(98901))], &index());

        assert_eq!(joined[0].city, "Yakima");
        assert_eq!(joined[0].lat, None);
        assert_eq!(joined[0].long, None);
    }

    #[test]
    fn test_join_copies_coordinates() {
        let (joined, _) = left_join(&[vehicle("Tacoma", Some(98402))], &index());

        assert_eq!(joined[0].lat, Some(47.25));
        assert_eq!(joined[0].long, Some(-122.44));
        assert_eq!(joined[0].base_msrp, 40000.0);
    }
}
