use std::collections::BTreeMap;

use tracing::{debug, info};

use crate::analyzers::types::{CityAggregate, JoinedRecord};
use crate::analyzers::utility::mean;

/// Per-city value series collected before averaging.
#[derive(Default)]
struct CitySeries {
    base_msrp: Vec<f64>,
    electric_range: Vec<f64>,
    lat: Vec<f64>,
    long: Vec<f64>,
}

/// Groups joined rows by city into [`CityAggregate`] rows.
///
/// Coordinate means skip rows without a geo match; a city where no row
/// matched gets `None` coordinates. Output is sorted by `city_ev_count`
/// descending, ties broken by city name.
#[tracing::instrument(skip_all, fields(rows = joined.len()))]
pub fn aggregate_by_city(joined: &[JoinedRecord]) -> Vec<CityAggregate> {
    let mut series: BTreeMap<&str, CitySeries> = BTreeMap::new();

    for row in joined {
        let city = series.entry(row.city.as_str()).or_default();

        city.base_msrp.push(row.base_msrp);
        city.electric_range.push(row.electric_range);

        if let (Some(lat), Some(long)) = (row.lat, row.long) {
            city.lat.push(lat);
            city.long.push(long);
        }
    }

    let mut aggregates: Vec<CityAggregate> = series
        .into_iter()
        .map(|(city, s)| {
            let has_coordinates = !s.lat.is_empty();
            if !has_coordinates {
                debug!(city, "City has no matched coordinates");
            }

            CityAggregate {
                city: city.to_string(),
                city_ev_count: s.base_msrp.len(),
                average_base_msrp: mean(&s.base_msrp),
                average_electric_range: mean(&s.electric_range),
                lat: has_coordinates.then(|| mean(&s.lat)),
                long: has_coordinates.then(|| mean(&s.long)),
            }
        })
        .collect();

    sort_by_count(&mut aggregates);
    info!(cities = aggregates.len(), "Aggregated vehicles by city");

    aggregates
}

/// Presentation order: most vehicles first, then alphabetical.
pub fn sort_by_count(aggregates: &mut [CityAggregate]) {
    aggregates.sort_by(|a, b| {
        b.city_ev_count
            .cmp(&a.city_ev_count)
            .then_with(|| a.city.cmp(&b.city))
    });
}
