//! Per-client geo points for the weighted heat-map view.

use std::collections::BTreeMap;

use crate::analyzers::types::GeoPoint;
use crate::dataset::TransactionRow;

/// True for a coordinate pair worth plotting: both fields finite and not
/// the (0, 0) null island that empty cells normalize to.
fn valid_coords(latitude: f64, longitude: f64) -> bool {
    latitude.is_finite() && longitude.is_finite() && !(latitude == 0.0 && longitude == 0.0)
}

/// Rolls the rows up into one weighted point per client.
///
/// A client's point uses the first valid coordinate pair seen in row
/// order; its weight is the client's total across all rows, including rows
/// without usable coordinates. Clients with no valid pair, and rows with no
/// client key, are omitted. Output is ordered by client key so repeated
/// runs emit identical sequences.
pub fn client_points<'a>(rows: impl IntoIterator<Item = &'a TransactionRow>) -> Vec<GeoPoint> {
    struct Accum {
        coords: Option<(f64, f64)>,
        weight: f64,
    }

    let mut per_client: BTreeMap<String, Accum> = BTreeMap::new();
    for row in rows {
        if row.client_key.is_empty() {
            continue;
        }
        let accum = per_client.entry(row.client_key.clone()).or_insert(Accum {
            coords: None,
            weight: 0.0,
        });
        accum.weight += row.weight;
        if accum.coords.is_none() {
            if let (Some(latitude), Some(longitude)) = (row.latitude, row.longitude) {
                if valid_coords(latitude, longitude) {
                    accum.coords = Some((latitude, longitude));
                }
            }
        }
    }

    per_client
        .into_values()
        .filter_map(|accum| {
            accum.coords.map(|(latitude, longitude)| GeoPoint {
                latitude,
                longitude,
                weight: accum.weight,
            })
        })
        .collect()
}
