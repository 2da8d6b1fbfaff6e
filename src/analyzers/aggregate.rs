//! The grouping engine: folds transaction rows into keyed buckets.
//!
//! One generic single-pass fold covers the channel and center dimensions;
//! the weight-range dimension needs a two-pass variant because a client is
//! classified by its *total* weight across the filtered set, not by any
//! individual row.

use std::collections::HashMap;

use crate::analyzers::types::{Bucket, Totals};
use crate::config::WeightRange;
use crate::dataset::TransactionRow;

/// Folds one row into a bucket. Empty client keys contribute sums and
/// vehicles but can't join a distinct-client set; plates flagged as
/// non-counting never enter the vehicle set.
fn fold_row(bucket: &mut Bucket, row: &TransactionRow) {
    if !row.client_key.is_empty() {
        bucket.clients.insert(row.client_key.clone());
    }
    if row.counts_as_vehicle {
        bucket.vehicles.insert(row.plate_key.clone());
    }
    bucket.sum_weight += row.weight;
    bucket.sum_value += row.value;
}

/// Flat totals over a row set: distinct clients, distinct countable
/// vehicles, summed weight and value.
pub fn totals<'a>(rows: impl IntoIterator<Item = &'a TransactionRow>) -> Totals {
    let mut all = Bucket::default();
    for row in rows {
        fold_row(&mut all, row);
    }
    Totals {
        clients: all.clients.len(),
        vehicles: all.vehicles.len(),
        sum_weight: all.sum_weight,
        sum_value: all.sum_value,
    }
}

/// Groups rows by a caller-supplied dimension key in a single pass.
///
/// Only dimension values with at least one contributing row appear in the
/// output (sparse map); ordering is up to the caller.
pub fn aggregate_by<'a, F>(
    rows: impl IntoIterator<Item = &'a TransactionRow>,
    key_fn: F,
) -> HashMap<String, Bucket>
where
    F: Fn(&TransactionRow) -> String,
{
    let mut buckets: HashMap<String, Bucket> = HashMap::new();
    for row in rows {
        let bucket = buckets.entry(key_fn(row)).or_default();
        fold_row(bucket, row);
    }
    buckets
}

/// Per-client accumulator for the weight-range first pass.
#[derive(Default)]
struct ClientRollup {
    weight: f64,
    value: f64,
    plates: Vec<String>,
}

/// Groups rows into weight-range buckets by per-client total weight.
///
/// Two passes: the first rolls rows up per client (rows without a client
/// key can't be classified and are skipped; negative weight readings are
/// skipped, and a row's value accrues only alongside an accepted
/// nonnegative weight). The second classifies each client's total into the
/// first matching range, in declared order, and folds the client rollup
/// into that bucket.
///
/// Every declared range appears in the output, empty or not, so the
/// presentation table stays shape-stable.
pub fn aggregate_by_weight_range<'a>(
    rows: impl IntoIterator<Item = &'a TransactionRow>,
    ranges: &[WeightRange],
) -> Vec<(String, Bucket)> {
    let mut per_client: HashMap<String, ClientRollup> = HashMap::new();
    for row in rows {
        if row.client_key.is_empty() {
            continue;
        }
        let rollup = per_client.entry(row.client_key.clone()).or_default();
        if row.weight >= 0.0 {
            rollup.weight += row.weight;
            if row.value >= 0.0 {
                rollup.value += row.value;
            }
        }
        if row.counts_as_vehicle {
            rollup.plates.push(row.plate_key.clone());
        }
    }

    let mut buckets: Vec<(String, Bucket)> = ranges
        .iter()
        .map(|r| (r.label.clone(), Bucket::default()))
        .collect();

    for (client, rollup) in per_client {
        let Some(idx) = ranges.iter().position(|r| r.contains(rollup.weight)) else {
            continue;
        };
        let bucket = &mut buckets[idx].1;
        bucket.clients.insert(client);
        bucket.vehicles.extend(rollup.plates);
        bucket.sum_weight += rollup.weight;
        bucket.sum_value += rollup.value;
    }

    buckets
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_weight_ranges;
    use std::collections::HashSet;

    fn row(center: &str, plate: &str, client: &str, weight: f64, value: f64) -> TransactionRow {
        TransactionRow {
            center: center.to_string(),
            client_key: client.to_string(),
            plate_key: plate.to_string(),
            channel: "RETAIL".to_string(),
            weight,
            value,
            counts_as_vehicle: !plate.is_empty() && plate != "RES-CLI",
            latitude: None,
            longitude: None,
        }
    }

    #[test]
    fn test_totals_distinct_counts_are_set_cardinalities() {
        let rows = vec![
            row("C1", "PLT-1", "CLI-A", 10.0, 100.0),
            row("C1", "PLT-1", "CLI-A", 5.0, 50.0),
            row("C1", "PLT-2", "CLI-A", 1.0, 10.0),
        ];
        let t = totals(&rows);
        assert_eq!(t.clients, 1);
        assert_eq!(t.vehicles, 2);
        assert_eq!(t.sum_weight, 16.0);
        assert_eq!(t.sum_value, 160.0);
    }

    #[test]
    fn test_non_vehicle_rows_sum_but_do_not_count() {
        let rows = vec![
            row("C1", "RES-CLI", "CLI-A", 10.0, 100.0),
            row("C1", "PLT-1", "CLI-B", 5.0, 50.0),
        ];
        let t = totals(&rows);
        assert_eq!(t.vehicles, 1);
        assert_eq!(t.sum_weight, 15.0);
    }

    #[test]
    fn test_empty_client_key_contributes_sums_only() {
        let rows = vec![row("C1", "PLT-1", "", 10.0, 100.0)];
        let t = totals(&rows);
        assert_eq!(t.clients, 0);
        assert_eq!(t.vehicles, 1);
        assert_eq!(t.sum_weight, 10.0);
    }

    #[test]
    fn test_aggregate_by_center() {
        let rows = vec![
            row("C1", "PLT-1", "CLI-A", 10.0, 100.0),
            row("C2", "PLT-2", "CLI-B", 5.0, 50.0),
            row("C1", "PLT-3", "CLI-C", 1.0, 10.0),
        ];
        let buckets = aggregate_by(&rows, |r| r.center.clone());
        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets["C1"].clients.len(), 2);
        assert_eq!(buckets["C1"].sum_weight, 11.0);
        assert_eq!(buckets["C2"].sum_value, 50.0);
    }

    #[test]
    fn test_bucket_sums_match_direct_totals() {
        let rows = vec![
            row("C1", "PLT-1", "CLI-A", 10.0, 100.0),
            row("C2", "PLT-2", "CLI-B", 5.0, 50.0),
            row("C1", "RES-CLI", "CLI-A", 2.0, 20.0),
        ];
        let direct = totals(&rows);
        let buckets = aggregate_by(&rows, |r| r.center.clone());

        let weight: f64 = buckets.values().map(|b| b.sum_weight).sum();
        let value: f64 = buckets.values().map(|b| b.sum_value).sum();
        assert_eq!(weight, direct.sum_weight);
        assert_eq!(value, direct.sum_value);

        let client_union: HashSet<_> = buckets.values().flat_map(|b| b.clients.iter()).collect();
        assert_eq!(client_union.len(), direct.clients);
        let vehicle_union: HashSet<_> = buckets.values().flat_map(|b| b.vehicles.iter()).collect();
        assert_eq!(vehicle_union.len(), direct.vehicles);
    }

    #[test]
    fn test_weight_range_uses_per_client_total() {
        // CLI-A totals 12 across two rows of 6: lands in 10–20, not 5–10
        let rows = vec![
            row("C1", "PLT-1", "CLI-A", 6.0, 10.0),
            row("C1", "PLT-2", "CLI-A", 6.0, 10.0),
        ];
        let buckets = aggregate_by_weight_range(&rows, &default_weight_ranges());
        let by_label: HashMap<_, _> = buckets.iter().map(|(l, b)| (l.as_str(), b)).collect();
        assert_eq!(by_label["10–20"].clients.len(), 1);
        assert_eq!(by_label["10–20"].vehicles.len(), 2);
        assert_eq!(by_label["10–20"].sum_weight, 12.0);
        assert_eq!(by_label["5–10"].clients.len(), 0);
    }

    #[test]
    fn test_all_declared_ranges_present_even_when_empty() {
        let ranges = default_weight_ranges();
        let rows: Vec<TransactionRow> = Vec::new();
        let buckets = aggregate_by_weight_range(&rows, &ranges);
        assert_eq!(buckets.len(), ranges.len());
        assert!(buckets.iter().all(|(_, b)| b.clients.is_empty()));
        // Declared order preserved
        let labels: Vec<_> = buckets.iter().map(|(l, _)| l.as_str()).collect();
        let expected: Vec<_> = ranges.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, expected);
    }

    #[test]
    fn test_weight_range_skips_rows_without_client() {
        let rows = vec![row("C1", "PLT-1", "", 10.0, 100.0)];
        let buckets = aggregate_by_weight_range(&rows, &default_weight_ranges());
        assert!(buckets.iter().all(|(_, b)| b.clients.is_empty()));
        assert_eq!(buckets.iter().map(|(_, b)| b.sum_weight).sum::<f64>(), 0.0);
    }

    #[test]
    fn test_weight_range_skips_negative_readings() {
        let rows = vec![
            row("C1", "PLT-1", "CLI-A", -5.0, 100.0),
            row("C1", "PLT-1", "CLI-A", 2.0, 20.0),
        ];
        let buckets = aggregate_by_weight_range(&rows, &default_weight_ranges());
        let by_label: HashMap<_, _> = buckets.iter().map(|(l, b)| (l.as_str(), b)).collect();
        // Only the nonnegative reading counts: total 2.0 in 1–3, value 20
        assert_eq!(by_label["1–3"].sum_weight, 2.0);
        assert_eq!(by_label["1–3"].sum_value, 20.0);
    }

    #[test]
    fn test_each_client_lands_in_exactly_one_range() {
        let rows = vec![
            row("C1", "PLT-1", "CLI-A", 0.5, 1.0),
            row("C1", "PLT-2", "CLI-B", 500.0, 1.0),
            row("C1", "PLT-3", "CLI-C", 501.0, 1.0),
        ];
        let buckets = aggregate_by_weight_range(&rows, &default_weight_ranges());
        let appearances = |client: &str| {
            buckets
                .iter()
                .filter(|(_, b)| b.clients.contains(client))
                .count()
        };
        assert_eq!(appearances("CLI-A"), 1);
        assert_eq!(appearances("CLI-B"), 1);
        assert_eq!(appearances("CLI-C"), 1);
        let by_label: HashMap<_, _> = buckets.iter().map(|(l, b)| (l.as_str(), b)).collect();
        assert!(by_label["200–500"].clients.contains("CLI-B"));
        assert!(by_label["Orders >500"].clients.contains("CLI-C"));
    }
}
