//! Assembles ordered, share-annotated summary tables and KPI snapshots
//! from engine buckets.

use chrono::Utc;

use crate::analyzers::aggregate::{aggregate_by, aggregate_by_weight_range, totals};
use crate::analyzers::types::{Bucket, KpiCard, Report, SummaryRow, SummaryTable, Totals};
use crate::analyzers::utility::{ratio, share_pct};
use crate::config::WeightRange;
use crate::dataset::{Dataset, RowFilter, TransactionRow};

/// Turns an ordered bucket list into a summary table.
///
/// The grand-total row is summed over the buckets (never recomputed from
/// rows), and every share percentage uses those summed totals as its
/// denominator, so the table's shares sum to 100% per metric.
fn summary_table(dimension: &str, buckets: Vec<(String, Bucket)>) -> SummaryTable {
    let total_clients: usize = buckets.iter().map(|(_, b)| b.clients.len()).sum();
    let total_vehicles: usize = buckets.iter().map(|(_, b)| b.vehicles.len()).sum();
    let total_weight: f64 = buckets.iter().map(|(_, b)| b.sum_weight).sum();
    let total_value: f64 = buckets.iter().map(|(_, b)| b.sum_value).sum();

    let rows = buckets
        .into_iter()
        .map(|(label, bucket)| SummaryRow {
            clients_pct: share_pct(bucket.clients.len() as f64, total_clients as f64),
            vehicles_pct: share_pct(bucket.vehicles.len() as f64, total_vehicles as f64),
            weight_pct: share_pct(bucket.sum_weight, total_weight),
            value_pct: share_pct(bucket.sum_value, total_value),
            weight_per_vehicle: bucket.weight_per_vehicle(),
            weight_per_client: bucket.weight_per_client(),
            clients_per_vehicle: bucket.clients_per_vehicle(),
            clients: bucket.clients.len(),
            vehicles: bucket.vehicles.len(),
            sum_weight: bucket.sum_weight,
            sum_value: bucket.sum_value,
            label,
        })
        .collect();

    let total = SummaryRow {
        label: "Total".to_string(),
        clients: total_clients,
        vehicles: total_vehicles,
        sum_weight: total_weight,
        sum_value: total_value,
        clients_pct: share_pct(total_clients as f64, total_clients as f64),
        vehicles_pct: share_pct(total_vehicles as f64, total_vehicles as f64),
        weight_pct: share_pct(total_weight, total_weight),
        value_pct: share_pct(total_value, total_value),
        weight_per_vehicle: ratio(total_weight, total_vehicles as f64),
        weight_per_client: ratio(total_weight, total_clients as f64),
        clients_per_vehicle: ratio(total_clients as f64, total_vehicles as f64),
    };

    SummaryTable {
        dimension: dimension.to_string(),
        generated_at: Utc::now(),
        rows,
        total,
    }
}

/// Orders sparse buckets by descending monetary value (stable on ties).
fn by_value_desc(buckets: std::collections::HashMap<String, Bucket>) -> Vec<(String, Bucket)> {
    let mut ordered: Vec<(String, Bucket)> = buckets.into_iter().collect();
    // HashMap iteration order is arbitrary; pre-sort by label so equal
    // values come out in a deterministic order.
    ordered.sort_by(|a, b| a.0.cmp(&b.0));
    ordered.sort_by(|a, b| {
        b.1.sum_value
            .partial_cmp(&a.1.sum_value)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    ordered
}

/// Channel summary for the given (already filtered) rows.
pub fn by_channel<'a>(rows: impl IntoIterator<Item = &'a TransactionRow>) -> SummaryTable {
    let buckets = aggregate_by(rows, |r| r.channel.clone());
    summary_table("channel", by_value_desc(buckets))
}

/// Center summary for the given (already filtered) rows.
pub fn by_center<'a>(rows: impl IntoIterator<Item = &'a TransactionRow>) -> SummaryTable {
    let buckets = aggregate_by(rows, |r| r.center.clone());
    summary_table("center", by_value_desc(buckets))
}

/// Weight-range summary for the given (already filtered) rows, in declared
/// range order with every range present.
pub fn by_weight_range<'a>(
    rows: impl IntoIterator<Item = &'a TransactionRow>,
    ranges: &[WeightRange],
) -> SummaryTable {
    summary_table("weight_range", aggregate_by_weight_range(rows, ranges))
}

/// KPI snapshot: the selection's totals, its share of the global
/// unfiltered baseline, and the zero-guarded ratio metrics.
pub fn kpi_card(selection: &Totals, baseline: &Totals) -> KpiCard {
    KpiCard {
        clients: selection.clients,
        vehicles: selection.vehicles,
        sum_weight: selection.sum_weight,
        sum_value: selection.sum_value,
        clients_share_pct: share_pct(selection.clients as f64, baseline.clients as f64),
        vehicles_share_pct: share_pct(selection.vehicles as f64, baseline.vehicles as f64),
        weight_share_pct: share_pct(selection.sum_weight, baseline.sum_weight),
        value_share_pct: share_pct(selection.sum_value, baseline.sum_value),
        weight_per_vehicle: ratio(selection.sum_weight, selection.vehicles as f64),
        weight_per_client: ratio(selection.sum_weight, selection.clients as f64),
        clients_per_vehicle: ratio(selection.clients as f64, selection.vehicles as f64),
    }
}

/// Builds the full report payload for one filter selection: KPI card, the
/// three dimension tables, and the selection-control value lists. One
/// synchronous recompute per call; nothing is cached between calls.
pub fn report(dataset: &Dataset, filter: &RowFilter) -> Report {
    let rows: Vec<&TransactionRow> = dataset.select(filter).collect();
    let selection = totals(rows.iter().copied());

    Report {
        generated_at: Utc::now(),
        center_filter: filter.center.clone(),
        channel_filter: filter.channel.clone(),
        kpis: kpi_card(&selection, dataset.global_totals()),
        by_channel: by_channel(rows.iter().copied()),
        by_center: by_center(rows.iter().copied()),
        by_weight_range: by_weight_range(rows.iter().copied(), dataset.weight_ranges()),
        centers: dataset.centers(),
        channels: dataset.channels(),
    }
}
