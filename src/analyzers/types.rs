//! Data types used by the aggregation pipeline.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashSet;

use crate::analyzers::utility::ratio;

/// Accumulator for one dimension value (a channel, a center, or a weight
/// range). Distinct counts are set cardinalities, not row counts.
#[derive(Debug, Default, Clone)]
pub struct Bucket {
    pub clients: HashSet<String>,
    pub vehicles: HashSet<String>,
    pub sum_weight: f64,
    pub sum_value: f64,
}

impl Bucket {
    pub fn weight_per_vehicle(&self) -> f64 {
        ratio(self.sum_weight, self.vehicles.len() as f64)
    }

    pub fn weight_per_client(&self) -> f64 {
        ratio(self.sum_weight, self.clients.len() as f64)
    }

    pub fn clients_per_vehicle(&self) -> f64 {
        ratio(self.clients.len() as f64, self.vehicles.len() as f64)
    }
}

/// Flat totals over a row set: the KPI numbers and the reference
/// denominators for baseline shares.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct Totals {
    pub clients: usize,
    pub vehicles: usize,
    pub sum_weight: f64,
    pub sum_value: f64,
}

/// One presentation row of a summary table. Share percentages are relative
/// to the table's own (filtered) totals, so the rows of one table sum to
/// 100% per metric.
#[derive(Debug, Clone, Serialize)]
pub struct SummaryRow {
    pub label: String,
    pub clients: usize,
    pub vehicles: usize,
    pub sum_weight: f64,
    pub sum_value: f64,
    pub clients_pct: f64,
    pub vehicles_pct: f64,
    pub weight_pct: f64,
    pub value_pct: f64,
    pub weight_per_vehicle: f64,
    pub weight_per_client: f64,
    pub clients_per_vehicle: f64,
}

/// An ordered summary table for one dimension plus its grand-total row.
/// The total row is summed over the bucket rows, never recomputed, so
/// bucket-sum == grand-total holds by construction.
#[derive(Debug, Serialize)]
pub struct SummaryTable {
    pub dimension: String,
    pub generated_at: DateTime<Utc>,
    pub rows: Vec<SummaryRow>,
    pub total: SummaryRow,
}

/// KPI snapshot for the current filter selection. The `*_share_pct` fields
/// are relative to the global unfiltered baseline ("how much of everything
/// is this slice"), so they do not sum to 100% across selections.
#[derive(Debug, Serialize)]
pub struct KpiCard {
    pub clients: usize,
    pub vehicles: usize,
    pub sum_weight: f64,
    pub sum_value: f64,
    pub clients_share_pct: f64,
    pub vehicles_share_pct: f64,
    pub weight_share_pct: f64,
    pub value_share_pct: f64,
    pub weight_per_vehicle: f64,
    pub weight_per_client: f64,
    pub clients_per_vehicle: f64,
}

/// One weighted heat-map point, aggregated per client.
#[derive(Debug, Clone, Serialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
    pub weight: f64,
}

/// Everything one filter selection produces, serialized as the report
/// payload for downstream rendering.
#[derive(Debug, Serialize)]
pub struct Report {
    pub generated_at: DateTime<Utc>,
    pub center_filter: Option<String>,
    pub channel_filter: Option<String>,
    pub kpis: KpiCard,
    pub by_channel: SummaryTable,
    pub by_center: SummaryTable,
    pub by_weight_range: SummaryTable,
    pub centers: Vec<String>,
    pub channels: Vec<String>,
}
