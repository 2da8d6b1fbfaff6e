//! The loaded dataset: normalized transaction rows joined against the
//! channel catalog, plus the global (unfiltered) baseline totals.
//!
//! Built once per load and immutable afterwards; every aggregation call
//! reads it and allocates fresh result structures, so filter changes are a
//! plain recompute with no shared mutable state.

use serde::Serialize;
use tracing::{debug, info};

use crate::analyzers::aggregate::totals;
use crate::analyzers::types::Totals;
use crate::catalog::ChannelCatalog;
use crate::config::{DatasetConfig, WeightRange};
use crate::normalize::{fold_header, to_key, to_number};

/// One roadmap transaction after normalization and catalog join.
#[derive(Debug, Clone, Serialize)]
pub struct TransactionRow {
    pub center: String,
    pub client_key: String,
    pub plate_key: String,
    pub channel: String,
    pub weight: f64,
    pub value: f64,
    /// Precomputed at build time: false for empty plates and for the
    /// configured non-vehicle sentinel. Such rows keep their sums but
    /// never enter a distinct-vehicle set.
    pub counts_as_vehicle: bool,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// Filter over the base row set. `None` fields match everything.
#[derive(Debug, Clone, Default)]
pub struct RowFilter {
    pub center: Option<String>,
    pub channel: Option<String>,
}

impl RowFilter {
    pub fn matches(&self, row: &TransactionRow) -> bool {
        if let Some(center) = &self.center {
            if row.center != *center {
                return false;
            }
        }
        if let Some(channel) = &self.channel {
            if row.channel != *channel {
                return false;
            }
        }
        true
    }
}

/// Resolved latitude/longitude column positions in the roadmap feed.
#[derive(Debug, Clone, Copy)]
struct GeoColumns {
    latitude: usize,
    longitude: usize,
}

/// The immutable session object produced by one load.
#[derive(Debug)]
pub struct Dataset {
    rows: Vec<TransactionRow>,
    ranges: Vec<WeightRange>,
    global: Totals,
    has_geo: bool,
}

impl Dataset {
    /// Builds the dataset from parsed roadmap rows.
    ///
    /// Applies, in order: header-row drop (per `roadmap_has_header`),
    /// excluded-plate removal (global: it affects every sum and count
    /// downstream), key normalization, numeric normalization, catalog
    /// join, and geo column resolution. The global baseline totals are
    /// computed here, over the full post-exclusion row set.
    pub fn build(
        roadmap_rows: &[Vec<String>],
        catalog: &ChannelCatalog,
        config: &DatasetConfig,
    ) -> Self {
        let geo = resolve_geo_columns(roadmap_rows, config);

        let excluded_plate = to_key(&config.excluded_plate);
        let non_vehicle_plate = to_key(&config.non_vehicle_plate);

        let data_rows = if config.roadmap_has_header && !roadmap_rows.is_empty() {
            &roadmap_rows[1..]
        } else {
            roadmap_rows
        };

        let mut rows = Vec::with_capacity(data_rows.len());
        let mut excluded = 0usize;
        for raw in data_rows {
            let cell = |idx: usize| raw.get(idx).map(String::as_str).unwrap_or("");

            let plate_key = to_key(cell(config.roadmap.plate));
            if plate_key == excluded_plate {
                excluded += 1;
                continue;
            }

            let client_key = to_key(cell(config.roadmap.client));
            let channel = catalog.channel_for(&client_key).to_string();
            let counts_as_vehicle = !plate_key.is_empty() && plate_key != non_vehicle_plate;

            let (latitude, longitude) = match geo {
                Some(g) => (
                    Some(to_number(Some(cell(g.latitude)))),
                    Some(to_number(Some(cell(g.longitude)))),
                ),
                None => (None, None),
            };

            rows.push(TransactionRow {
                center: cell(config.roadmap.center).trim().to_string(),
                client_key,
                plate_key,
                channel,
                weight: to_number(Some(cell(config.roadmap.weight))),
                value: to_number(Some(cell(config.roadmap.value))),
                counts_as_vehicle,
                latitude,
                longitude,
            });
        }

        if excluded > 0 {
            debug!(excluded, plate = %excluded_plate, "Dropped excluded-plate rows");
        }

        let global = totals(rows.iter());
        info!(
            rows = rows.len(),
            clients = global.clients,
            vehicles = global.vehicles,
            geo = geo.is_some(),
            "Dataset built"
        );

        Self {
            rows,
            ranges: config.weight_ranges.clone(),
            global,
            has_geo: geo.is_some(),
        }
    }

    /// Parses both raw feed payloads and builds the dataset in one step.
    pub fn from_text(roadmap_text: &str, catalog_text: &str, config: &DatasetConfig) -> Self {
        let roadmap_rows = crate::parser::parse(roadmap_text);
        let catalog_rows = crate::parser::parse(catalog_text);
        let catalog = ChannelCatalog::build(&catalog_rows, &config.catalog);
        debug!(
            roadmap_rows = roadmap_rows.len(),
            catalog_entries = catalog.len(),
            "Feeds parsed"
        );
        Self::build(&roadmap_rows, &catalog, config)
    }

    /// All base rows (post-exclusion, pre-filter).
    pub fn rows(&self) -> &[TransactionRow] {
        &self.rows
    }

    /// Rows matching a filter selection.
    pub fn select<'a>(&'a self, filter: &'a RowFilter) -> impl Iterator<Item = &'a TransactionRow> {
        self.rows.iter().filter(move |r| filter.matches(r))
    }

    /// The unfiltered baseline totals, fixed at build time.
    pub fn global_totals(&self) -> &Totals {
        &self.global
    }

    pub fn weight_ranges(&self) -> &[WeightRange] {
        &self.ranges
    }

    /// Whether latitude/longitude columns were resolved at build time.
    pub fn has_geo(&self) -> bool {
        self.has_geo
    }

    /// Distinct non-empty center labels, sorted, for selection controls.
    pub fn centers(&self) -> Vec<String> {
        let mut centers: Vec<String> = self
            .rows
            .iter()
            .map(|r| r.center.clone())
            .filter(|c| !c.is_empty())
            .collect();
        centers.sort();
        centers.dedup();
        centers
    }

    /// Distinct channel labels, sorted, for selection controls.
    pub fn channels(&self) -> Vec<String> {
        let mut channels: Vec<String> = self.rows.iter().map(|r| r.channel.clone()).collect();
        channels.sort();
        channels.dedup();
        channels
    }
}

/// Header names recognized as geo columns after [`fold_header`].
const LATITUDE_NAMES: [&str; 3] = ["lat", "latitud", "latitude"];
const LONGITUDE_NAMES: [&str; 5] = ["lon", "lng", "long", "longitud", "longitude"];

/// Explicit config indices win; otherwise the header row (when present) is
/// scanned by folded column name. Returns `None` when geo cannot be
/// resolved; callers degrade gracefully.
fn resolve_geo_columns(roadmap_rows: &[Vec<String>], config: &DatasetConfig) -> Option<GeoColumns> {
    if let (Some(latitude), Some(longitude)) =
        (config.roadmap.latitude, config.roadmap.longitude)
    {
        return Some(GeoColumns { latitude, longitude });
    }
    if !config.roadmap_has_header {
        return None;
    }
    let header = roadmap_rows.first()?;

    let find = |names: &[&str]| {
        header
            .iter()
            .position(|cell| names.contains(&fold_header(cell).as_str()))
    };
    let latitude = find(&LATITUDE_NAMES)?;
    let longitude = find(&LONGITUDE_NAMES)?;
    Some(GeoColumns { latitude, longitude })
}
