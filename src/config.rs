//! Dataset configuration: column positions, sentinels, and the weight-range
//! ladder.
//!
//! Neither feed carries a schema, so the caller names which column holds
//! what. The defaults reproduce the production export layout; a JSON file
//! can override any of it for other exports.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Column positions (0-based) in the roadmap transaction feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoadmapColumns {
    pub center: usize,
    pub plate: usize,
    pub client: usize,
    pub weight: usize,
    pub value: usize,
    /// Explicit geo column positions. When absent, the header row (if any)
    /// is scanned for latitude/longitude column names instead.
    #[serde(default)]
    pub latitude: Option<usize>,
    #[serde(default)]
    pub longitude: Option<usize>,
}

/// Column positions (0-based) in the client catalog feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogColumns {
    pub key: usize,
    pub channel: usize,
}

/// One rung of the weight-range ladder. Bounds are checked in declared
/// order with first-match-wins, so adjacent rungs may share a boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeightRange {
    pub label: String,
    pub min: f64,
    #[serde(default)]
    pub min_exclusive: bool,
    /// `None` means unbounded above.
    #[serde(default)]
    pub max: Option<f64>,
    #[serde(default)]
    pub max_exclusive: bool,
}

impl WeightRange {
    pub fn contains(&self, weight: f64) -> bool {
        let above = if self.min_exclusive {
            weight > self.min
        } else {
            weight >= self.min
        };
        let below = match self.max {
            Some(max) if self.max_exclusive => weight < max,
            Some(max) => weight <= max,
            None => true,
        };
        above && below
    }
}

/// Full dataset configuration for one load.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetConfig {
    pub roadmap: RoadmapColumns,
    pub catalog: CatalogColumns,
    /// Whether the roadmap feed starts with a header row (dropped before
    /// aggregation). Explicit rather than sniffed: the export either has
    /// one or it doesn't, and the caller knows which.
    #[serde(default = "default_true")]
    pub roadmap_has_header: bool,
    /// Plate removed from the dataset entirely: its rows count toward
    /// nothing.
    pub excluded_plate: String,
    /// Plate whose rows keep their weight and value but never count as a
    /// vehicle.
    pub non_vehicle_plate: String,
    pub weight_ranges: Vec<WeightRange>,
}

fn default_true() -> bool {
    true
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            roadmap: RoadmapColumns {
                center: 1,
                plate: 2,
                client: 3,
                weight: 10,
                value: 11,
                latitude: None,
                longitude: None,
            },
            catalog: CatalogColumns { key: 0, channel: 21 },
            roadmap_has_header: true,
            excluded_plate: "FRT-001".to_string(),
            non_vehicle_plate: "RES-CLI".to_string(),
            weight_ranges: default_weight_ranges(),
        }
    }
}

impl DatasetConfig {
    /// Loads a configuration from a JSON file.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {path}"))?;
        let config: DatasetConfig = serde_json::from_str(&content)
            .with_context(|| format!("parsing config file {path}"))?;
        Ok(config)
    }
}

/// The production ladder: half-open rungs up to 200, a closed 200–500 rung,
/// and an open-ended tail for oversized orders.
pub fn default_weight_ranges() -> Vec<WeightRange> {
    let rung = |label: &str, min: f64, max: f64| WeightRange {
        label: label.to_string(),
        min,
        min_exclusive: false,
        max: Some(max),
        max_exclusive: true,
    };
    vec![
        rung("0–1", 0.0, 1.0),
        rung("1–3", 1.0, 3.0),
        rung("3–5", 3.0, 5.0),
        rung("5–10", 5.0, 10.0),
        rung("10–20", 10.0, 20.0),
        rung("20–50", 20.0, 50.0),
        rung("50–100", 50.0, 100.0),
        rung("100–200", 100.0, 200.0),
        WeightRange {
            label: "200–500".to_string(),
            min: 200.0,
            min_exclusive: false,
            max: Some(500.0),
            max_exclusive: false,
        },
        WeightRange {
            label: "Orders >500".to_string(),
            min: 500.0,
            min_exclusive: true,
            max: None,
            max_exclusive: false,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_ranges_cover_all_nonnegative_weights() {
        let ranges = default_weight_ranges();
        for w in [0.0, 0.5, 1.0, 2.99, 5.0, 19.9, 50.0, 199.9, 200.0, 500.0, 500.01, 9999.0] {
            let matches = ranges.iter().filter(|r| r.contains(w)).count();
            assert!(matches >= 1, "weight {w} matched no range");
        }
    }

    #[test]
    fn test_first_match_is_deterministic_on_shared_boundary() {
        let ranges = default_weight_ranges();
        // 500.0 is inside the closed 200–500 rung and outside the exclusive tail
        let first = ranges.iter().find(|r| r.contains(500.0)).unwrap();
        assert_eq!(first.label, "200–500");
        let first = ranges.iter().find(|r| r.contains(500.01)).unwrap();
        assert_eq!(first.label, "Orders >500");
    }

    #[test]
    fn test_range_bounds() {
        let ranges = default_weight_ranges();
        assert!(ranges[0].contains(0.0));
        assert!(!ranges[0].contains(1.0));
        assert!(ranges[1].contains(1.0));
    }

    #[test]
    fn test_config_round_trips_through_json() {
        let config = DatasetConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: DatasetConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.roadmap.weight, config.roadmap.weight);
        assert_eq!(back.excluded_plate, config.excluded_plate);
        assert_eq!(back.weight_ranges.len(), config.weight_ranges.len());
    }
}
