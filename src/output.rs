//! Output materialization for reports: JSON to stdout or disk, CSV tables.
//!
//! The engine's outputs are plain serde rows; everything here is a thin
//! serialization shim for whichever consumer renders them.

use anyhow::Result;
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use tracing::debug;

use crate::analyzers::types::{GeoPoint, SummaryTable};

/// Pretty-prints any report payload as JSON on stdout.
pub fn print_json(value: &impl Serialize) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value)?;
    stdout.write_all(b"\n")?;
    Ok(())
}

/// Writes a report payload as pretty JSON to a file.
pub fn write_json(path: &str, value: &impl Serialize) -> Result<()> {
    debug!(path, "Writing JSON report");
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, value)?;
    Ok(())
}

/// Writes a summary table as CSV: one header, the bucket rows in table
/// order, then the grand-total row.
pub fn write_table_csv(path: &str, table: &SummaryTable) -> Result<()> {
    debug!(path, dimension = %table.dimension, rows = table.rows.len(), "Writing table CSV");

    let mut writer = csv::WriterBuilder::new().from_path(path)?;
    for row in &table.rows {
        writer.serialize(row)?;
    }
    writer.serialize(&table.total)?;
    writer.flush()?;
    Ok(())
}

/// Writes per-client geo points as CSV.
pub fn write_points_csv(path: &str, points: &[GeoPoint]) -> Result<()> {
    debug!(path, points = points.len(), "Writing geo points CSV");

    let mut writer = csv::WriterBuilder::new().from_path(path)?;
    for point in points {
        writer.serialize(point)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::summary::by_channel;
    use crate::dataset::TransactionRow;
    use std::env;
    use std::fs;

    fn temp_path(name: &str) -> String {
        format!("{}/{}", env::temp_dir().display(), name)
    }

    fn sample_table() -> SummaryTable {
        let rows = vec![TransactionRow {
            center: "C1".to_string(),
            client_key: "CLI-A".to_string(),
            plate_key: "PLT-1".to_string(),
            channel: "RETAIL".to_string(),
            weight: 10.0,
            value: 100.0,
            counts_as_vehicle: true,
            latitude: None,
            longitude: None,
        }];
        by_channel(&rows)
    }

    #[test]
    fn test_write_table_csv_has_header_rows_and_total() {
        let path = temp_path("roadmap_rollup_test_table.csv");
        let _ = fs::remove_file(&path);

        write_table_csv(&path, &sample_table()).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        // header + 1 bucket row + total row
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("label"));
        assert!(lines[1].contains("RETAIL"));
        assert!(lines[2].contains("Total"));

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_write_points_csv() {
        let path = temp_path("roadmap_rollup_test_points.csv");
        let _ = fs::remove_file(&path);

        let points = vec![GeoPoint {
            latitude: -12.05,
            longitude: -77.04,
            weight: 15.0,
        }];
        write_points_csv(&path, &points).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.lines().count() == 2);
        assert!(content.contains("-77.04"));

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_write_json_round_trips() {
        let path = temp_path("roadmap_rollup_test_report.json");
        let _ = fs::remove_file(&path);

        write_json(&path, &sample_table()).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(value["dimension"], "channel");

        fs::remove_file(&path).unwrap();
    }
}
