//! Client-to-channel catalog index.
//!
//! Built once per load from the catalog feed and read-only afterwards.
//! Lookups are total: a client missing from the catalog lands in the
//! fallback channel rather than failing the join.

use std::collections::HashMap;

use crate::config::CatalogColumns;
use crate::normalize::to_key;

/// Channel assigned to clients the catalog doesn't know, and to catalog
/// entries with a blank channel cell.
pub const NO_CHANNEL: &str = "No Channel";

/// Lookup from normalized client key to channel label.
#[derive(Debug, Default)]
pub struct ChannelCatalog {
    entries: HashMap<String, String>,
}

impl ChannelCatalog {
    /// Builds the index from parsed catalog rows.
    ///
    /// The first row is dropped when its channel cell looks like a header
    /// ("canal" or "channel", case-insensitive); catalog exports vary on
    /// whether they carry one. Keys are normalized with [`to_key`]; empty
    /// keys are skipped; on duplicate keys the last occurrence wins.
    pub fn build(rows: &[Vec<String>], columns: &CatalogColumns) -> Self {
        let mut entries = HashMap::new();

        let mut rows = rows.iter();
        let mut first = rows.next();
        if let Some(row) = first {
            let channel_cell = row.get(columns.channel).map(String::as_str).unwrap_or("");
            let folded = channel_cell.to_lowercase();
            if folded.contains("canal") || folded.contains("channel") {
                first = None;
            }
        }

        for row in first.into_iter().chain(rows) {
            let key = to_key(row.get(columns.key).map(String::as_str).unwrap_or(""));
            if key.is_empty() {
                continue;
            }
            let channel = row
                .get(columns.channel)
                .map(|c| c.trim())
                .filter(|c| !c.is_empty())
                .unwrap_or(NO_CHANNEL);
            entries.insert(key, channel.to_string());
        }

        Self { entries }
    }

    /// Returns the channel for a normalized client key. Total: unknown
    /// clients fall back to [`NO_CHANNEL`].
    pub fn channel_for(&self, client_key: &str) -> &str {
        self.entries
            .get(client_key)
            .map(String::as_str)
            .unwrap_or(NO_CHANNEL)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
