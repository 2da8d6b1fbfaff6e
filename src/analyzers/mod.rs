//! Aggregation engine and share annotation.
//!
//! One parameterized engine folds transaction rows into keyed buckets; the
//! summary layer turns bucket maps into ordered, percentage-annotated table
//! rows and KPI snapshots consumed by the rendering side.

pub mod aggregate;
pub mod geo;
pub mod summary;
pub mod types;
pub mod utility;
