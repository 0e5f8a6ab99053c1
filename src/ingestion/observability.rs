use std::fmt;
use std::path::PathBuf;

use tracing::{info, warn};

use crate::error::QualityError;
use crate::types::{Column, Dataset};

use super::unified::IngestionFormat;

/// Where an ingestion attempt read from.
#[derive(Debug, Clone)]
pub struct IngestionContext {
    pub path: PathBuf,
    pub format: IngestionFormat,
}

/// What one column looked like straight after ingestion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnIngestStats {
    pub name: String,
    /// Empty cells, `null`, absent JSON keys and NaN tokens.
    pub missing: usize,
    /// Cells that did not parse as the declared dtype and were kept as they came in.
    pub drifted: usize,
}

impl ColumnIngestStats {
    fn of(column: &Column) -> Self {
        let dtype = column.dtype();
        Self {
            name: column.name().to_string(),
            missing: column.values().iter().filter(|v| v.is_missing()).count(),
            drifted: column.values().iter().filter(|v| !dtype.accepts(v)).count(),
        }
    }
}

/// Shape and per-column cell quality of a freshly ingested dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestionStats {
    pub rows: usize,
    pub columns: Vec<ColumnIngestStats>,
}

impl IngestionStats {
    pub(crate) fn of(ds: &Dataset) -> Self {
        Self {
            rows: ds.row_count(),
            columns: ds.columns().iter().map(ColumnIngestStats::of).collect(),
        }
    }

    pub fn missing_cells(&self) -> usize {
        self.columns.iter().map(|c| c.missing).sum()
    }

    pub fn drifted_cells(&self) -> usize {
        self.columns.iter().map(|c| c.drifted).sum()
    }

    /// Columns holding at least one cell that did not match its declared dtype.
    pub fn drifted_columns(&self) -> impl Iterator<Item = &ColumnIngestStats> {
        self.columns.iter().filter(|c| c.drifted > 0)
    }
}

/// Receives the outcome of [`super::ingest_from_path`].
pub trait IngestionObserver: Send + Sync + fmt::Debug {
    fn on_success(&self, _ctx: &IngestionContext, _stats: &IngestionStats) {}

    fn on_failure(&self, _ctx: &IngestionContext, _error: &QualityError) {}
}

/// Logs ingestion outcomes through `tracing`, one `warn!` per column with type drift.
#[derive(Debug, Default)]
pub struct TracingObserver;

impl IngestionObserver for TracingObserver {
    fn on_success(&self, ctx: &IngestionContext, stats: &IngestionStats) {
        info!(
            format = ?ctx.format,
            path = %ctx.path.display(),
            rows = stats.rows,
            columns = stats.columns.len(),
            missing = stats.missing_cells(),
            drifted = stats.drifted_cells(),
            "ingestion succeeded"
        );
        for column in stats.drifted_columns() {
            warn!(
                path = %ctx.path.display(),
                column = %column.name,
                drifted = column.drifted,
                "cells did not parse as the declared dtype"
            );
        }
    }

    fn on_failure(&self, ctx: &IngestionContext, error: &QualityError) {
        warn!(format = ?ctx.format, path = %ctx.path.display(), %error, "ingestion failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DataType, Value};

    #[test]
    fn stats_count_missing_and_drifted_cells_per_column() {
        let ds = Dataset::new(vec![
            Column::new(
                "stock",
                DataType::Integer,
                vec![Value::Integer(3), Value::String("abc".into()), Value::Missing],
            ),
            Column::new(
                "note",
                DataType::String,
                vec![Value::String("ok".into()), Value::Missing, Value::Missing],
            ),
        ])
        .unwrap();

        let stats = IngestionStats::of(&ds);
        assert_eq!(stats.rows, 3);
        assert_eq!(stats.missing_cells(), 3);
        assert_eq!(stats.drifted_cells(), 1);
        let drifted: Vec<&str> = stats.drifted_columns().map(|c| c.name.as_str()).collect();
        assert_eq!(drifted, vec!["stock"]);
    }
}
