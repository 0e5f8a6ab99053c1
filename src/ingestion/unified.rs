//! Unified ingestion entrypoint.
//!
//! Most callers should use [`ingest_from_path`], which ingests a file into an in-memory
//! [`crate::types::Dataset`] using a provided [`crate::types::Schema`].
//!
//! - If [`IngestionOptions::format`] is `None`, the ingestion format is inferred from the file
//!   extension.
//! - If an [`super::observability::IngestionObserver`] is provided, it receives per-column
//!   missing and type-drift counts on success, or the error on failure.

use std::path::Path;
use std::sync::Arc;

use crate::error::{QualityError, QualityResult};
use crate::types::{Dataset, Schema};

use super::observability::{IngestionContext, IngestionObserver, IngestionStats};
use super::{csv, json};

/// Supported ingestion formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestionFormat {
    /// Comma-separated values.
    Csv,
    /// JSON array-of-objects or NDJSON.
    Json,
}

impl IngestionFormat {
    /// Parse an ingestion format from a file extension (case-insensitive).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "csv" => Some(Self::Csv),
            "json" | "ndjson" => Some(Self::Json),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct IngestionOptions {
    /// If `None`, auto-detect format from file extension.
    pub format: Option<IngestionFormat>,
    pub observer: Option<Arc<dyn IngestionObserver>>,
}

/// Unified ingestion entry point for path-based sources.
///
/// # Examples
///
/// ```no_run
/// use data_quality_monitor::ingestion::{ingest_from_path, IngestionOptions};
/// use data_quality_monitor::types::{DataType, Field, Schema};
///
/// # fn main() -> Result<(), data_quality_monitor::QualityError> {
/// let schema = Schema::new(vec![
///     Field::new("product_id", DataType::Integer),
///     Field::new("price", DataType::Float),
///     Field::new("last_updated", DataType::Datetime),
/// ]);
///
/// // Uses `.csv` to select CSV ingestion.
/// let ds = ingest_from_path("products.csv", &schema, &IngestionOptions::default())?;
/// println!("rows={}", ds.row_count());
/// # Ok(())
/// # }
/// ```
///
/// ## Force a format explicitly (override extension inference)
///
/// ```no_run
/// use data_quality_monitor::ingestion::{ingest_from_path, IngestionFormat, IngestionOptions};
/// use data_quality_monitor::types::{DataType, Field, Schema};
///
/// # fn main() -> Result<(), data_quality_monitor::QualityError> {
/// let schema = Schema::new(vec![Field::new("id", DataType::Integer)]);
///
/// let opts = IngestionOptions {
///     format: Some(IngestionFormat::Json),
///     ..Default::default()
/// };
///
/// let ds = ingest_from_path("export_without_extension", &schema, &opts)?;
/// println!("rows={}", ds.row_count());
/// # Ok(())
/// # }
/// ```
pub fn ingest_from_path(path: impl AsRef<Path>, schema: &Schema, options: &IngestionOptions) -> QualityResult<Dataset> {
    let path = path.as_ref();
    let fmt = match options.format {
        Some(f) => f,
        None => infer_format_from_path(path)?,
    };

    let ctx = IngestionContext {
        path: path.to_path_buf(),
        format: fmt,
    };

    let result = match fmt {
        IngestionFormat::Csv => csv::ingest_csv_from_path(path, schema),
        IngestionFormat::Json => json::ingest_json_from_path(path, schema),
    };

    if let Some(obs) = options.observer.as_ref() {
        match &result {
            Ok(ds) => obs.on_success(&ctx, &IngestionStats::of(ds)),
            Err(e) => obs.on_failure(&ctx, e),
        }
    }

    result
}

fn infer_format_from_path(path: &Path) -> QualityResult<IngestionFormat> {
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .ok_or_else(|| QualityError::SchemaMismatch {
            message: format!("cannot infer format: path has no extension ({})", path.display()),
        })?;

    IngestionFormat::from_extension(ext).ok_or_else(|| QualityError::SchemaMismatch {
        message: format!("cannot infer format from extension '{ext}' for path ({})", path.display()),
    })
}
