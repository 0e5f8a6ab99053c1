//! Ingestion adapters that build a [`crate::types::Dataset`] from files.
//!
//! Most callers should use [`ingest_from_path`] (from [`unified`]) which:
//!
//! - auto-detects format by file extension (or you can override via [`IngestionOptions`])
//! - reads the file into an in-memory, column-major [`crate::types::Dataset`]
//! - optionally reports per-column missing and type-drift counts to an [`IngestionObserver`]
//!
//! Parsing is lenient: a cell that does not parse as its declared dtype is kept as a
//! [`Value::String`] so the accuracy analyzer can report it, instead of failing the whole load.
//! Empty cells, JSON `null` and NaN tokens in numeric columns become [`Value::Missing`].
//!
//! Format-specific functions are also available under:
//! - [`csv`]
//! - [`json`]

pub mod csv;
pub mod json;
pub mod observability;
pub mod unified;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::error::QualityResult;
use crate::types::{Column, DataType, Dataset, Schema, Value};

pub use observability::{ColumnIngestStats, IngestionContext, IngestionObserver, IngestionStats, TracingObserver};
pub use unified::{IngestionFormat, IngestionOptions, ingest_from_path};

/// Parse a raw text cell according to its declared dtype.
pub(crate) fn parse_cell(data_type: DataType, raw: &str) -> Value {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Value::Missing;
    }
    if data_type.is_numeric() && is_nan_token(trimmed) {
        return Value::Missing;
    }

    let parsed = match data_type {
        DataType::String | DataType::Categorical => None,
        DataType::Integer => trimmed.parse::<i64>().ok().map(Value::Integer),
        DataType::Float => trimmed.parse::<f64>().ok().map(float_cell),
        DataType::Boolean => parse_bool(trimmed).map(Value::Boolean),
        DataType::Datetime => parse_datetime(trimmed).map(Value::Datetime),
    };
    parsed.unwrap_or_else(|| Value::String(trimmed.to_owned()))
}

fn is_nan_token(s: &str) -> bool {
    s.eq_ignore_ascii_case("nan") || s == "NA"
}

/// A parsed NaN (for example from `-nan`) is missing.
fn float_cell(v: f64) -> Value {
    if v.is_nan() { Value::Missing } else { Value::Float(v) }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.to_ascii_lowercase().as_str() {
        "true" | "t" | "1" | "yes" | "y" => Some(true),
        "false" | "f" | "0" | "no" | "n" => Some(false),
        _ => None,
    }
}

/// RFC 3339, `YYYY-MM-DD HH:MM:SS[.f]` (UTC) or `YYYY-MM-DD` (midnight UTC).
pub(crate) fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(t) = DateTime::parse_from_rfc3339(s) {
        return Some(t.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(t) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(t.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|t| t.and_utc())
}

/// Row-by-row builder for a column-major [`Dataset`].
pub(crate) struct ColumnBuilder<'a> {
    schema: &'a Schema,
    columns: Vec<Vec<Value>>,
}

impl<'a> ColumnBuilder<'a> {
    pub(crate) fn new(schema: &'a Schema) -> Self {
        Self {
            schema,
            columns: vec![Vec::new(); schema.fields.len()],
        }
    }

    /// Append one row; `row` must have one value per schema field.
    pub(crate) fn push_row(&mut self, row: impl IntoIterator<Item = Value>) {
        for (column, value) in self.columns.iter_mut().zip(row) {
            column.push(value);
        }
    }

    pub(crate) fn finish(self) -> QualityResult<Dataset> {
        let columns = self
            .schema
            .fields
            .iter()
            .zip(self.columns)
            .map(|(field, values)| Column::new(field.name.clone(), field.data_type, values))
            .collect();
        Dataset::new(columns)
    }
}
