//! CSV ingestion implementation.

use std::path::Path;

use super::{ColumnBuilder, parse_cell};
use crate::error::{QualityError, QualityResult};
use crate::types::{Dataset, Schema};

/// Ingest a CSV file into an in-memory [`Dataset`].
///
/// Rules:
///
/// - CSV must have headers.
/// - Headers must contain all schema fields (order can differ, extra columns are ignored).
/// - Each cell is parsed according to the schema field type; cells that do not parse are kept as
///   strings rather than rejected.
pub fn ingest_csv_from_path(path: impl AsRef<Path>, schema: &Schema) -> QualityResult<Dataset> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)?;
    ingest_csv_from_reader(&mut rdr, schema)
}

/// Ingest CSV data from an existing CSV reader.
pub fn ingest_csv_from_reader<R: std::io::Read>(rdr: &mut csv::Reader<R>, schema: &Schema) -> QualityResult<Dataset> {
    let headers = rdr.headers()?.clone();

    // Map schema fields -> CSV column indexes (allows re-ordered CSV columns).
    let mut col_idxs = Vec::with_capacity(schema.fields.len());
    for field in &schema.fields {
        match headers.iter().position(|h| h.trim() == field.name) {
            Some(idx) => col_idxs.push(idx),
            None => {
                return Err(QualityError::SchemaMismatch {
                    message: format!(
                        "missing required column '{field}'. headers={:?}",
                        headers.iter().collect::<Vec<_>>(),
                        field = field.name
                    ),
                });
            }
        }
    }

    let mut builder = ColumnBuilder::new(schema);
    for result in rdr.records() {
        let record = result?;
        builder.push_row(
            schema
                .fields
                .iter()
                .zip(col_idxs.iter())
                .map(|(field, &csv_idx)| parse_cell(field.data_type, record.get(csv_idx).unwrap_or(""))),
        );
    }

    builder.finish()
}
