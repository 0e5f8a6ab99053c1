//! JSON ingestion implementation.
//!
//! Supported inputs:
//! - A JSON array of objects: `[{"a":1}, {"a":2}]`
//! - Newline-delimited JSON (NDJSON): `{"a":1}\n{"a":2}\n`
//!
//! Nested fields are supported using dot paths in schema field names (e.g. `user.name`).
//! A field absent from a record is treated like an explicit `null`.

use std::fs;
use std::path::Path;

use super::{ColumnBuilder, parse_datetime};
use crate::error::{QualityError, QualityResult};
use crate::types::{DataType, Dataset, Schema, Value};

/// Ingest JSON into an in-memory [`Dataset`].
pub fn ingest_json_from_path(path: impl AsRef<Path>, schema: &Schema) -> QualityResult<Dataset> {
    let text = fs::read_to_string(path)?;
    ingest_json_from_str(&text, schema)
}

/// Ingest JSON from an in-memory string into a [`Dataset`].
pub fn ingest_json_from_str(input: &str, schema: &Schema) -> QualityResult<Dataset> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(QualityError::SchemaMismatch {
            message: "json input is empty".to_string(),
        });
    }

    // First try parsing as a single JSON value (array or object).
    if let Ok(v) = serde_json::from_str::<serde_json::Value>(trimmed) {
        match v {
            serde_json::Value::Array(items) => ingest_json_values(&items, schema),
            serde_json::Value::Object(_) => ingest_json_values(std::slice::from_ref(&v), schema),
            _ => Err(QualityError::SchemaMismatch {
                message: "json must be an object, an array of objects, or NDJSON".to_string(),
            }),
        }
    } else {
        // Fall back to NDJSON.
        let mut values = Vec::new();
        for (i, line) in trimmed.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let v = serde_json::from_str::<serde_json::Value>(line).map_err(|e| QualityError::ParseError {
                row: i + 1,
                column: "<record>".to_string(),
                raw: line.to_string(),
                message: format!("invalid ndjson: {e}"),
            })?;
            values.push(v);
        }
        ingest_json_values(&values, schema)
    }
}

fn ingest_json_values(values: &[serde_json::Value], schema: &Schema) -> QualityResult<Dataset> {
    let mut builder = ColumnBuilder::new(schema);

    for (idx0, v) in values.iter().enumerate() {
        let obj = v.as_object().ok_or_else(|| QualityError::SchemaMismatch {
            message: format!("row {} is not a json object", idx0 + 1),
        })?;

        builder.push_row(schema.fields.iter().map(|field| {
            get_by_dot_path(obj, &field.name)
                .map(|jv| convert_json_value(field.data_type, jv))
                .unwrap_or(Value::Missing)
        }));
    }

    builder.finish()
}

fn get_by_dot_path<'a>(
    root: &'a serde_json::Map<String, serde_json::Value>,
    path: &str,
) -> Option<&'a serde_json::Value> {
    let mut segments = path.split('.');
    let mut current = root.get(segments.next()?)?;
    for segment in segments {
        match current {
            serde_json::Value::Object(map) => current = map.get(segment)?,
            _ => return None,
        }
    }
    Some(current)
}

/// JSON scalars keep their own type; only datetime columns parse strings since JSON has no
/// timestamp type. Arrays and objects are kept as their JSON text.
fn convert_json_value(data_type: DataType, v: &serde_json::Value) -> Value {
    match v {
        serde_json::Value::Null => Value::Missing,
        serde_json::Value::Bool(b) => Value::Boolean(*b),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => Value::Integer(i),
            None => n.as_f64().map(Value::Float).unwrap_or(Value::Missing),
        },
        serde_json::Value::String(s) if data_type == DataType::Datetime => {
            parse_datetime(s.trim()).map_or_else(|| Value::String(s.clone()), Value::Datetime)
        }
        serde_json::Value::String(s) => Value::String(s.clone()),
        other => Value::String(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Field;
    use chrono::{TimeZone, Utc};

    fn schema() -> Schema {
        Schema::new(vec![
            Field::new("id", DataType::Integer),
            Field::new("user.name", DataType::String),
            Field::new("seen_at", DataType::Datetime),
        ])
    }

    #[test]
    fn reads_array_with_nested_paths() {
        let ds = ingest_json_from_str(
            r#"[{"id":1,"user":{"name":"ada"},"seen_at":"2024-01-02"},{"id":2,"user":{"name":null}}]"#,
            &schema(),
        )
        .unwrap();

        assert_eq!(ds.row_count(), 2);
        let names = ds.column("user.name").unwrap().values();
        assert_eq!(names, &[Value::String("ada".into()), Value::Missing]);
        let seen = ds.column("seen_at").unwrap().values();
        assert_eq!(seen[0], Value::Datetime(Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap()));
        assert_eq!(seen[1], Value::Missing);
    }

    #[test]
    fn reads_ndjson_and_keeps_off_type_scalars() {
        let ds = ingest_json_from_str("{\"id\":\"7\"}\n\n{\"id\":2.5}\n", &schema()).unwrap();
        let ids = ds.column("id").unwrap().values();
        assert_eq!(ids, &[Value::String("7".into()), Value::Float(2.5)]);
    }

    #[test]
    fn rejects_non_object_rows() {
        let err = ingest_json_from_str("[1, 2]", &schema()).unwrap_err();
        assert!(err.to_string().contains("row 1 is not a json object"));
    }

    #[test]
    fn reports_bad_ndjson_line() {
        let err = ingest_json_from_str("{\"id\":1}\n{oops\n", &schema()).unwrap_err();
        assert!(matches!(err, QualityError::ParseError { row: 2, .. }));
    }
}
