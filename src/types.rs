//! Core data model types.
//!
//! A [`Dataset`] is an immutable, column-major table: an ordered list of named [`Column`]s that
//! all hold the same number of tagged [`Value`]s. Ingestion adapters describe the expected shape
//! of incoming data with a [`Schema`] (a list of typed [`Field`]s).

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{QualityError, QualityResult};

/// Logical data type declared for a column.
///
/// Serializes as the lowercase variant name; deserializes through [`FromStr`], so aliases such
/// as `"int"` or `"timestamp"` work in JSON rulesets too.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum DataType {
    /// 64-bit signed integer.
    Integer,
    /// 64-bit floating point number.
    Float,
    /// UTF-8 string.
    String,
    /// Boolean.
    Boolean,
    /// UTC timestamp.
    Datetime,
    /// String label drawn from a (usually small) domain.
    Categorical,
}

impl DataType {
    /// Whether values of this type take part in numeric checks and statistics.
    pub fn is_numeric(self) -> bool {
        matches!(self, Self::Integer | Self::Float)
    }

    /// Whether a value's runtime tag conforms to this declared type.
    ///
    /// Missing values always conform. Integers conform to `Float` when exactly representable.
    pub fn accepts(self, value: &Value) -> bool {
        match (self, value) {
            (_, v) if v.is_missing() => true,
            (Self::Integer, Value::Integer(_)) => true,
            (Self::Float, Value::Float(_)) => true,
            (Self::Float, Value::Integer(v)) => v.unsigned_abs() <= MAX_EXACT_F64_INT,
            (Self::String | Self::Categorical, Value::String(_)) => true,
            (Self::Boolean, Value::Boolean(_)) => true,
            (Self::Datetime, Value::Datetime(_)) => true,
            _ => false,
        }
    }
}

const MAX_EXACT_F64_INT: u64 = 1 << 53;

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Integer => "integer",
            Self::Float => "float",
            Self::String => "string",
            Self::Boolean => "boolean",
            Self::Datetime => "datetime",
            Self::Categorical => "categorical",
        };
        f.write_str(s)
    }
}

impl FromStr for DataType {
    type Err = QualityError;

    /// Parse a dtype tag (case-insensitive), accepting a few common aliases.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "integer" | "int" | "int64" => Ok(Self::Integer),
            "float" | "float64" | "double" => Ok(Self::Float),
            "string" | "str" | "utf8" => Ok(Self::String),
            "boolean" | "bool" => Ok(Self::Boolean),
            "datetime" | "timestamp" | "date" => Ok(Self::Datetime),
            "categorical" | "category" => Ok(Self::Categorical),
            _ => Err(QualityError::UnknownDtype { tag: s.to_string() }),
        }
    }
}

impl TryFrom<String> for DataType {
    type Error = QualityError;

    fn try_from(tag: String) -> Result<Self, Self::Error> {
        tag.parse()
    }
}

/// A single tagged cell value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Explicit missing marker.
    Missing,
    /// 64-bit signed integer.
    Integer(i64),
    /// 64-bit float.
    Float(f64),
    /// UTF-8 string (also used for categorical labels).
    String(String),
    /// Boolean.
    Boolean(bool),
    /// UTC timestamp.
    Datetime(DateTime<Utc>),
}

impl Value {
    /// [`Value::Missing`] or a NaN float. NaN carries no measurement and counts as a null.
    pub fn is_missing(&self) -> bool {
        match self {
            Self::Missing => true,
            Self::Float(v) => v.is_nan(),
            _ => false,
        }
    }

    /// Numeric view of the value. Infinities are numeric, NaN is not.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Integer(v) => Some(*v as f64),
            Self::Float(v) if !v.is_nan() => Some(*v),
            _ => None,
        }
    }

    pub fn as_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Datetime(v) => Some(*v),
            _ => None,
        }
    }

    /// Hashable identity of the value, used for duplicate detection.
    pub fn key(&self) -> ValueKey<'_> {
        match self {
            Self::Missing => ValueKey::Missing,
            Self::Float(v) if v.is_nan() => ValueKey::Missing,
            Self::Integer(v) => ValueKey::Integer(*v),
            Self::Float(v) => ValueKey::Float(canonical_bits(*v)),
            Self::String(v) => ValueKey::String(v.as_str()),
            Self::Boolean(v) => ValueKey::Boolean(*v),
            Self::Datetime(v) => ValueKey::Datetime(*v),
        }
    }
}

fn canonical_bits(v: f64) -> u64 {
    if v == 0.0 { 0.0f64.to_bits() } else { v.to_bits() }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing => Ok(()),
            Self::Integer(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::String(v) => f.write_str(v),
            Self::Boolean(v) => write!(f, "{v}"),
            Self::Datetime(v) => f.write_str(&v.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
        }
    }
}

/// Borrowed, hashable identity of a [`Value`].
///
/// Floats compare by bit pattern with `-0.0 == 0.0`. NaN maps to the missing key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKey<'a> {
    Missing,
    Integer(i64),
    Float(u64),
    String(&'a str),
    Boolean(bool),
    Datetime(DateTime<Utc>),
}

/// A named column with a declared dtype and one value per row.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    dtype: DataType,
    values: Vec<Value>,
}

impl Column {
    pub fn new(name: impl Into<String>, dtype: DataType, values: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            dtype,
            values,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared (advisory) dtype.
    pub fn dtype(&self) -> DataType {
        self.dtype
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Row positions holding a missing value (see [`Value::is_missing`]), ascending.
    pub fn missing_indices(&self) -> Vec<usize> {
        self.values
            .iter()
            .enumerate()
            .filter(|(_, v)| v.is_missing())
            .map(|(i, _)| i)
            .collect()
    }

    /// `(row, value)` pairs for every numeric cell, in row order. Includes infinities.
    pub fn numeric_values(&self) -> Vec<(usize, f64)> {
        self.values
            .iter()
            .enumerate()
            .filter_map(|(i, v)| v.as_f64().map(|x| (i, x)))
            .collect()
    }

    /// Like [`Column::numeric_values`] restricted to finite values.
    pub fn finite_values(&self) -> Vec<(usize, f64)> {
        let mut values = self.numeric_values();
        values.retain(|&(_, x)| x.is_finite());
        values
    }

    /// `(row, timestamp)` pairs for every datetime cell, in row order.
    pub fn datetime_values(&self) -> Vec<(usize, DateTime<Utc>)> {
        self.values
            .iter()
            .enumerate()
            .filter_map(|(i, v)| v.as_datetime().map(|t| (i, t)))
            .collect()
    }
}

/// Immutable column-major dataset.
///
/// Construction validates the shape: all columns have the same length and names are unique.
/// Name lookups go through an index resolved once here.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    columns: Vec<Column>,
    index: HashMap<String, usize>,
    row_count: usize,
}

impl Dataset {
    /// Create a dataset from columns.
    ///
    /// Returns [`QualityError::ColumnLengthMismatch`] if a column's length differs from the
    /// first column's, and [`QualityError::DuplicateColumn`] on repeated names.
    pub fn new(columns: Vec<Column>) -> QualityResult<Self> {
        let row_count = columns.first().map(Column::len).unwrap_or(0);
        let mut index = HashMap::with_capacity(columns.len());

        for (i, column) in columns.iter().enumerate() {
            if column.len() != row_count {
                return Err(QualityError::ColumnLengthMismatch {
                    column: column.name.clone(),
                    expected: row_count,
                    actual: column.len(),
                });
            }
            if index.insert(column.name.clone(), i).is_some() {
                return Err(QualityError::DuplicateColumn {
                    column: column.name.clone(),
                });
            }
        }

        Ok(Self {
            columns,
            index,
            row_count,
        })
    }

    /// Number of rows (`n`). Zero for a dataset without columns.
    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Columns in declaration order.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Look up a column by name.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.index.get(name).map(|&i| &self.columns[i])
    }

    /// Iterate column names in order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    /// Hashable identity of a whole row, one key per column.
    pub fn row_key(&self, row: usize) -> Vec<ValueKey<'_>> {
        self.columns.iter().map(|c| c.values[row].key()).collect()
    }
}

/// A single named, typed field in a [`Schema`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    /// Field/column name.
    pub name: String,
    /// Declared data type.
    pub data_type: DataType,
}

impl Field {
    /// Create a new field.
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }
}

/// A list of fields describing the expected shape of incoming data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    /// Ordered list of fields.
    pub fields: Vec<Field>,
}

impl Schema {
    /// Create a new schema from fields.
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    /// Build a schema from `(name, dtype tag)` pairs, rejecting unknown tags.
    pub fn from_tags<'a, I>(pairs: I) -> QualityResult<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let fields = pairs
            .into_iter()
            .map(|(name, tag)| Ok(Field::new(name, tag.parse::<DataType>()?)))
            .collect::<QualityResult<Vec<_>>>()?;
        Ok(Self::new(fields))
    }

    /// Iterate field names in order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    /// Returns the index of a field by name, if present.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }
}
