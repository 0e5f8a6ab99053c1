//! Descriptive column statistics, independent of scoring.
//!
//! The profiler never fails: malformed or missing values are excluded from aggregates and a
//! column with nothing to aggregate gets [`ColumnStats::Empty`].
//!
//! ```rust
//! use data_quality_monitor::profiling::{ColumnStats, Profiler};
//! use data_quality_monitor::types::{Column, DataType, Dataset, Value};
//!
//! let ds = Dataset::new(vec![Column::new(
//!     "price",
//!     DataType::Float,
//!     vec![Value::Float(1.0), Value::Missing, Value::Float(3.0)],
//! )])
//! .unwrap();
//!
//! let profile = Profiler::new().profile(&ds);
//! let price = profile.get("price").unwrap();
//! assert_eq!(price.missing, 1);
//! match &price.stats {
//!     ColumnStats::Numeric(s) => assert_eq!(s.mean, 2.0),
//!     other => panic!("unexpected {other:?}"),
//! }
//! ```

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::stats::{self, Moments};
use crate::types::{Column, DataType, Dataset, Value};

/// Dtype inferred from the runtime tags of a column's non-missing values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObservedType {
    Integer,
    /// Floats, or a mix of integers and floats.
    Float,
    String,
    Boolean,
    Datetime,
    /// More than one incompatible tag.
    Mixed,
    /// Only missing values.
    Empty,
}

impl ObservedType {
    /// Whether the observed type silently disagrees with the declared one.
    pub fn drifts_from(self, declared: DataType) -> bool {
        match (declared, self) {
            (_, Self::Empty) => false,
            (DataType::Integer, Self::Integer) => false,
            (DataType::Float, Self::Float | Self::Integer) => false,
            (DataType::String | DataType::Categorical, Self::String) => false,
            (DataType::Boolean, Self::Boolean) => false,
            (DataType::Datetime, Self::Datetime) => false,
            _ => true,
        }
    }
}

/// Count, mean, standard deviation and five-number summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericSummary {
    /// Finite values summarized; infinities are left to the accuracy checks.
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation; `None` with fewer than two values.
    pub std: Option<f64>,
    pub min: f64,
    pub q25: f64,
    pub median: f64,
    pub q75: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrequencyEntry {
    pub value: String,
    pub count: usize,
}

/// Distinct count plus value frequencies, most frequent first, ties in first-seen order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrequencySummary {
    pub distinct: usize,
    pub frequencies: Vec<FrequencyEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemporalSummary {
    pub count: usize,
    pub earliest: DateTime<Utc>,
    pub latest: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ColumnStats {
    Numeric(NumericSummary),
    Categorical(FrequencySummary),
    Temporal(TemporalSummary),
    /// Nothing to aggregate.
    Empty,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnProfile {
    pub name: String,
    pub declared_dtype: DataType,
    pub observed_dtype: ObservedType,
    pub rows: usize,
    pub missing: usize,
    pub stats: ColumnStats,
}

impl ColumnProfile {
    pub fn has_type_drift(&self) -> bool {
        self.observed_dtype.drifts_from(self.declared_dtype)
    }
}

/// Profiles keyed by column name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatasetProfile {
    pub row_count: usize,
    pub columns: BTreeMap<String, ColumnProfile>,
}

impl DatasetProfile {
    pub fn get(&self, column: &str) -> Option<&ColumnProfile> {
        self.columns.get(column)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Columns whose observed dtype disagrees with the declared one.
    pub fn drifted_columns(&self) -> impl Iterator<Item = &ColumnProfile> {
        self.columns.values().filter(|c| c.has_type_drift())
    }
}

/// Produces a [`DatasetProfile`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Profiler {
    top_values: Option<usize>,
}

impl Profiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep only the `k` most frequent values in frequency tables. Distinct counts are unaffected.
    pub fn with_top_values(mut self, k: usize) -> Self {
        self.top_values = Some(k);
        self
    }

    pub fn profile(&self, dataset: &Dataset) -> DatasetProfile {
        let columns = dataset
            .columns()
            .iter()
            .map(|c| (c.name().to_string(), self.profile_column(c)))
            .collect();
        DatasetProfile {
            row_count: dataset.row_count(),
            columns,
        }
    }

    fn profile_column(&self, column: &Column) -> ColumnProfile {
        let stats = match column.dtype() {
            DataType::Integer | DataType::Float => numeric_stats(column),
            DataType::Datetime => temporal_stats(column),
            DataType::String | DataType::Categorical | DataType::Boolean => self.frequency_stats(column),
        };
        ColumnProfile {
            name: column.name().to_string(),
            declared_dtype: column.dtype(),
            observed_dtype: observe(column.values()),
            rows: column.len(),
            missing: column.values().iter().filter(|v| v.is_missing()).count(),
            stats,
        }
    }

    fn frequency_stats(&self, column: &Column) -> ColumnStats {
        // value -> (count, first row seen)
        let mut counts: HashMap<String, (usize, usize)> = HashMap::new();
        for (i, v) in column.values().iter().enumerate() {
            if v.is_missing() {
                continue;
            }
            counts.entry(v.to_string()).or_insert((0, i)).0 += 1;
        }
        if counts.is_empty() {
            return ColumnStats::Empty;
        }

        let distinct = counts.len();
        let mut entries: Vec<(String, usize, usize)> =
            counts.into_iter().map(|(value, (count, first))| (value, count, first)).collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));
        if let Some(k) = self.top_values {
            entries.truncate(k);
        }

        ColumnStats::Categorical(FrequencySummary {
            distinct,
            frequencies: entries
                .into_iter()
                .map(|(value, count, _)| FrequencyEntry { value, count })
                .collect(),
        })
    }
}

fn numeric_stats(column: &Column) -> ColumnStats {
    let values: Vec<f64> = column.finite_values().into_iter().map(|(_, x)| x).collect();
    let moments = Moments::from_values(values.iter().copied());
    let sorted = stats::sorted(values);
    let q = |p| stats::quantile(&sorted, p);

    match (moments.mean(), q(0.0), q(0.25), q(0.5), q(0.75), q(1.0)) {
        (Some(mean), Some(min), Some(q25), Some(median), Some(q75), Some(max)) => {
            ColumnStats::Numeric(NumericSummary {
                count: sorted.len(),
                mean,
                std: moments.sample_std(),
                min,
                q25,
                median,
                q75,
                max,
            })
        }
        _ => ColumnStats::Empty,
    }
}

fn temporal_stats(column: &Column) -> ColumnStats {
    let values = column.datetime_values();
    let earliest = values.iter().map(|&(_, t)| t).min();
    let latest = values.iter().map(|&(_, t)| t).max();
    match (earliest, latest) {
        (Some(earliest), Some(latest)) => ColumnStats::Temporal(TemporalSummary {
            count: values.len(),
            earliest,
            latest,
        }),
        _ => ColumnStats::Empty,
    }
}

fn observe(values: &[Value]) -> ObservedType {
    let mut observed = ObservedType::Empty;
    for v in values {
        let tag = match v {
            v if v.is_missing() => continue,
            Value::Missing => continue,
            Value::Integer(_) => ObservedType::Integer,
            Value::Float(_) => ObservedType::Float,
            Value::String(_) => ObservedType::String,
            Value::Boolean(_) => ObservedType::Boolean,
            Value::Datetime(_) => ObservedType::Datetime,
        };
        observed = match (observed, tag) {
            (ObservedType::Empty, t) => t,
            (a, b) if a == b => a,
            (ObservedType::Integer, ObservedType::Float) | (ObservedType::Float, ObservedType::Integer) => {
                ObservedType::Float
            }
            _ => return ObservedType::Mixed,
        };
    }
    observed
}
