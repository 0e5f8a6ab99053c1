//! Dimension analyzers and score aggregation.
//!
//! Each analyzer is a stateless function of a [`Dataset`] and a [`QualityRuleset`] producing a
//! fresh [`DimensionScore`]. Analyzers do not depend on each other's output, so they can run in
//! any order or concurrently (see [`crate::execution::QualityEngine`]).
//!
//! - [`CompletenessAnalyzer`]: null/missing coverage (needs no rules)
//! - [`AccuracyAnalyzer`]: type conformance, bounds, outliers
//! - [`ConsistencyAnalyzer`]: uniqueness, duplicate rows, categorical domains
//! - [`TimelinessAnalyzer`]: future dates and validity windows
//! - [`QualityAggregator`]: weighted composite score and the final [`QualityReport`]
//!
//! ## Example: analyzers by hand
//!
//! ```rust
//! use chrono::{TimeZone, Utc};
//! use data_quality_monitor::profiling::Profiler;
//! use data_quality_monitor::quality::{
//!     AccuracyAnalyzer, CompletenessAnalyzer, ConsistencyAnalyzer, QualityAggregator, TimelinessAnalyzer,
//! };
//! use data_quality_monitor::rules::{ColumnRule, QualityRuleset};
//! use data_quality_monitor::types::{Column, DataType, Dataset, Value};
//!
//! # fn main() -> Result<(), data_quality_monitor::QualityError> {
//! let ds = Dataset::new(vec![Column::new(
//!     "price",
//!     DataType::Float,
//!     vec![Value::Float(10.0), Value::Float(-50.0), Value::Missing, Value::Float(12.5)],
//! )])?;
//! let rules = QualityRuleset::new().column("price", ColumnRule::new().min(0.0));
//! let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
//!
//! let scores = vec![
//!     CompletenessAnalyzer::new().evaluate(&ds),
//!     AccuracyAnalyzer::new().evaluate(&ds, &rules)?,
//!     ConsistencyAnalyzer::new().evaluate(&ds, &rules)?,
//!     TimelinessAnalyzer::new(now).evaluate(&ds, &rules)?,
//! ];
//! let report = QualityAggregator::default().aggregate_at(scores, Profiler::new().profile(&ds), now)?;
//!
//! assert!(report.composite_score() < 100.0);
//! # Ok(())
//! # }
//! ```

mod accuracy;
mod completeness;
mod consistency;
mod issue;
mod report;
mod timeliness;

use crate::error::QualityResult;
use crate::rules::QualityRuleset;
use crate::types::Dataset;

pub use accuracy::AccuracyAnalyzer;
pub use completeness::CompletenessAnalyzer;
pub use consistency::ConsistencyAnalyzer;
pub use issue::{ColumnScore, Dimension, DimensionScore, Issue, IssueKind, Note, Severity, ROW_LEVEL};
pub use report::{QualityAggregator, QualityReport, QualityWeights};
pub use timeliness::TimelinessAnalyzer;

/// Common interface over the four dimension analyzers.
pub trait DimensionAnalyzer: Send + Sync {
    /// The dimension this analyzer scores.
    fn dimension(&self) -> Dimension;

    /// Score `dataset` against `ruleset`.
    ///
    /// Errors are reserved for malformed rules; data problems become issues.
    fn analyze(&self, dataset: &Dataset, ruleset: &QualityRuleset) -> QualityResult<DimensionScore>;
}
