//! `data-quality-monitor` scores an in-memory tabular [`types::Dataset`] along four data-quality
//! dimensions and combines them into a single weighted report.
//!
//! The primary entrypoint is [`execution::QualityEngine`], which runs every analyzer plus the
//! statistical profiler in parallel and aggregates the results into a [`quality::QualityReport`].
//!
//! ## Dimensions
//!
//! - **Completeness**: share of non-missing cells per column
//! - **Accuracy**: dtype conformance, `min`/`max` bounds, statistical outliers (z-score or IQR)
//! - **Consistency**: unique columns, duplicate rows, categorical domains
//! - **Timeliness**: future timestamps and validity windows, relative to a fixed "now"
//!
//! Every dimension score is on a 0..=100 scale. Findings are reported as [`quality::Issue`]s with
//! a [`quality::Severity`] and the affected row indices; only structural problems (bad rules,
//! bad weights, unreadable files) surface as [`QualityError`].
//!
//! ## Rules
//!
//! Checks beyond completeness are opt-in per column through a [`rules::QualityRuleset`], which
//! can be built in code or loaded from JSON:
//!
//! ```rust
//! use data_quality_monitor::rules::QualityRuleset;
//!
//! # fn main() -> Result<(), data_quality_monitor::QualityError> {
//! let rules = QualityRuleset::from_json_str(
//!     r#"{
//!         "columns": {
//!             "price": { "dtype": "float", "min": 0.0, "outlier": { "method": "z_score", "threshold": 3.0 } },
//!             "category": { "allowed_values": ["Electronics", "Clothing", "Food"] },
//!             "product_id": { "unique": true }
//!         }
//!     }"#,
//! )?;
//! assert!(rules.rule("price").is_some());
//! # Ok(())
//! # }
//! ```
//!
//! ## Quick example: evaluate a dataset
//!
//! ```rust
//! use chrono::{TimeZone, Utc};
//! use data_quality_monitor::execution::{EngineOptions, QualityEngine};
//! use data_quality_monitor::quality::{Dimension, Severity};
//! use data_quality_monitor::rules::{ColumnRule, QualityRuleset};
//! use data_quality_monitor::types::{Column, DataType, Dataset, Value};
//!
//! # fn main() -> Result<(), data_quality_monitor::QualityError> {
//! let ds = Dataset::new(vec![
//!     Column::new("sku", DataType::String, vec![
//!         Value::String("a".into()),
//!         Value::String("b".into()),
//!         Value::String("b".into()),
//!         Value::String("c".into()),
//!     ]),
//!     Column::new("price", DataType::Float, vec![
//!         Value::Float(9.5),
//!         Value::Missing,
//!         Value::Float(12.0),
//!         Value::Float(11.0),
//!     ]),
//! ])?;
//! let rules = QualityRuleset::new()
//!     .column("sku", ColumnRule::new().unique())
//!     .column("price", ColumnRule::new().min(0.0));
//!
//! let engine = QualityEngine::new(EngineOptions {
//!     now: Some(Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()),
//!     ..Default::default()
//! })?;
//! let report = engine.evaluate(&ds, &rules)?;
//!
//! assert_eq!(report.score(Dimension::Completeness), 87.5);
//! assert_eq!(report.score(Dimension::Consistency), 75.0);
//! assert_eq!(report.issues_at_or_above(Severity::Critical).len(), 1);
//! println!("{}", report.to_json_pretty()?);
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`types`]: values, columns, datasets, and ingestion schemas
//! - [`rules`]: per-column quality rules
//! - [`quality`]: the dimension analyzers, issues, and the aggregator
//! - [`profiling`]: per-column descriptive statistics and type drift
//! - [`execution`]: parallel engine, observers, and run metrics
//! - [`ingestion`]: CSV/JSON loaders producing a [`types::Dataset`]
//! - [`error`]: the crate error type

pub mod error;
pub mod execution;
pub mod ingestion;
pub mod profiling;
pub mod quality;
pub mod rules;
mod stats;
pub mod types;

pub use error::{QualityError, QualityResult};
