//! Column expectations checked by the analyzers.
//!
//! A [`QualityRuleset`] maps column names to [`ColumnRule`]s. Every field of a rule is optional:
//! an absent expectation means the corresponding check is skipped, never that it fails.
//!
//! Rulesets can be built in code or loaded from JSON:
//!
//! ```rust
//! use data_quality_monitor::rules::{ColumnRule, OutlierRule, QualityRuleset};
//! use data_quality_monitor::types::DataType;
//!
//! let from_code = QualityRuleset::new()
//!     .column(
//!         "price",
//!         ColumnRule::new()
//!             .dtype(DataType::Float)
//!             .min(0.0)
//!             .outlier(OutlierRule::z_score(3.0)),
//!     )
//!     .column("id", ColumnRule::new().unique());
//!
//! let from_json = QualityRuleset::from_json_str(
//!     r#"{
//!         "columns": {
//!             "price": { "dtype": "float", "min": 0.0, "outlier": { "method": "z_score", "threshold": 3.0 } },
//!             "id": { "unique": true }
//!         }
//!     }"#,
//! )
//! .unwrap();
//!
//! assert_eq!(from_code, from_json);
//! ```

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{QualityError, QualityResult};
use crate::types::DataType;

/// Expectations for a whole dataset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct QualityRuleset {
    /// Per-column expectations, keyed by column name.
    pub columns: BTreeMap<String, ColumnRule>,
    /// Flag rows that exactly repeat an earlier row.
    pub detect_duplicate_rows: bool,
}

impl QualityRuleset {
    /// An empty ruleset: no expectations, every rule-driven check is skipped.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a ruleset from JSON.
    pub fn from_json_str(input: &str) -> QualityResult<Self> {
        Ok(serde_json::from_str(input)?)
    }

    /// Add (or replace) the rule for `name`.
    pub fn column(mut self, name: impl Into<String>, rule: ColumnRule) -> Self {
        self.columns.insert(name.into(), rule);
        self
    }

    /// Enable exact duplicate-row detection.
    pub fn with_duplicate_row_check(mut self) -> Self {
        self.detect_duplicate_rows = true;
        self
    }

    pub fn rule(&self, column: &str) -> Option<&ColumnRule> {
        self.columns.get(column)
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty() && !self.detect_duplicate_rows
    }

    /// Validate every rule.
    pub fn validate(&self) -> QualityResult<()> {
        for (name, rule) in &self.columns {
            rule.validate_accuracy(name)?;
            rule.validate_freshness(name)?;
        }
        Ok(())
    }
}

/// Expectations for a single column.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ColumnRule {
    /// Expected dtype; enables the type-conformance check.
    pub dtype: Option<DataType>,
    /// Allowed categorical domain; enables the membership check.
    pub allowed_values: Option<BTreeSet<String>>,
    /// Inclusive numeric lower bound.
    pub min: Option<f64>,
    /// Inclusive numeric upper bound.
    pub max: Option<f64>,
    /// Values must not repeat.
    pub unique: bool,
    /// Outlier detection settings.
    pub outlier: Option<OutlierRule>,
    /// Freshness/validity window for datetime columns.
    pub freshness: Option<FreshnessRule>,
}

impl ColumnRule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dtype(mut self, dtype: DataType) -> Self {
        self.dtype = Some(dtype);
        self
    }

    pub fn allowed_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_values = Some(values.into_iter().map(Into::into).collect());
        self
    }

    pub fn min(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }

    pub fn max(mut self, max: f64) -> Self {
        self.max = Some(max);
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn outlier(mut self, outlier: OutlierRule) -> Self {
        self.outlier = Some(outlier);
        self
    }

    pub fn freshness(mut self, freshness: FreshnessRule) -> Self {
        self.freshness = Some(freshness);
        self
    }

    /// Check the fields used by the accuracy analyzer.
    pub fn validate_accuracy(&self, column: &str) -> QualityResult<()> {
        for (field, bound) in [("min", self.min), ("max", self.max)] {
            if bound.is_some_and(|b| !b.is_finite()) {
                return Err(invalid(column, field, "bound must be finite"));
            }
        }
        if let (Some(min), Some(max)) = (self.min, self.max) {
            if min > max {
                return Err(invalid(column, "min", format!("min {min} exceeds max {max}")));
            }
        }
        if let Some(outlier) = &self.outlier {
            if !outlier.threshold.is_finite() || outlier.threshold <= 0.0 {
                return Err(invalid(
                    column,
                    "outlier.threshold",
                    format!("threshold must be > 0, got {}", outlier.threshold),
                ));
            }
        }
        Ok(())
    }

    /// Check the fields used by the timeliness analyzer.
    pub fn validate_freshness(&self, column: &str) -> QualityResult<()> {
        if let Some(FreshnessRule {
            not_before: Some(lo),
            not_after: Some(hi),
            ..
        }) = &self.freshness
        {
            if lo > hi {
                return Err(invalid(
                    column,
                    "freshness.not_before",
                    format!("window start {lo} is after window end {hi}"),
                ));
            }
        }
        Ok(())
    }
}

fn invalid(column: &str, field: &str, message: impl Into<String>) -> QualityError {
    QualityError::InvalidRule {
        column: column.to_string(),
        field: field.to_string(),
        message: message.into(),
    }
}

/// How outliers are detected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutlierMethod {
    /// `|x - mean| / std > threshold`, population standard deviation.
    #[default]
    ZScore,
    /// Outside `[q1 - threshold * iqr, q3 + threshold * iqr]`.
    Iqr,
}

/// Outlier detection settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutlierRule {
    pub method: OutlierMethod,
    pub threshold: f64,
}

impl OutlierRule {
    pub const DEFAULT_Z_THRESHOLD: f64 = 3.0;
    pub const DEFAULT_IQR_MULTIPLIER: f64 = 1.5;

    pub fn z_score(threshold: f64) -> Self {
        Self {
            method: OutlierMethod::ZScore,
            threshold,
        }
    }

    pub fn iqr(multiplier: f64) -> Self {
        Self {
            method: OutlierMethod::Iqr,
            threshold: multiplier,
        }
    }
}

impl Default for OutlierRule {
    fn default() -> Self {
        Self::z_score(Self::DEFAULT_Z_THRESHOLD)
    }
}

/// Freshness/validity expectations for a datetime column.
///
/// The default rule only forbids future timestamps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FreshnessRule {
    /// Timestamps after the reference "now" are acceptable.
    pub allow_future: bool,
    /// Inclusive lower end of the validity window.
    pub not_before: Option<DateTime<Utc>>,
    /// Inclusive upper end of the validity window.
    pub not_after: Option<DateTime<Utc>>,
}

impl FreshnessRule {
    /// Forbid future timestamps, no window.
    pub fn no_future_dates() -> Self {
        Self::default()
    }

    pub fn allow_future(mut self) -> Self {
        self.allow_future = true;
        self
    }

    pub fn window(mut self, not_before: Option<DateTime<Utc>>, not_after: Option<DateTime<Utc>>) -> Self {
        self.not_before = not_before;
        self.not_after = not_after;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn non_positive_threshold_names_the_field() {
        let rules = QualityRuleset::new().column("price", ColumnRule::new().outlier(OutlierRule::z_score(0.0)));
        let err = rules.validate().unwrap_err();
        assert!(matches!(
            err,
            QualityError::InvalidRule { ref column, ref field, .. } if column == "price" && field == "outlier.threshold"
        ));
    }

    #[test]
    fn inverted_bounds_are_rejected() {
        let rule = ColumnRule::new().min(10.0).max(1.0);
        assert!(rule.validate_accuracy("qty").is_err());
    }

    #[test]
    fn inverted_window_is_rejected() {
        let lo = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let hi = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let rule = ColumnRule::new().freshness(FreshnessRule::no_future_dates().window(Some(lo), Some(hi)));
        let err = rule.validate_freshness("date").unwrap_err();
        assert!(err.to_string().contains("freshness.not_before"));
    }

    #[test]
    fn json_defaults_fill_absent_fields() {
        let rules = QualityRuleset::from_json_str(
            r#"{"columns": {"date": {"freshness": {}}, "score": {"outlier": {}}}}"#,
        )
        .unwrap();
        assert!(!rules.detect_duplicate_rows);
        assert_eq!(rules.rule("date").unwrap().freshness, Some(FreshnessRule::no_future_dates()));
        assert_eq!(rules.rule("score").unwrap().outlier, Some(OutlierRule::default()));
    }

    #[test]
    fn json_rejects_unknown_dtype_tag() {
        let err = QualityRuleset::from_json_str(r#"{"columns": {"x": {"dtype": "decimal"}}}"#).unwrap_err();
        assert!(matches!(err, QualityError::Json(_)));
    }

    #[test]
    fn json_dtype_accepts_aliases() {
        let rules = QualityRuleset::from_json_str(
            r#"{"columns": {"qty": {"dtype": "int"}, "seen": {"dtype": "timestamp"}, "tag": {"dtype": "Category"}}}"#,
        )
        .unwrap();
        assert_eq!(rules.rule("qty").unwrap().dtype, Some(DataType::Integer));
        assert_eq!(rules.rule("seen").unwrap().dtype, Some(DataType::Datetime));
        assert_eq!(rules.rule("tag").unwrap().dtype, Some(DataType::Categorical));
        assert_eq!(serde_json::to_string(&DataType::Integer).unwrap(), r#""integer""#);
    }

    #[test]
    fn empty_ruleset_is_empty() {
        assert!(QualityRuleset::new().is_empty());
        assert!(!QualityRuleset::new().with_duplicate_row_check().is_empty());
    }
}
