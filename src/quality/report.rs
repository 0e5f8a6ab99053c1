//! Weighted aggregation of dimension scores into a [`QualityReport`].

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

use super::{Dimension, DimensionScore, Issue, Severity};
use crate::error::{QualityError, QualityResult};
use crate::profiling::DatasetProfile;
use crate::stats;

/// Relative weight of each dimension in the composite score.
///
/// Weights need not sum to one; the composite divides by their sum.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct QualityWeights {
    pub completeness: f64,
    pub accuracy: f64,
    pub consistency: f64,
    pub timeliness: f64,
}

impl Default for QualityWeights {
    fn default() -> Self {
        Self::equal()
    }
}

impl QualityWeights {
    /// 0.25 for every dimension.
    pub fn equal() -> Self {
        Self {
            completeness: 0.25,
            accuracy: 0.25,
            consistency: 0.25,
            timeliness: 0.25,
        }
    }

    pub fn get(&self, dimension: Dimension) -> f64 {
        match dimension {
            Dimension::Completeness => self.completeness,
            Dimension::Accuracy => self.accuracy,
            Dimension::Consistency => self.consistency,
            Dimension::Timeliness => self.timeliness,
        }
    }

    fn total(&self) -> f64 {
        Dimension::ALL.iter().map(|&d| self.get(d)).sum()
    }

    /// Reject negative or non-finite weights, weights that are all zero, and weights whose sum
    /// overflows to infinity.
    pub fn validate(&self) -> QualityResult<()> {
        for dimension in Dimension::ALL {
            let w = self.get(dimension);
            if !w.is_finite() || w < 0.0 {
                return Err(QualityError::InvalidWeights {
                    field: dimension.to_string(),
                    message: format!("weight must be a finite number >= 0, got {w}"),
                });
            }
        }
        let total = self.total();
        if total <= 0.0 {
            return Err(QualityError::InvalidWeights {
                field: "weights".to_string(),
                message: "at least one weight must be > 0".to_string(),
            });
        }
        if !total.is_finite() {
            return Err(QualityError::InvalidWeights {
                field: "weights".to_string(),
                message: "sum of weights must be finite".to_string(),
            });
        }
        Ok(())
    }

    /// `Σ w·s / Σ w` over the four dimensions, clamped to `[0, 100]`.
    pub fn composite(&self, scores: &BTreeMap<Dimension, DimensionScore>) -> QualityResult<f64> {
        self.validate()?;
        if let Some(&dimension) = Dimension::ALL.iter().find(|d| !scores.contains_key(d)) {
            return Err(QualityError::MissingDimension { dimension });
        }
        Ok(self.weighted(scores))
    }

    /// Caller guarantees validated weights and all four dimensions present.
    fn weighted(&self, scores: &BTreeMap<Dimension, DimensionScore>) -> f64 {
        let sum: f64 = scores.iter().map(|(&d, s)| self.get(d) * s.score).sum();
        stats::clamp_score(sum / self.total())
    }
}

/// Combines the four dimension scores and the profile into a report.
#[derive(Debug, Clone, Copy, Default)]
pub struct QualityAggregator {
    weights: QualityWeights,
}

impl QualityAggregator {
    /// Fails with [`QualityError::InvalidWeights`] on malformed weights.
    pub fn new(weights: QualityWeights) -> QualityResult<Self> {
        weights.validate()?;
        Ok(Self { weights })
    }

    pub fn weights(&self) -> QualityWeights {
        self.weights
    }

    /// Aggregate, stamping the report with the current time.
    pub fn aggregate<I>(&self, dimension_scores: I, profile: DatasetProfile) -> QualityResult<QualityReport>
    where
        I: IntoIterator<Item = DimensionScore>,
    {
        self.aggregate_at(dimension_scores, profile, Utc::now())
    }

    /// Aggregate with an explicit `generated_at`.
    ///
    /// If a dimension appears more than once, the last score wins. Every dimension must be
    /// present, otherwise [`QualityError::MissingDimension`] is returned.
    pub fn aggregate_at<I>(
        &self,
        dimension_scores: I,
        profile: DatasetProfile,
        generated_at: DateTime<Utc>,
    ) -> QualityResult<QualityReport>
    where
        I: IntoIterator<Item = DimensionScore>,
    {
        let dimension_scores: BTreeMap<Dimension, DimensionScore> = dimension_scores
            .into_iter()
            .map(|s| (s.dimension, s))
            .collect();
        // Validates the inputs; the value itself is recomputed on demand.
        self.weights.composite(&dimension_scores)?;

        Ok(QualityReport {
            dimension_scores,
            weights: self.weights,
            profile,
            generated_at,
        })
    }
}

/// Result of one evaluation.
///
/// The composite score is not stored: [`QualityReport::composite_score`] recomputes it from the
/// dimension scores and weights every time.
#[derive(Debug, Clone, PartialEq)]
pub struct QualityReport {
    dimension_scores: BTreeMap<Dimension, DimensionScore>,
    weights: QualityWeights,
    profile: DatasetProfile,
    generated_at: DateTime<Utc>,
}

impl QualityReport {
    pub fn dimension_scores(&self) -> &BTreeMap<Dimension, DimensionScore> {
        &self.dimension_scores
    }

    pub fn dimension(&self, dimension: Dimension) -> &DimensionScore {
        // Every dimension is present by construction.
        &self.dimension_scores[&dimension]
    }

    pub fn score(&self, dimension: Dimension) -> f64 {
        self.dimension(dimension).score
    }

    pub fn composite_score(&self) -> f64 {
        self.weights.weighted(&self.dimension_scores)
    }

    pub fn weights(&self) -> QualityWeights {
        self.weights
    }

    pub fn profile(&self) -> &DatasetProfile {
        &self.profile
    }

    pub fn generated_at(&self) -> DateTime<Utc> {
        self.generated_at
    }

    /// All issues, grouped by dimension in [`Dimension::ALL`] order.
    pub fn issues(&self) -> impl Iterator<Item = &Issue> {
        self.dimension_scores.values().flat_map(|s| s.issues.iter())
    }

    /// Issues an alerting collaborator should see at the given threshold.
    pub fn issues_at_or_above(&self, severity: Severity) -> Vec<&Issue> {
        self.issues().filter(|i| i.severity >= severity).collect()
    }

    /// Whether the composite score meets `threshold`.
    pub fn passes(&self, threshold: f64) -> bool {
        self.composite_score() >= threshold
    }

    pub fn to_json_pretty(&self) -> QualityResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl Serialize for QualityReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("QualityReport", 5)?;
        s.serialize_field("generated_at", &self.generated_at)?;
        s.serialize_field("composite_score", &self.composite_score())?;
        s.serialize_field("weights", &self.weights)?;
        s.serialize_field("dimension_scores", &self.dimension_scores)?;
        s.serialize_field("profile", &self.profile)?;
        s.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quality::IssueKind;
    use chrono::TimeZone;

    fn scores(values: [f64; 4]) -> Vec<DimensionScore> {
        Dimension::ALL
            .iter()
            .zip(values)
            .map(|(&d, s)| DimensionScore::new(d, s, Vec::new()))
            .collect()
    }

    fn aggregate(values: [f64; 4], weights: QualityWeights) -> QualityResult<QualityReport> {
        QualityAggregator::new(weights)?.aggregate(scores(values), DatasetProfile::default())
    }

    #[test]
    fn equal_weights_all_perfect_is_100() {
        let report = aggregate([100.0; 4], QualityWeights::default()).unwrap();
        assert_eq!(report.composite_score(), 100.0);
    }

    #[test]
    fn equal_weights_one_zero_is_75() {
        let report = aggregate([0.0, 100.0, 100.0, 100.0], QualityWeights::default()).unwrap();
        assert!((report.composite_score() - 75.0).abs() < 1e-9);
    }

    #[test]
    fn custom_weights_need_not_sum_to_one() {
        let weights = QualityWeights {
            completeness: 2.0,
            accuracy: 1.0,
            consistency: 1.0,
            timeliness: 0.0,
        };
        let report = aggregate([50.0, 100.0, 100.0, 0.0], weights).unwrap();
        assert!((report.composite_score() - 75.0).abs() < 1e-9);
    }

    #[test]
    fn all_zero_weights_is_an_error() {
        let zero = QualityWeights {
            completeness: 0.0,
            accuracy: 0.0,
            consistency: 0.0,
            timeliness: 0.0,
        };
        let err = QualityAggregator::new(zero).unwrap_err();
        assert!(matches!(err, QualityError::InvalidWeights { ref field, .. } if field == "weights"));
    }

    #[test]
    fn overflowing_weight_sum_is_an_error() {
        let huge = QualityWeights {
            completeness: f64::MAX,
            accuracy: f64::MAX,
            consistency: f64::MAX,
            timeliness: f64::MAX,
        };
        let err = QualityAggregator::new(huge).unwrap_err();
        assert!(matches!(err, QualityError::InvalidWeights { ref field, .. } if field == "weights"));
    }

    #[test]
    fn negative_weight_names_the_dimension() {
        let weights = QualityWeights {
            accuracy: -0.5,
            ..QualityWeights::default()
        };
        let err = QualityAggregator::new(weights).unwrap_err();
        assert!(matches!(err, QualityError::InvalidWeights { ref field, .. } if field == "accuracy"));
    }

    #[test]
    fn missing_dimension_is_an_error() {
        let mut partial = scores([100.0; 4]);
        partial.pop();
        let err = QualityAggregator::default()
            .aggregate(partial, DatasetProfile::default())
            .unwrap_err();
        assert!(matches!(err, QualityError::MissingDimension { dimension: Dimension::Timeliness }));
    }

    #[test]
    fn severity_filter_for_alerting() {
        let issue = |sev| Issue::new(Dimension::Accuracy, "price", IssueKind::Outlier, vec![1], sev);
        let mut input = scores([100.0; 4]);
        input[1].issues = vec![issue(Severity::Info), issue(Severity::Warning), issue(Severity::Critical)];
        let report = QualityAggregator::default()
            .aggregate(input, DatasetProfile::default())
            .unwrap();

        assert_eq!(report.issues_at_or_above(Severity::Warning).len(), 2);
        assert_eq!(report.issues_at_or_above(Severity::Critical).len(), 1);
        assert!(report.passes(100.0));
    }

    #[test]
    fn serialized_report_carries_derived_composite() {
        let at = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let report = QualityAggregator::default()
            .aggregate_at(scores([0.0, 100.0, 100.0, 100.0]), DatasetProfile::default(), at)
            .unwrap();
        let json: serde_json::Value = serde_json::from_str(&report.to_json_pretty().unwrap()).unwrap();
        assert_eq!(json["composite_score"], serde_json::json!(75.0));
        assert_eq!(json["dimension_scores"]["completeness"]["score"], serde_json::json!(0.0));
        assert_eq!(json["generated_at"], serde_json::json!("2024-06-01T00:00:00Z"));
    }
}
