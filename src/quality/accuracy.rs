//! Type conformance, numeric range/sign and outlier checks.

use tracing::{debug, warn};

use super::{Dimension, DimensionAnalyzer, DimensionScore, Issue, IssueKind, Severity};
use crate::error::QualityResult;
use crate::rules::{ColumnRule, OutlierMethod, OutlierRule, QualityRuleset};
use crate::stats::{self, Moments};
use crate::types::{Column, DataType, Dataset};

/// Validates values against declared dtypes, bounds and outlier rules.
///
/// The score is `100 * (1 - violations / checked)` summed over every check that ran. A row is
/// counted once per violated check, so a row failing two checks lowers the score twice.
#[derive(Debug, Clone, Copy, Default)]
pub struct AccuracyAnalyzer;

/// Running totals across checks.
#[derive(Debug, Default)]
struct Tally {
    checked: usize,
    violations: usize,
    issues: Vec<Issue>,
}

impl Tally {
    fn record(&mut self, checked: usize, column: &str, kind: IssueKind, rows: Vec<usize>, severity: Severity) {
        self.checked += checked;
        if rows.is_empty() {
            return;
        }
        self.violations += rows.len();
        self.issues
            .push(Issue::new(Dimension::Accuracy, column, kind, rows, severity));
    }
}

impl AccuracyAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// Run all applicable checks.
    ///
    /// Fails with [`crate::QualityError::InvalidRule`] before checking anything if a rule has a
    /// non-positive outlier threshold or inverted bounds.
    pub fn evaluate(&self, dataset: &Dataset, ruleset: &QualityRuleset) -> QualityResult<DimensionScore> {
        for (name, rule) in &ruleset.columns {
            rule.validate_accuracy(name)?;
        }

        let mut tally = Tally::default();
        for (name, rule) in &ruleset.columns {
            match dataset.column(name) {
                Some(column) => check_column(column, rule, &mut tally),
                None => warn!(column = name.as_str(), "rule refers to a column not in the dataset"),
            }
        }

        debug!(
            checked = tally.checked,
            violations = tally.violations,
            "accuracy checks finished"
        );
        let score = stats::ratio_score(tally.violations, tally.checked);
        Ok(DimensionScore::new(Dimension::Accuracy, score, tally.issues))
    }
}

fn check_column(column: &Column, rule: &ColumnRule, tally: &mut Tally) {
    if let Some(expected) = rule.dtype {
        check_type(column, expected, tally);
    }
    if rule.min.is_some() || rule.max.is_some() {
        check_range(column, rule.min, rule.max, tally);
    }
    if let Some(outlier) = &rule.outlier {
        check_outliers(column, outlier, tally);
    }
}

fn check_type(column: &Column, expected: DataType, tally: &mut Tally) {
    let mut checked = 0;
    let mut mismatched = Vec::new();
    for (i, v) in column.values().iter().enumerate() {
        if v.is_missing() {
            continue;
        }
        checked += 1;
        if !expected.accepts(v) {
            mismatched.push(i);
        }
    }
    tally.record(checked, column.name(), IssueKind::TypeMismatch, mismatched, Severity::Critical);
}

fn check_range(column: &Column, min: Option<f64>, max: Option<f64>, tally: &mut Tally) {
    let values = column.numeric_values();
    let mut negative = Vec::new();
    let mut below = Vec::new();
    let mut above = Vec::new();

    for &(i, x) in &values {
        match (min, max) {
            (Some(lo), _) if x < lo => {
                // Magnitude-only fields (lower bound >= 0) get the more specific kind.
                if x < 0.0 && lo >= 0.0 {
                    negative.push(i);
                } else {
                    below.push(i);
                }
            }
            (_, Some(hi)) if x > hi => above.push(i),
            _ => {}
        }
    }

    let name = column.name();
    tally.record(values.len(), name, IssueKind::NegativeValue, negative, Severity::Critical);
    tally.record(0, name, IssueKind::BelowBound, below, Severity::Critical);
    tally.record(0, name, IssueKind::AboveBound, above, Severity::Critical);
}

fn check_outliers(column: &Column, rule: &OutlierRule, tally: &mut Tally) {
    let values = column.numeric_values();
    let outliers = match rule.method {
        OutlierMethod::ZScore => z_score_outliers(&values, rule.threshold),
        OutlierMethod::Iqr => iqr_outliers(&values, rule.threshold),
    };
    if !outliers.is_empty() {
        debug!(column = column.name(), count = outliers.len(), method = ?rule.method, "outliers found");
    }
    tally.record(values.len(), column.name(), IssueKind::Outlier, outliers, Severity::Warning);
}

fn finite(values: &[(usize, f64)]) -> impl Iterator<Item = f64> + '_ {
    values.iter().map(|&(_, x)| x).filter(|x| x.is_finite())
}

/// Rows whose `|z|` exceeds `threshold`. Mean and std come from the finite values; an infinite
/// value is always an outlier. A constant column has no defined z-score and flags only infinities.
fn z_score_outliers(values: &[(usize, f64)], threshold: f64) -> Vec<usize> {
    let moments = Moments::from_values(finite(values));
    let fit = match (moments.mean(), moments.population_std()) {
        (Some(mean), Some(std)) if std > 0.0 => Some((mean, std)),
        _ => None,
    };
    values
        .iter()
        .filter(|&&(_, x)| match fit {
            _ if !x.is_finite() => true,
            Some((mean, std)) => ((x - mean) / std).abs() > threshold,
            None => false,
        })
        .map(|&(i, _)| i)
        .collect()
}

/// Rows outside the Tukey fences `[q1 - k*iqr, q3 + k*iqr]`, with quartiles taken over the
/// finite values. Infinite values always fall outside.
fn iqr_outliers(values: &[(usize, f64)], k: f64) -> Vec<usize> {
    let sorted = stats::sorted(finite(values));
    let (lo, hi) = match (stats::quantile(&sorted, 0.25), stats::quantile(&sorted, 0.75)) {
        (Some(q1), Some(q3)) => (q1 - k * (q3 - q1), q3 + k * (q3 - q1)),
        _ => (f64::NEG_INFINITY, f64::INFINITY),
    };
    values
        .iter()
        .filter(|&&(_, x)| !x.is_finite() || x < lo || x > hi)
        .map(|&(i, _)| i)
        .collect()
}

impl DimensionAnalyzer for AccuracyAnalyzer {
    fn dimension(&self) -> Dimension {
        Dimension::Accuracy
    }

    fn analyze(&self, dataset: &Dataset, ruleset: &QualityRuleset) -> QualityResult<DimensionScore> {
        self.evaluate(dataset, ruleset)
    }
}
