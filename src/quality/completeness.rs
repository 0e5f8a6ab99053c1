//! Null/missing coverage.

use tracing::debug;

use super::{ColumnScore, Dimension, DimensionAnalyzer, DimensionScore, Issue, IssueKind, Severity};
use crate::error::QualityResult;
use crate::rules::QualityRuleset;
use crate::types::Dataset;

/// Measures how much of each column is present.
///
/// Every column counts equally towards the dimension score, whatever its semantic importance.
/// An empty dataset is vacuously complete: score 100, no issues.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompletenessAnalyzer;

impl CompletenessAnalyzer {
    pub fn new() -> Self {
        Self
    }

    pub fn evaluate(&self, dataset: &Dataset) -> DimensionScore {
        let n = dataset.row_count();
        if n == 0 || dataset.column_count() == 0 {
            return DimensionScore::new(Dimension::Completeness, 100.0, Vec::new());
        }

        let mut issues = Vec::new();
        let mut column_scores = Vec::with_capacity(dataset.column_count());

        for column in dataset.columns() {
            let missing = column.missing_indices();
            let null_ratio = missing.len() as f64 / n as f64;
            column_scores.push(ColumnScore {
                column: column.name().to_string(),
                score: (1.0 - null_ratio) * 100.0,
            });

            if !missing.is_empty() {
                debug!(column = column.name(), null_ratio, "missing values found");
                issues.push(Issue::new(
                    Dimension::Completeness,
                    column.name(),
                    IssueKind::NullValue,
                    missing,
                    severity_for_ratio(null_ratio),
                ));
            }
        }

        let score = column_scores.iter().map(|c| c.score).sum::<f64>() / column_scores.len() as f64;
        DimensionScore::new(Dimension::Completeness, score, issues).with_column_scores(column_scores)
    }
}

fn severity_for_ratio(null_ratio: f64) -> Severity {
    if null_ratio > 0.5 {
        Severity::Critical
    } else if null_ratio > 0.1 {
        Severity::Warning
    } else {
        Severity::Info
    }
}

impl DimensionAnalyzer for CompletenessAnalyzer {
    fn dimension(&self) -> Dimension {
        Dimension::Completeness
    }

    fn analyze(&self, dataset: &Dataset, _ruleset: &QualityRuleset) -> QualityResult<DimensionScore> {
        Ok(self.evaluate(dataset))
    }
}
