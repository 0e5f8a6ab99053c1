//! Uniqueness, duplicate rows and categorical domain membership.

use std::collections::{BTreeSet, HashSet};

use tracing::{debug, warn};

use super::{Dimension, DimensionAnalyzer, DimensionScore, Issue, IssueKind, Severity, ROW_LEVEL};
use crate::error::QualityResult;
use crate::rules::QualityRuleset;
use crate::stats;
use crate::types::{Column, Dataset, Value};

/// Validates uniqueness constraints, exact duplicate rows and categorical domains.
///
/// Unlike accuracy, flagged rows are deduplicated: the score is
/// `100 * (1 - |rows hit by any check| / n)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsistencyAnalyzer;

impl ConsistencyAnalyzer {
    pub fn new() -> Self {
        Self
    }

    pub fn evaluate(&self, dataset: &Dataset, ruleset: &QualityRuleset) -> QualityResult<DimensionScore> {
        let mut issues = Vec::new();

        for (name, rule) in &ruleset.columns {
            let Some(column) = dataset.column(name) else {
                warn!(column = name.as_str(), "rule refers to a column not in the dataset");
                continue;
            };
            if rule.unique {
                let rows = repeated_values(column);
                if !rows.is_empty() {
                    issues.push(Issue::new(
                        Dimension::Consistency,
                        name.as_str(),
                        IssueKind::DuplicateValue,
                        rows,
                        Severity::Critical,
                    ));
                }
            }
            if let Some(allowed) = &rule.allowed_values {
                let rows = out_of_domain(column, allowed);
                if !rows.is_empty() {
                    issues.push(Issue::new(
                        Dimension::Consistency,
                        name.as_str(),
                        IssueKind::InvalidCategory,
                        rows,
                        Severity::Warning,
                    ));
                }
            }
        }

        if ruleset.detect_duplicate_rows {
            let rows = duplicate_rows(dataset);
            if !rows.is_empty() {
                issues.push(Issue::new(
                    Dimension::Consistency,
                    ROW_LEVEL,
                    IssueKind::DuplicateRow,
                    rows,
                    Severity::Warning,
                ));
            }
        }

        let flagged: BTreeSet<usize> = issues
            .iter()
            .flat_map(|i| i.affected_indices.iter().copied())
            .collect();
        debug!(flagged = flagged.len(), rows = dataset.row_count(), "consistency checks finished");

        let score = stats::ratio_score(flagged.len(), dataset.row_count());
        Ok(DimensionScore::new(Dimension::Consistency, score, issues))
    }
}

/// All but the first occurrence of each repeated non-missing value.
fn repeated_values(column: &Column) -> Vec<usize> {
    let mut seen = HashSet::new();
    column
        .values()
        .iter()
        .enumerate()
        .filter(|&(_, v)| !v.is_missing() && !seen.insert(v.key()))
        .map(|(i, _)| i)
        .collect()
}

/// Rows that exactly repeat an earlier row across every column.
fn duplicate_rows(dataset: &Dataset) -> Vec<usize> {
    let mut seen = HashSet::with_capacity(dataset.row_count());
    (0..dataset.row_count())
        .filter(|&row| !seen.insert(dataset.row_key(row)))
        .collect()
}

/// Non-missing values outside `allowed`. The empty string is always invalid.
fn out_of_domain(column: &Column, allowed: &BTreeSet<String>) -> Vec<usize> {
    column
        .values()
        .iter()
        .enumerate()
        .filter(|&(_, v)| match v {
            v if v.is_missing() => false,
            Value::String(s) => s.is_empty() || !allowed.contains(s),
            other => !allowed.contains(&other.to_string()),
        })
        .map(|(i, _)| i)
        .collect()
}

impl DimensionAnalyzer for ConsistencyAnalyzer {
    fn dimension(&self) -> Dimension {
        Dimension::Consistency
    }

    fn analyze(&self, dataset: &Dataset, ruleset: &QualityRuleset) -> QualityResult<DimensionScore> {
        self.evaluate(dataset, ruleset)
    }
}
