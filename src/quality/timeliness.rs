//! Freshness and validity windows for temporal columns.

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use super::{ColumnScore, Dimension, DimensionAnalyzer, DimensionScore, Issue, IssueKind, Note, Severity};
use crate::error::QualityResult;
use crate::rules::{FreshnessRule, QualityRuleset};
use crate::stats;
use crate::types::{Column, DataType, Dataset};

/// Checks datetime columns against a reference instant and optional validity window.
///
/// The reference instant is fixed at construction so that repeated evaluations agree.
#[derive(Debug, Clone, Copy)]
pub struct TimelinessAnalyzer {
    now: DateTime<Utc>,
}

impl TimelinessAnalyzer {
    /// Analyzer that treats `now` as the present.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self { now }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    pub fn evaluate(&self, dataset: &Dataset, ruleset: &QualityRuleset) -> QualityResult<DimensionScore> {
        for (name, rule) in &ruleset.columns {
            rule.validate_freshness(name)?;
        }

        let mut issues = Vec::new();
        let mut column_scores = Vec::new();
        let mut notes = Vec::new();

        for (name, rule) in &ruleset.columns {
            let Some(freshness) = &rule.freshness else {
                continue;
            };
            let Some(column) = dataset.column(name) else {
                warn!(column = name.as_str(), "freshness rule refers to a column not in the dataset");
                continue;
            };
            if column.dtype() != DataType::Datetime {
                warn!(column = name.as_str(), dtype = %column.dtype(), "freshness rule on a non-datetime column");
                continue;
            }

            let (future, outside) = self.classify(column, freshness);
            let flagged = future.len() + outside.len();
            column_scores.push(ColumnScore {
                column: name.clone(),
                score: stats::ratio_score(flagged, dataset.row_count()),
            });
            if !future.is_empty() {
                issues.push(Issue::new(
                    Dimension::Timeliness,
                    name.as_str(),
                    IssueKind::FutureDate,
                    future,
                    Severity::Critical,
                ));
            }
            if !outside.is_empty() {
                issues.push(Issue::new(
                    Dimension::Timeliness,
                    name.as_str(),
                    IssueKind::OutsideWindow,
                    outside,
                    Severity::Warning,
                ));
            }
            if let Some(span) = observed_span(column) {
                notes.push(span);
            }
        }

        if column_scores.is_empty() {
            return Ok(DimensionScore::new(Dimension::Timeliness, 100.0, Vec::new())
                .with_notes(vec![Note::NoRulesApplied]));
        }

        let score = column_scores.iter().map(|c| c.score).sum::<f64>() / column_scores.len() as f64;
        Ok(DimensionScore::new(Dimension::Timeliness, score, issues)
            .with_column_scores(column_scores)
            .with_notes(notes))
    }

    /// Split violating rows into (future, outside window). Each row lands in at most one list.
    fn classify(&self, column: &Column, rule: &FreshnessRule) -> (Vec<usize>, Vec<usize>) {
        let mut future = Vec::new();
        let mut outside = Vec::new();
        for (i, t) in column.datetime_values() {
            if !rule.allow_future && t > self.now {
                future.push(i);
            } else if rule.not_before.is_some_and(|lo| t < lo) || rule.not_after.is_some_and(|hi| t > hi) {
                outside.push(i);
            }
        }
        (future, outside)
    }
}

impl Default for TimelinessAnalyzer {
    fn default() -> Self {
        Self::new(Utc::now())
    }
}

fn observed_span(column: &Column) -> Option<Note> {
    let values = column.datetime_values();
    let earliest = values.iter().map(|&(_, t)| t).min()?;
    let latest = values.iter().map(|&(_, t)| t).max()?;
    let span_seconds = (latest - earliest).num_seconds();
    if span_seconds == 0 {
        debug!(column = column.name(), "all timestamps identical");
    }
    Some(Note::ObservedSpan {
        column: column.name().to_string(),
        earliest,
        latest,
        span_seconds,
    })
}

impl DimensionAnalyzer for TimelinessAnalyzer {
    fn dimension(&self) -> Dimension {
        Dimension::Timeliness
    }

    fn analyze(&self, dataset: &Dataset, ruleset: &QualityRuleset) -> QualityResult<DimensionScore> {
        self.evaluate(dataset, ruleset)
    }
}
