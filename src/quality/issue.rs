use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Column label used by issues that concern whole rows rather than one column.
pub const ROW_LEVEL: &str = "row-level";

/// One of the four orthogonal quality axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Completeness,
    Accuracy,
    Consistency,
    Timeliness,
}

impl Dimension {
    pub const ALL: [Dimension; 4] = [
        Self::Completeness,
        Self::Accuracy,
        Self::Consistency,
        Self::Timeliness,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Completeness => "completeness",
            Self::Accuracy => "accuracy",
            Self::Consistency => "consistency",
            Self::Timeliness => "timeliness",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Issue severity, ordered `Info < Warning < Critical`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => f.write_str("info"),
            Self::Warning => f.write_str("warning"),
            Self::Critical => f.write_str("critical"),
        }
    }
}

/// What kind of problem an [`Issue`] records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    NullValue,
    TypeMismatch,
    NegativeValue,
    BelowBound,
    AboveBound,
    Outlier,
    DuplicateValue,
    DuplicateRow,
    InvalidCategory,
    FutureDate,
    OutsideWindow,
}

impl IssueKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NullValue => "null_value",
            Self::TypeMismatch => "type_mismatch",
            Self::NegativeValue => "negative_value",
            Self::BelowBound => "below_bound",
            Self::AboveBound => "above_bound",
            Self::Outlier => "outlier",
            Self::DuplicateValue => "duplicate_value",
            Self::DuplicateRow => "duplicate_row",
            Self::InvalidCategory => "invalid_category",
            Self::FutureDate => "future_date",
            Self::OutsideWindow => "outside_window",
        }
    }
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A located record of a detected quality problem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub dimension: Dimension,
    /// Column name, or [`ROW_LEVEL`].
    pub column: String,
    pub kind: IssueKind,
    /// Distinct row positions, ascending.
    pub affected_indices: Vec<usize>,
    pub severity: Severity,
}

impl Issue {
    /// Create an issue. `affected_indices` is sorted and deduplicated.
    pub fn new(
        dimension: Dimension,
        column: impl Into<String>,
        kind: IssueKind,
        mut affected_indices: Vec<usize>,
        severity: Severity,
    ) -> Self {
        affected_indices.sort_unstable();
        affected_indices.dedup();
        Self {
            dimension,
            column: column.into(),
            kind,
            affected_indices,
            severity,
        }
    }

    pub fn affected_rows(&self) -> usize {
        self.affected_indices.len()
    }

    pub fn is_row_level(&self) -> bool {
        self.column == ROW_LEVEL
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}.{} on '{}' ({} rows)",
            self.severity,
            self.dimension,
            self.kind,
            self.column,
            self.affected_indices.len()
        )
    }
}

/// Per-column sub-score within a dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnScore {
    pub column: String,
    pub score: f64,
}

/// Informational context attached to a dimension score. Never affects the score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Note {
    /// No column had a rule for this dimension; the score is vacuous.
    NoRulesApplied,
    /// Observed range of a temporal column. A zero span (all identical timestamps) is valid.
    ObservedSpan {
        column: String,
        earliest: DateTime<Utc>,
        latest: DateTime<Utc>,
        span_seconds: i64,
    },
}

/// Score and findings for one dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionScore {
    pub dimension: Dimension,
    /// In `[0, 100]`.
    pub score: f64,
    pub issues: Vec<Issue>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub column_scores: Vec<ColumnScore>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<Note>,
}

impl DimensionScore {
    pub fn new(dimension: Dimension, score: f64, issues: Vec<Issue>) -> Self {
        Self {
            dimension,
            score: crate::stats::clamp_score(score),
            issues,
            column_scores: Vec::new(),
            notes: Vec::new(),
        }
    }

    pub fn with_column_scores(mut self, column_scores: Vec<ColumnScore>) -> Self {
        self.column_scores = column_scores;
        self
    }

    pub fn with_notes(mut self, notes: Vec<Note>) -> Self {
        self.notes = notes;
        self
    }

    /// Per-column sub-score, if this dimension computed one for `column`.
    pub fn column_score(&self, column: &str) -> Option<f64> {
        self.column_scores
            .iter()
            .find(|c| c.column == column)
            .map(|c| c.score)
    }

    /// Issues of the given kind.
    pub fn issues_of(&self, kind: IssueKind) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(move |i| i.kind == kind)
    }

    /// Whether the score is vacuous because no rule applied.
    pub fn no_rules_applied(&self) -> bool {
        self.notes.contains(&Note::NoRulesApplied)
    }
}
