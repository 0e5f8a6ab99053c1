use thiserror::Error;

use crate::quality::Dimension;

/// Convenience result type for fallible quality operations.
pub type QualityResult<T> = Result<T, QualityError>;

/// Error type returned across the crate.
///
/// Only structural and configuration problems are errors. Data-quality findings (nulls,
/// outliers, invalid categories, ...) are reported as [`crate::quality::Issue`] values instead.
#[derive(Debug, Error)]
pub enum QualityError {
    /// Underlying I/O error (e.g. file not found, permission denied).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV ingestion error.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON ingestion or configuration error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// The input does not conform to the provided schema (missing columns, non-object rows, etc.).
    #[error("schema mismatch: {message}")]
    SchemaMismatch { message: String },

    /// A structural value could not be parsed.
    #[error("failed to parse value at row {row} column '{column}': {message} (raw='{raw}')")]
    ParseError {
        row: usize,
        column: String,
        raw: String,
        message: String,
    },

    /// A column does not have the dataset's row count.
    #[error("column '{column}' has {actual} values, expected {expected}")]
    ColumnLengthMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },

    /// Two columns share the same name.
    #[error("duplicate column name '{column}'")]
    DuplicateColumn { column: String },

    /// A dtype tag is not one of the supported logical types.
    #[error("unknown dtype tag '{tag}'")]
    UnknownDtype { tag: String },

    /// A column rule is malformed (e.g. non-positive outlier threshold).
    #[error("invalid rule for column '{column}' field '{field}': {message}")]
    InvalidRule {
        column: String,
        field: String,
        message: String,
    },

    /// Dimension weights are malformed.
    #[error("invalid weights ({field}): {message}")]
    InvalidWeights { field: String, message: String },

    /// The aggregator did not receive a score for a dimension.
    #[error("missing score for dimension '{dimension}'")]
    MissingDimension { dimension: Dimension },

    /// The worker pool could not be built.
    #[error("thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}
