use thiserror::Error;

use crate::types::DataType;

/// Convenience result type for analysis operations.
pub type AnalysisResult<T> = Result<T, AnalysisError>;

/// Convenience result type for the bundled loaders.
pub type IngestionResult<T> = Result<T, IngestionError>;

/// Convenience result type for rule-book loading.
pub type RulesResult<T> = Result<T, RulesError>;

/// Error type returned by the analysis core.
///
/// Only malformed configuration or a structurally unreadable dataset is an error. Data-quality
/// facts (nulls, duplicates, failed cross-products, negative values) are report content.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// A cell does not match the declared type of its column.
    #[error("column '{column}' is declared {declared:?} but row {row} holds {found}")]
    InvalidColumnType {
        column: String,
        declared: DataType,
        row: usize,
        found: String,
    },

    /// The dataset has no columns. Zero rows is valid.
    #[error("dataset has no columns")]
    EmptyDataset,

    /// A rule or key designation references a column that the dataset does not have.
    #[error("designated column '{column}' does not exist. columns={available:?}")]
    MissingDesignatedColumn {
        column: String,
        available: Vec<String>,
    },

    /// A row has a different number of cells than the schema has fields.
    #[error("row {row} has {actual} values but the schema has {expected} fields")]
    RaggedRow {
        row: usize,
        expected: usize,
        actual: usize,
    },

    /// A consistency rule targets a column whose kind the relation cannot evaluate.
    #[error("rule '{rule}' cannot be applied to column '{column}' of type {data_type:?}: {message}")]
    IncompatibleRule {
        rule: String,
        column: String,
        data_type: DataType,
        message: String,
    },

    /// The worker pool could not be created.
    #[error("failed to build thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// A column aggregation failed inside polars.
    #[error("polars error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),
}

impl AnalysisError {
    /// Stable snake_case identifier for the error kind, used in serialized failure records.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidColumnType { .. } => "invalid_column_type",
            Self::EmptyDataset => "empty_dataset",
            Self::MissingDesignatedColumn { .. } => "missing_designated_column",
            Self::RaggedRow { .. } => "ragged_row",
            Self::IncompatibleRule { .. } => "incompatible_rule",
            Self::ThreadPool(_) => "thread_pool",
            Self::Polars(_) => "polars",
        }
    }
}

/// Error type returned by the bundled CSV loader.
#[derive(Debug, Error)]
pub enum IngestionError {
    /// Underlying I/O error (e.g. file not found, permission denied).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV ingestion error.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// Invalid directory glob pattern.
    #[error("invalid glob pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    /// A path matched by a glob could not be read.
    #[error("glob error: {0}")]
    Glob(#[from] glob::GlobError),

    /// The input does not conform to the provided schema (missing columns, unknown dataset, etc.).
    #[error("schema mismatch: {message}")]
    SchemaMismatch { message: String },

    /// A value could not be parsed into the required [`DataType`].
    #[error("failed to parse value at row {row} column '{column}': {message} (raw='{raw}')")]
    ParseError {
        row: usize,
        column: String,
        raw: String,
        message: String,
    },
}

/// Error type returned when loading a [`crate::rules::RuleBook`].
#[derive(Debug, Error)]
pub enum RulesError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid rule book: {0}")]
    Json(#[from] serde_json::Error),
}
