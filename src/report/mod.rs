//! Report structures handed to the presentation layer.
//!
//! Everything here is plain data. [`CollectionReport::assemble`] is the only computation: it
//! combines per-dataset outcomes with the relationships inferred across the successful ones.

use serde::Serialize;

use crate::consistency::ConsistencyFinding;
use crate::error::AnalysisError;
use crate::keys::{CompositeKeyCandidate, KeyCandidate};
use crate::profile::{ColumnProfile, CorrelationFinding, GroupedStatistics, Statistic};
use crate::relationships::{
    infer_relationships, shared_columns, DatasetSignature, RelationshipEdge, SharedColumn,
};
use crate::structure::StructuralReport;

/// A column with at least one null value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MissingValues {
    pub column: String,
    pub null_count: usize,
    pub null_pct: Statistic,
}

/// Duplicate count of one designated key projection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateKeyCount {
    pub columns: Vec<String>,
    pub duplicates: usize,
}

/// Everything learned about one dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub dataset: String,
    pub row_count: usize,
    pub column_count: usize,
    /// One profile per column, in column order.
    pub columns: Vec<ColumnProfile>,
    pub missing_values: Vec<MissingValues>,
    pub duplicate_rows: usize,
    pub duplicate_keys: Vec<DuplicateKeyCount>,
    pub key_candidates: Vec<KeyCandidate>,
    pub composite_keys: Vec<CompositeKeyCandidate>,
    pub structural: Vec<StructuralReport>,
    pub consistency: Vec<ConsistencyFinding>,
    pub correlations: Vec<CorrelationFinding>,
    /// One entry per designated grouping, in rule-book order.
    pub grouped_statistics: Vec<GroupedStatistics>,
}

impl AnalysisReport {
    /// No duplicate rows or keys, every structural check well formed, every rule passing.
    pub fn is_clean(&self) -> bool {
        self.duplicate_rows == 0
            && self.duplicate_keys.iter().all(|d| d.duplicates == 0)
            && self.structural.iter().all(StructuralReport::is_well_formed)
            && self.consistency.iter().all(ConsistencyFinding::passes)
    }

    pub fn profile(&self, column: &str) -> Option<&ColumnProfile> {
        self.columns.iter().find(|c| c.name == column)
    }

    pub fn key_candidate(&self, column: &str) -> Option<&KeyCandidate> {
        self.key_candidates.iter().find(|k| k.column == column)
    }

    pub fn signature(&self) -> DatasetSignature {
        DatasetSignature::from_profiles(self.dataset.clone(), &self.columns)
    }
}

/// Why a dataset could not be analysed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatasetFailure {
    pub dataset: String,
    /// Stable error code, see [`AnalysisError::code`].
    pub code: String,
    pub reason: String,
}

impl DatasetFailure {
    pub fn new(dataset: impl Into<String>, err: &AnalysisError) -> Self {
        Self {
            dataset: dataset.into(),
            code: err.code().to_string(),
            reason: err.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DatasetOutcome {
    Analyzed(AnalysisReport),
    Failed(DatasetFailure),
}

impl DatasetOutcome {
    pub fn dataset(&self) -> &str {
        match self {
            Self::Analyzed(r) => &r.dataset,
            Self::Failed(f) => &f.dataset,
        }
    }

    pub fn report(&self) -> Option<&AnalysisReport> {
        match self {
            Self::Analyzed(r) => Some(r),
            Self::Failed(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&DatasetFailure> {
        match self {
            Self::Analyzed(_) => None,
            Self::Failed(f) => Some(f),
        }
    }
}

/// Per-dataset outcomes in input order, plus everything inferred across datasets.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollectionReport {
    pub datasets: Vec<DatasetOutcome>,
    pub relationships: Vec<RelationshipEdge>,
    pub shared_columns: Vec<SharedColumn>,
}

impl CollectionReport {
    /// Combine outcomes. Failed datasets contribute no relationships.
    pub fn assemble(datasets: Vec<DatasetOutcome>) -> Self {
        let signatures: Vec<DatasetSignature> = datasets
            .iter()
            .filter_map(DatasetOutcome::report)
            .map(AnalysisReport::signature)
            .collect();

        Self {
            relationships: infer_relationships(&signatures),
            shared_columns: shared_columns(&signatures),
            datasets,
        }
    }

    pub fn report(&self, dataset: &str) -> Option<&AnalysisReport> {
        self.datasets
            .iter()
            .filter_map(DatasetOutcome::report)
            .find(|r| r.dataset == dataset)
    }

    pub fn reports(&self) -> impl Iterator<Item = &AnalysisReport> {
        self.datasets.iter().filter_map(DatasetOutcome::report)
    }

    pub fn failures(&self) -> impl Iterator<Item = &DatasetFailure> {
        self.datasets.iter().filter_map(DatasetOutcome::failure)
    }

    /// Edges touching `dataset` on either side.
    pub fn relationships_of<'a>(
        &'a self,
        dataset: &'a str,
    ) -> impl Iterator<Item = &'a RelationshipEdge> {
        self.relationships
            .iter()
            .filter(move |e| e.source == dataset || e.target == dataset)
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
