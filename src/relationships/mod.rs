//! Cross-dataset relationship inference by column name.
//!
//! Two datasets are linked whenever they carry a column with exactly the same name. Every link
//! is reported, including names that plausibly coincide (`name`, `date`); identifier-like names
//! are only tagged with higher [`Confidence`]. No values are compared across datasets, so an edge
//! is a hint for review, not a verified foreign key.

use std::collections::HashSet;

use indexmap::IndexMap;
use serde::Serialize;

use crate::keys::is_identifier_name;
use crate::profile::ColumnProfile;

/// Column names of one dataset with their distinct-value counts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetSignature {
    pub dataset: String,
    pub columns: Vec<ColumnSignature>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSignature {
    pub name: String,
    pub distinct_count: usize,
}

impl DatasetSignature {
    pub fn new(dataset: impl Into<String>, columns: Vec<ColumnSignature>) -> Self {
        Self {
            dataset: dataset.into(),
            columns,
        }
    }

    /// Build a signature from a dataset's column profiles.
    pub fn from_profiles(dataset: impl Into<String>, profiles: &[ColumnProfile]) -> Self {
        Self::new(
            dataset,
            profiles
                .iter()
                .map(|p| ColumnSignature {
                    name: p.name.clone(),
                    distinct_count: p.distinct_count,
                })
                .collect(),
        )
    }

    fn distinct_count(&self, column: &str) -> Option<usize> {
        self.columns
            .iter()
            .find(|c| c.name == column)
            .map(|c| c.distinct_count)
    }
}

/// How much a shared column name suggests a real relationship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    /// The name looks like an identifier (`..._id`, or contains `id`).
    Identifier,
    /// The names merely coincide.
    Coincidental,
}

impl Confidence {
    pub fn for_column(name: &str) -> Self {
        if is_identifier_name(name) {
            Self::Identifier
        } else {
            Self::Coincidental
        }
    }
}

/// A proposed relationship between two datasets sharing a column name.
///
/// `source` is always the lexicographically smaller dataset name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelationshipEdge {
    pub column: String,
    pub source: String,
    pub target: String,
    pub source_distinct: usize,
    pub target_distinct: usize,
    pub confidence: Confidence,
}

/// A column name carried by two or more datasets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SharedColumn {
    pub column: String,
    /// Datasets carrying the column, in input order.
    pub datasets: Vec<String>,
    pub confidence: Confidence,
}

/// One edge per dataset pair per shared column name, sorted by `(source, target, column)`.
///
/// The output does not depend on the order of `signatures`.
pub fn infer_relationships(signatures: &[DatasetSignature]) -> Vec<RelationshipEdge> {
    let mut edges = Vec::new();
    for (i, left) in signatures.iter().enumerate() {
        for right in &signatures[i + 1..] {
            let right_names: HashSet<&str> =
                right.columns.iter().map(|c| c.name.as_str()).collect();
            let mut emitted = HashSet::new();

            for col in &left.columns {
                let name = col.name.as_str();
                if !right_names.contains(name) || !emitted.insert(name) {
                    continue;
                }
                let right_distinct = right.distinct_count(name).unwrap_or_default();
                let (source, target, source_distinct, target_distinct) =
                    if left.dataset <= right.dataset {
                        (left, right, col.distinct_count, right_distinct)
                    } else {
                        (right, left, right_distinct, col.distinct_count)
                    };
                edges.push(RelationshipEdge {
                    column: name.to_string(),
                    source: source.dataset.clone(),
                    target: target.dataset.clone(),
                    source_distinct,
                    target_distinct,
                    confidence: Confidence::for_column(name),
                });
            }
        }
    }

    edges.sort_by(|a, b| {
        (&a.source, &a.target, &a.column).cmp(&(&b.source, &b.target, &b.column))
    });
    edges
}

/// Every column name carried by at least two datasets, in first-seen order.
pub fn shared_columns(signatures: &[DatasetSignature]) -> Vec<SharedColumn> {
    let mut carriers: IndexMap<&str, Vec<String>> = IndexMap::new();
    for sig in signatures {
        let mut seen = HashSet::new();
        for col in &sig.columns {
            if seen.insert(col.name.as_str()) {
                carriers
                    .entry(col.name.as_str())
                    .or_default()
                    .push(sig.dataset.clone());
            }
        }
    }

    carriers
        .into_iter()
        .filter(|(_, datasets)| datasets.len() > 1)
        .map(|(column, datasets)| SharedColumn {
            column: column.to_string(),
            datasets,
            confidence: Confidence::for_column(column),
        })
        .collect()
}
