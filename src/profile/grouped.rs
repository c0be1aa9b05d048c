//! Numeric statistics per group of rows (price by category, error by horizon, ...).

use std::cmp::Ordering;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, AnalysisResult};
use crate::typed::{Column, NumericColumn, TypedDataSet};

use super::stats::Moments;

/// Numeric columns to summarise for every distinct combination of `group_by` values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupedStatisticsSpec {
    pub group_by: Vec<String>,
    pub columns: Vec<String>,
}

impl GroupedStatisticsSpec {
    pub fn new<G, C>(group_by: G, columns: C) -> Self
    where
        G: IntoIterator,
        G::Item: Into<String>,
        C: IntoIterator,
        C::Item: Into<String>,
    {
        Self {
            group_by: group_by.into_iter().map(Into::into).collect(),
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }
}

/// Result of one [`GroupedStatisticsSpec`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupedStatistics {
    pub group_by: Vec<String>,
    /// Groups in ascending key order, null keys first.
    pub groups: Vec<GroupStatistics>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupStatistics {
    /// Key cells in `group_by` order; `None` is a null key cell.
    pub key: Vec<Option<String>>,
    pub rows: usize,
    /// Per column, over the group's non-null, non-NaN values.
    pub columns: IndexMap<String, Moments>,
}

/// Summarise `spec.columns` per group of `spec.group_by`.
///
/// Fails with [`AnalysisError::MissingDesignatedColumn`] for an unknown column and
/// [`AnalysisError::IncompatibleRule`] when a summarised column is not numeric.
pub fn grouped_statistics(
    dataset: &TypedDataSet<'_>,
    spec: &GroupedStatisticsSpec,
) -> AnalysisResult<GroupedStatistics> {
    let group_idxs = spec
        .group_by
        .iter()
        .map(|c| dataset.column_index(c))
        .collect::<AnalysisResult<Vec<_>>>()?;
    let values = spec
        .columns
        .iter()
        .map(|name| match dataset.column(name)? {
            Column::Numeric(n) => Ok(n),
            other => Err(AnalysisError::IncompatibleRule {
                rule: "grouped_statistics".to_string(),
                column: name.clone(),
                data_type: other.data_type(),
                message: "grouped statistics need a numeric column".to_string(),
            }),
        })
        .collect::<AnalysisResult<Vec<&NumericColumn<'_>>>>()?;

    let columns = dataset.columns();
    let mut groups: Vec<Vec<usize>> = dataset.group_rows(&group_idxs).into_values().collect();
    groups.sort_by(|a, b| {
        group_idxs
            .iter()
            .map(|&c| columns[c].compare_rows(a[0], b[0]))
            .find(|o| o.is_ne())
            .unwrap_or(Ordering::Equal)
    });

    let groups = groups
        .into_iter()
        .map(|rows| GroupStatistics {
            key: group_idxs.iter().map(|&c| columns[c].render(rows[0])).collect(),
            rows: rows.len(),
            columns: values
                .iter()
                .map(|column| {
                    let group_values = rows
                        .iter()
                        .filter_map(|&r| column.cells[r])
                        .map(|n| n.as_f64())
                        .filter(|v| !v.is_nan())
                        .collect();
                    (column.name.to_string(), Moments::from_values(group_values))
                })
                .collect(),
        })
        .collect();

    Ok(GroupedStatistics {
        group_by: spec.group_by.clone(),
        groups,
    })
}
