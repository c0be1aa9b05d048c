//! Key-candidate detection within a single dataset.
//!
//! - [`detect_key`]: classifies one column as unique and/or sequential
//! - [`detect_composite_key`]: group-size cardinality of an ordered column pair
//! - [`check_mapping_key`]: whether a column pair determines a third column
//!
//! Uniqueness and sequentiality are reported as separate facts. A column can be unique without
//! being sequential; a sequential column is always unique.

use std::collections::HashSet;

use serde::Serialize;

use crate::error::AnalysisResult;
use crate::profile::CardinalitySummary;
use crate::typed::{Column, Number, TypedDataSet};

/// Overall classification of a key candidate, strongest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyVerdict {
    Sequential,
    Unique,
    NonUnique,
}

/// Single-column key candidate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeyCandidate {
    pub column: String,
    pub row_count: usize,
    pub distinct_count: usize,
    pub null_count: usize,
    /// Distinct non-null count equals the row count.
    pub unique: bool,
    /// Sorted values are exactly `1..=row_count`. Only integer columns qualify.
    pub sequential: bool,
    pub verdict: KeyVerdict,
    /// Rows per distinct value (nulls form their own group).
    pub occurrences: CardinalitySummary,
}

/// Ordered column pair treated as a composite key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompositeKeyCandidate {
    pub columns: Vec<String>,
    pub row_count: usize,
    pub distinct_combinations: usize,
    /// Every combination occurs exactly once.
    pub unique: bool,
    /// Rows per observed combination.
    pub cardinality: CardinalitySummary,
}

/// Result of asking whether `(first, second)` determines `target`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MappingKeyCheck {
    pub key: Vec<String>,
    pub target: String,
    pub groups: usize,
    /// Groups whose number of distinct non-null `target` values is not exactly one.
    pub ambiguous_groups: usize,
    /// Distinct `target` values per group.
    pub targets_per_group: CardinalitySummary,
    pub is_mapping_key: bool,
}

/// Classify a single column.
pub fn detect_key(dataset: &TypedDataSet<'_>, column: &str) -> AnalysisResult<KeyCandidate> {
    let idx = dataset.column_index(column)?;
    let col = &dataset.columns()[idx];
    let row_count = dataset.row_count();
    let distinct_count = col.distinct_count();

    let unique = distinct_count == row_count;
    let sequential = unique && is_sequential(col, row_count);
    let verdict = if sequential {
        KeyVerdict::Sequential
    } else if unique {
        KeyVerdict::Unique
    } else {
        KeyVerdict::NonUnique
    };

    let occurrences =
        CardinalitySummary::from_sizes(dataset.group_rows(&[idx]).values().map(Vec::len));

    Ok(KeyCandidate {
        column: column.to_string(),
        row_count,
        distinct_count,
        null_count: col.null_count(),
        unique,
        sequential,
        verdict,
        occurrences,
    })
}

/// `true` iff `column` is an integer column whose sorted values are exactly `1..=row_count`.
pub fn is_sequential(column: &Column<'_>, row_count: usize) -> bool {
    let Column::Numeric(numeric) = column else {
        return false;
    };
    if !numeric.is_integer() {
        return false;
    }

    let mut values = Vec::with_capacity(row_count);
    for cell in &numeric.cells {
        match cell {
            Some(Number::Int(v)) => values.push(*v),
            _ => return false,
        }
    }
    values.sort_unstable();
    values
        .iter()
        .enumerate()
        .all(|(i, &v)| i64::try_from(i + 1).is_ok_and(|expected| expected == v))
}

/// Group-size cardinality of the ordered pair `(first, second)`.
pub fn detect_composite_key(
    dataset: &TypedDataSet<'_>,
    first: &str,
    second: &str,
) -> AnalysisResult<CompositeKeyCandidate> {
    let cols = [dataset.column_index(first)?, dataset.column_index(second)?];
    let groups = dataset.group_rows(&cols);
    let cardinality = CardinalitySummary::from_sizes(groups.values().map(Vec::len));

    Ok(CompositeKeyCandidate {
        columns: vec![first.to_string(), second.to_string()],
        row_count: dataset.row_count(),
        distinct_combinations: groups.len(),
        unique: groups.len() == dataset.row_count(),
        cardinality,
    })
}

/// Whether every `(first, second)` group has exactly one distinct non-null `target` value.
pub fn check_mapping_key(
    dataset: &TypedDataSet<'_>,
    first: &str,
    second: &str,
    target: &str,
) -> AnalysisResult<MappingKeyCheck> {
    let cols = [dataset.column_index(first)?, dataset.column_index(second)?];
    let target_col = dataset.column(target)?;
    let groups = dataset.group_rows(&cols);

    let per_group: Vec<usize> = groups
        .values()
        .map(|rows| {
            rows.iter()
                .filter_map(|&r| target_col.key(r))
                .collect::<HashSet<_>>()
                .len()
        })
        .collect();
    let ambiguous_groups = per_group.iter().filter(|&&n| n != 1).count();

    Ok(MappingKeyCheck {
        key: vec![first.to_string(), second.to_string()],
        target: target.to_string(),
        groups: groups.len(),
        ambiguous_groups,
        targets_per_group: CardinalitySummary::from_sizes(per_group),
        is_mapping_key: ambiguous_groups == 0,
    })
}

/// Naming heuristic for identifier columns: the lower-cased name contains `id`.
///
/// This also matches words such as `width`. Treat the result as a confidence hint,
/// never as a filter.
pub fn is_identifier_name(name: &str) -> bool {
    name.to_ascii_lowercase().contains("id")
}

/// Columns worth classifying as key candidates without explicit designation.
///
/// A column qualifies when its name looks like an identifier, or when it is a non-float column
/// whose values are unique over a non-empty dataset.
pub fn suggest_key_columns<'a>(dataset: &TypedDataSet<'a>) -> Vec<&'a str> {
    let rows = dataset.row_count();
    dataset
        .columns()
        .iter()
        .filter(|c| {
            let float = matches!(c, Column::Numeric(n) if !n.is_integer());
            is_identifier_name(c.name()) || (!float && rows > 0 && c.distinct_count() == rows)
        })
        .map(Column::name)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{
        check_mapping_key, detect_composite_key, detect_key, is_identifier_name,
        suggest_key_columns, KeyVerdict,
    };
    use crate::error::AnalysisError;
    use crate::typed::TypedDataSet;
    use crate::types::{DataSet, DataType, Field, Schema, Value};

    fn entity_rows(entities: &[i64]) -> DataSet {
        let schema = Schema::new(vec![
            Field::new("SKU_ID", DataType::Int64),
            Field::new("Warehouse_ID", DataType::Utf8),
            Field::new("Entity", DataType::Int64),
            Field::new("Weight", DataType::Float64),
        ]);
        let rows = entities
            .iter()
            .enumerate()
            .map(|(i, &e)| {
                vec![
                    Value::Int64((i / 2) as i64 + 1),
                    Value::Utf8(format!("W{}", i % 2)),
                    Value::Int64(e),
                    Value::Float64(i as f64 * 0.5),
                ]
            })
            .collect();
        DataSet::new(schema, rows)
    }

    #[test]
    fn sequential_column_is_also_unique() {
        let ds = entity_rows(&[3, 1, 4, 2]);
        let typed = TypedDataSet::new(&ds).unwrap();
        let key = detect_key(&typed, "Entity").unwrap();
        assert!(key.unique);
        assert!(key.sequential);
        assert_eq!(key.verdict, KeyVerdict::Sequential);
        assert!(key.occurrences.uniform);
    }

    #[test]
    fn unique_but_not_sequential() {
        let ds = entity_rows(&[10, 20, 30, 40]);
        let typed = TypedDataSet::new(&ds).unwrap();
        let key = detect_key(&typed, "Entity").unwrap();
        assert!(key.unique);
        assert!(!key.sequential);
        assert_eq!(key.verdict, KeyVerdict::Unique);
    }

    #[test]
    fn repeated_values_are_non_unique() {
        let ds = entity_rows(&[1, 2, 2, 3]);
        let typed = TypedDataSet::new(&ds).unwrap();
        let key = detect_key(&typed, "SKU_ID").unwrap();
        assert_eq!(key.verdict, KeyVerdict::NonUnique);
        assert_eq!(key.distinct_count, 2);
        assert_eq!(key.occurrences.groups, 2);
        assert_eq!(key.occurrences.max, Some(2));
    }

    #[test]
    fn null_prevents_uniqueness() {
        let mut ds = entity_rows(&[1, 2, 3]);
        ds.rows[2][2] = Value::Null;
        let typed = TypedDataSet::new(&ds).unwrap();
        let key = detect_key(&typed, "Entity").unwrap();
        assert_eq!(key.null_count, 1);
        assert!(!key.unique);
        assert!(!key.sequential);
    }

    #[test]
    fn float_columns_are_never_sequential() {
        let schema = Schema::new(vec![Field::new("n", DataType::Float64)]);
        let ds = DataSet::new(schema, vec![vec![Value::Float64(1.0)], vec![Value::Float64(2.0)]]);
        let typed = TypedDataSet::new(&ds).unwrap();
        let key = detect_key(&typed, "n").unwrap();
        assert!(key.unique);
        assert!(!key.sequential);
    }

    #[test]
    fn composite_key_cardinality() {
        let mut ds = entity_rows(&[1, 2, 3, 4]);
        ds.rows.push(ds.rows[0].clone());
        let typed = TypedDataSet::new(&ds).unwrap();
        let key = detect_composite_key(&typed, "SKU_ID", "Warehouse_ID").unwrap();
        assert_eq!(key.distinct_combinations, 4);
        assert!(!key.unique);
        assert_eq!(key.cardinality.min, Some(1));
        assert_eq!(key.cardinality.max, Some(2));
        assert!(!key.cardinality.uniform);
    }

    #[test]
    fn mapping_key_detects_ambiguous_groups() {
        let ds = entity_rows(&[1, 2, 3, 4]);
        let typed = TypedDataSet::new(&ds).unwrap();
        let check = check_mapping_key(&typed, "SKU_ID", "Warehouse_ID", "Entity").unwrap();
        assert!(check.is_mapping_key);
        assert_eq!(check.groups, 4);

        let mut ds = ds;
        let mut extra = ds.rows[0].clone();
        extra[2] = Value::Int64(99);
        ds.rows.push(extra);
        let typed = TypedDataSet::new(&ds).unwrap();
        let check = check_mapping_key(&typed, "SKU_ID", "Warehouse_ID", "Entity").unwrap();
        assert!(!check.is_mapping_key);
        assert_eq!(check.ambiguous_groups, 1);
        assert_eq!(check.targets_per_group.max, Some(2));
    }

    #[test]
    fn unknown_column_is_a_configuration_error() {
        let ds = entity_rows(&[1]);
        let typed = TypedDataSet::new(&ds).unwrap();
        assert!(matches!(
            detect_key(&typed, "nope"),
            Err(AnalysisError::MissingDesignatedColumn { .. })
        ));
    }

    #[test]
    fn identifier_names() {
        assert!(is_identifier_name("SKU_ID"));
        assert!(is_identifier_name("Entity_id"));
        assert!(is_identifier_name("Identifier"));
        assert!(!is_identifier_name("Brand"));
        assert!(!is_identifier_name("date"));
        assert!(is_identifier_name("width"));
    }

    #[test]
    fn suggests_identifier_and_unique_columns() {
        let ds = entity_rows(&[1, 2, 3, 4]);
        let typed = TypedDataSet::new(&ds).unwrap();
        // Weight is unique but a float; Warehouse_ID repeats but is id-named.
        assert_eq!(
            suggest_key_columns(&typed),
            vec!["SKU_ID", "Warehouse_ID", "Entity"]
        );
    }
}
