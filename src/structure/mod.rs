//! Structural validation of mapping tables.
//!
//! A mapping table assigns a surrogate identifier to every combination of two key domains
//! (e.g. one `Entity` per `SKU_ID` × `Warehouse_ID`). [`validate_structure`] checks, for one
//! designated [`StructuralKeySpec`]:
//!
//! 1. cross-product completeness: `row_count == distinct(first) * distinct(second)`, and whether
//!    every non-null combination of the two domains is present
//! 2. mapping cardinality: each `(first, second)` group has exactly one identifier
//! 3. identifier uniqueness, and sequentiality from 1 for integer identifiers
//! 4. duplicate full rows and duplicate `(first, second)` combinations
//!
//! Every check is total. Unexpected shapes, including zero rows, produce a verdict rather than an
//! error; only a reference to a missing column fails.

use serde::{Deserialize, Serialize};

use crate::error::AnalysisResult;
use crate::keys::{self, MappingKeyCheck};
use crate::typed::{Column, TypedDataSet};

/// Designation of a composite natural key and the identifier it should map to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuralKeySpec {
    pub first: String,
    pub second: String,
    pub identifier: String,
}

impl StructuralKeySpec {
    pub fn new(
        first: impl Into<String>,
        second: impl Into<String>,
        identifier: impl Into<String>,
    ) -> Self {
        Self {
            first: first.into(),
            second: second.into(),
            identifier: identifier.into(),
        }
    }
}

/// Cross-product completeness of two key columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrossProductCheck {
    pub first: String,
    pub second: String,
    pub first_distinct: usize,
    pub second_distinct: usize,
    /// `first_distinct * second_distinct`.
    pub expected: usize,
    /// Row count.
    pub actual: usize,
    /// Distinct `(first, second)` combinations observed, nulls included.
    pub observed_combinations: usize,
    /// Distinct combinations with both key cells non-null. At most `expected`.
    pub domain_combinations: usize,
    /// Rows with a null in either key cell.
    pub null_key_rows: usize,
    /// `expected == actual`.
    pub complete: bool,
    /// Complete, and every combination of the two domains appears exactly once.
    pub exactly_once: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IdentifierCheck {
    pub column: String,
    pub unique: bool,
    /// `None` when the identifier is not an integer column.
    pub sequential: Option<bool>,
    /// Rows repeating an earlier identifier value.
    pub duplicate_values: usize,
}

/// Duplicate counts. Both are always reported, zero included.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DuplicateCounts {
    pub full_rows: usize,
    pub key_combinations: usize,
}

/// A failed structural invariant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "violation", rename_all = "snake_case")]
pub enum StructuralViolation {
    IncompleteCrossProduct { expected: usize, actual: usize },
    /// The row count matches `expected`, but rows with null or repeated keys stand in for
    /// `missing` combinations of the two domains.
    MissingCombinations { missing: usize },
    NullKeyCombination { rows: usize },
    /// A key column has no non-null values on a non-empty dataset, so `expected` is zero.
    IncompatibleKeyPair { column: String },
    AmbiguousMapping { groups: usize },
    NonUniqueIdentifier { duplicates: usize },
    NonSequentialIdentifier,
}

/// Verdict object for one [`StructuralKeySpec`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StructuralReport {
    pub key: StructuralKeySpec,
    pub cross_product: CrossProductCheck,
    pub mapping: MappingKeyCheck,
    pub identifier: IdentifierCheck,
    pub duplicates: DuplicateCounts,
    pub violations: Vec<StructuralViolation>,
}

impl StructuralReport {
    /// No violation was found.
    pub fn is_well_formed(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn has_violation(&self, predicate: impl Fn(&StructuralViolation) -> bool) -> bool {
        self.violations.iter().any(predicate)
    }
}

/// Run every structural check for `spec`.
pub fn validate_structure(
    dataset: &TypedDataSet<'_>,
    spec: &StructuralKeySpec,
) -> AnalysisResult<StructuralReport> {
    let first_idx = dataset.column_index(&spec.first)?;
    let second_idx = dataset.column_index(&spec.second)?;
    let id_idx = dataset.column_index(&spec.identifier)?;

    let cross_product = check_cross_product(dataset, first_idx, second_idx);
    let mapping = keys::check_mapping_key(dataset, &spec.first, &spec.second, &spec.identifier)?;
    let identifier = check_identifier(dataset, id_idx);
    let duplicates = DuplicateCounts {
        full_rows: dataset.duplicate_row_count(),
        key_combinations: dataset.duplicate_count(&[first_idx, second_idx]),
    };

    let mut violations = Vec::new();
    if dataset.row_count() > 0 {
        for (column, distinct) in [
            (&spec.first, cross_product.first_distinct),
            (&spec.second, cross_product.second_distinct),
        ] {
            if distinct == 0 {
                violations.push(StructuralViolation::IncompatibleKeyPair {
                    column: column.clone(),
                });
            }
        }
    }
    if !cross_product.complete {
        violations.push(StructuralViolation::IncompleteCrossProduct {
            expected: cross_product.expected,
            actual: cross_product.actual,
        });
    } else if !cross_product.exactly_once {
        violations.push(StructuralViolation::MissingCombinations {
            missing: cross_product.expected - cross_product.domain_combinations,
        });
    }
    if cross_product.null_key_rows > 0 {
        violations.push(StructuralViolation::NullKeyCombination {
            rows: cross_product.null_key_rows,
        });
    }
    if mapping.ambiguous_groups > 0 {
        violations.push(StructuralViolation::AmbiguousMapping {
            groups: mapping.ambiguous_groups,
        });
    }
    if !identifier.unique {
        violations.push(StructuralViolation::NonUniqueIdentifier {
            duplicates: identifier.duplicate_values,
        });
    }
    if identifier.sequential == Some(false) {
        violations.push(StructuralViolation::NonSequentialIdentifier);
    }

    Ok(StructuralReport {
        key: spec.clone(),
        cross_product,
        mapping,
        identifier,
        duplicates,
        violations,
    })
}

fn check_cross_product(
    dataset: &TypedDataSet<'_>,
    first_idx: usize,
    second_idx: usize,
) -> CrossProductCheck {
    let columns = dataset.columns();
    let first = &columns[first_idx];
    let second = &columns[second_idx];
    let first_distinct = first.distinct_count();
    let second_distinct = second.distinct_count();
    let expected = first_distinct.saturating_mul(second_distinct);
    let actual = dataset.row_count();
    let groups = dataset.group_rows(&[first_idx, second_idx]);
    let mut domain_combinations = 0;
    let mut null_key_rows = 0;
    for (key, rows) in &groups {
        if key.iter().all(Option::is_some) {
            domain_combinations += 1;
        } else {
            null_key_rows += rows.len();
        }
    }
    let complete = expected == actual;

    CrossProductCheck {
        first: first.name().to_string(),
        second: second.name().to_string(),
        first_distinct,
        second_distinct,
        expected,
        actual,
        observed_combinations: groups.len(),
        domain_combinations,
        null_key_rows,
        complete,
        exactly_once: complete && domain_combinations == expected,
    }
}

fn check_identifier(dataset: &TypedDataSet<'_>, idx: usize) -> IdentifierCheck {
    let column = &dataset.columns()[idx];
    let row_count = dataset.row_count();
    let unique = column.distinct_count() == row_count;
    let sequential = match column {
        Column::Numeric(n) if n.is_integer() => Some(keys::is_sequential(column, row_count)),
        _ => None,
    };

    IdentifierCheck {
        column: column.name().to_string(),
        unique,
        sequential,
        duplicate_values: dataset.duplicate_count(&[idx]),
    }
}

/// Full-row duplicate count of a dataset.
pub fn duplicate_rows(dataset: &TypedDataSet<'_>) -> usize {
    dataset.duplicate_row_count()
}

/// Duplicate count of the projection onto `columns`.
pub fn duplicate_keys(dataset: &TypedDataSet<'_>, columns: &[String]) -> AnalysisResult<usize> {
    let idxs = columns
        .iter()
        .map(|c| dataset.column_index(c))
        .collect::<AnalysisResult<Vec<_>>>()?;
    Ok(dataset.duplicate_count(&idxs))
}

#[cfg(test)]
mod tests {
    use super::{duplicate_keys, validate_structure, StructuralKeySpec, StructuralViolation};
    use crate::typed::TypedDataSet;
    use crate::types::{DataSet, DataType, Field, Schema, Value};

    fn mapping_table(skus: i64, warehouses: i64) -> DataSet {
        let schema = Schema::new(vec![
            Field::new("SKU_ID", DataType::Int64),
            Field::new("Warehouse_ID", DataType::Int64),
            Field::new("Entity", DataType::Int64),
        ]);
        let mut rows = Vec::new();
        let mut entity = 1;
        for s in 1..=skus {
            for w in 1..=warehouses {
                rows.push(vec![Value::Int64(s), Value::Int64(w), Value::Int64(entity)]);
                entity += 1;
            }
        }
        DataSet::new(schema, rows)
    }

    fn spec() -> StructuralKeySpec {
        StructuralKeySpec::new("SKU_ID", "Warehouse_ID", "Entity")
    }

    #[test]
    fn well_formed_mapping_table_passes() {
        let ds = mapping_table(4, 3);
        let typed = TypedDataSet::new(&ds).unwrap();
        let report = validate_structure(&typed, &spec()).unwrap();
        assert!(report.cross_product.complete);
        assert!(report.cross_product.exactly_once);
        assert_eq!(report.cross_product.expected, 12);
        assert_eq!(report.identifier.sequential, Some(true));
        assert_eq!(report.duplicates.full_rows, 0);
        assert_eq!(report.duplicates.key_combinations, 0);
        assert!(report.is_well_formed());
    }

    #[test]
    fn zero_rows_is_a_complete_cross_product() {
        let ds = DataSet::new(mapping_table(1, 1).schema, vec![]);
        let typed = TypedDataSet::new(&ds).unwrap();
        let report = validate_structure(&typed, &spec()).unwrap();
        assert!(report.cross_product.complete);
        assert_eq!((report.cross_product.expected, report.cross_product.actual), (0, 0));
        assert!(report.is_well_formed());
    }

    #[test]
    fn all_null_key_column_is_incompatible_not_an_error() {
        let mut ds = mapping_table(2, 2);
        for row in &mut ds.rows {
            row[1] = Value::Null;
        }
        let typed = TypedDataSet::new(&ds).unwrap();
        let report = validate_structure(&typed, &spec()).unwrap();
        assert_eq!(report.cross_product.expected, 0);
        assert!(!report.cross_product.complete);
        assert!(report.has_violation(|v| matches!(
            v,
            StructuralViolation::IncompatibleKeyPair { column } if column == "Warehouse_ID"
        )));
    }

    #[test]
    fn null_key_cell_does_not_fill_a_missing_combination() {
        let mut ds = mapping_table(2, 2);
        ds.rows[3][1] = Value::Null;
        let typed = TypedDataSet::new(&ds).unwrap();
        let report = validate_structure(&typed, &spec()).unwrap();
        let cp = &report.cross_product;
        assert!(cp.complete);
        assert!(!cp.exactly_once);
        assert_eq!((cp.domain_combinations, cp.null_key_rows), (3, 1));
        assert!(report.has_violation(|v| matches!(
            v,
            StructuralViolation::MissingCombinations { missing: 1 }
        )));
        assert!(report.has_violation(|v| matches!(
            v,
            StructuralViolation::NullKeyCombination { rows: 1 }
        )));
        assert!(!report.is_well_formed());
    }

    #[test]
    fn repeated_combination_is_complete_but_not_exactly_once() {
        let mut ds = mapping_table(2, 2);
        ds.rows[3][1] = Value::Int64(1);
        let typed = TypedDataSet::new(&ds).unwrap();
        let report = validate_structure(&typed, &spec()).unwrap();
        assert!(report.cross_product.complete);
        assert!(!report.cross_product.exactly_once);
        assert_eq!(report.duplicates.key_combinations, 1);
        assert!(report.has_violation(|v| matches!(
            v,
            StructuralViolation::MissingCombinations { missing: 1 }
        )));
    }

    #[test]
    fn identifier_checks_are_independent_of_cross_product() {
        let mut ds = mapping_table(2, 2);
        ds.rows[3][2] = Value::Int64(7);
        let typed = TypedDataSet::new(&ds).unwrap();
        let report = validate_structure(&typed, &spec()).unwrap();
        assert!(report.cross_product.complete);
        assert!(report.identifier.unique);
        assert_eq!(report.identifier.sequential, Some(false));
        assert_eq!(report.violations, vec![StructuralViolation::NonSequentialIdentifier]);
    }

    #[test]
    fn repeated_identifier_is_reported() {
        let mut ds = mapping_table(2, 2);
        ds.rows[3][2] = Value::Int64(1);
        let typed = TypedDataSet::new(&ds).unwrap();
        let report = validate_structure(&typed, &spec()).unwrap();
        assert!(!report.identifier.unique);
        assert_eq!(report.identifier.duplicate_values, 1);
        assert!(report.has_violation(|v| matches!(
            v,
            StructuralViolation::NonUniqueIdentifier { duplicates: 1 }
        )));
    }

    #[test]
    fn text_identifier_has_no_sequentiality_verdict() {
        let schema = Schema::new(vec![
            Field::new("a", DataType::Utf8),
            Field::new("b", DataType::Utf8),
            Field::new("id", DataType::Utf8),
        ]);
        let ds = DataSet::new(
            schema,
            vec![vec![
                Value::Utf8("x".into()),
                Value::Utf8("y".into()),
                Value::Utf8("x-y".into()),
            ]],
        );
        let typed = TypedDataSet::new(&ds).unwrap();
        let report = validate_structure(&typed, &StructuralKeySpec::new("a", "b", "id")).unwrap();
        assert_eq!(report.identifier.sequential, None);
        assert!(report.is_well_formed());
    }

    #[test]
    fn duplicate_keys_by_name() {
        let mut ds = mapping_table(2, 2);
        ds.rows.push(ds.rows[0].clone());
        let typed = TypedDataSet::new(&ds).unwrap();
        let cols = vec!["SKU_ID".to_string(), "Warehouse_ID".to_string()];
        assert_eq!(duplicate_keys(&typed, &cols).unwrap(), 1);
        assert!(duplicate_keys(&typed, &["nope".to_string()]).is_err());
    }
}
