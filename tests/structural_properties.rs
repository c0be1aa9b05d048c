mod common;

use dataset_integrity::keys::{detect_composite_key, detect_key, KeyVerdict};
use dataset_integrity::structure::{
    duplicate_rows, validate_structure, StructuralKeySpec, StructuralViolation,
};
use dataset_integrity::typed::TypedDataSet;
use dataset_integrity::types::{DataSet, DataType, Field, Schema, Value};

use common::sku_warehouse_map;

fn spec() -> StructuralKeySpec {
    StructuralKeySpec::new("SKU_ID", "Warehouse_ID", "Entity")
}

#[test]
fn four_skus_by_three_warehouses_is_well_formed() {
    let ds = sku_warehouse_map(4, 3);
    let typed = TypedDataSet::new(&ds).unwrap();
    let report = validate_structure(&typed, &spec()).unwrap();

    assert_eq!(report.cross_product.expected, 12);
    assert_eq!(report.cross_product.actual, 12);
    assert!(report.cross_product.complete);
    assert!(report.cross_product.exactly_once);
    assert!(report.mapping.is_mapping_key);
    assert!(report.identifier.unique);
    assert_eq!(report.identifier.sequential, Some(true));
    assert_eq!(report.duplicates.full_rows, 0);
    assert_eq!(report.duplicates.key_combinations, 0);
    assert!(report.is_well_formed());

    let entity = detect_key(&typed, "Entity").unwrap();
    assert!(entity.unique && entity.sequential);
    assert_eq!(entity.verdict, KeyVerdict::Sequential);

    let composite = detect_composite_key(&typed, "SKU_ID", "Warehouse_ID").unwrap();
    assert!(composite.unique);
    assert_eq!(composite.cardinality.max, Some(1));

    // Every SKU appears once per warehouse.
    let sku = detect_key(&typed, "SKU_ID").unwrap();
    assert!(sku.occurrences.uniform);
    assert_eq!(sku.occurrences.min, Some(3));
}

#[test]
fn cross_product_holds_for_every_full_grid() {
    for skus in 1..=6 {
        for warehouses in 1..=5 {
            let ds = sku_warehouse_map(skus, warehouses);
            let typed = TypedDataSet::new(&ds).unwrap();
            let report = validate_structure(&typed, &spec()).unwrap();
            assert!(
                report.cross_product.complete,
                "{skus}x{warehouses} should be complete"
            );
            assert_eq!(report.cross_product.expected, skus as usize * warehouses);
        }
    }
}

#[test]
fn removing_one_row_breaks_the_cross_product_by_one() {
    let mut ds = sku_warehouse_map(4, 3);
    ds.rows.remove(4);
    assert_eq!(ds.row_count(), 11);

    let typed = TypedDataSet::new(&ds).unwrap();
    let report = validate_structure(&typed, &spec()).unwrap();
    assert!(!report.cross_product.complete);
    assert_eq!(report.cross_product.expected - report.cross_product.actual, 1);
    assert!(report.has_violation(|v| matches!(
        v,
        StructuralViolation::IncompleteCrossProduct { expected: 12, actual: 11 }
    )));
    // Entity now skips a value, independently of the cross-product verdict.
    assert!(report.has_violation(|v| *v == StructuralViolation::NonSequentialIdentifier));
}

#[test]
fn duplicating_one_row_increments_both_duplicate_counts() {
    let mut ds = sku_warehouse_map(4, 3);
    let before = {
        let typed = TypedDataSet::new(&ds).unwrap();
        validate_structure(&typed, &spec()).unwrap().duplicates
    };

    ds.rows.push(ds.rows[7].clone());
    let typed = TypedDataSet::new(&ds).unwrap();
    let report = validate_structure(&typed, &spec()).unwrap();

    assert_eq!(report.duplicates.full_rows, before.full_rows + 1);
    assert_eq!(report.duplicates.key_combinations, before.key_combinations + 1);
    assert_eq!(duplicate_rows(&typed), 1);
    assert!(!report.cross_product.complete);
    assert!(!report.cross_product.exactly_once);
    assert!(report.has_violation(|v| matches!(
        v,
        StructuralViolation::NonUniqueIdentifier { duplicates: 1 }
    )));
    // The duplicated pair still maps to a single Entity.
    assert!(report.mapping.is_mapping_key);
}

#[test]
fn conflicting_identifier_is_an_ambiguous_mapping() {
    let mut ds = sku_warehouse_map(2, 2);
    let mut conflicting = ds.rows[0].clone();
    conflicting[2] = Value::Int64(99);
    ds.rows.push(conflicting);

    let typed = TypedDataSet::new(&ds).unwrap();
    let report = validate_structure(&typed, &spec()).unwrap();
    assert!(report.has_violation(|v| matches!(v, StructuralViolation::AmbiguousMapping { groups: 1 })));
    assert_eq!(report.duplicates.full_rows, 0);
    assert_eq!(report.duplicates.key_combinations, 1);
}

#[test]
fn zero_rows_is_a_complete_cross_product() {
    let ds = sku_warehouse_map(0, 3);
    let typed = TypedDataSet::new(&ds).unwrap();
    let report = validate_structure(&typed, &spec()).unwrap();
    assert_eq!(report.cross_product.expected, 0);
    assert!(report.cross_product.complete);
    assert!(report.is_well_formed());
}

#[test]
fn all_null_key_column_is_reported_not_raised() {
    let mut ds = sku_warehouse_map(2, 2);
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
fn null_key_cell_does_not_stand_in_for_a_missing_pair() {
    let schema = Schema::new(vec![
        Field::new("SKU_ID", DataType::Int64),
        Field::new("Warehouse_ID", DataType::Int64),
        Field::new("Entity", DataType::Int64),
    ]);
    let rows = [(1, Some(1)), (1, Some(2)), (2, Some(1)), (2, None)]
        .iter()
        .zip(1..)
        .map(|(&(sku, wh), entity)| {
            vec![
                Value::Int64(sku),
                wh.map_or(Value::Null, Value::Int64),
                Value::Int64(entity),
            ]
        })
        .collect();
    let ds = DataSet::new(schema, rows);
    let typed = TypedDataSet::new(&ds).unwrap();
    let report = validate_structure(&typed, &spec()).unwrap();

    let cp = &report.cross_product;
    assert_eq!((cp.expected, cp.actual), (4, 4));
    assert!(cp.complete);
    assert_eq!(cp.observed_combinations, 4);
    assert_eq!(cp.domain_combinations, 3);
    assert!(!cp.exactly_once);
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
