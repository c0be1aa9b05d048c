#![allow(dead_code)]

use dataset_integrity::types::{DataSet, DataType, Field, Schema, Value};

/// Mapping table assigning a sequential `Entity` to every `SKU_ID` × `Warehouse_ID` pair.
pub fn sku_warehouse_map(skus: i64, warehouses: usize) -> DataSet {
    let schema = Schema::new(vec![
        Field::new("SKU_ID", DataType::Int64),
        Field::new("Warehouse_ID", DataType::Utf8),
        Field::new("Entity", DataType::Int64),
    ]);
    let mut rows = Vec::new();
    for sku in 1..=skus {
        for wh in 0..warehouses {
            let entity = rows.len() as i64 + 1;
            rows.push(vec![
                Value::Int64(sku),
                Value::Utf8(format!("WH{:02}", wh + 1)),
                Value::Int64(entity),
            ]);
        }
    }
    DataSet::new(schema, rows)
}

/// Forecast residuals per `Entity` and `Horizon`, with a consistent `absolute_error`.
pub fn residuals(entities: i64, horizons: i64) -> DataSet {
    let schema = Schema::new(vec![
        Field::new("Entity", DataType::Int64),
        Field::new("Horizon", DataType::Int64),
        Field::new("error", DataType::Float64),
        Field::new("absolute_error", DataType::Float64),
    ]);
    let mut rows = Vec::new();
    for entity in 1..=entities {
        for horizon in 1..=horizons {
            let error = ((entity * 7 + horizon * 3) % 11) as f64 - 5.0;
            rows.push(vec![
                Value::Int64(entity),
                Value::Int64(horizon),
                Value::Float64(error * 0.5),
                Value::Float64((error * 0.5).abs()),
            ]);
        }
    }
    DataSet::new(schema, rows)
}

/// Product attributes keyed by `SKU_ID`.
pub fn sku_attributes(skus: i64) -> DataSet {
    let schema = Schema::new(vec![
        Field::new("SKU_ID", DataType::Int64),
        Field::new("Brand", DataType::Utf8),
        Field::new("Price", DataType::Float64),
    ]);
    let rows = (1..=skus)
        .map(|sku| {
            vec![
                Value::Int64(sku),
                Value::Utf8(["Fizz", "Pop", "Cola"][(sku % 3) as usize].to_string()),
                Value::Float64(0.5 + sku as f64 * 0.25),
            ]
        })
        .collect();
    DataSet::new(schema, rows)
}
