//! Structural validation and full-collection benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use dataset_integrity::consistency::{evaluate_rules, ConsistencyRule};
use dataset_integrity::engine::{AnalysisEngine, AnalysisOptions};
use dataset_integrity::rules::{DatasetRules, RuleBook};
use dataset_integrity::structure::{validate_structure, StructuralKeySpec};
use dataset_integrity::typed::TypedDataSet;
use dataset_integrity::types::{DataSet, DataSetCollection, DataType, Field, Schema, Value};

fn generate_map(skus: usize, warehouses: usize) -> DataSet {
    let schema = Schema::new(vec![
        Field::new("SKU_ID", DataType::Int64),
        Field::new("Warehouse_ID", DataType::Utf8),
        Field::new("Entity", DataType::Int64),
        Field::new("error", DataType::Float64),
        Field::new("absolute_error", DataType::Float64),
    ]);
    let mut rows = Vec::with_capacity(skus * warehouses);
    for sku in 0..skus {
        for wh in 0..warehouses {
            let entity = rows.len() as i64 + 1;
            let error = ((sku * 31 + wh * 17) % 23) as f64 - 11.0;
            rows.push(vec![
                Value::Int64(sku as i64 + 1),
                Value::Utf8(format!("WH{wh:03}")),
                Value::Int64(entity),
                Value::Float64(error),
                Value::Float64(error.abs()),
            ]);
        }
    }
    DataSet::new(schema, rows)
}

fn bench_validate_structure(c: &mut Criterion) {
    let mut group = c.benchmark_group("validate_structure");
    let spec = StructuralKeySpec::new("SKU_ID", "Warehouse_ID", "Entity");
    for skus in [100, 1_000, 10_000] {
        let ds = generate_map(skus, 10);
        let Ok(typed) = TypedDataSet::new(&ds) else {
            continue;
        };
        group.throughput(Throughput::Elements(ds.row_count() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(ds.row_count()), &typed, |b, typed| {
            b.iter(|| validate_structure(black_box(typed), &spec))
        });
    }
    group.finish();
}

fn bench_consistency(c: &mut Criterion) {
    let mut group = c.benchmark_group("consistency_rules");
    let rules = vec![
        ConsistencyRule::absolute_value("abs", "error", "absolute_error"),
        ConsistencyRule::non_negative("non-negative", "absolute_error"),
    ];
    let ds = generate_map(10_000, 10);
    if let Ok(typed) = TypedDataSet::new(&ds) {
        group.throughput(Throughput::Elements(ds.row_count() as u64));
        group.bench_function("100000_rows", |b| {
            b.iter(|| evaluate_rules(black_box(&typed), &rules))
        });
    }
    group.finish();
}

fn bench_collection(c: &mut Criterion) {
    let mut group = c.benchmark_group("analyze_collection");
    group.sample_size(20);

    let collection = (0..8).fold(DataSetCollection::new(), |c, i| {
        c.with(format!("map_{i}"), generate_map(500, 20))
    });
    let rules = (0..8).fold(RuleBook::new(), |book, i| {
        book.with(
            format!("map_{i}"),
            DatasetRules::default()
                .with_structural_key(StructuralKeySpec::new("SKU_ID", "Warehouse_ID", "Entity")),
        )
    });

    for threads in [1, 4] {
        let Ok(engine) = AnalysisEngine::new(AnalysisOptions {
            num_threads: Some(threads),
            max_in_flight_datasets: threads,
            ..AnalysisOptions::default()
        }) else {
            continue;
        };
        group.bench_with_input(BenchmarkId::new("threads", threads), &engine, |b, engine| {
            b.iter(|| engine.analyze_collection(black_box(&collection), &rules))
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_validate_structure,
    bench_consistency,
    bench_collection
);
criterion_main!(benches);
