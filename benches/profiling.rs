//! Column profiling benchmarks.
//!
//! Measures typed-view construction and per-column profiling over mixed-type datasets.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use dataset_integrity::profile::{profile_columns, strong_correlations, ProfileOptions};
use dataset_integrity::typed::TypedDataSet;
use dataset_integrity::types::{DataSet, DataType, Field, Schema, Value};

/// Residual-like data: ids, a categorical marker, and correlated floats with some nulls.
fn generate_residuals(rows: usize) -> DataSet {
    let schema = Schema::new(vec![
        Field::new("Entity", DataType::Int64),
        Field::new("Horizon", DataType::Int64),
        Field::new("Marker", DataType::Utf8),
        Field::new("observed", DataType::Float64),
        Field::new("forecasted", DataType::Float64),
        Field::new("error", DataType::Float64),
    ]);
    let markers = ["A", "B", "C", "D", "E", "F", "G", "H", "I", "J", "K", "L"];
    let rows = (0..rows)
        .map(|row| {
            let observed = (row % 97) as f64 * 1.5;
            let forecasted = observed + (row % 7) as f64 - 3.0;
            vec![
                Value::Int64((row / 12) as i64 + 1),
                Value::Int64((row % 12) as i64 + 1),
                Value::Utf8(markers[row % markers.len()].to_string()),
                Value::Float64(observed),
                if row % 50 == 0 {
                    Value::Null
                } else {
                    Value::Float64(forecasted)
                },
                Value::Float64(forecasted - observed),
            ]
        })
        .collect();
    DataSet::new(schema, rows)
}

fn bench_typed_view(c: &mut Criterion) {
    let mut group = c.benchmark_group("typed_view");
    for rows in [1_000, 10_000, 100_000] {
        let ds = generate_residuals(rows);
        group.throughput(Throughput::Elements(rows as u64));
        group.bench_with_input(BenchmarkId::from_parameter(rows), &ds, |b, ds| {
            b.iter(|| TypedDataSet::new(black_box(ds)).map(|t| t.row_count()))
        });
    }
    group.finish();
}

fn bench_profile_columns(c: &mut Criterion) {
    let mut group = c.benchmark_group("profile_columns");
    let opts = ProfileOptions::default();
    for rows in [1_000, 10_000, 100_000] {
        let ds = generate_residuals(rows);
        let Ok(typed) = TypedDataSet::new(&ds) else {
            continue;
        };
        group.throughput(Throughput::Elements(rows as u64));
        group.bench_with_input(BenchmarkId::from_parameter(rows), &typed, |b, typed| {
            b.iter(|| profile_columns(black_box(typed), &opts))
        });
    }
    group.finish();
}

fn bench_correlations(c: &mut Criterion) {
    let mut group = c.benchmark_group("strong_correlations");
    for rows in [1_000, 100_000] {
        let ds = generate_residuals(rows);
        let Ok(typed) = TypedDataSet::new(&ds) else {
            continue;
        };
        group.throughput(Throughput::Elements(rows as u64));
        group.bench_with_input(BenchmarkId::from_parameter(rows), &typed, |b, typed| {
            b.iter(|| strong_correlations(black_box(typed), 0.5))
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_typed_view,
    bench_profile_columns,
    bench_correlations
);
criterion_main!(benches);
