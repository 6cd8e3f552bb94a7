//! Benchmarks for column profiling and type inference.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::hint::black_box;
use std::time::Duration;
use canary_guard::analyzers::{ColumnProfiler, DataInsights, ProfilerConfig, TypeInferenceEngine};
use canary_guard::dataset::Column;
use canary_guard::test_fixtures::generated_dataset;

fn bench_single_column_profiling(c: &mut Criterion) {
    let dataset = generated_dataset(10_000).unwrap();

    let mut group = c.benchmark_group("single_column_profiling");
    group.measurement_time(Duration::from_secs(8));

    let test_cases = vec![
        ("integer_unique", "id"),
        ("float_with_outliers", "measure"),
        ("string_low_cardinality", "category"),
        ("string_high_cardinality", "email"),
    ];

    for (name, column) in test_cases {
        let profiler = ColumnProfiler::new();
        let column = dataset.column(column).unwrap();
        group.bench_with_input(BenchmarkId::new("default_config", name), column, |b, column| {
            b.iter(|| profiler.profile_column(black_box(column)));
        });
    }

    group.finish();
}

fn bench_profiler_configurations(c: &mut Criterion) {
    let dataset = generated_dataset(10_000).unwrap();

    let mut group = c.benchmark_group("profiler_configurations");

    let configs = vec![
        ("default", ColumnProfiler::new()),
        ("minimal", ColumnProfiler::builder().config(ProfilerConfig::minimal()).build()),
        ("large_sample", ColumnProfiler::builder().sample_size(100).build()),
    ];

    for (name, profiler) in configs {
        group.bench_function(name, |b| {
            b.iter(|| profiler.profile_dataset(black_box(&dataset)));
        });
    }

    group.finish();
}

fn bench_dataset_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("dataset_scaling");

    for rows in [1_000usize, 10_000, 100_000] {
        let dataset = generated_dataset(rows).unwrap();
        let profiler = ColumnProfiler::new();
        group.throughput(Throughput::Elements(rows as u64));
        group.bench_with_input(BenchmarkId::from_parameter(rows), &dataset, |b, dataset| {
            b.iter(|| {
                let profiles = profiler.profile_dataset(black_box(dataset));
                DataInsights::from_profiles(&profiles)
            });
        });
    }

    group.finish();
}

fn bench_text_inference(c: &mut Criterion) {
    let engine = TypeInferenceEngine::new();
    let numbers = Column::new(
        "amount",
        (0..10_000).map(|i| format!("{}.{:02}", i, i % 100)).collect::<Vec<_>>(),
    );
    let dates = Column::new(
        "booked_at",
        (0..10_000)
            .map(|i| format!("2024-{:02}-{:02}", i % 12 + 1, i % 28 + 1))
            .collect::<Vec<_>>(),
    );

    let mut group = c.benchmark_group("type_inference");
    group.bench_function("numeric_text", |b| b.iter(|| engine.infer_column(black_box(&numbers))));
    group.bench_function("date_text", |b| b.iter(|| engine.infer_column(black_box(&dates))));
    group.finish();
}

criterion_group!(
    benches,
    bench_single_column_profiling,
    bench_profiler_configurations,
    bench_dataset_scaling,
    bench_text_inference
);
criterion_main!(benches);
