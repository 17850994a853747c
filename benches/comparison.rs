//! End-to-end engine benchmark
//!
//! Measures full requests through `BenchmarkEngine`: a scope-relaxing
//! statistic lookup (cold and cached), the correlation matrix, and a full
//! individual comparison with top-performer and correlation context.
//!
//! # Run Instructions
//!
//! ```bash
//! cargo bench --bench comparison
//! ```

use chrono::NaiveDate;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use eq_benchmark::catalog::Metric;
use eq_benchmark::config::EngineConfig;
use eq_benchmark::engine::BenchmarkEngine;
use eq_benchmark::filter::FilterSpec;
use eq_benchmark::record::{Benchmark, BenchmarkId, DataPoint, Demographics, MetricValues};
use eq_benchmark::source::InMemoryStore;

const B: BenchmarkId = BenchmarkId(1);
const COUNTRIES: [&str; 6] = ["FR", "DE", "US", "BR", "JP", "IN"];
const SECTORS: [&str; 4] = ["Education", "Health", "Finance", "Retail"];

fn population(n: usize) -> Vec<DataPoint> {
    let date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap_or_default();
    (0..n)
        .map(|i| {
            let latent = ((i * 37) % 101) as f64 / 100.0;
            let mut metrics = MetricValues::new();
            for (k, metric) in Metric::ALL.iter().enumerate() {
                let range = metric.range();
                let noise = ((i * (k + 3)) % 17) as f64 / 17.0;
                let value = range.min + (range.max - range.min) * (0.6 * latent + 0.4 * noise);
                metrics = metrics.with(*metric, value);
            }
            let demographics = Demographics {
                country: Some(COUNTRIES[i % COUNTRIES.len()].to_string()),
                sector: Some(SECTORS[i % SECTORS.len()].to_string()),
                ..Demographics::default()
            };
            DataPoint::new(date, demographics, metrics)
        })
        .collect()
}

fn engine(n: usize, cache_enabled: bool) -> BenchmarkEngine<InMemoryStore> {
    let store = InMemoryStore::new();
    store.insert(Benchmark::completed(B, "bench", population(n)));
    let config = EngineConfig {
        cache_enabled,
        ..EngineConfig::default()
    };
    match BenchmarkEngine::new(store, config) {
        Ok(engine) => engine,
        Err(e) => panic!("bench engine: {}", e),
    }
}

fn bench_statistic(c: &mut Criterion) {
    let filter = FilterSpec::from_expr(B, "country=FR,sector=Health").unwrap_or_else(|e| panic!("{}", e));
    let mut group = c.benchmark_group("statistic");

    let cold = engine(20_000, false);
    group.bench_function("uncached", |b| {
        b.iter(|| cold.statistic(Metric::Empathy, black_box(&filter)));
    });

    let warm = engine(20_000, true);
    group.bench_function("cached", |b| {
        b.iter(|| warm.statistic(Metric::Empathy, black_box(&filter)));
    });
    group.finish();
}

fn bench_correlations(c: &mut Criterion) {
    let engine = engine(20_000, false);
    let filter = FilterSpec::global(B);
    c.bench_function("correlation_matrix", |b| {
        b.iter(|| engine.correlations(black_box(&filter)));
    });
}

fn bench_compare(c: &mut Criterion) {
    let engine = engine(20_000, true);
    let filter = FilterSpec::from_expr(B, "country=DE").unwrap_or_else(|e| panic!("{}", e));
    let individual = Metric::ALL.iter().fold(MetricValues::new(), |values, metric| {
        let range = metric.range();
        values.with(*metric, (range.min + range.max) / 2.0)
    });

    c.bench_function("compare_individual", |b| {
        b.iter(|| engine.compare(black_box(&individual), black_box(&filter)));
    });
}

criterion_group!(benches, bench_statistic, bench_correlations, bench_compare);
criterion_main!(benches);
