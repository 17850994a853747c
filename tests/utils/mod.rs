// Shared population generators for integration tests
//
// Records are deterministic functions of their index so expected counts per
// demographic slice can be computed by hand:
//   country  = [FR, DE, US, BR][i % 4]
//   sector   = [Education, Health, Finance][i % 3]
//   job_role = [Manager, Engineer, Teacher, Nurse, Analyst][i % 5]
// A shared latent score drives eq_total, empathy and effectiveness, so those
// three correlate perfectly. Resilience is answered by every 7th record only.

#![allow(dead_code)]

use chrono::{Duration, NaiveDate};
use eq_benchmark::catalog::Metric;
use eq_benchmark::record::{Benchmark, BenchmarkId, DataPoint, Demographics, MetricValues};
use eq_benchmark::source::InMemoryStore;
use std::path::{Path, PathBuf};

pub const COUNTRIES: [&str; 4] = ["FR", "DE", "US", "BR"];
pub const SECTORS: [&str; 3] = ["Education", "Health", "Finance"];
pub const ROLES: [&str; 5] = ["Manager", "Engineer", "Teacher", "Nurse", "Analyst"];

/// Latent ability in [0, 1], spread over 101 distinct levels
pub fn latent(i: usize) -> f64 {
    ((i * 37) % 101) as f64 / 100.0
}

pub fn record(i: usize) -> DataPoint {
    let l = latent(i);
    let mut metrics = MetricValues::new()
        .with(Metric::EqTotal, 80.0 + 40.0 * l)
        .with(Metric::Empathy, 75.0 + 50.0 * l)
        .with(Metric::Optimism, 90.0 + ((i * 13) % 29) as f64)
        .with(Metric::Effectiveness, 70.0 + 55.0 * l)
        .with(Metric::Wellbeing, 85.0 + ((i * 7) % 41) as f64);
    if i % 7 == 0 {
        metrics = metrics.with(Metric::Resilience, (i % 100) as f64);
    }

    let demographics = Demographics {
        country: Some(COUNTRIES[i % 4].to_string()),
        sector: Some(SECTORS[i % 3].to_string()),
        job_role: Some(ROLES[i % 5].to_string()),
        ..Demographics::default()
    };
    let assessed_on =
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + Duration::days((i % 300) as i64);
    DataPoint::new(assessed_on, demographics, metrics)
}

pub fn population(n: usize) -> Vec<DataPoint> {
    (0..n).map(record).collect()
}

pub fn benchmark(id: u64, n: usize) -> Benchmark {
    Benchmark::completed(BenchmarkId(id), format!("Population {}", id), population(n))
}

pub fn store(n: usize) -> InMemoryStore {
    let store = InMemoryStore::new();
    store.insert(benchmark(1, n));
    store
}

/// Write a JSON store holding one benchmark per entry of `sizes` (ids from 1)
pub fn write_store(dir: &Path, sizes: &[usize]) -> PathBuf {
    let store = InMemoryStore::new();
    for (i, n) in sizes.iter().enumerate() {
        store.insert(benchmark(i as u64 + 1, *n));
    }
    let path = dir.join("benchmarks.json");
    store.save_json(&path).unwrap();
    path
}
