//! Data source contracts and the in-memory JSON store
//!
//! The engine never reaches into storage directly. It asks a [`DataSource`]
//! for a benchmark, for matching raw points, or for a cheap aggregate used
//! to rule out hopeless requests before any rows are pulled.

use crate::catalog::Metric;
use crate::error::{EngineError, Result};
use crate::filter::FilterSpec;
use crate::record::{Benchmark, BenchmarkId, DataPoint};
use anyhow::Context;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Raw point query: benchmark, demographic equality filters, and an
/// optional metric that must be non-null
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PointQuery {
    pub filter: FilterSpec,
    pub non_null: Option<Metric>,
}

impl PointQuery {
    pub fn new(filter: FilterSpec) -> Self {
        Self {
            filter,
            non_null: None,
        }
    }

    pub fn with_non_null(mut self, metric: Metric) -> Self {
        self.non_null = Some(metric);
        self
    }

    pub fn matches(&self, point: &DataPoint) -> bool {
        self.filter.matches(point) && self.non_null.map_or(true, |m| point.value(m).is_some())
    }
}

/// Count/mean/min/max of one metric over a filtered population
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Aggregate {
    pub count: usize,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
}

impl Aggregate {
    /// `None` for an empty input
    pub fn of(values: impl IntoIterator<Item = f64>) -> Option<Self> {
        let mut count = 0usize;
        let mut sum = 0.0;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for v in values {
            count += 1;
            sum += v;
            min = min.min(v);
            max = max.max(v);
        }
        (count > 0).then(|| Aggregate {
            count,
            mean: sum / count as f64,
            min,
            max,
        })
    }
}

/// Query capabilities the engine needs from storage
pub trait DataSource: Send + Sync {
    fn benchmark(&self, id: BenchmarkId) -> Result<Arc<Benchmark>>;

    fn data_points(&self, query: &PointQuery) -> Result<Vec<DataPoint>>;

    /// Aggregate of `metric` over the filtered population, `None` when no
    /// record carries a value
    fn aggregate(&self, id: BenchmarkId, metric: Metric, filter: &FilterSpec)
        -> Result<Option<Aggregate>>;
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreFile {
    benchmarks: Vec<Benchmark>,
}

/// Benchmarks held in memory, loadable from and savable to JSON
#[derive(Debug, Default)]
pub struct InMemoryStore {
    benchmarks: DashMap<BenchmarkId, Arc<Benchmark>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a `{"benchmarks": [...]}` document
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path.as_ref()).with_context(|| {
            format!("Failed to read benchmark data: {}", path.as_ref().display())
        })?;
        let store = Self::from_json_str(&content)
            .with_context(|| format!("Invalid benchmark data in {}", path.as_ref().display()))?;
        info!(
            path = %path.as_ref().display(),
            benchmarks = store.len(),
            "loaded benchmark store"
        );
        Ok(store)
    }

    /// Parse a store document. Every stored value must lie in its metric's
    /// canonical range; the first offending row fails the whole load.
    pub fn from_json_str(content: &str) -> anyhow::Result<Self> {
        let file: StoreFile =
            serde_json::from_str(content).context("Failed to parse benchmark JSON")?;
        let store = Self::new();
        for benchmark in file.benchmarks {
            for (row, point) in benchmark.points().iter().enumerate() {
                point
                    .metrics()
                    .check_ranges()
                    .with_context(|| format!("Benchmark {} row {}", benchmark.id(), row))?;
            }
            store.insert(benchmark);
        }
        Ok(store)
    }

    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let mut benchmarks: Vec<Benchmark> = self
            .benchmarks
            .iter()
            .map(|entry| Benchmark::clone(entry.value()))
            .collect();
        benchmarks.sort_by_key(|b| b.id());
        let json = serde_json::to_string_pretty(&StoreFile { benchmarks })
            .context("Failed to serialize benchmark store")?;
        fs::write(path.as_ref(), json).with_context(|| {
            format!("Failed to write benchmark data: {}", path.as_ref().display())
        })?;
        Ok(())
    }

    /// Insert or replace a benchmark, returning the previous version
    pub fn insert(&self, benchmark: Benchmark) -> Option<Arc<Benchmark>> {
        debug!(
            id = %benchmark.id(),
            version = benchmark.version(),
            rows = benchmark.total_rows(),
            "storing benchmark"
        );
        self.benchmarks.insert(benchmark.id(), Arc::new(benchmark))
    }

    pub fn remove_benchmark(&self, id: BenchmarkId) -> Option<Arc<Benchmark>> {
        self.benchmarks.remove(&id).map(|(_, b)| b)
    }

    /// Stored ids in ascending order
    pub fn ids(&self) -> Vec<BenchmarkId> {
        let mut ids: Vec<BenchmarkId> = self.benchmarks.iter().map(|e| *e.key()).collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.benchmarks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.benchmarks.is_empty()
    }
}

impl DataSource for InMemoryStore {
    fn benchmark(&self, id: BenchmarkId) -> Result<Arc<Benchmark>> {
        self.benchmarks
            .get(&id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or(EngineError::UnknownBenchmark(id))
    }

    fn data_points(&self, query: &PointQuery) -> Result<Vec<DataPoint>> {
        let benchmark = self.benchmark(query.filter.benchmark())?;
        Ok(benchmark
            .points()
            .iter()
            .filter(|p| query.matches(p))
            .cloned()
            .collect())
    }

    fn aggregate(
        &self,
        id: BenchmarkId,
        metric: Metric,
        filter: &FilterSpec,
    ) -> Result<Option<Aggregate>> {
        let benchmark = self.benchmark(id)?;
        Ok(Aggregate::of(
            benchmark
                .points()
                .iter()
                .filter(|p| filter.matches(p))
                .filter_map(|p| p.value(metric)),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Demographics, MetricValues};
    use chrono::NaiveDate;

    fn point(country: &str, empathy: Option<f64>) -> DataPoint {
        let demographics = Demographics {
            country: Some(country.to_string()),
            ..Demographics::default()
        };
        let metrics = empathy.map_or_else(MetricValues::new, |v| {
            MetricValues::new().with(Metric::Empathy, v)
        });
        DataPoint::new(
            NaiveDate::from_ymd_opt(2024, 5, 2).unwrap(),
            demographics,
            metrics,
        )
    }

    fn store() -> InMemoryStore {
        let store = InMemoryStore::new();
        store.insert(Benchmark::completed(
            BenchmarkId(1),
            "Europe 2024",
            vec![
                point("FR", Some(100.0)),
                point("FR", None),
                point("FR", Some(110.0)),
                point("DE", Some(90.0)),
            ],
        ));
        store
    }

    #[test]
    fn test_unknown_benchmark() {
        assert_eq!(
            store().benchmark(BenchmarkId(9)).unwrap_err(),
            EngineError::UnknownBenchmark(BenchmarkId(9))
        );
    }

    #[test]
    fn test_data_points_with_non_null_constraint() {
        let store = store();
        let fr = FilterSpec::from_expr(BenchmarkId(1), "country=FR").unwrap();

        assert_eq!(store.data_points(&PointQuery::new(fr.clone())).unwrap().len(), 3);
        let answered = store
            .data_points(&PointQuery::new(fr).with_non_null(Metric::Empathy))
            .unwrap();
        assert_eq!(answered.len(), 2);
    }

    #[test]
    fn test_aggregate() {
        let store = store();
        let fr = FilterSpec::from_expr(BenchmarkId(1), "country=FR").unwrap();
        let aggregate = store
            .aggregate(BenchmarkId(1), Metric::Empathy, &fr)
            .unwrap()
            .unwrap();
        assert_eq!(aggregate.count, 2);
        assert_eq!(aggregate.mean, 105.0);
        assert_eq!(aggregate.min, 100.0);
        assert_eq!(aggregate.max, 110.0);

        assert_eq!(
            store
                .aggregate(BenchmarkId(1), Metric::Optimism, &fr)
                .unwrap(),
            None
        );
    }

    #[test]
    fn test_insert_replaces_and_remove() {
        let store = store();
        let previous = store.insert(Benchmark::completed(BenchmarkId(1), "v2", Vec::new()));
        assert_eq!(previous.unwrap().name(), "Europe 2024");
        assert_eq!(store.benchmark(BenchmarkId(1)).unwrap().name(), "v2");

        assert!(store.remove_benchmark(BenchmarkId(1)).is_some());
        assert!(store.is_empty());
    }

    #[test]
    fn test_json_round_trip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        store().save_json(&path).unwrap();

        let loaded = InMemoryStore::from_json_file(&path).unwrap();
        assert_eq!(loaded.ids(), vec![BenchmarkId(1)]);
        let benchmark = loaded.benchmark(BenchmarkId(1)).unwrap();
        assert_eq!(benchmark.total_rows(), 4);
        assert_eq!(benchmark.points()[1].value(Metric::Empathy), None);
    }

    #[test]
    fn test_out_of_range_value_rejected_on_load() {
        let store = InMemoryStore::new();
        store.insert(Benchmark::completed(
            BenchmarkId(3),
            "bad import",
            vec![point("FR", Some(100.0)), point("FR", Some(300.0))],
        ));
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        store.save_json(&path).unwrap();

        let err = InMemoryStore::from_json_file(&path).unwrap_err();
        let chain = format!("{:#}", err);
        assert!(chain.contains("Benchmark #3 row 1"));
        assert!(chain.contains("empathy outside canonical range"));
        assert!(matches!(
            err.root_cause().downcast_ref::<EngineError>(),
            Some(EngineError::ValueOutOfRange { .. })
        ));
    }

    #[test]
    fn test_malformed_json_has_context() {
        let err = InMemoryStore::from_json_str("{\"benchmarks\": 3}").unwrap_err();
        assert!(err.to_string().contains("Failed to parse benchmark JSON"));
    }
}
