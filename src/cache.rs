//! Statistic cache keyed by benchmark version
//!
//! Every key carries the benchmark id and version it was computed against,
//! so a re-imported benchmark can never serve stale results. `invalidate`
//! additionally drops the memory held for a benchmark.

use crate::catalog::Metric;
use crate::engine::ResolvedStat;
use crate::filter::FilterSpec;
use crate::insight::CorrelationMatrix;
use crate::record::BenchmarkId;
use dashmap::DashMap;
use fnv::FnvBuildHasher;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Benchmark identity a cached value was computed against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VersionKey {
    pub benchmark: BenchmarkId,
    pub version: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub statistics: usize,
    pub correlations: usize,
    pub hits: u64,
    pub misses: u64,
}

#[derive(Debug, Default)]
pub struct StatCache {
    statistics: DashMap<(VersionKey, Metric, FilterSpec), ResolvedStat, FnvBuildHasher>,
    correlations: DashMap<(VersionKey, FilterSpec), Arc<CorrelationMatrix>, FnvBuildHasher>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl StatCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn statistic(
        &self,
        version: VersionKey,
        metric: Metric,
        filter: &FilterSpec,
    ) -> Option<ResolvedStat> {
        let found = self
            .statistics
            .get(&(version, metric, filter.clone()))
            .map(|entry| entry.value().clone());
        self.record(found.is_some());
        found
    }

    pub fn put_statistic(
        &self,
        version: VersionKey,
        metric: Metric,
        filter: &FilterSpec,
        stat: ResolvedStat,
    ) {
        self.statistics.insert((version, metric, filter.clone()), stat);
    }

    pub fn correlations(
        &self,
        version: VersionKey,
        filter: &FilterSpec,
    ) -> Option<Arc<CorrelationMatrix>> {
        let found = self
            .correlations
            .get(&(version, filter.clone()))
            .map(|entry| Arc::clone(entry.value()));
        self.record(found.is_some());
        found
    }

    pub fn put_correlations(
        &self,
        version: VersionKey,
        filter: &FilterSpec,
        matrix: Arc<CorrelationMatrix>,
    ) {
        self.correlations.insert((version, filter.clone()), matrix);
    }

    /// Drop every entry computed against any version of `benchmark`
    pub fn invalidate(&self, benchmark: BenchmarkId) {
        let before = self.statistics.len() + self.correlations.len();
        self.statistics.retain(|(v, _, _), _| v.benchmark != benchmark);
        self.correlations.retain(|(v, _), _| v.benchmark != benchmark);
        let dropped = before - (self.statistics.len() + self.correlations.len());
        debug!(benchmark = %benchmark, dropped, "cache invalidated");
    }

    /// Drop entries of `benchmark` computed against versions other than `current`
    pub fn evict_stale(&self, benchmark: BenchmarkId, current: u32) {
        self.statistics
            .retain(|(v, _, _), _| v.benchmark != benchmark || v.version == current);
        self.correlations
            .retain(|(v, _), _| v.benchmark != benchmark || v.version == current);
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            statistics: self.statistics.len(),
            correlations: self.correlations.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    fn record(&self, hit: bool) {
        let counter = if hit { &self.hits } else { &self.misses };
        counter.fetch_add(1, Ordering::Relaxed);
    }
}
