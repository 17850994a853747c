//! Engine facade
//!
//! Owns the configuration, a data source and the statistic cache. Each
//! request loads its benchmark once, checks it is ready for analysis, and
//! hands the points to the analysis components.

use crate::cache::{StatCache, VersionKey};
use crate::catalog::Metric;
use crate::compare::{Comparator, ComparisonResult};
use crate::config::EngineConfig;
use crate::error::{EngineError, InsufficientSample, Result};
use crate::fallback::{ConfidenceTier, FallbackResolver, Scope};
use crate::filter::FilterSpec;
use crate::insight::{CorrelationAnalyzer, CorrelationMatrix, TopPerformerProfile, TopPerformerProfiler};
use crate::record::{Benchmark, BenchmarkId, MetricValues};
use crate::sampling::SampleDisclosure;
use crate::source::{DataSource, PointQuery};
use crate::stats::{self, StatResult};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};

/// Descriptive statistics with the scope and precision they were computed at
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedStat {
    pub metric: Metric,
    pub stats: StatResult,
    pub scope: Scope,
    pub confidence: ConfidenceTier,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sampling: Option<SampleDisclosure>,
}

impl ResolvedStat {
    pub fn n(&self) -> usize {
        self.stats.n
    }
}

pub struct BenchmarkEngine<S> {
    config: EngineConfig,
    source: S,
    cache: StatCache,
    resolver: FallbackResolver,
    comparator: Comparator,
    profiler: TopPerformerProfiler,
    correlations: CorrelationAnalyzer,
}

impl<S: DataSource> BenchmarkEngine<S> {
    /// Fails with `InvalidConfig` before any analysis can run
    pub fn new(source: S, config: EngineConfig) -> Result<Self> {
        config.validate().map_err(EngineError::InvalidConfig)?;
        Ok(Self {
            resolver: FallbackResolver::from_config(&config),
            comparator: Comparator::from_config(&config),
            profiler: TopPerformerProfiler::from_config(&config),
            correlations: CorrelationAnalyzer::from_config(&config),
            cache: StatCache::new(),
            config,
            source,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn cache(&self) -> &StatCache {
        &self.cache
    }

    /// Drop cached results for a benchmark that changed
    pub fn invalidate(&self, benchmark: BenchmarkId) {
        self.cache.invalidate(benchmark);
    }

    /// Descriptive statistics for one metric at the narrowest sufficient scope
    pub fn statistic(&self, metric: Metric, filter: &FilterSpec) -> Result<ResolvedStat> {
        let benchmark = self.load(filter)?;
        let version = version_key(&benchmark);

        if self.config.cache_enabled {
            if let Some(hit) = self.cache.statistic(version, metric, filter) {
                return Ok(hit);
            }
        }

        // No narrower scope can hold more values than the whole benchmark
        let global = FilterSpec::global(benchmark.id());
        let global_n = self
            .source
            .aggregate(benchmark.id(), metric, &global)?
            .map_or(0, |a| a.count);
        if global_n < self.config.min_sample_size {
            warn!(metric = %metric, global_n, "statistic withheld before loading rows");
            return Err(EngineError::InsufficientSample(InsufficientSample {
                metric,
                best_available: global_n,
                required: self.config.min_sample_size,
            }));
        }

        // Only rows answering the metric can contribute to its statistic
        let points = self
            .source
            .data_points(&PointQuery::new(global).with_non_null(metric))?;
        let resolution = self.resolver.resolve(&points, filter, metric)?;
        let sampled = self.config.sampler().sample(&resolution.sample.values(metric));
        let stats = stats::calculate_stats(&sampled.items).ok_or_else(|| {
            EngineError::InsufficientSample(InsufficientSample {
                metric,
                best_available: 0,
                required: self.config.min_sample_size,
            })
        })?;

        let resolved = ResolvedStat {
            metric,
            confidence: ConfidenceTier::for_reportable(stats.n),
            stats,
            scope: resolution.scope,
            sampling: sampled.disclosure,
        };
        debug!(metric = %metric, n = resolved.n(), scope = %resolved.scope, "statistic resolved");

        if self.config.cache_enabled {
            self.cache.evict_stale(version.benchmark, version.version);
            self.cache
                .put_statistic(version, metric, filter, resolved.clone());
        }
        Ok(resolved)
    }

    /// Statistics for every catalog metric; unresolvable metrics are returned
    /// as withheld rather than failing the whole request
    pub fn statistics(
        &self,
        filter: &FilterSpec,
    ) -> Result<Vec<std::result::Result<ResolvedStat, InsufficientSample>>> {
        let mut results = Vec::with_capacity(Metric::COUNT);
        for metric in Metric::ALL {
            match self.statistic(*metric, filter) {
                Ok(stat) => results.push(Ok(stat)),
                Err(EngineError::InsufficientSample(insufficient)) => {
                    results.push(Err(insufficient))
                }
                Err(e) => return Err(e),
            }
        }
        Ok(results)
    }

    pub fn correlations(&self, filter: &FilterSpec) -> Result<Arc<CorrelationMatrix>> {
        let benchmark = self.load(filter)?;
        let version = version_key(&benchmark);

        if self.config.cache_enabled {
            if let Some(hit) = self.cache.correlations(version, filter) {
                return Ok(hit);
            }
        }

        let matrix = Arc::new(self.correlations.analyze(benchmark.points(), filter)?);
        if self.config.cache_enabled {
            self.cache.evict_stale(version.benchmark, version.version);
            self.cache
                .put_correlations(version, filter, Arc::clone(&matrix));
        }
        Ok(matrix)
    }

    pub fn top_performers(&self, outcome: Metric, filter: &FilterSpec) -> Result<TopPerformerProfile> {
        let benchmark = self.load(filter)?;
        self.profiler.profile(benchmark.points(), filter, outcome)
    }

    /// Compare one individual's metrics against the filtered population
    pub fn compare(&self, individual: &MetricValues, filter: &FilterSpec) -> Result<ComparisonResult> {
        let benchmark = self.load(filter)?;
        self.comparator
            .compare(benchmark.points(), individual, filter)
    }

    fn load(&self, filter: &FilterSpec) -> Result<Arc<Benchmark>> {
        let benchmark = self.source.benchmark(filter.benchmark())?;
        benchmark.ensure_ready()?;
        Ok(benchmark)
    }
}

fn version_key(benchmark: &Benchmark) -> VersionKey {
    VersionKey {
        benchmark: benchmark.id(),
        version: benchmark.version(),
    }
}
