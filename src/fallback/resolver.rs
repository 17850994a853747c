// Progressive scope relaxation
//
// The requested filter is tried first. While the measured sample stays under
// the threshold, the most specific remaining dimension is dropped and the
// filter re-evaluated, ending at the global scope of the benchmark.

use super::confidence::ConfidenceTier;
use super::scope::Scope;
use crate::catalog::Metric;
use crate::config::EngineConfig;
use crate::error::{EngineError, InsufficientSample, Result};
use crate::filter::{FilterSpec, FilteredSample, SampleFilter};
use crate::record::DataPoint;
use serde::Serialize;
use tracing::{debug, info};

/// One scope evaluated during a walk, for diagnostics
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScopeAttempt {
    pub scope: String,
    pub n: usize,
}

/// Outcome of walking the scope chain with a probe
#[derive(Debug, Clone)]
pub enum Walk<T> {
    /// First scope whose measured `n` met the threshold
    Found {
        scope: Scope,
        n: usize,
        value: T,
        attempts: Vec<ScopeAttempt>,
    },
    /// Even the global scope fell short
    Exhausted {
        best_available: usize,
        attempts: Vec<ScopeAttempt>,
    },
}

impl<T> Walk<T> {
    pub fn attempts(&self) -> &[ScopeAttempt] {
        match self {
            Walk::Found { attempts, .. } | Walk::Exhausted { attempts, .. } => attempts,
        }
    }
}

/// A metric population resolved at the narrowest sufficient scope
#[derive(Debug, Clone)]
pub struct Resolution<'a> {
    pub scope: Scope,
    pub sample: FilteredSample<'a>,
    /// Metric-specific `n` at the resolved scope
    pub n: usize,
    pub confidence: ConfidenceTier,
    pub attempts: Vec<ScopeAttempt>,
}

/// Walks from the requested scope toward global until a sample is large enough
#[derive(Debug, Clone, Copy)]
pub struct FallbackResolver {
    min_sample_size: usize,
    filter: SampleFilter,
}

impl FallbackResolver {
    pub fn new(min_sample_size: usize, filter: SampleFilter) -> Self {
        Self {
            min_sample_size,
            filter,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(
            config.min_sample_size,
            SampleFilter::new(config.deduplicate_subjects),
        )
    }

    pub fn min_sample_size(&self) -> usize {
        self.min_sample_size
    }

    pub fn sample_filter(&self) -> SampleFilter {
        self.filter
    }

    /// Scopes in evaluation order: the request itself, then one fewer
    /// dimension per step, ending at global.
    pub fn scope_chain(requested: &FilterSpec) -> Vec<Scope> {
        let mut chain = vec![Scope::exact(requested.clone())];
        let mut current = requested.clone();
        let mut relaxed = Vec::new();
        for dimension in requested.active_dimensions() {
            current = current.without(dimension);
            relaxed.push(dimension);
            chain.push(Scope::new(current.clone(), relaxed.clone()));
        }
        chain
    }

    /// Walk the chain, measuring each scope with `probe`, until the measured
    /// `n` reaches `threshold`.
    pub fn search<T, F>(&self, requested: &FilterSpec, threshold: usize, mut probe: F) -> Result<Walk<T>>
    where
        F: FnMut(&FilterSpec) -> Result<(usize, T)>,
    {
        let mut attempts = Vec::new();
        let mut best_available = 0;

        for scope in Self::scope_chain(requested) {
            let (n, value) = probe(&scope.filter)?;
            debug!(scope = %scope.filter.describe(), n, threshold, "evaluated scope");
            attempts.push(ScopeAttempt {
                scope: scope.filter.describe(),
                n,
            });
            best_available = best_available.max(n);

            if n >= threshold {
                if scope.is_relaxed() {
                    info!(
                        requested = %requested.describe(),
                        resolved = %scope.describe(),
                        n,
                        "scope relaxed to reach minimum sample"
                    );
                }
                return Ok(Walk::Found {
                    scope,
                    n,
                    value,
                    attempts,
                });
            }
        }

        Ok(Walk::Exhausted {
            best_available,
            attempts,
        })
    }

    /// Resolve the population for one metric.
    ///
    /// Fails with `InsufficientSample` when no scope, global included, holds
    /// `min_sample_size` non-null values of `metric`.
    pub fn resolve<'a>(
        &self,
        points: &'a [DataPoint],
        requested: &FilterSpec,
        metric: Metric,
    ) -> Result<Resolution<'a>> {
        self.resolve_with(points, requested, metric, self.min_sample_size, |sample| {
            sample.n_for(metric)
        })
    }

    /// Like [`resolve`](Self::resolve), but a scope is accepted only once
    /// `measure` reaches `threshold`. The reported `n` is still the metric's
    /// own `n`; on failure `best_available` is the largest measured value.
    pub fn resolve_with<'a, F>(
        &self,
        points: &'a [DataPoint],
        requested: &FilterSpec,
        metric: Metric,
        threshold: usize,
        mut measure: F,
    ) -> Result<Resolution<'a>>
    where
        F: FnMut(&FilteredSample<'a>) -> usize,
    {
        let walk = self.search(requested, threshold, |spec| {
            let sample = self.filter.apply(points, spec);
            Ok((measure(&sample), sample))
        })?;

        match walk {
            Walk::Found {
                scope,
                value: sample,
                attempts,
                ..
            } => {
                let n = sample.n_for(metric);
                Ok(Resolution {
                    scope,
                    n,
                    confidence: ConfidenceTier::for_reportable(n),
                    sample,
                    attempts,
                })
            }
            Walk::Exhausted { best_available, .. } => {
                Err(EngineError::InsufficientSample(InsufficientSample {
                    metric,
                    best_available,
                    required: threshold,
                }))
            }
        }
    }
}
