//! Comparison of one individual against a benchmark population
//!
//! Each submitted metric is resolved independently: a slice that is large
//! enough for `eq_total` may be too small for a sparsely answered talent,
//! so metrics in one report can carry different scopes and confidence
//! tiers. The report then adds the top-performer profile and correlation
//! context for the individual's strongest outcome.

mod report;

pub use report::{
    Classification, ComparisonReport, ComparisonResult, MetricComparison, MetricEntry,
};

use crate::catalog::Metric;
use crate::config::EngineConfig;
use crate::error::{EngineError, InsufficientSample, Result};
use crate::fallback::{ConfidenceTier, FallbackResolver};
use crate::filter::FilterSpec;
use crate::insight::{CorrelationAnalyzer, TopPerformerProfiler};
use crate::record::{DataPoint, MetricValues};
use crate::sampling::PopulationSampler;
use crate::stats;
use tracing::{info, warn};

/// Reject individual values outside their metric's canonical range
pub fn validate_individual(individual: &MetricValues) -> Result<()> {
    individual.check_ranges()
}

/// Builds [`ComparisonResult`]s from an engine configuration
#[derive(Debug, Clone, Copy)]
pub struct Comparator {
    resolver: FallbackResolver,
    sampler: PopulationSampler,
    profiler: TopPerformerProfiler,
    correlations: CorrelationAnalyzer,
    strength_threshold: f64,
    growth_threshold: f64,
}

impl Comparator {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            resolver: FallbackResolver::from_config(config),
            sampler: config.sampler(),
            profiler: TopPerformerProfiler::from_config(config),
            correlations: CorrelationAnalyzer::from_config(config),
            strength_threshold: config.strength_threshold,
            growth_threshold: config.growth_threshold,
        }
    }

    /// Compare `individual` against the population selected by `filter`.
    ///
    /// Structural problems (out-of-range values) fail immediately. Metrics
    /// that cannot be resolved are withheld; when none can be ranked the
    /// result is `InsufficientPopulation`.
    pub fn compare(
        &self,
        points: &[DataPoint],
        individual: &MetricValues,
        filter: &FilterSpec,
    ) -> Result<ComparisonResult> {
        validate_individual(individual)?;

        let mut entries = Vec::with_capacity(individual.present_count());
        for (metric, value) in individual.iter() {
            entries.push(self.compare_metric(points, filter, metric, value)?);
        }

        if !entries.iter().any(|e| matches!(e, MetricEntry::Ranked(_))) {
            warn!(filter = %filter, "no metric could be ranked");
            let withheld = entries
                .into_iter()
                .filter_map(|e| match e {
                    MetricEntry::Withheld(w) => Some(w),
                    MetricEntry::Ranked(_) => None,
                })
                .collect();
            return Ok(ComparisonResult::InsufficientPopulation { withheld });
        }

        let strongest_outcome = strongest_outcome(&entries);
        let mut notes = Vec::new();
        let mut top_performers = None;
        let mut correlations = None;

        if let Some(outcome) = strongest_outcome {
            match self.profiler.profile(points, filter, outcome) {
                Ok(profile) => top_performers = Some(profile),
                Err(EngineError::InsufficientSample(insufficient)) => {
                    notes.push(format!(
                        "No top-performer profile for {}: top group n={} is below the required {}.",
                        outcome, insufficient.best_available, insufficient.required
                    ));
                }
                Err(e) => return Err(e),
            }

            let matrix = self.correlations.analyze_outcomes(points, filter, &[outcome])?;
            correlations = matrix.groups.into_iter().next();
        }

        info!(
            filter = %filter,
            ranked = entries.iter().filter(|e| e.as_ranked().is_some()).count(),
            submitted = entries.len(),
            "comparison complete"
        );

        Ok(ComparisonResult::Report(ComparisonReport {
            requested: filter.clone(),
            entries,
            strongest_outcome,
            top_performers,
            correlations,
            notes,
        }))
    }

    fn compare_metric(
        &self,
        points: &[DataPoint],
        filter: &FilterSpec,
        metric: Metric,
        value: f64,
    ) -> Result<MetricEntry> {
        let resolution = match self.resolver.resolve(points, filter, metric) {
            Ok(resolution) => resolution,
            Err(EngineError::InsufficientSample(insufficient)) => {
                warn!(
                    metric = %metric,
                    best_available = insufficient.best_available,
                    "metric withheld"
                );
                return Ok(MetricEntry::Withheld(insufficient));
            }
            Err(e) => return Err(e),
        };

        let sampled = self.sampler.sample(&resolution.sample.values(metric));
        let sorted = stats::sorted_copy(&sampled.items);
        // Empty only if every resolved value was dropped, which sampling never does
        let (Some(population), Some(percentile_rank)) = (
            stats::calculate_stats_sorted(&sorted),
            stats::percentile_rank(&sorted, value),
        ) else {
            return Ok(MetricEntry::Withheld(InsufficientSample {
                metric,
                best_available: sorted.len(),
                required: self.resolver.min_sample_size(),
            }));
        };

        Ok(MetricEntry::Ranked(MetricComparison {
            metric,
            value,
            percentile_rank,
            classification: Classification::classify(
                percentile_rank,
                self.strength_threshold,
                self.growth_threshold,
            ),
            n: sorted.len(),
            confidence: ConfidenceTier::for_reportable(sorted.len()),
            scope: resolution.scope,
            sampling: sampled.disclosure,
            population,
        }))
    }
}

/// Ranked outcome with the highest percentile rank; ties keep catalog order
fn strongest_outcome(entries: &[MetricEntry]) -> Option<Metric> {
    let mut best: Option<&MetricComparison> = None;
    for comparison in entries.iter().filter_map(MetricEntry::as_ranked) {
        if !comparison.metric.is_outcome() {
            continue;
        }
        if best.map_or(true, |b| comparison.percentile_rank > b.percentile_rank) {
            best = Some(comparison);
        }
    }
    best.map(|c| c.metric)
}

#[cfg(test)]
mod tests;
