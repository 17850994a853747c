// Top-performer profiling
//
// Records at or above the configured percentile of an outcome form the top
// group. Every other metric is then ranked by Cohen's d of the top group
// against the whole resolved population:
//
//     d = (mean(top) - mean(population)) / std_dev(population)
//
// Ranking is by |d| descending; equal magnitudes keep catalog order.

use crate::catalog::Metric;
use crate::config::EngineConfig;
use crate::error::{EngineError, InsufficientSample, Result};
use crate::fallback::{ConfidenceTier, FallbackResolver, Scope};
use crate::filter::{FilterSpec, FilteredSample};
use crate::record::DataPoint;
use crate::sampling::{PopulationSampler, SampleDisclosure};
use crate::stats;
use serde::Serialize;
use std::fmt::Write as _;
use tracing::debug;

/// Cohen's conventional effect-size classes
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EffectMagnitude {
    Negligible,
    Small,
    Medium,
    Large,
}

impl EffectMagnitude {
    pub fn classify(effect_size: f64) -> Self {
        let d = effect_size.abs();
        if d < 0.2 {
            EffectMagnitude::Negligible
        } else if d < 0.5 {
            EffectMagnitude::Small
        } else if d < 0.8 {
            EffectMagnitude::Medium
        } else {
            EffectMagnitude::Large
        }
    }

    /// At least a small effect
    pub fn is_distinguishing(&self) -> bool {
        *self >= EffectMagnitude::Small
    }

    pub fn name(&self) -> &'static str {
        match self {
            EffectMagnitude::Negligible => "negligible",
            EffectMagnitude::Small => "small",
            EffectMagnitude::Medium => "medium",
            EffectMagnitude::Large => "large",
        }
    }
}

/// How far the top group departs from the population on one metric
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TraitEffect {
    pub metric: Metric,
    pub population_mean: f64,
    pub top_group_mean: f64,
    pub effect_size: f64,
    pub magnitude: EffectMagnitude,
    /// Non-null observations of this metric in the population
    pub population_n: usize,
    /// Non-null observations of this metric in the top group
    pub top_n: usize,
}

/// Ranked traits separating an outcome's top performers from everyone else
#[derive(Debug, Clone, Serialize)]
pub struct TopPerformerProfile {
    pub outcome: Metric,
    /// Percentile that defines the top group (e.g. 90.0)
    pub quantile: f64,
    /// Outcome value at that percentile
    pub cutoff: f64,
    /// Outcome `n` of the population the cutoff was taken from
    pub population_n: usize,
    pub top_n: usize,
    pub confidence: ConfidenceTier,
    pub scope: Scope,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sampling: Option<SampleDisclosure>,
    /// Sorted by |effect_size| descending
    pub traits: Vec<TraitEffect>,
}

impl TopPerformerProfile {
    /// Traits with at least a small effect, still in rank order
    pub fn distinguishing(&self) -> impl Iterator<Item = &TraitEffect> {
        self.traits.iter().filter(|t| t.magnitude.is_distinguishing())
    }

    pub fn to_report_string(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "Top performers in {} (>= p{:.0}, cutoff {:.1}): {} of {} [{}, {} confidence]",
            self.outcome,
            self.quantile,
            self.cutoff,
            self.top_n,
            self.population_n,
            self.scope,
            self.confidence
        );
        for effect in self.distinguishing() {
            let _ = writeln!(
                out,
                "  {:<24} d={:+.2} ({}) top={:.1} population={:.1}",
                effect.metric.key(),
                effect.effect_size,
                effect.magnitude.name(),
                effect.top_group_mean,
                effect.population_mean
            );
        }
        if self.distinguishing().next().is_none() {
            out.push_str("  no distinguishing traits\n");
        }
        out
    }
}

/// Builds [`TopPerformerProfile`]s over a fallback-resolved population
#[derive(Debug, Clone, Copy)]
pub struct TopPerformerProfiler {
    resolver: FallbackResolver,
    sampler: PopulationSampler,
    quantile: f64,
    min_top_sample: usize,
}

impl TopPerformerProfiler {
    pub fn new(
        resolver: FallbackResolver,
        sampler: PopulationSampler,
        quantile: f64,
        min_top_sample: usize,
    ) -> Self {
        Self {
            resolver,
            sampler,
            quantile,
            min_top_sample,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(
            FallbackResolver::from_config(config),
            config.sampler(),
            config.top_performer_quantile,
            config.min_top_performer_sample,
        )
    }

    /// Profile the top performers of `outcome`.
    ///
    /// The scope escalates until both the outcome population and its top
    /// group are large enough. Fails with `InsufficientSample` otherwise;
    /// `best_available` is then the largest top group seen.
    pub fn profile(
        &self,
        points: &[DataPoint],
        requested: &FilterSpec,
        outcome: Metric,
    ) -> Result<TopPerformerProfile> {
        let min_population = self.resolver.min_sample_size();
        let resolution = self.resolver.resolve_with(
            points,
            requested,
            outcome,
            self.min_top_sample,
            |sample| {
                if sample.n_for(outcome) < min_population {
                    0
                } else {
                    top_group_size(&sample.values(outcome), self.quantile)
                }
            },
        )?;

        // Cutoff and membership come from the full resolved population so a
        // capped sample cannot shrink the top group the scope was accepted for
        let outcome_values = stats::sorted_copy(&resolution.sample.values(outcome));
        let cutoff = stats::percentile(&outcome_values, self.quantile).ok_or_else(|| {
            EngineError::InsufficientSample(InsufficientSample {
                metric: outcome,
                best_available: 0,
                required: self.min_top_sample,
            })
        })?;
        let top_points: Vec<&DataPoint> = resolution
            .sample
            .points()
            .iter()
            .copied()
            .filter(|p| p.value(outcome).is_some_and(|v| v >= cutoff))
            .collect();

        // Only the per-trait means and deviations run on capped samples
        let sampled = self.sampler.sample(resolution.sample.points());
        let population = FilteredSample::from_points(sampled.items);
        let top = FilteredSample::from_points(self.sampler.sample(&top_points).items);

        let mut traits: Vec<TraitEffect> = Metric::ALL
            .iter()
            .copied()
            .filter(|m| *m != outcome)
            .filter_map(|m| self.trait_effect(&population, &top, m))
            .collect();
        traits.sort_by(|a, b| {
            b.effect_size
                .abs()
                .total_cmp(&a.effect_size.abs())
                .then(a.metric.cmp(&b.metric))
        });

        debug!(
            outcome = %outcome,
            cutoff,
            top_n = top.count(),
            traits = traits.len(),
            "profiled top performers"
        );

        let population_n = outcome_values.len();
        Ok(TopPerformerProfile {
            outcome,
            quantile: self.quantile,
            cutoff,
            population_n,
            top_n: top_points.len(),
            confidence: ConfidenceTier::for_reportable(population_n),
            scope: resolution.scope,
            sampling: sampled.disclosure,
            traits,
        })
    }

    fn trait_effect(
        &self,
        population: &FilteredSample<'_>,
        top: &FilteredSample<'_>,
        metric: Metric,
    ) -> Option<TraitEffect> {
        let population_values = population.values(metric);
        let top_values = top.values(metric);
        if population_values.len() < self.resolver.min_sample_size()
            || top_values.len() < self.min_top_sample
        {
            return None;
        }

        let population_mean = stats::mean(&population_values)?;
        let population_sd = stats::std_dev(&population_values)?;
        let top_group_mean = stats::mean(&top_values)?;
        let effect_size = stats::effect_size(top_group_mean, population_mean, population_sd)?;

        Some(TraitEffect {
            metric,
            population_mean,
            top_group_mean,
            effect_size,
            magnitude: EffectMagnitude::classify(effect_size),
            population_n: population_values.len(),
            top_n: top_values.len(),
        })
    }
}

/// Count of values at or above the `quantile` percentile
fn top_group_size(values: &[f64], quantile: f64) -> usize {
    let sorted = stats::sorted_copy(values);
    match stats::percentile(&sorted, quantile) {
        Some(cutoff) => sorted.iter().filter(|v| **v >= cutoff).count(),
        None => 0,
    }
}
