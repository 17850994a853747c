// Competency ↔ outcome correlation matrix
//
// Pearson r for every (competency, outcome) pair over records where both
// values are present. Pairs backed by fewer than the minimum sample are
// omitted rather than reported with a wide error bar.

use crate::catalog::Metric;
use crate::config::EngineConfig;
use crate::error::Result;
use crate::fallback::{FallbackResolver, Scope, Walk};
use crate::filter::{FilterSpec, FilteredSample};
use crate::record::DataPoint;
use crate::sampling::{PopulationSampler, SampleDisclosure};
use crate::stats;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// |r| >= 0.5 strong, >= 0.3 moderate, otherwise weak
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CorrelationStrength {
    Weak,
    Moderate,
    Strong,
}

impl CorrelationStrength {
    pub fn classify(r: f64) -> Self {
        let magnitude = r.abs();
        if magnitude >= 0.5 {
            CorrelationStrength::Strong
        } else if magnitude >= 0.3 {
            CorrelationStrength::Moderate
        } else {
            CorrelationStrength::Weak
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            CorrelationStrength::Weak => "weak",
            CorrelationStrength::Moderate => "moderate",
            CorrelationStrength::Strong => "strong",
        }
    }
}

impl fmt::Display for CorrelationStrength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationResult {
    pub competency: Metric,
    pub outcome: Metric,
    pub r: f64,
    /// Complete pairs the coefficient was computed from
    pub n: usize,
    pub strength: CorrelationStrength,
    pub scope: Scope,
}

/// Correlations for one outcome, strongest first
#[derive(Debug, Clone, Serialize)]
pub struct OutcomeCorrelations {
    pub outcome: Metric,
    pub results: Vec<CorrelationResult>,
}

/// Full matrix grouped by outcome in catalog order
#[derive(Debug, Clone, Serialize)]
pub struct CorrelationMatrix {
    pub scope: Scope,
    /// Records in the resolved population before sampling
    pub population_n: usize,
    /// Largest pair set that was capped, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sampling: Option<SampleDisclosure>,
    pub groups: Vec<OutcomeCorrelations>,
}

impl CorrelationMatrix {
    pub fn for_outcome(&self, outcome: Metric) -> Option<&[CorrelationResult]> {
        self.groups
            .iter()
            .find(|g| g.outcome == outcome)
            .map(|g| g.results.as_slice())
    }

    /// Every reported pair, grouped and ordered
    pub fn results(&self) -> impl Iterator<Item = &CorrelationResult> {
        self.groups.iter().flat_map(|g| g.results.iter())
    }

    pub fn len(&self) -> usize {
        self.groups.iter().map(|g| g.results.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CorrelationAnalyzer {
    resolver: FallbackResolver,
    sampler: PopulationSampler,
}

impl CorrelationAnalyzer {
    pub fn new(resolver: FallbackResolver, sampler: PopulationSampler) -> Self {
        Self { resolver, sampler }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(FallbackResolver::from_config(config), config.sampler())
    }

    /// Every competency against every outcome
    pub fn analyze(&self, points: &[DataPoint], requested: &FilterSpec) -> Result<CorrelationMatrix> {
        let outcomes: Vec<Metric> = Metric::outcomes().collect();
        self.analyze_outcomes(points, requested, &outcomes)
    }

    /// Every competency against the given outcomes only.
    ///
    /// The scope widens until at least one (competency, outcome) pair holds
    /// the minimum number of complete observations; when even the global
    /// scope is short, the global population is used and every pair is
    /// omitted.
    pub fn analyze_outcomes(
        &self,
        points: &[DataPoint],
        requested: &FilterSpec,
        outcomes: &[Metric],
    ) -> Result<CorrelationMatrix> {
        let filter = self.resolver.sample_filter();
        let walk = self
            .resolver
            .search(requested, self.resolver.min_sample_size(), |spec| {
                let sample = filter.apply(points, spec);
                Ok((max_pair_count(&sample, outcomes), sample))
            })?;

        let (scope, sample) = match walk {
            Walk::Found { scope, value, .. } => (scope, value),
            Walk::Exhausted { .. } => {
                let global = FilterSpec::global(requested.benchmark());
                let relaxed = requested.active_dimensions().collect();
                let sample = filter.apply(points, &global);
                (Scope::new(global, relaxed), sample)
            }
        };

        let mut outcomes = outcomes.to_vec();
        outcomes.sort();
        outcomes.dedup();

        // Pairs are capped one by one after counting, so a capped pair never
        // falls below the minimum the scope was accepted for
        let mut sampling: Option<SampleDisclosure> = None;
        let groups = outcomes
            .into_iter()
            .map(|outcome| OutcomeCorrelations {
                outcome,
                results: self.correlate_outcome(&sample, outcome, &scope, &mut sampling),
            })
            .collect();

        Ok(CorrelationMatrix {
            scope,
            population_n: sample.count(),
            sampling,
            groups,
        })
    }

    fn correlate_outcome(
        &self,
        population: &FilteredSample<'_>,
        outcome: Metric,
        scope: &Scope,
        sampling: &mut Option<SampleDisclosure>,
    ) -> Vec<CorrelationResult> {
        let mut results: Vec<CorrelationResult> = Metric::competencies()
            .filter_map(|competency| {
                let pairs = paired_values(population, competency, outcome);
                if pairs.len() < self.resolver.min_sample_size() {
                    debug!(
                        competency = %competency,
                        outcome = %outcome,
                        n = pairs.len(),
                        "correlation omitted, too few pairs"
                    );
                    return None;
                }
                let sampled = self.sampler.sample(&pairs);
                if let Some(disclosure) = sampled.disclosure {
                    if sampling.map_or(true, |d| disclosure.population_n > d.population_n) {
                        *sampling = Some(disclosure);
                    }
                }
                let pairs = sampled.items;
                let r = stats::pearson_pairs(&pairs)?;
                Some(CorrelationResult {
                    competency,
                    outcome,
                    r,
                    n: pairs.len(),
                    strength: CorrelationStrength::classify(r),
                    scope: scope.clone(),
                })
            })
            .collect();

        results.sort_by(|a, b| {
            b.r.abs()
                .total_cmp(&a.r.abs())
                .then(a.competency.cmp(&b.competency))
        });
        results
    }
}

/// Complete (competency, outcome) observations in a population
fn paired_values(population: &FilteredSample<'_>, competency: Metric, outcome: Metric) -> Vec<(f64, f64)> {
    population
        .points()
        .iter()
        .filter_map(|p| Some((p.value(competency)?, p.value(outcome)?)))
        .collect()
}

/// Largest complete-pair count over every competency and the given outcomes
fn max_pair_count(sample: &FilteredSample<'_>, outcomes: &[Metric]) -> usize {
    outcomes
        .iter()
        .flat_map(|outcome| Metric::competencies().map(move |competency| (competency, *outcome)))
        .map(|(competency, outcome)| {
            sample
                .points()
                .iter()
                .filter(|p| p.value(competency).is_some() && p.value(outcome).is_some())
                .count()
        })
        .max()
        .unwrap_or(0)
}
