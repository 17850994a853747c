//! Population capping for percentile- and correlation-sensitive work
//!
//! Large populations are reduced to at most `cap` observations before
//! sorting or pairing. The substitution is never silent: every sampled
//! result carries a [`SampleDisclosure`], and the `n` reported downstream is
//! the size actually used.
//!
//! | Strategy | Selection | Reproducible |
//! |----------|-----------|--------------|
//! | `stride` | every k-th record, evenly spaced | always |
//! | `random` | uniform without replacement | per seed |

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

/// How a capped population is reduced
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum SamplingStrategy {
    /// Deterministic, evenly spaced index stride
    #[default]
    Stride,
    /// Uniform random sample from a seeded generator
    Random { seed: u64 },
}

impl SamplingStrategy {
    pub fn name(&self) -> &'static str {
        match self {
            SamplingStrategy::Stride => "stride",
            SamplingStrategy::Random { .. } => "random",
        }
    }
}

/// Disclosure attached to any statistic computed from a sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleDisclosure {
    /// Size of the population before sampling
    pub population_n: usize,
    /// Size actually used for computation
    pub used_n: usize,
    pub strategy: SamplingStrategy,
}

impl SampleDisclosure {
    /// e.g. `stride sample of 10000 out of 52000 records`
    pub fn describe(&self) -> String {
        format!(
            "{} sample of {} out of {} records",
            self.strategy.name(),
            self.used_n,
            self.population_n
        )
    }
}

/// Items after capping, with a disclosure when sampling happened
#[derive(Debug, Clone)]
pub struct Sampled<T> {
    pub items: Vec<T>,
    pub disclosure: Option<SampleDisclosure>,
}

/// Caps populations at a configurable size
#[derive(Debug, Clone, Copy)]
pub struct PopulationSampler {
    /// Maximum population size (None = unbounded)
    cap: Option<usize>,
    strategy: SamplingStrategy,
}

impl PopulationSampler {
    pub fn new(cap: Option<usize>, strategy: SamplingStrategy) -> Self {
        Self { cap, strategy }
    }

    /// Sampler that never reduces a population
    pub fn unbounded() -> Self {
        Self {
            cap: None,
            strategy: SamplingStrategy::Stride,
        }
    }

    pub fn cap(&self) -> Option<usize> {
        self.cap
    }

    pub fn strategy(&self) -> SamplingStrategy {
        self.strategy
    }

    /// Reduce `items` to at most `cap` elements, preserving relative order
    pub fn sample<T: Clone>(&self, items: &[T]) -> Sampled<T> {
        let len = items.len();
        let cap = match self.cap {
            Some(cap) if len > cap => cap,
            _ => {
                return Sampled {
                    items: items.to_vec(),
                    disclosure: None,
                }
            }
        };

        let indices = match self.strategy {
            SamplingStrategy::Stride => stride_indices(len, cap),
            SamplingStrategy::Random { seed } => random_indices(len, cap, seed),
        };

        tracing::debug!(
            population_n = len,
            used_n = indices.len(),
            "population capped by {:?} sampling",
            self.strategy
        );

        Sampled {
            items: indices.iter().map(|&i| items[i].clone()).collect(),
            disclosure: Some(SampleDisclosure {
                population_n: len,
                used_n: indices.len(),
                strategy: self.strategy,
            }),
        }
    }
}

fn stride_indices(len: usize, cap: usize) -> Vec<usize> {
    (0..cap).map(|i| i * len / cap).collect()
}

fn random_indices(len: usize, cap: usize, seed: u64) -> Vec<usize> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut indices = rand::seq::index::sample(&mut rng, len, cap).into_vec();
    indices.sort_unstable();
    indices
}
