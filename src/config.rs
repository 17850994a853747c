//! Engine configuration
//!
//! Every threshold the engine applies lives here, loaded from TOML or taken
//! from the defaults. The hard sample-size floor is not configurable
//! downward: a config may only ask for more evidence, never less.

use crate::sampling::{PopulationSampler, SamplingStrategy};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// No statistic backed by fewer observations is ever reported
pub const HARD_MIN_SAMPLE_SIZE: usize = 30;

/// Configuration for comparative benchmark analysis
///
/// # Example
/// ```
/// use eq_benchmark::config::EngineConfig;
///
/// let config = EngineConfig::default();
/// assert_eq!(config.min_sample_size, 30);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Minimum metric-specific `n` for a reportable statistic
    ///
    /// Default: 30 (also the floor)
    pub min_sample_size: usize,

    /// Minimum size of the top-performer group before a profile is computed
    ///
    /// Default: 30
    pub min_top_performer_sample: usize,

    /// Outcome percentile at or above which a record counts as a top performer
    ///
    /// Default: 90.0
    pub top_performer_quantile: f64,

    /// Percentile rank at or above which a metric is a strength
    ///
    /// Default: 75.0
    pub strength_threshold: f64,

    /// Percentile rank at or below which a metric is a growth area
    ///
    /// Default: 25.0
    pub growth_threshold: f64,

    /// Population size above which percentile/correlation work is sampled
    ///
    /// Default: 10 000. `None` disables sampling.
    pub population_cap: Option<usize>,

    /// How capped populations are reduced
    pub sampling: SamplingStrategy,

    /// Count only the latest assessment of each subject
    pub deduplicate_subjects: bool,

    /// Cache statistic and correlation results per benchmark version
    pub cache_enabled: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_sample_size: HARD_MIN_SAMPLE_SIZE,
            min_top_performer_sample: HARD_MIN_SAMPLE_SIZE,
            top_performer_quantile: 90.0,
            strength_threshold: 75.0,
            growth_threshold: 25.0,
            population_cap: Some(10_000),
            sampling: SamplingStrategy::Stride,
            deduplicate_subjects: false,
            cache_enabled: true,
        }
    }
}

impl EngineConfig {
    /// Demand medium-confidence populations everywhere and never sample
    pub fn strict() -> Self {
        Self {
            min_sample_size: 100,
            min_top_performer_sample: 50,
            population_cap: None,
            deduplicate_subjects: true,
            ..Self::default()
        }
    }

    /// Accept the hard floor everywhere and sample large populations harder
    pub fn permissive() -> Self {
        Self {
            min_sample_size: HARD_MIN_SAMPLE_SIZE,
            min_top_performer_sample: HARD_MIN_SAMPLE_SIZE,
            top_performer_quantile: 80.0,
            population_cap: Some(2_000),
            ..Self::default()
        }
    }

    /// Load configuration from a TOML file; missing keys take defaults.
    ///
    /// # Example TOML
    /// ```toml
    /// min_sample_size = 50
    /// top_performer_quantile = 80.0
    /// population_cap = 5000
    /// sampling = { kind = "random", seed = 42 }
    /// ```
    pub fn from_toml<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).with_context(|| {
            format!("Failed to read engine config: {}", path.as_ref().display())
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(content).context("Failed to parse TOML engine configuration")?;
        config.validate().map_err(|e| anyhow::anyhow!(e))?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.min_sample_size < HARD_MIN_SAMPLE_SIZE {
            return Err(format!(
                "min_sample_size must be >= {}, got {}",
                HARD_MIN_SAMPLE_SIZE, self.min_sample_size
            ));
        }

        if self.min_top_performer_sample < HARD_MIN_SAMPLE_SIZE {
            return Err(format!(
                "min_top_performer_sample must be >= {}, got {}",
                HARD_MIN_SAMPLE_SIZE, self.min_top_performer_sample
            ));
        }

        if !(self.top_performer_quantile > 0.0 && self.top_performer_quantile < 100.0) {
            return Err(format!(
                "top_performer_quantile must be in (0, 100), got {}",
                self.top_performer_quantile
            ));
        }

        for (name, value) in [
            ("strength_threshold", self.strength_threshold),
            ("growth_threshold", self.growth_threshold),
        ] {
            if !(0.0..=100.0).contains(&value) {
                return Err(format!("{} must be in [0, 100], got {}", name, value));
            }
        }

        if self.growth_threshold >= self.strength_threshold {
            return Err(format!(
                "growth_threshold ({}) must be below strength_threshold ({})",
                self.growth_threshold, self.strength_threshold
            ));
        }

        if let Some(cap) = self.population_cap {
            if cap < self.min_sample_size {
                return Err(format!(
                    "population_cap ({}) must be >= min_sample_size ({})",
                    cap, self.min_sample_size
                ));
            }
            if cap < self.min_top_performer_sample {
                return Err(format!(
                    "population_cap ({}) must be >= min_top_performer_sample ({})",
                    cap, self.min_top_performer_sample
                ));
            }
        }

        Ok(())
    }

    pub fn sampler(&self) -> PopulationSampler {
        PopulationSampler::new(self.population_cap, self.sampling)
    }
}
