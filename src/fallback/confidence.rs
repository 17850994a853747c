// Confidence tiers derived from sample size
//
// The high tier is the classic survey sample size for a 95% confidence
// level at a 5% margin of error with maximum variance (p = 0.5):
//
//     n = (z / E)^2 * p(1 - p) = (1.96 / 0.05)^2 * 0.25 = 384.16 -> 385

use serde::{Deserialize, Serialize};
use std::fmt;

/// z-score for a two-sided 95% confidence level
pub const Z_95: f64 = 1.96;

/// Margin of error targeted by the high tier
pub const MARGIN_OF_ERROR: f64 = 0.05;

/// Smallest `n` labelled high confidence
pub const HIGH_CONFIDENCE_N: usize = 385;

/// Smallest `n` labelled medium confidence
pub const MEDIUM_CONFIDENCE_N: usize = 100;

/// Sample size needed to estimate a proportion within `margin` at `z`
pub fn required_sample_size(z: f64, margin: f64) -> usize {
    ((z / margin).powi(2) * 0.25).ceil() as usize
}

/// Precision label attached to every reported statistic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceTier {
    Low,
    Medium,
    High,
}

impl ConfidenceTier {
    /// Tier for a resolved sample size; `None` means not reportable.
    ///
    /// `min_sample_size` is the configured reporting floor (never below 30).
    pub fn for_sample_size(n: usize, min_sample_size: usize) -> Option<Self> {
        (n >= min_sample_size).then(|| Self::for_reportable(n))
    }

    /// Tier for an `n` already known to clear the reporting floor
    pub fn for_reportable(n: usize) -> Self {
        if n >= HIGH_CONFIDENCE_N {
            ConfidenceTier::High
        } else if n >= MEDIUM_CONFIDENCE_N {
            ConfidenceTier::Medium
        } else {
            ConfidenceTier::Low
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ConfidenceTier::Low => "low",
            ConfidenceTier::Medium => "medium",
            ConfidenceTier::High => "high",
        }
    }
}

impl fmt::Display for ConfidenceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
