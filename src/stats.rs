//! Statistics primitives
//!
//! Pure, deterministic functions over plain `f64` slices. "No data" is
//! always `None`, never zero: an empty population has no mean, and callers
//! must not treat it as one.

use serde::{Deserialize, Serialize};

/// Percentile points reported in every `StatResult`
pub const REPORTED_PERCENTILES: [f64; 6] = [10.0, 25.0, 50.0, 75.0, 90.0, 95.0];

/// Bisection steps for `percentile_rank`; enough to exhaust f64 precision on [0, 100]
const RANK_SEARCH_ITERATIONS: usize = 64;

/// Descriptive statistics for one metric over one resolved population
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatResult {
    /// Number of observations the statistics were computed from
    pub n: usize,
    pub mean: f64,
    pub median: f64,
    /// Population standard deviation
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    pub p10: f64,
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
    pub p90: f64,
    pub p95: f64,
}

impl StatResult {
    /// (percentile point, value) pairs in ascending order
    pub fn percentiles(&self) -> [(f64, f64); 6] {
        [
            (10.0, self.p10),
            (25.0, self.p25),
            (50.0, self.p50),
            (75.0, self.p75),
            (90.0, self.p90),
            (95.0, self.p95),
        ]
    }
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Population standard deviation: `sqrt(avg((x - mean)^2))`
pub fn std_dev(values: &[f64]) -> Option<f64> {
    let m = mean(values)?;
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    Some(variance.sqrt())
}

/// Median of unsorted values
pub fn median(values: &[f64]) -> Option<f64> {
    let sorted = sorted_copy(values);
    percentile(&sorted, 50.0)
}

/// Linear-interpolation percentile over ascending `sorted` values.
///
/// `idx = (p/100)*(n-1)`, interpolating between the floor and ceil order
/// statistics. `p` is clamped to [0, 100].
pub fn percentile(sorted: &[f64], p: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    if sorted.len() == 1 {
        return Some(sorted[0]);
    }

    let p = p.clamp(0.0, 100.0);
    let index = (p / 100.0) * (sorted.len() - 1) as f64;
    let lower = index.floor() as usize;
    let upper = index.ceil() as usize;

    if lower == upper {
        Some(sorted[lower])
    } else {
        let weight = index - lower as f64;
        Some(sorted[lower] * (1.0 - weight) + sorted[upper] * weight)
    }
}

/// Inverse of [`percentile`]: the percentile position of `value` within
/// ascending `sorted` values.
///
/// Bisects the interpolation function. Values below the minimum rank 0,
/// above the maximum rank 100. When `value` sits on a flat run of tied
/// order statistics the midpoint of that run is returned.
pub fn percentile_rank(sorted: &[f64], value: f64) -> Option<f64> {
    let first = *sorted.first()?;
    let last = *sorted.last()?;
    if value < first {
        return Some(0.0);
    }
    if value > last {
        return Some(100.0);
    }

    let at = |p: f64| percentile(sorted, p).unwrap_or(first);

    // Smallest p with percentile(p) >= value
    let (mut lo, mut hi) = (0.0_f64, 100.0_f64);
    if at(0.0) >= value {
        hi = 0.0;
    } else {
        for _ in 0..RANK_SEARCH_ITERATIONS {
            let mid = (lo + hi) / 2.0;
            if at(mid) >= value {
                hi = mid;
            } else {
                lo = mid;
            }
        }
    }
    let lowest = hi;

    // Largest p with percentile(p) <= value
    let (mut lo, mut hi) = (0.0_f64, 100.0_f64);
    if at(100.0) <= value {
        lo = 100.0;
    } else {
        for _ in 0..RANK_SEARCH_ITERATIONS {
            let mid = (lo + hi) / 2.0;
            if at(mid) <= value {
                lo = mid;
            } else {
                hi = mid;
            }
        }
    }
    let highest = lo;

    Some(((lowest + highest) / 2.0).clamp(0.0, 100.0))
}

/// Pearson correlation over index pairs where both sides are present.
///
/// Returns `None` with fewer than 3 complete pairs or when either side has
/// zero variance.
pub fn pearson_correlation(xs: &[Option<f64>], ys: &[Option<f64>]) -> Option<f64> {
    let pairs: Vec<(f64, f64)> = xs
        .iter()
        .zip(ys)
        .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
        .collect();
    pearson_pairs(&pairs)
}

/// Pearson correlation over already-paired observations
pub fn pearson_pairs(pairs: &[(f64, f64)]) -> Option<f64> {
    if pairs.len() < 3 {
        return None;
    }

    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|(x, _)| x).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|(_, y)| y).sum::<f64>() / n;

    let mut covariance = 0.0;
    let mut sum_sq_x = 0.0;
    let mut sum_sq_y = 0.0;
    for (x, y) in pairs {
        let dx = x - mean_x;
        let dy = y - mean_y;
        covariance += dx * dy;
        sum_sq_x += dx * dx;
        sum_sq_y += dy * dy;
    }

    if sum_sq_x == 0.0 || sum_sq_y == 0.0 {
        return None;
    }

    let r = covariance / (sum_sq_x * sum_sq_y).sqrt();
    Some(r.clamp(-1.0, 1.0))
}

/// Cohen's d of a subgroup against its population, using the population
/// standard deviation as the denominator. `None` when the population has no
/// spread.
pub fn effect_size(group_mean: f64, population_mean: f64, population_std_dev: f64) -> Option<f64> {
    if population_std_dev <= 0.0 || !population_std_dev.is_finite() {
        return None;
    }
    Some((group_mean - population_mean) / population_std_dev)
}

/// Full descriptive bundle; `None` for empty input.
pub fn calculate_stats(values: &[f64]) -> Option<StatResult> {
    if values.is_empty() {
        return None;
    }
    let sorted = sorted_copy(values);
    calculate_stats_sorted(&sorted)
}

/// Same as [`calculate_stats`] for input that is already ascending.
pub fn calculate_stats_sorted(sorted: &[f64]) -> Option<StatResult> {
    let n = sorted.len();
    let mean = mean(sorted)?;
    let std_dev = std_dev(sorted)?;
    let at = |p: f64| percentile(sorted, p);

    Some(StatResult {
        n,
        mean,
        median: at(50.0)?,
        std_dev,
        min: sorted[0],
        max: sorted[n - 1],
        p10: at(10.0)?,
        p25: at(25.0)?,
        p50: at(50.0)?,
        p75: at(75.0)?,
        p90: at(90.0)?,
        p95: at(95.0)?,
    })
}

/// Ascending copy using a total order (NaN sorts last)
pub fn sorted_copy(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    sorted
}
