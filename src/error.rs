//! Error taxonomy for the benchmark engine
//!
//! Structural problems (unknown metric keys, malformed filters, bad config)
//! are raised immediately and never retried. "No data" conditions inside the
//! statistics primitives are `Option`s, not errors; only the final
//! insufficient-sample outcome of a full fallback walk surfaces here.

use crate::catalog::Metric;
use crate::record::{BenchmarkId, BenchmarkStatus};
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Explicit non-result: a metric could not reach the minimum sample size
/// even at the widest scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InsufficientSample {
    pub metric: Metric,
    /// Largest `n` seen at any scope that was tried
    pub best_available: usize,
    /// Minimum `n` required for a reportable statistic
    pub required: usize,
}

impl fmt::Display for InsufficientSample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "insufficient sample for {}: best available n={}, required n>={}",
            self.metric.key(),
            self.best_available,
            self.required
        )
    }
}

/// Errors for engine operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("{0}")]
    InsufficientSample(InsufficientSample),

    #[error("Unknown metric key '{0}'")]
    InvalidMetric(String),

    #[error("Malformed filter: {0}")]
    MalformedFilter(String),

    #[error("Value {value} for {metric} outside canonical range [{min}, {max}]")]
    ValueOutOfRange {
        metric: String,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("Unknown benchmark {0}")]
    UnknownBenchmark(BenchmarkId),

    #[error("Benchmark {id} is {status}, analysis requires a completed benchmark")]
    BenchmarkNotReady {
        id: BenchmarkId,
        status: BenchmarkStatus,
    },

    #[error("Invalid benchmark transition from {from} to {to}")]
    InvalidTransition {
        from: BenchmarkStatus,
        to: BenchmarkStatus,
    },

    #[error("Invalid engine configuration: {0}")]
    InvalidConfig(String),
}

impl From<InsufficientSample> for EngineError {
    fn from(value: InsufficientSample) -> Self {
        EngineError::InsufficientSample(value)
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
