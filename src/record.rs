//! Assessment records and the benchmarks that own them

use crate::catalog::Metric;
use crate::error::{EngineError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Identifier of a benchmark collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BenchmarkId(pub u64);

impl fmt::Display for BenchmarkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Demographic and contextual attributes of one assessment
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Demographics {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sector: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_function: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age_range: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    /// Source collection the record was imported from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// One nullable value per catalog metric, indexed by `Metric::index`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<Metric, Option<f64>>", into = "BTreeMap<Metric, Option<f64>>")]
pub struct MetricValues([Option<f64>; Metric::COUNT]);

impl MetricValues {
    pub fn new() -> Self {
        Self([None; Metric::COUNT])
    }

    /// Builder-style setter
    pub fn with(mut self, metric: Metric, value: f64) -> Self {
        self.0[metric.index()] = Some(value);
        self
    }

    pub fn get(&self, metric: Metric) -> Option<f64> {
        self.0[metric.index()]
    }

    /// Present values in catalog order
    pub fn iter(&self) -> impl Iterator<Item = (Metric, f64)> + '_ {
        Metric::ALL
            .iter()
            .filter_map(move |m| self.get(*m).map(|v| (*m, v)))
    }

    pub fn present_count(&self) -> usize {
        self.0.iter().filter(|v| v.is_some()).count()
    }

    /// First value outside its metric's canonical range, as `ValueOutOfRange`
    pub fn check_ranges(&self) -> Result<()> {
        for (metric, value) in self.iter() {
            let range = metric.range();
            if !range.contains(value) {
                return Err(EngineError::ValueOutOfRange {
                    metric: metric.key().to_string(),
                    value,
                    min: range.min,
                    max: range.max,
                });
            }
        }
        Ok(())
    }
}

impl Default for MetricValues {
    fn default() -> Self {
        Self::new()
    }
}

impl From<BTreeMap<Metric, Option<f64>>> for MetricValues {
    fn from(map: BTreeMap<Metric, Option<f64>>) -> Self {
        let mut values = MetricValues::new();
        for (metric, value) in map {
            values.0[metric.index()] = value;
        }
        values
    }
}

impl From<MetricValues> for BTreeMap<Metric, Option<f64>> {
    fn from(values: MetricValues) -> Self {
        values.iter().map(|(m, v)| (m, Some(v))).collect()
    }
}

/// One assessment record. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    /// Links repeat assessments of the same subject over time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    subject_key: Option<String>,
    assessed_on: NaiveDate,
    #[serde(flatten)]
    demographics: Demographics,
    #[serde(default)]
    metrics: MetricValues,
}

impl DataPoint {
    pub fn new(assessed_on: NaiveDate, demographics: Demographics, metrics: MetricValues) -> Self {
        Self {
            subject_key: None,
            assessed_on,
            demographics,
            metrics,
        }
    }

    pub fn with_subject_key(mut self, key: impl Into<String>) -> Self {
        self.subject_key = Some(key.into());
        self
    }

    pub fn subject_key(&self) -> Option<&str> {
        self.subject_key.as_deref()
    }

    pub fn assessed_on(&self) -> NaiveDate {
        self.assessed_on
    }

    pub fn demographics(&self) -> &Demographics {
        &self.demographics
    }

    pub fn metrics(&self) -> &MetricValues {
        &self.metrics
    }

    pub fn value(&self, metric: Metric) -> Option<f64> {
        self.metrics.get(metric)
    }
}

/// Processing lifecycle of a benchmark import
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BenchmarkStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl fmt::Display for BenchmarkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BenchmarkStatus::Pending => "pending",
            BenchmarkStatus::Processing => "processing",
            BenchmarkStatus::Completed => "completed",
            BenchmarkStatus::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// A named, versioned collection of data points analyzed as one population
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Benchmark {
    id: BenchmarkId,
    name: String,
    /// Bumped every time an import completes; statistic caches key on it
    #[serde(default)]
    version: u32,
    status: BenchmarkStatus,
    #[serde(default)]
    total_rows: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    failure_reason: Option<String>,
    #[serde(default)]
    points: Vec<DataPoint>,
}

impl Benchmark {
    pub fn new(id: BenchmarkId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            version: 0,
            status: BenchmarkStatus::Pending,
            total_rows: 0,
            failure_reason: None,
            points: Vec::new(),
        }
    }

    /// Shortcut for a benchmark whose import already completed
    pub fn completed(id: BenchmarkId, name: impl Into<String>, points: Vec<DataPoint>) -> Self {
        let total_rows = points.len();
        Self {
            id,
            name: name.into(),
            version: 1,
            status: BenchmarkStatus::Completed,
            total_rows,
            failure_reason: None,
            points,
        }
    }

    pub fn id(&self) -> BenchmarkId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn status(&self) -> BenchmarkStatus {
        self.status
    }

    pub fn total_rows(&self) -> usize {
        self.total_rows
    }

    pub fn failure_reason(&self) -> Option<&str> {
        self.failure_reason.as_deref()
    }

    pub fn points(&self) -> &[DataPoint] {
        &self.points
    }

    /// Begin an import. Allowed from any state except `Processing`.
    pub fn start_processing(&mut self) -> Result<()> {
        self.transition(BenchmarkStatus::Processing)?;
        self.failure_reason = None;
        Ok(())
    }

    /// Finish an import, replacing the owned data points and bumping the version.
    pub fn complete(&mut self, points: Vec<DataPoint>) -> Result<()> {
        self.transition(BenchmarkStatus::Completed)?;
        self.total_rows = points.len();
        self.points = points;
        self.version += 1;
        Ok(())
    }

    pub fn fail(&mut self, reason: impl Into<String>) -> Result<()> {
        self.transition(BenchmarkStatus::Failed)?;
        self.failure_reason = Some(reason.into());
        Ok(())
    }

    /// Analysis is only permitted on completed benchmarks
    pub fn ensure_ready(&self) -> Result<()> {
        if self.status == BenchmarkStatus::Completed {
            Ok(())
        } else {
            Err(EngineError::BenchmarkNotReady {
                id: self.id,
                status: self.status,
            })
        }
    }

    fn transition(&mut self, to: BenchmarkStatus) -> Result<()> {
        use BenchmarkStatus::{Completed, Failed, Pending, Processing};

        let allowed = matches!(
            (self.status, to),
            (Pending | Completed | Failed, Processing) | (Processing, Completed | Failed)
        );
        if !allowed {
            return Err(EngineError::InvalidTransition {
                from: self.status,
                to,
            });
        }
        self.status = to;
        Ok(())
    }
}
