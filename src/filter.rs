//! Demographic sample filtering for `-f/--filter` expressions
//!
//! Supports:
//! - Single predicates: `-f country=FR`
//! - Conjunctions: `-f country=FR,sector=Education,job_role=Teacher`
//!
//! Only the dimensions named in a filter constrain the sample; everything
//! else is open.

use crate::catalog::Metric;
use crate::error::{EngineError, Result};
use crate::record::{BenchmarkId, DataPoint, Demographics};
use fnv::FnvHashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A demographic attribute a filter can constrain.
///
/// Declaration order is the relaxation order: most specific first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Source,
    JobRole,
    JobFunction,
    AgeRange,
    Gender,
    Sector,
    Region,
    Country,
}

impl Dimension {
    /// Most specific first; the fallback resolver drops dimensions in this order
    pub const RELAXATION_ORDER: [Dimension; 8] = [
        Dimension::Source,
        Dimension::JobRole,
        Dimension::JobFunction,
        Dimension::AgeRange,
        Dimension::Gender,
        Dimension::Sector,
        Dimension::Region,
        Dimension::Country,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Dimension::Source => "source",
            Dimension::JobRole => "job_role",
            Dimension::JobFunction => "job_function",
            Dimension::AgeRange => "age_range",
            Dimension::Gender => "gender",
            Dimension::Sector => "sector",
            Dimension::Region => "region",
            Dimension::Country => "country",
        }
    }

    /// Parse a dimension name; anything without a matching demographic field
    /// is a malformed filter.
    pub fn from_key(key: &str) -> Result<Dimension> {
        let key = key.trim();
        Self::RELAXATION_ORDER
            .iter()
            .copied()
            .find(|d| d.key() == key)
            .ok_or_else(|| {
                EngineError::MalformedFilter(format!("unknown filter dimension '{}'", key))
            })
    }

    /// The record's value for this dimension
    pub fn value_of<'a>(&self, demographics: &'a Demographics) -> Option<&'a str> {
        let field = match self {
            Dimension::Source => &demographics.source,
            Dimension::JobRole => &demographics.job_role,
            Dimension::JobFunction => &demographics.job_function,
            Dimension::AgeRange => &demographics.age_range,
            Dimension::Gender => &demographics.gender,
            Dimension::Sector => &demographics.sector,
            Dimension::Region => &demographics.region,
            Dimension::Country => &demographics.country,
        };
        field.as_deref()
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Immutable set of demographic equality predicates scoped to one benchmark.
///
/// Narrowing and widening build new instances; a spec is never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FilterSpec {
    benchmark: BenchmarkId,
    #[serde(default)]
    predicates: BTreeMap<Dimension, String>,
}

impl FilterSpec {
    /// Whole benchmark, no demographic constraint
    pub fn global(benchmark: BenchmarkId) -> Self {
        Self {
            benchmark,
            predicates: BTreeMap::new(),
        }
    }

    /// Parse an expression like `country=FR,sector=Education`.
    ///
    /// An empty expression is the global filter.
    pub fn from_expr(benchmark: BenchmarkId, expr: &str) -> Result<Self> {
        let mut pairs = Vec::new();
        for part in expr.split(',') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            let Some((key, value)) = part.split_once('=') else {
                return Err(EngineError::MalformedFilter(format!(
                    "expected dimension=value, got '{}'",
                    part
                )));
            };
            pairs.push((key, value));
        }
        Self::from_pairs(benchmark, pairs)
    }

    /// Build from raw (dimension name, value) pairs
    pub fn from_pairs<'a, I>(benchmark: BenchmarkId, pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut spec = Self::global(benchmark);
        for (key, value) in pairs {
            let dimension = Dimension::from_key(key)?;
            let value = value.trim();
            if value.is_empty() {
                return Err(EngineError::MalformedFilter(format!(
                    "empty value for dimension '{}'",
                    dimension
                )));
            }
            if spec.predicates.contains_key(&dimension) {
                return Err(EngineError::MalformedFilter(format!(
                    "dimension '{}' specified more than once",
                    dimension
                )));
            }
            spec = spec.with(dimension, value);
        }
        Ok(spec)
    }

    /// New spec with one more (or a replaced) predicate
    pub fn with(&self, dimension: Dimension, value: impl Into<String>) -> Self {
        let mut predicates = self.predicates.clone();
        predicates.insert(dimension, value.into());
        Self {
            benchmark: self.benchmark,
            predicates,
        }
    }

    /// New spec with `dimension` relaxed
    pub fn without(&self, dimension: Dimension) -> Self {
        let mut predicates = self.predicates.clone();
        predicates.remove(&dimension);
        Self {
            benchmark: self.benchmark,
            predicates,
        }
    }

    pub fn benchmark(&self) -> BenchmarkId {
        self.benchmark
    }

    pub fn get(&self, dimension: Dimension) -> Option<&str> {
        self.predicates.get(&dimension).map(String::as_str)
    }

    pub fn is_global(&self) -> bool {
        self.predicates.is_empty()
    }

    /// Active dimensions, most specific first
    pub fn active_dimensions(&self) -> impl Iterator<Item = Dimension> + '_ {
        self.predicates.keys().copied()
    }

    /// The most specific dimension still constraining this spec
    pub fn most_specific(&self) -> Option<Dimension> {
        self.active_dimensions().next()
    }

    pub fn predicates(&self) -> impl Iterator<Item = (Dimension, &str)> + '_ {
        self.predicates.iter().map(|(d, v)| (*d, v.as_str()))
    }

    /// Conjunctive match over the specified dimensions only
    pub fn matches(&self, point: &DataPoint) -> bool {
        let demographics = point.demographics();
        self.predicates.iter().all(|(dimension, wanted)| {
            dimension
                .value_of(demographics)
                .is_some_and(|actual| actual.eq_ignore_ascii_case(wanted))
        })
    }

    /// Human-readable scope, e.g. `country=FR, sector=Education` or `global`
    pub fn describe(&self) -> String {
        if self.is_global() {
            return "global".to_string();
        }
        self.predicates
            .iter()
            .map(|(d, v)| format!("{}={}", d, v))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for FilterSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.benchmark, self.describe())
    }
}

/// Applies a `FilterSpec` to a benchmark's data points
#[derive(Debug, Clone, Copy, Default)]
pub struct SampleFilter {
    /// Keep only the most recent assessment per subject key
    deduplicate_subjects: bool,
}

impl SampleFilter {
    pub fn new(deduplicate_subjects: bool) -> Self {
        Self {
            deduplicate_subjects,
        }
    }

    pub fn apply<'a>(&self, points: &'a [DataPoint], spec: &FilterSpec) -> FilteredSample<'a> {
        let matched: Vec<&DataPoint> = points.iter().filter(|p| spec.matches(p)).collect();

        let points = if self.deduplicate_subjects {
            latest_per_subject(matched)
        } else {
            matched
        };

        FilteredSample { points }
    }
}

/// Keeps the latest assessment for every subject key, preserving input order.
/// Records without a key are never merged.
fn latest_per_subject(points: Vec<&DataPoint>) -> Vec<&DataPoint> {
    let mut latest: FnvHashMap<&str, usize> = FnvHashMap::default();
    for (i, point) in points.iter().enumerate() {
        if let Some(key) = point.subject_key() {
            match latest.get(key) {
                Some(&j) if points[j].assessed_on() > point.assessed_on() => {}
                _ => {
                    latest.insert(key, i);
                }
            }
        }
    }

    points
        .iter()
        .enumerate()
        .filter(|(i, p)| match p.subject_key() {
            Some(key) => latest.get(key) == Some(i),
            None => true,
        })
        .map(|(_, p)| *p)
        .collect()
}

/// Records matching a filter
#[derive(Debug, Clone)]
pub struct FilteredSample<'a> {
    points: Vec<&'a DataPoint>,
}

impl<'a> FilteredSample<'a> {
    /// Wrap an already-selected subset, e.g. a sampled population or top group
    pub fn from_points(points: Vec<&'a DataPoint>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[&'a DataPoint] {
        &self.points
    }

    /// Number of matching records, regardless of metric nulls
    pub fn count(&self) -> usize {
        self.points.len()
    }

    /// Non-null values of one metric; its length is that metric's `n`
    pub fn values(&self, metric: Metric) -> Vec<f64> {
        self.points.iter().filter_map(|p| p.value(metric)).collect()
    }

    /// Metric-specific sample size
    pub fn n_for(&self, metric: Metric) -> usize {
        self.points
            .iter()
            .filter(|p| p.value(metric).is_some())
            .count()
    }
}
