// Effective scope of a resolved population
//
// Every resolved statistic says which scope it was computed at and which
// requested dimensions were dropped on the way there.

use crate::filter::{Dimension, FilterSpec};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Specificity level of a scope: its most specific active dimension, or global
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeLevel {
    Source,
    JobRole,
    JobFunction,
    AgeRange,
    Gender,
    Sector,
    Region,
    Country,
    Global,
}

impl ScopeLevel {
    pub fn of(filter: &FilterSpec) -> Self {
        match filter.most_specific() {
            None => ScopeLevel::Global,
            Some(Dimension::Source) => ScopeLevel::Source,
            Some(Dimension::JobRole) => ScopeLevel::JobRole,
            Some(Dimension::JobFunction) => ScopeLevel::JobFunction,
            Some(Dimension::AgeRange) => ScopeLevel::AgeRange,
            Some(Dimension::Gender) => ScopeLevel::Gender,
            Some(Dimension::Sector) => ScopeLevel::Sector,
            Some(Dimension::Region) => ScopeLevel::Region,
            Some(Dimension::Country) => ScopeLevel::Country,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ScopeLevel::Source => "source",
            ScopeLevel::JobRole => "job-role",
            ScopeLevel::JobFunction => "job-function",
            ScopeLevel::AgeRange => "age-range",
            ScopeLevel::Gender => "gender",
            ScopeLevel::Sector => "sector",
            ScopeLevel::Region => "region",
            ScopeLevel::Country => "country",
            ScopeLevel::Global => "global",
        }
    }
}

impl fmt::Display for ScopeLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The scope a statistic was actually computed at
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Scope {
    pub level: ScopeLevel,
    pub filter: FilterSpec,
    /// Requested dimensions dropped to reach this scope, in drop order
    pub relaxed: Vec<Dimension>,
}

impl Scope {
    pub fn new(filter: FilterSpec, relaxed: Vec<Dimension>) -> Self {
        Self {
            level: ScopeLevel::of(&filter),
            filter,
            relaxed,
        }
    }

    /// Scope exactly as requested
    pub fn exact(filter: FilterSpec) -> Self {
        Self::new(filter, Vec::new())
    }

    pub fn is_relaxed(&self) -> bool {
        !self.relaxed.is_empty()
    }

    /// e.g. `country-level data (country=FR)` or `global data`
    pub fn describe(&self) -> String {
        match self.level {
            ScopeLevel::Global => "global data".to_string(),
            level => format!("{}-level data ({})", level, self.filter.describe()),
        }
    }

    /// Sentence explaining a relaxation, `None` when the requested scope was used
    pub fn disclosure(&self, requested: &FilterSpec) -> Option<String> {
        if !self.is_relaxed() {
            return None;
        }
        Some(format!(
            "This comparison used {} because {}-level data was insufficient.",
            self.describe(),
            ScopeLevel::of(requested)
        ))
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}
