// Comparison result types and text rendering

use crate::catalog::Metric;
use crate::error::InsufficientSample;
use crate::fallback::{ConfidenceTier, Scope};
use crate::filter::FilterSpec;
use crate::insight::{OutcomeCorrelations, TopPerformerProfile};
use crate::sampling::SampleDisclosure;
use crate::stats::StatResult;
use serde::Serialize;
use std::fmt::Write as _;

/// Where an individual's percentile rank falls relative to the thresholds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    Strength,
    GrowthArea,
    Neutral,
}

impl Classification {
    pub fn classify(percentile_rank: f64, strength_threshold: f64, growth_threshold: f64) -> Self {
        if percentile_rank >= strength_threshold {
            Classification::Strength
        } else if percentile_rank <= growth_threshold {
            Classification::GrowthArea
        } else {
            Classification::Neutral
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Classification::Strength => "strength",
            Classification::GrowthArea => "growth area",
            Classification::Neutral => "neutral",
        }
    }
}

/// One metric of the individual placed in its resolved population
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricComparison {
    pub metric: Metric,
    pub value: f64,
    pub percentile_rank: f64,
    pub classification: Classification,
    /// Observations the rank was computed from (after any sampling)
    pub n: usize,
    pub confidence: ConfidenceTier,
    pub scope: Scope,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sampling: Option<SampleDisclosure>,
    pub population: StatResult,
}

/// A metric is either ranked or explicitly withheld
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MetricEntry {
    Ranked(MetricComparison),
    Withheld(InsufficientSample),
}

impl MetricEntry {
    pub fn metric(&self) -> Metric {
        match self {
            MetricEntry::Ranked(c) => c.metric,
            MetricEntry::Withheld(w) => w.metric,
        }
    }

    pub fn as_ranked(&self) -> Option<&MetricComparison> {
        match self {
            MetricEntry::Ranked(c) => Some(c),
            MetricEntry::Withheld(_) => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ComparisonReport {
    pub requested: FilterSpec,
    /// One entry per submitted metric, in catalog order
    pub entries: Vec<MetricEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strongest_outcome: Option<Metric>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_performers: Option<TopPerformerProfile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlations: Option<OutcomeCorrelations>,
    /// Context that could not be produced, e.g. a profile with too few top performers
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
}

impl ComparisonReport {
    pub fn ranked(&self) -> impl Iterator<Item = &MetricComparison> {
        self.entries.iter().filter_map(MetricEntry::as_ranked)
    }

    pub fn withheld(&self) -> impl Iterator<Item = &InsufficientSample> {
        self.entries.iter().filter_map(|e| match e {
            MetricEntry::Withheld(w) => Some(w),
            MetricEntry::Ranked(_) => None,
        })
    }

    pub fn get(&self, metric: Metric) -> Option<&MetricEntry> {
        self.entries.iter().find(|e| e.metric() == metric)
    }

    pub fn strengths(&self) -> impl Iterator<Item = &MetricComparison> {
        self.ranked()
            .filter(|c| c.classification == Classification::Strength)
    }

    pub fn growth_areas(&self) -> impl Iterator<Item = &MetricComparison> {
        self.ranked()
            .filter(|c| c.classification == Classification::GrowthArea)
    }

    /// Distinct sentences explaining every relaxed scope and sampled population
    pub fn disclosures(&self) -> Vec<String> {
        let mut sentences: Vec<String> = Vec::new();
        let mut push = |sentence: String| {
            if !sentences.contains(&sentence) {
                sentences.push(sentence);
            }
        };
        for comparison in self.ranked() {
            if let Some(sentence) = comparison.scope.disclosure(&self.requested) {
                push(sentence);
            }
            if let Some(sampling) = comparison.sampling {
                push(format!(
                    "Percentiles for {} were computed from a {}.",
                    comparison.metric,
                    sampling.describe()
                ));
            }
        }
        sentences
    }

    pub fn to_report_string(&self) -> String {
        let mut out = String::new();
        let ranked = self.ranked().count();
        let _ = writeln!(
            out,
            "Benchmark comparison for {} ({} of {} metrics ranked)",
            self.requested,
            ranked,
            self.entries.len()
        );
        out.push('\n');
        let _ = writeln!(
            out,
            "  {:<24} {:>7} {:>7}  {:<12} {:>6}  {:<10} scope",
            "metric", "value", "pctile", "class", "n", "confidence"
        );
        for comparison in self.ranked() {
            let _ = writeln!(
                out,
                "  {:<24} {:>7.1} {:>7.1}  {:<12} {:>6}  {:<10} {}",
                comparison.metric.key(),
                comparison.value,
                comparison.percentile_rank,
                comparison.classification.name(),
                comparison.n,
                comparison.confidence,
                comparison.scope
            );
        }

        let withheld: Vec<&InsufficientSample> = self.withheld().collect();
        if !withheld.is_empty() {
            out.push_str("\nWithheld:\n");
            for insufficient in withheld {
                let _ = writeln!(out, "  {}", insufficient);
            }
        }

        if let Some(outcome) = self.strongest_outcome {
            let _ = writeln!(out, "\nStrongest outcome: {}", outcome);
        }
        if let Some(profile) = &self.top_performers {
            out.push('\n');
            out.push_str(&profile.to_report_string());
        }
        if let Some(correlations) = &self.correlations {
            let _ = writeln!(out, "\nCompetencies correlated with {}:", correlations.outcome);
            if correlations.results.is_empty() {
                out.push_str("  none with enough paired observations\n");
            }
            for result in &correlations.results {
                let _ = writeln!(
                    out,
                    "  {:<24} r={:+.2} ({}, n={})",
                    result.competency.key(),
                    result.r,
                    result.strength,
                    result.n
                );
            }
        }

        let notes: Vec<String> = self
            .disclosures()
            .into_iter()
            .chain(self.notes.iter().cloned())
            .collect();
        if !notes.is_empty() {
            out.push_str("\nNotes:\n");
            for note in notes {
                let _ = writeln!(out, "  {}", note);
            }
        }
        out
    }
}

/// Final answer of a comparison: a report, or an explicit statement that the
/// population could not support any metric even globally
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum ComparisonResult {
    Report(ComparisonReport),
    InsufficientPopulation { withheld: Vec<InsufficientSample> },
}

impl ComparisonResult {
    pub fn report(&self) -> Option<&ComparisonReport> {
        match self {
            ComparisonResult::Report(report) => Some(report),
            ComparisonResult::InsufficientPopulation { .. } => None,
        }
    }

    pub fn to_report_string(&self) -> String {
        match self {
            ComparisonResult::Report(report) => report.to_report_string(),
            ComparisonResult::InsufficientPopulation { withheld } => {
                let mut out = String::from(
                    "No metric could be ranked: the population is too small even at global scope.\n",
                );
                for insufficient in withheld {
                    let _ = writeln!(out, "  {}", insufficient);
                }
                out
            }
        }
    }
}
