//! CSV export of resolved statistics, correlations, top-performer profiles
//! and comparisons
//!
//! Flat rows for dashboards and spreadsheets. Withheld metrics are kept as
//! rows with empty numeric columns so the export always lists every
//! requested metric.

use crate::compare::{ComparisonResult, MetricEntry};
use crate::engine::ResolvedStat;
use crate::error::InsufficientSample;
use crate::insight::{CorrelationMatrix, TopPerformerProfile};

/// Escape CSV field (handle commas, quotes, newlines)
fn escape_field(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn number(value: f64) -> String {
    format!("{:.4}", value)
}

/// One row per metric: descriptive statistics or an explicit withheld marker
#[derive(Debug, Default)]
pub struct CsvStatsOutput {
    rows: Vec<String>,
}

impl CsvStatsOutput {
    const HEADER: &'static str =
        "metric,status,n,mean,median,std_dev,min,max,p10,p25,p50,p75,p90,p95,confidence,scope,sampled_from";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_stat(&mut self, stat: &ResolvedStat) {
        let s = &stat.stats;
        let mut fields = vec![
            stat.metric.key().to_string(),
            "ok".to_string(),
            s.n.to_string(),
        ];
        fields.extend(
            [s.mean, s.median, s.std_dev, s.min, s.max]
                .into_iter()
                .chain(s.percentiles().map(|(_, v)| v))
                .map(number),
        );
        fields.push(stat.confidence.to_string());
        fields.push(escape_field(&stat.scope.filter.describe()));
        fields.push(
            stat.sampling
                .map(|d| d.population_n.to_string())
                .unwrap_or_default(),
        );
        self.rows.push(fields.join(","));
    }

    pub fn add_withheld(&mut self, withheld: &InsufficientSample) {
        let mut fields = vec![
            withheld.metric.key().to_string(),
            "insufficient_sample".to_string(),
            withheld.best_available.to_string(),
        ];
        fields.extend(std::iter::repeat(String::new()).take(14));
        self.rows.push(fields.join(","));
    }

    pub fn to_csv(&self) -> String {
        let mut output = String::from(Self::HEADER);
        output.push('\n');
        for row in &self.rows {
            output.push_str(row);
            output.push('\n');
        }
        output
    }
}

/// One row per reported (competency, outcome) pair, in matrix order
pub fn correlations_to_csv(matrix: &CorrelationMatrix) -> String {
    let mut output = String::from("outcome,competency,r,n,strength,scope\n");
    for result in matrix.results() {
        output.push_str(&format!(
            "{},{},{},{},{},{}\n",
            result.outcome.key(),
            result.competency.key(),
            number(result.r),
            result.n,
            result.strength,
            escape_field(&result.scope.filter.describe())
        ));
    }
    output
}

/// One row per trait in rank order; profile-level columns repeat on each row
pub fn top_performers_to_csv(profile: &TopPerformerProfile) -> String {
    let mut output = String::from(
        "outcome,cutoff,metric,population_mean,top_group_mean,effect_size,magnitude,population_n,top_n,scope\n",
    );
    let scope = escape_field(&profile.scope.filter.describe());
    for t in &profile.traits {
        output.push_str(&format!(
            "{},{},{},{},{},{},{},{},{},{}\n",
            profile.outcome.key(),
            number(profile.cutoff),
            t.metric.key(),
            number(t.population_mean),
            number(t.top_group_mean),
            number(t.effect_size),
            t.magnitude.name(),
            t.population_n,
            t.top_n,
            scope
        ));
    }
    output
}

fn withheld_comparison_row(withheld: &InsufficientSample) -> String {
    format!(
        "{},insufficient_sample,,,,{},,",
        withheld.metric.key(),
        withheld.best_available
    )
}

/// One row per submitted metric of a comparison
pub fn comparison_to_csv(result: &ComparisonResult) -> String {
    let mut output =
        String::from("metric,status,value,percentile_rank,classification,n,confidence,scope\n");
    let rows: Vec<String> = match result {
        ComparisonResult::Report(report) => report
            .entries
            .iter()
            .map(|entry| match entry {
                MetricEntry::Ranked(c) => format!(
                    "{},ranked,{},{},{},{},{},{}",
                    c.metric.key(),
                    number(c.value),
                    number(c.percentile_rank),
                    escape_field(c.classification.name()),
                    c.n,
                    c.confidence,
                    escape_field(&c.scope.filter.describe())
                ),
                MetricEntry::Withheld(w) => withheld_comparison_row(w),
            })
            .collect(),
        ComparisonResult::InsufficientPopulation { withheld } => {
            withheld.iter().map(withheld_comparison_row).collect()
        }
    };
    for row in rows {
        output.push_str(&row);
        output.push('\n');
    }
    output
}
