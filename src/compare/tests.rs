// Comparison scenarios
//
// A 400-record population with linear metric columns, so the expected
// percentile of any value is easy to reason about.

use super::*;
use crate::catalog::Metric;
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::fallback::{ConfidenceTier, ScopeLevel};
use crate::filter::FilterSpec;
use crate::record::{BenchmarkId, DataPoint, Demographics, MetricValues};
use crate::stats;
use chrono::NaiveDate;

const B: BenchmarkId = BenchmarkId(21);

fn record(i: usize) -> DataPoint {
    let x = i as f64;
    let mut metrics = MetricValues::new()
        .with(Metric::EqTotal, 65.0 + x * 0.1)
        .with(Metric::Empathy, 80.0 + x * 0.1)
        .with(Metric::Effectiveness, 70.0 + x * 0.15);
    if i % 4 == 0 {
        metrics = metrics.with(Metric::Vision, (i % 100) as f64);
    }
    let demographics = Demographics {
        country: Some(if i < 50 { "FR" } else { "DE" }.to_string()),
        ..Demographics::default()
    };
    DataPoint::new(
        NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
        demographics,
        metrics,
    )
}

fn population(n: usize) -> Vec<DataPoint> {
    (0..n).map(record).collect()
}

fn comparator() -> Comparator {
    Comparator::from_config(&EngineConfig::default())
}

fn empathy_at(points: &[DataPoint], p: f64) -> f64 {
    let values: Vec<f64> = points.iter().filter_map(|d| d.value(Metric::Empathy)).collect();
    stats::percentile(&stats::sorted_copy(&values), p).unwrap()
}

fn ranked(result: &ComparisonResult, metric: Metric) -> MetricComparison {
    result
        .report()
        .and_then(|r| r.get(metric))
        .and_then(MetricEntry::as_ranked)
        .cloned()
        .unwrap_or_else(|| panic!("{} was not ranked", metric))
}

/// Scenario: individual scores exactly at the population's 90th percentile
/// Expected: percentile rank ~90, classified as a strength
#[test]
fn test_value_at_p90_is_a_strength() {
    let points = population(400);
    let individual = MetricValues::new().with(Metric::Empathy, empathy_at(&points, 90.0));

    let result = comparator()
        .compare(&points, &individual, &FilterSpec::global(B))
        .unwrap();
    let empathy = ranked(&result, Metric::Empathy);

    assert!((empathy.percentile_rank - 90.0).abs() < 1e-6);
    assert_eq!(empathy.classification, Classification::Strength);
    assert_eq!(empathy.n, 400);
    assert_eq!(empathy.confidence, ConfidenceTier::High);
    assert!(!empathy.scope.is_relaxed());
}

#[test]
fn test_value_at_p10_is_a_growth_area() {
    let points = population(400);
    let individual = MetricValues::new().with(Metric::Empathy, empathy_at(&points, 10.0));

    let result = comparator()
        .compare(&points, &individual, &FilterSpec::global(B))
        .unwrap();

    assert_eq!(
        ranked(&result, Metric::Empathy).classification,
        Classification::GrowthArea
    );
}

#[test]
fn test_median_value_is_neutral() {
    let points = population(400);
    let individual = MetricValues::new().with(Metric::Empathy, empathy_at(&points, 50.0));

    let result = comparator()
        .compare(&points, &individual, &FilterSpec::global(B))
        .unwrap();
    let empathy = ranked(&result, Metric::Empathy);

    assert!((empathy.percentile_rank - 50.0).abs() < 1e-6);
    assert_eq!(empathy.classification, Classification::Neutral);
}

/// Scenario: the whole benchmark holds ten records
/// Expected: explicit insufficient-population result, never a silent rank
#[test]
fn test_tiny_population_is_insufficient() {
    let points = population(10);
    let individual = MetricValues::new()
        .with(Metric::Empathy, 100.0)
        .with(Metric::EqTotal, 100.0);

    let result = comparator()
        .compare(&points, &individual, &FilterSpec::global(B))
        .unwrap();

    match result {
        ComparisonResult::InsufficientPopulation { withheld } => {
            assert_eq!(withheld.len(), 2);
            assert!(withheld.iter().all(|w| w.best_available == 10 && w.required == 30));
        }
        ComparisonResult::Report(_) => panic!("Expected InsufficientPopulation"),
    }
}

#[test]
fn test_out_of_range_value_is_rejected() {
    let points = population(400);
    let individual = MetricValues::new().with(Metric::Empathy, 150.0);

    let err = comparator()
        .compare(&points, &individual, &FilterSpec::global(B))
        .unwrap_err();

    assert!(matches!(err, EngineError::ValueOutOfRange { ref metric, .. } if metric == "empathy"));
}

#[test]
fn test_metrics_resolve_to_their_own_scopes() {
    let points = population(400);
    let requested = FilterSpec::from_expr(B, "country=FR").unwrap();
    let individual = MetricValues::new()
        .with(Metric::Empathy, 84.0)
        .with(Metric::Vision, 50.0);

    let result = comparator().compare(&points, &individual, &requested).unwrap();
    let empathy = ranked(&result, Metric::Empathy);
    let vision = ranked(&result, Metric::Vision);

    // 50 FR records answer empathy, only 13 answer vision
    assert_eq!(empathy.scope.level, ScopeLevel::Country);
    assert_eq!(empathy.n, 50);
    assert_eq!(vision.scope.level, ScopeLevel::Global);
    assert_eq!(vision.n, 100);

    let disclosures = result.report().unwrap().disclosures();
    assert_eq!(
        disclosures,
        vec!["This comparison used global data because country-level data was insufficient."
            .to_string()]
    );
}

#[test]
fn test_unanswerable_metric_is_withheld_alongside_ranked_ones() {
    let points = population(400);
    let individual = MetricValues::new()
        .with(Metric::Empathy, 100.0)
        .with(Metric::Resilience, 60.0);

    let result = comparator()
        .compare(&points, &individual, &FilterSpec::global(B))
        .unwrap();
    let report = result.report().unwrap();

    assert_eq!(report.ranked().count(), 1);
    let withheld: Vec<_> = report.withheld().collect();
    assert_eq!(withheld.len(), 1);
    assert_eq!(withheld[0].metric, Metric::Resilience);
    assert_eq!(withheld[0].best_available, 0);
}

#[test]
fn test_strongest_outcome_brings_profile_and_correlations() {
    let points = population(400);
    let individual = MetricValues::new()
        .with(Metric::Empathy, 110.0)
        .with(Metric::Effectiveness, 125.0);

    let result = comparator()
        .compare(&points, &individual, &FilterSpec::global(B))
        .unwrap();
    let report = result.report().unwrap();

    assert_eq!(report.strongest_outcome, Some(Metric::Effectiveness));
    let profile = report.top_performers.as_ref().unwrap();
    assert_eq!(profile.outcome, Metric::Effectiveness);
    assert_eq!(profile.top_n, 40);

    let correlations = report.correlations.as_ref().unwrap();
    assert_eq!(correlations.outcome, Metric::Effectiveness);
    assert_eq!(correlations.results[0].competency, Metric::Empathy);
    assert!(report.notes.is_empty());
}

#[test]
fn test_no_outcome_means_no_outcome_context() {
    let points = population(400);
    let individual = MetricValues::new().with(Metric::Empathy, 110.0);

    let result = comparator()
        .compare(&points, &individual, &FilterSpec::global(B))
        .unwrap();
    let report = result.report().unwrap();

    assert_eq!(report.strongest_outcome, None);
    assert!(report.top_performers.is_none());
    assert!(report.correlations.is_none());
}

#[test]
fn test_small_top_group_becomes_a_note() {
    // 200 records: the top decile holds 20, below the 30 required
    let points = population(200);
    let individual = MetricValues::new().with(Metric::Effectiveness, 90.0);

    let result = comparator()
        .compare(&points, &individual, &FilterSpec::global(B))
        .unwrap();
    let report = result.report().unwrap();

    assert_eq!(report.strongest_outcome, Some(Metric::Effectiveness));
    assert!(report.top_performers.is_none());
    assert_eq!(report.notes.len(), 1);
    assert!(report.notes[0].contains("top group n=20"));
}

#[test]
fn test_capped_population_is_disclosed() {
    let points = population(400);
    let config = EngineConfig {
        population_cap: Some(100),
        ..EngineConfig::default()
    };
    let individual = MetricValues::new().with(Metric::Empathy, 100.0);

    let result = Comparator::from_config(&config)
        .compare(&points, &individual, &FilterSpec::global(B))
        .unwrap();
    let empathy = ranked(&result, Metric::Empathy);

    assert_eq!(empathy.n, 100);
    assert_eq!(empathy.confidence, ConfidenceTier::Medium);
    let sampling = empathy.sampling.unwrap();
    assert_eq!(sampling.population_n, 400);
    assert_eq!(
        result.report().unwrap().disclosures(),
        vec!["Percentiles for empathy were computed from a stride sample of 100 out of 400 records."
            .to_string()]
    );
}

#[test]
fn test_report_string_sections() {
    let points = population(400);
    let requested = FilterSpec::from_expr(B, "country=FR").unwrap();
    let individual = MetricValues::new()
        .with(Metric::Vision, 50.0)
        .with(Metric::Effectiveness, 120.0)
        .with(Metric::Resilience, 40.0);

    let text = comparator()
        .compare(&points, &individual, &requested)
        .unwrap()
        .to_report_string();

    assert!(text.contains("Benchmark comparison for #21 [country=FR]"));
    assert!(text.contains("Withheld:"));
    assert!(text.contains("Strongest outcome: effectiveness"));
    assert!(text.contains("Notes:"));
    assert!(text.contains("because country-level data was insufficient"));
}

#[test]
fn test_insufficient_population_report_string() {
    let points = population(5);
    let individual = MetricValues::new().with(Metric::Empathy, 100.0);
    let text = comparator()
        .compare(&points, &individual, &FilterSpec::global(B))
        .unwrap()
        .to_report_string();
    assert!(text.starts_with("No metric could be ranked"));
    assert!(text.contains("best available n=5"));
}
