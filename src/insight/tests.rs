// Top-performer and correlation scenarios
//
// The synthetic population has one competency that tracks the outcome
// exactly, one that is pseudo-random noise, and nothing else, so the
// expected ranking is unambiguous.

use super::*;
use crate::catalog::Metric;
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::fallback::ScopeLevel;
use crate::filter::FilterSpec;
use crate::record::{BenchmarkId, DataPoint, Demographics, MetricValues};
use chrono::NaiveDate;

const B: BenchmarkId = BenchmarkId(11);

fn record(i: usize, country: &str) -> DataPoint {
    let x = i as f64;
    let metrics = MetricValues::new()
        .with(Metric::Effectiveness, 70.0 + x * 0.15)
        .with(Metric::Empathy, 80.0 + x * 0.1)
        .with(Metric::NobleGoals, 80.0 + x * 0.1)
        .with(Metric::Optimism, 100.0 + ((i * 7) % 11) as f64);
    let demographics = Demographics {
        country: Some(country.to_string()),
        ..Demographics::default()
    };
    DataPoint::new(
        NaiveDate::from_ymd_opt(2023, 9, 1).unwrap(),
        demographics,
        metrics,
    )
}

fn population(n: usize) -> Vec<DataPoint> {
    (0..n).map(|i| record(i, "DE")).collect()
}

#[test]
fn test_effect_magnitude_classes() {
    assert_eq!(EffectMagnitude::classify(0.1), EffectMagnitude::Negligible);
    assert_eq!(EffectMagnitude::classify(-0.3), EffectMagnitude::Small);
    assert_eq!(EffectMagnitude::classify(0.5), EffectMagnitude::Medium);
    assert_eq!(EffectMagnitude::classify(-0.79), EffectMagnitude::Medium);
    assert_eq!(EffectMagnitude::classify(0.8), EffectMagnitude::Large);
    assert!(!EffectMagnitude::Negligible.is_distinguishing());
    assert!(EffectMagnitude::Small.is_distinguishing());
}

#[test]
fn test_correlation_strength_classes() {
    assert_eq!(CorrelationStrength::classify(0.29), CorrelationStrength::Weak);
    assert_eq!(CorrelationStrength::classify(-0.3), CorrelationStrength::Moderate);
    assert_eq!(CorrelationStrength::classify(0.5), CorrelationStrength::Strong);
    assert_eq!(CorrelationStrength::classify(-0.92), CorrelationStrength::Strong);
}

/// Scenario: empathy rises in lockstep with effectiveness
/// Expected: empathy is the top-ranked trait with a large effect
#[test]
fn test_perfectly_correlated_metric_ranks_first() {
    let points = population(400);
    let profiler = TopPerformerProfiler::from_config(&EngineConfig::default());

    let profile = profiler
        .profile(&points, &FilterSpec::global(B), Metric::Effectiveness)
        .unwrap();

    assert_eq!(profile.population_n, 400);
    assert_eq!(profile.top_n, 40);
    assert_eq!(profile.traits.len(), 3);
    assert!(matches!(
        profile.traits[0].metric,
        Metric::Empathy | Metric::NobleGoals
    ));
    assert_eq!(profile.traits[0].magnitude, EffectMagnitude::Large);
    assert_eq!(profile.traits[2].metric, Metric::Optimism);
    assert!(profile.traits[0].effect_size > 1.0);
}

#[test]
fn test_equal_effects_keep_catalog_order() {
    let points = population(400);
    let profile = TopPerformerProfiler::from_config(&EngineConfig::default())
        .profile(&points, &FilterSpec::global(B), Metric::Effectiveness)
        .unwrap();

    // Identical columns give bit-identical effect sizes
    assert_eq!(profile.traits[0].effect_size, profile.traits[1].effect_size);
    assert_eq!(profile.traits[0].metric, Metric::Empathy);
    assert_eq!(profile.traits[1].metric, Metric::NobleGoals);
}

#[test]
fn test_outcome_is_not_its_own_trait() {
    let points = population(400);
    let profile = TopPerformerProfiler::from_config(&EngineConfig::default())
        .profile(&points, &FilterSpec::global(B), Metric::Effectiveness)
        .unwrap();
    assert!(profile.traits.iter().all(|t| t.metric != Metric::Effectiveness));
}

#[test]
fn test_small_top_group_escalates_scope() {
    let mut points: Vec<DataPoint> = (0..50).map(|i| record(i, "FR")).collect();
    points.extend((50..400).map(|i| record(i, "DE")));
    let requested = FilterSpec::from_expr(B, "country=FR").unwrap();

    let profile = TopPerformerProfiler::from_config(&EngineConfig::default())
        .profile(&points, &requested, Metric::Effectiveness)
        .unwrap();

    assert_eq!(profile.scope.level, ScopeLevel::Global);
    assert!(profile.scope.is_relaxed());
    assert_eq!(profile.top_n, 40);
}

#[test]
fn test_top_group_below_minimum_is_a_non_result() {
    let points = population(100);
    let err = TopPerformerProfiler::from_config(&EngineConfig::default())
        .profile(&points, &FilterSpec::global(B), Metric::Effectiveness)
        .unwrap_err();

    match err {
        EngineError::InsufficientSample(insufficient) => {
            assert_eq!(insufficient.metric, Metric::Effectiveness);
            assert_eq!(insufficient.best_available, 10);
            assert_eq!(insufficient.required, 30);
        }
        other => panic!("Expected InsufficientSample, got {:?}", other),
    }
}

#[test]
fn test_profile_report_lists_distinguishing_traits() {
    let points = population(400);
    let profile = TopPerformerProfiler::from_config(&EngineConfig::default())
        .profile(&points, &FilterSpec::global(B), Metric::Effectiveness)
        .unwrap();
    let report = profile.to_report_string();
    assert!(report.contains("Top performers in effectiveness"));
    assert!(report.contains("empathy"));
    assert!(report.contains("large"));
}

#[test]
fn test_correlation_matrix_groups_and_orders() {
    let points = population(400);
    let matrix = CorrelationAnalyzer::from_config(&EngineConfig::default())
        .analyze(&points, &FilterSpec::global(B))
        .unwrap();

    // One group per outcome in catalog order, populated only where data exists
    let outcomes: Vec<Metric> = matrix.groups.iter().map(|g| g.outcome).collect();
    assert_eq!(outcomes, Metric::outcomes().collect::<Vec<_>>());

    let effectiveness = matrix.for_outcome(Metric::Effectiveness).unwrap();
    assert_eq!(effectiveness.len(), 3);
    assert_eq!(effectiveness[0].competency, Metric::Empathy);
    assert_eq!(effectiveness[1].competency, Metric::NobleGoals);
    assert_eq!(effectiveness[2].competency, Metric::Optimism);
    assert!((effectiveness[0].r - 1.0).abs() < 1e-12);
    assert_eq!(effectiveness[0].strength, CorrelationStrength::Strong);
    assert_eq!(effectiveness[0].n, 400);

    assert!(matrix.for_outcome(Metric::Wellbeing).unwrap().is_empty());
    assert_eq!(matrix.len(), 3);
}

#[test]
fn test_pairs_below_minimum_are_omitted() {
    let points = population(25);
    let matrix = CorrelationAnalyzer::from_config(&EngineConfig::default())
        .analyze(&points, &FilterSpec::global(B))
        .unwrap();
    assert!(matrix.is_empty());
    assert_eq!(matrix.population_n, 25);
}

#[test]
fn test_correlation_population_is_capped_and_disclosed() {
    let points = population(400);
    let config = EngineConfig {
        population_cap: Some(100),
        ..EngineConfig::default()
    };
    let matrix = CorrelationAnalyzer::from_config(&config)
        .analyze_outcomes(&points, &FilterSpec::global(B), &[Metric::Effectiveness])
        .unwrap();

    let disclosure = matrix.sampling.unwrap();
    assert_eq!(disclosure.population_n, 400);
    assert_eq!(disclosure.used_n, 100);
    assert_eq!(matrix.population_n, 400);
    assert!(matrix.results().all(|r| r.n == 100));
}

/// Scenario: 40 FR records answered empathy but not the outcome
/// Expected: the walk widens to global instead of reporting an empty matrix
#[test]
fn test_sparse_outcome_widens_correlation_scope() {
    let mut points: Vec<DataPoint> = (0..40)
        .map(|i| {
            let metrics = MetricValues::new().with(Metric::Empathy, 80.0 + i as f64);
            DataPoint::new(
                NaiveDate::from_ymd_opt(2023, 9, 1).unwrap(),
                Demographics {
                    country: Some("FR".to_string()),
                    ..Demographics::default()
                },
                metrics,
            )
        })
        .collect();
    points.extend((0..400).map(|i| record(i, "DE")));
    let requested = FilterSpec::from_expr(B, "country=FR").unwrap();

    let matrix = CorrelationAnalyzer::from_config(&EngineConfig::default())
        .analyze_outcomes(&points, &requested, &[Metric::Effectiveness])
        .unwrap();

    assert_eq!(matrix.scope.level, ScopeLevel::Global);
    assert_eq!(matrix.population_n, 440);
    let effectiveness = matrix.for_outcome(Metric::Effectiveness).unwrap();
    assert_eq!(effectiveness[0].competency, Metric::Empathy);
    assert_eq!(effectiveness[0].n, 400);
}

/// Scenario: enough complete pairs in the requested slice
/// Expected: no relaxation even though other records exist
#[test]
fn test_correlation_scope_kept_when_pairs_suffice() {
    let mut points: Vec<DataPoint> = (0..60).map(|i| record(i, "FR")).collect();
    points.extend((60..400).map(|i| record(i, "DE")));
    let requested = FilterSpec::from_expr(B, "country=FR").unwrap();

    let matrix = CorrelationAnalyzer::from_config(&EngineConfig::default())
        .analyze_outcomes(&points, &requested, &[Metric::Effectiveness])
        .unwrap();

    assert!(!matrix.scope.is_relaxed());
    assert_eq!(matrix.for_outcome(Metric::Effectiveness).unwrap()[0].n, 60);
}

/// Scenario: population cap far below the population size
/// Expected: the top group is taken from the whole population, only trait
/// statistics run on the sample
#[test]
fn test_capped_population_keeps_full_top_group() {
    let points = population(400);
    let config = EngineConfig {
        population_cap: Some(100),
        ..EngineConfig::default()
    };
    assert!(config.validate().is_ok());

    let profile = TopPerformerProfiler::from_config(&config)
        .profile(&points, &FilterSpec::global(B), Metric::Effectiveness)
        .unwrap();

    assert_eq!(profile.population_n, 400);
    assert_eq!(profile.top_n, 40);
    let sampling = profile.sampling.unwrap();
    assert_eq!(sampling.population_n, 400);
    assert_eq!(sampling.used_n, 100);
    assert_eq!(profile.traits[0].population_n, 100);
    assert_eq!(profile.traits[0].top_n, 40);
    assert_eq!(profile.traits[0].magnitude, EffectMagnitude::Large);
}
