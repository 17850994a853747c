//! Metric catalog
//!
//! Closed registry of every analyzable metric. `Metric::ALL` is in
//! declaration order, and that order is the tie-break order for every ranked
//! output in the crate (effect sizes, correlations).

use crate::error::{EngineError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Grouping of metrics in the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricCategory {
    /// Composite indices (total EQ and the three pursuits)
    CoreIndex,
    /// The eight trainable competencies
    Competency,
    /// Life outcomes and their factors
    Outcome,
    /// Brain-profile talents
    Talent,
}

impl MetricCategory {
    pub fn all() -> &'static [MetricCategory] {
        &[
            MetricCategory::CoreIndex,
            MetricCategory::Competency,
            MetricCategory::Outcome,
            MetricCategory::Talent,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            MetricCategory::CoreIndex => "core_index",
            MetricCategory::Competency => "competency",
            MetricCategory::Outcome => "outcome",
            MetricCategory::Talent => "talent",
        }
    }

    /// Canonical value range shared by every metric of the category
    pub fn range(&self) -> ValueRange {
        match self {
            MetricCategory::CoreIndex | MetricCategory::Competency | MetricCategory::Outcome => {
                ValueRange {
                    min: 65.0,
                    max: 135.0,
                }
            }
            MetricCategory::Talent => ValueRange {
                min: 0.0,
                max: 100.0,
            },
        }
    }
}

/// Inclusive numeric range a metric value must fall in
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
}

impl ValueRange {
    pub fn contains(&self, value: f64) -> bool {
        value.is_finite() && value >= self.min && value <= self.max
    }
}

macro_rules! metric_catalog {
    ($( $variant:ident => $key:literal, $category:ident; )+) => {
        /// Every analyzable metric of an assessment record
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum Metric {
            $( $variant, )+
        }

        impl Metric {
            /// All metrics in declaration order
            pub const ALL: &'static [Metric] = &[ $( Metric::$variant, )+ ];

            pub const COUNT: usize = Metric::ALL.len();

            /// Stable snake_case key used in data files and filters
            pub fn key(self) -> &'static str {
                match self {
                    $( Metric::$variant => $key, )+
                }
            }

            pub fn category(self) -> MetricCategory {
                match self {
                    $( Metric::$variant => MetricCategory::$category, )+
                }
            }

            /// Translation key for the human-readable label
            pub fn label_key(self) -> &'static str {
                match self {
                    $( Metric::$variant => concat!("metric.", $key, ".label"), )+
                }
            }
        }
    };
}

metric_catalog! {
    EqTotal => "eq_total", CoreIndex;
    KnowYourself => "know_yourself", CoreIndex;
    ChooseYourself => "choose_yourself", CoreIndex;
    GiveYourself => "give_yourself", CoreIndex;

    EmotionalLiteracy => "emotional_literacy", Competency;
    RecognizePatterns => "recognize_patterns", Competency;
    ConsequentialThinking => "consequential_thinking", Competency;
    NavigateEmotions => "navigate_emotions", Competency;
    IntrinsicMotivation => "intrinsic_motivation", Competency;
    Optimism => "optimism", Competency;
    Empathy => "empathy", Competency;
    NobleGoals => "noble_goals", Competency;

    Effectiveness => "effectiveness", Outcome;
    Relationships => "relationships", Outcome;
    Wellbeing => "wellbeing", Outcome;
    QualityOfLife => "quality_of_life", Outcome;
    Influence => "influence", Outcome;
    DecisionMaking => "decision_making", Outcome;
    Community => "community", Outcome;
    Network => "network", Outcome;
    Achievement => "achievement", Outcome;
    Satisfaction => "satisfaction", Outcome;
    Balance => "balance", Outcome;
    Health => "health", Outcome;

    DataMining => "data_mining", Talent;
    Modeling => "modeling", Talent;
    Prioritizing => "prioritizing", Talent;
    Connection => "connection", Talent;
    EmotionalInsight => "emotional_insight", Talent;
    Collaboration => "collaboration", Talent;
    Reflecting => "reflecting", Talent;
    Adaptability => "adaptability", Talent;
    CriticalThinking => "critical_thinking", Talent;
    Resilience => "resilience", Talent;
    RiskTolerance => "risk_tolerance", Talent;
    Imagination => "imagination", Talent;
    Proactivity => "proactivity", Talent;
    Commitment => "commitment", Talent;
    ProblemSolving => "problem_solving", Talent;
    Vision => "vision", Talent;
    Designing => "designing", Talent;
    Entrepreneurship => "entrepreneurship", Talent;
}

/// Static description of one catalog entry
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MetricDefinition {
    pub metric: Metric,
    pub key: &'static str,
    pub category: MetricCategory,
    pub label_key: &'static str,
    pub range: ValueRange,
}

impl Metric {
    /// Position in declaration order (also the index into `MetricValues`)
    pub fn index(self) -> usize {
        self as usize
    }

    /// Look up a metric by key; unknown keys are rejected.
    pub fn from_key(key: &str) -> Result<Metric> {
        let key = key.trim();
        Metric::ALL
            .iter()
            .copied()
            .find(|m| m.key() == key)
            .ok_or_else(|| EngineError::InvalidMetric(key.to_string()))
    }

    pub fn range(self) -> ValueRange {
        self.category().range()
    }

    pub fn definition(self) -> MetricDefinition {
        MetricDefinition {
            metric: self,
            key: self.key(),
            category: self.category(),
            label_key: self.label_key(),
            range: self.range(),
        }
    }

    /// Metrics of one category, in declaration order
    pub fn by_category(category: MetricCategory) -> impl Iterator<Item = Metric> {
        Metric::ALL
            .iter()
            .copied()
            .filter(move |m| m.category() == category)
    }

    pub fn competencies() -> impl Iterator<Item = Metric> {
        Self::by_category(MetricCategory::Competency)
    }

    pub fn outcomes() -> impl Iterator<Item = Metric> {
        Self::by_category(MetricCategory::Outcome)
    }

    pub fn is_outcome(self) -> bool {
        self.category() == MetricCategory::Outcome
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Metric {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        Metric::from_key(s)
    }
}

/// Full catalog in declaration order
pub fn catalog() -> impl Iterator<Item = MetricDefinition> {
    Metric::ALL.iter().map(|m| m.definition())
}
