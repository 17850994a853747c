//! Population insight: what top performers share, and which competencies
//! move with which outcomes.
//!
//! Both analyses run over a fallback-resolved population and respect the
//! population cap, disclosing any sampling they do.

mod correlation;
mod top_performer;

pub use correlation::{
    CorrelationAnalyzer, CorrelationMatrix, CorrelationResult, CorrelationStrength,
    OutcomeCorrelations,
};
pub use top_performer::{EffectMagnitude, TopPerformerProfile, TopPerformerProfiler, TraitEffect};

#[cfg(test)]
mod tests;
