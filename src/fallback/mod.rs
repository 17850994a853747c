//! Fallback resolution for undersized demographic slices
//!
//! A requested slice (say, nurses in France) is often too small to support a
//! statistic. Rather than report a number computed from five people, the
//! resolver widens the scope one dimension at a time:
//!
//! source → job role → job function → age range → gender → sector → region
//! → country → global
//!
//! Every resolution carries the scope actually used, the dimensions that
//! were relaxed, and a confidence tier derived from the final `n`.

mod confidence;
mod resolver;
mod scope;

pub use confidence::{
    required_sample_size, ConfidenceTier, HIGH_CONFIDENCE_N, MARGIN_OF_ERROR,
    MEDIUM_CONFIDENCE_N, Z_95,
};
pub use resolver::{FallbackResolver, Resolution, ScopeAttempt, Walk};
pub use scope::{Scope, ScopeLevel};
