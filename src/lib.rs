//! eq-benchmark - comparative intelligence over emotional-intelligence assessments
//!
//! This library computes population statistics over benchmark collections of
//! assessment records, ranks individuals against them, profiles what sets top
//! performers apart, and correlates competencies with life outcomes. Every
//! reported number is backed by at least 30 observations: when a requested
//! demographic slice is too small, the scope is relaxed one dimension at a
//! time and the relaxation is disclosed alongside the result.

pub mod cache;
pub mod catalog;
pub mod cli;
pub mod compare;
pub mod config;
pub mod csv_output;
pub mod engine;
pub mod error;
pub mod fallback;
pub mod filter;
pub mod insight;
pub mod record;
pub mod sampling;
pub mod source;
pub mod stats;
