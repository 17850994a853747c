//! CLI argument parsing for eq-benchmark

use crate::catalog::Metric;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Output format for analysis results
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text format (default)
    Text,
    /// JSON format for machine parsing
    Json,
    /// CSV format for spreadsheet and dashboard import
    Csv,
}

#[derive(Parser, Debug)]
#[command(name = "eq-benchmark")]
#[command(version)]
#[command(
    about = "Comparative benchmark analysis for emotional-intelligence assessment populations",
    long_about = None
)]
pub struct Cli {
    /// Benchmark store (JSON document with a `benchmarks` array)
    #[arg(long = "data", value_name = "FILE", global = true)]
    pub data: Option<PathBuf>,

    /// Engine configuration (TOML); defaults apply when omitted
    #[arg(long = "config", value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long = "format", value_enum, default_value = "text", global = true)]
    pub format: OutputFormat,

    /// Enable debug tracing output to stderr
    #[arg(long = "debug", global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Population selection shared by every analysis subcommand
#[derive(clap::Args, Debug, Clone)]
pub struct Selection {
    /// Benchmark id; may be omitted when the store holds exactly one benchmark
    #[arg(short = 'b', long = "benchmark", value_name = "ID")]
    pub benchmark: Option<u64>,

    /// Demographic filter (e.g., -f country=FR,sector=Education)
    #[arg(short = 'f', long = "filter", value_name = "EXPR")]
    pub filter: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Descriptive statistics per metric, with resolved scope and confidence
    Stats {
        #[command(flatten)]
        selection: Selection,

        /// Metric to describe (repeatable); all catalog metrics when omitted
        #[arg(short = 'm', long = "metric", value_name = "KEY", value_parser = parse_metric)]
        metrics: Vec<Metric>,
    },

    /// Competency/outcome correlation matrix
    Correlations {
        #[command(flatten)]
        selection: Selection,

        /// Restrict the output to one outcome
        #[arg(long = "outcome", value_name = "KEY", value_parser = parse_metric)]
        outcome: Option<Metric>,
    },

    /// Traits that distinguish an outcome's top performers
    TopPerformers {
        #[command(flatten)]
        selection: Selection,

        /// Outcome metric defining the top group
        #[arg(long = "outcome", value_name = "KEY", value_parser = parse_metric)]
        outcome: Metric,

        /// Top-group percentile (overrides the configuration)
        #[arg(long = "quantile", value_name = "P")]
        quantile: Option<f64>,
    },

    /// Compare one individual's scores against the population
    Compare {
        #[command(flatten)]
        selection: Selection,

        /// Individual score (repeatable), e.g. --score empathy=112
        #[arg(short = 's', long = "score", value_name = "KEY=VALUE", value_parser = parse_score)]
        scores: Vec<(Metric, f64)>,

        /// JSON object of metric scores, e.g. {"empathy": 112, "optimism": 98}
        #[arg(long = "individual", value_name = "FILE")]
        individual: Option<PathBuf>,
    },

    /// List the metric catalog
    Metrics,
}

/// clap value parser for metric keys
pub fn parse_metric(key: &str) -> Result<Metric, String> {
    Metric::from_key(key).map_err(|e| e.to_string())
}

/// clap value parser for `metric=value` scores
pub fn parse_score(expr: &str) -> Result<(Metric, f64), String> {
    let (key, value) = expr
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", expr))?;
    let metric = parse_metric(key)?;
    let value: f64 = value
        .trim()
        .parse()
        .map_err(|_| format!("invalid score '{}' for {}", value.trim(), metric))?;
    Ok((metric, value))
}
