use anyhow::{bail, Context, Result};
use clap::Parser;
use eq_benchmark::{
    catalog::{self, Metric},
    cli::{Cli, Command, OutputFormat, Selection},
    config::EngineConfig,
    csv_output,
    engine::{BenchmarkEngine, ResolvedStat},
    error::{EngineError, InsufficientSample},
    filter::FilterSpec,
    insight::CorrelationMatrix,
    record::{BenchmarkId, MetricValues},
    source::InMemoryStore,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber for debug output
fn init_tracing(debug: bool) {
    if debug {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive(tracing::Level::TRACE.into()),
            )
            .with_writer(std::io::stderr)
            .init();
    }
}

/// JSON row of the `stats` command
#[derive(Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum StatRow {
    Ok(ResolvedStat),
    InsufficientSample(InsufficientSample),
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", json);
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    match path {
        Some(path) => EngineConfig::from_toml(path),
        None => Ok(EngineConfig::default()),
    }
}

fn load_store(path: Option<&Path>) -> Result<InMemoryStore> {
    let Some(path) = path else {
        bail!("--data FILE is required for analysis commands");
    };
    InMemoryStore::from_json_file(path)
}

/// Build the requested filter, defaulting the benchmark when the store holds only one
fn resolve_filter(store: &InMemoryStore, selection: &Selection) -> Result<FilterSpec> {
    let benchmark = match selection.benchmark {
        Some(id) => BenchmarkId(id),
        None => match store.ids().as_slice() {
            [only] => *only,
            [] => bail!("Benchmark store is empty"),
            ids => bail!(
                "Store holds {} benchmarks; select one with --benchmark",
                ids.len()
            ),
        },
    };
    let filter = FilterSpec::from_expr(benchmark, selection.filter.as_deref().unwrap_or(""))?;
    Ok(filter)
}

/// Merge `--individual` JSON scores with repeated `--score` flags (flags win)
fn load_individual(path: Option<&Path>, scores: &[(Metric, f64)]) -> Result<MetricValues> {
    let mut individual = MetricValues::new();
    if let Some(path) = path {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read individual scores: {}", path.display()))?;
        let map: BTreeMap<String, f64> =
            serde_json::from_str(&content).context("Individual scores must be a JSON object")?;
        for (key, value) in map {
            individual = individual.with(Metric::from_key(&key)?, value);
        }
    }
    for (metric, value) in scores {
        individual = individual.with(*metric, *value);
    }
    if individual.present_count() == 0 {
        bail!("No scores given; use --score KEY=VALUE or --individual FILE");
    }
    Ok(individual)
}

fn print_stat_text(row: &Result<ResolvedStat, InsufficientSample>) {
    match row {
        Ok(stat) => {
            let s = &stat.stats;
            println!(
                "{:<32} n={:<6} mean={:>8.2} sd={:>7.2} p25={:>8.2} p50={:>8.2} p75={:>8.2}  [{}, {} confidence]",
                stat.metric.key(),
                s.n,
                s.mean,
                s.std_dev,
                s.p25,
                s.median,
                s.p75,
                stat.scope,
                stat.confidence
            );
            if let Some(sampling) = &stat.sampling {
                println!("{:<32} {}", "", sampling.describe());
            }
        }
        Err(withheld) => println!("{:<32} withheld: {}", withheld.metric.key(), withheld),
    }
}

fn print_correlations_text(matrix: &CorrelationMatrix, outcome: Option<Metric>) {
    println!(
        "Correlations at {} (n={})",
        matrix.scope, matrix.population_n
    );
    if let Some(sampling) = &matrix.sampling {
        println!("Computed from a {}", sampling.describe());
    }
    for group in &matrix.groups {
        if outcome.is_some_and(|o| o != group.outcome) {
            continue;
        }
        println!();
        println!("{}:", group.outcome.key());
        if group.results.is_empty() {
            println!("  (no pair reached the minimum sample)");
        }
        for result in &group.results {
            println!(
                "  {:<32} r={:+.3}  {:<8} n={}",
                result.competency.key(),
                result.r,
                result.strength.name(),
                result.n
            );
        }
    }
}

fn run_stats(
    engine: &BenchmarkEngine<InMemoryStore>,
    filter: &FilterSpec,
    metrics: &[Metric],
    format: OutputFormat,
) -> Result<()> {
    let rows = if metrics.is_empty() {
        engine.statistics(filter)?
    } else {
        let mut rows = Vec::with_capacity(metrics.len());
        for metric in metrics {
            match engine.statistic(*metric, filter) {
                Ok(stat) => rows.push(Ok(stat)),
                Err(EngineError::InsufficientSample(withheld)) => rows.push(Err(withheld)),
                Err(e) => return Err(e.into()),
            }
        }
        rows
    };

    match format {
        OutputFormat::Text => {
            for row in &rows {
                print_stat_text(row);
            }
        }
        OutputFormat::Json => {
            let json_rows: Vec<StatRow> = rows
                .into_iter()
                .map(|row| match row {
                    Ok(stat) => StatRow::Ok(stat),
                    Err(withheld) => StatRow::InsufficientSample(withheld),
                })
                .collect();
            print_json(&json_rows)?;
        }
        OutputFormat::Csv => {
            let mut output = csv_output::CsvStatsOutput::new();
            for row in &rows {
                match row {
                    Ok(stat) => output.add_stat(stat),
                    Err(withheld) => output.add_withheld(withheld),
                }
            }
            print!("{}", output.to_csv());
        }
    }
    Ok(())
}

fn run_metrics(format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => {
            for def in catalog::catalog() {
                println!(
                    "{:<32} {:<12} [{}, {}]",
                    def.key,
                    def.category.name(),
                    def.range.min,
                    def.range.max
                );
            }
        }
        OutputFormat::Json => print_json(&catalog::catalog().collect::<Vec<_>>())?,
        OutputFormat::Csv => {
            println!("key,category,min,max");
            for def in catalog::catalog() {
                println!(
                    "{},{},{},{}",
                    def.key,
                    def.category.name(),
                    def.range.min,
                    def.range.max
                );
            }
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Cli::parse();

    init_tracing(args.debug);

    if let Command::Metrics = args.command {
        return run_metrics(args.format);
    }

    let mut config = load_config(args.config.as_deref())?;
    if let Command::TopPerformers {
        quantile: Some(q), ..
    } = &args.command
    {
        config.top_performer_quantile = *q;
    }
    let store = load_store(args.data.as_deref())?;

    match &args.command {
        Command::Stats { selection, metrics } => {
            let filter = resolve_filter(&store, selection)?;
            let engine = BenchmarkEngine::new(store, config)?;
            run_stats(&engine, &filter, metrics, args.format)?;
        }
        Command::Correlations { selection, outcome } => {
            let filter = resolve_filter(&store, selection)?;
            let engine = BenchmarkEngine::new(store, config)?;
            let matrix = engine.correlations(&filter)?;
            match args.format {
                OutputFormat::Text => print_correlations_text(&matrix, *outcome),
                OutputFormat::Json => match outcome {
                    Some(o) => print_json(&matrix.for_outcome(*o))?,
                    None => print_json(matrix.as_ref())?,
                },
                OutputFormat::Csv => print!("{}", csv_output::correlations_to_csv(&matrix)),
            }
        }
        Command::TopPerformers {
            selection, outcome, ..
        } => {
            let filter = resolve_filter(&store, selection)?;
            let engine = BenchmarkEngine::new(store, config)?;
            let profile = engine.top_performers(*outcome, &filter)?;
            match args.format {
                OutputFormat::Text => print!("{}", profile.to_report_string()),
                OutputFormat::Json => print_json(&profile)?,
                OutputFormat::Csv => print!("{}", csv_output::top_performers_to_csv(&profile)),
            }
        }
        Command::Compare {
            selection,
            scores,
            individual,
        } => {
            let filter = resolve_filter(&store, selection)?;
            let individual = load_individual(individual.as_deref(), scores)?;
            let engine = BenchmarkEngine::new(store, config)?;
            let result = engine.compare(&individual, &filter)?;
            match args.format {
                OutputFormat::Text => print!("{}", result.to_report_string()),
                OutputFormat::Json => print_json(&result)?,
                OutputFormat::Csv => print!("{}", csv_output::comparison_to_csv(&result)),
            }
        }
        Command::Metrics => run_metrics(args.format)?,
    }

    Ok(())
}
