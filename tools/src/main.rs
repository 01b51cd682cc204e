//! prep-runner: headless dashboard data preparation.
//!
//! Usage:
//!   prep-runner --input anomalies_detected.csv --out powerbi_data --seed 42
//!   prep-runner --config prep.json --out-of-range clamp --json
//!   prep-runner --filter --agencies EPA,DOD --min-amount 100 --max-amount 5000

use anyhow::{Context, Result};
use chrono::NaiveDate;
use spendrisk_core::{
    config::PipelineConfig,
    filter::{self, ExplorationFilter},
    ingest::read_transactions,
    pipeline::{PreparationPipeline, RunSummary},
    risk::OutOfRangePolicy,
};
use std::{
    env,
    path::{Path, PathBuf},
};

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let config = build_config(&args)?;
    let json = has_flag(&args, "--json");

    if has_flag(&args, "--filter") {
        return run_filter(&args, &config);
    }

    let pipeline = PreparationPipeline::new(config);
    if !json {
        println!("Spending risk preparation - prep-runner");
        println!("  run_id:     {}", pipeline.run_id);
        println!("  seed:       {}", pipeline.config.seed);
        println!("  input:      {}", pipeline.config.input_path.display());
        println!("  output:     {}", pipeline.config.output_dir.display());
        println!();
    }

    let summary = pipeline.run()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary);
    }
    Ok(())
}

/// Config file first (if given), then explicit flags on top.
fn build_config(args: &[String]) -> Result<PipelineConfig> {
    let mut config = match arg_value(args, "--config") {
        Some(path) => PipelineConfig::load(Path::new(path))?,
        None => PipelineConfig::default(),
    };

    if let Some(v) = arg_value(args, "--input") {
        config.input_path = PathBuf::from(v);
    }
    if let Some(v) = arg_value(args, "--out") {
        config.output_dir = PathBuf::from(v);
    }
    if let Some(v) = arg_value(args, "--seed") {
        config.seed = v.parse::<u64>().with_context(|| format!("--seed {v}"))?;
    }
    if let Some(v) = arg_value(args, "--epoch") {
        config.epoch = NaiveDate::parse_from_str(v, "%Y-%m-%d")
            .with_context(|| format!("--epoch {v} (expected YYYY-MM-DD)"))?;
    }
    if let Some(v) = arg_value(args, "--delimiter") {
        let mut chars = v.chars();
        config.delimiter = match (chars.next(), chars.next()) {
            (Some(c), None) => c,
            _ => anyhow::bail!("--delimiter must be exactly one character, got {v:?}"),
        };
    }
    if let Some(v) = arg_value(args, "--out-of-range") {
        config.out_of_range = v.parse::<OutOfRangePolicy>()?;
    }

    config.validate()?;
    log::debug!("effective config: {config:?}");
    Ok(config)
}

fn run_filter(args: &[String], config: &PipelineConfig) -> Result<()> {
    let delimiter = config.delimiter_byte()?;
    let records = read_transactions(&config.input_path, delimiter)?;

    let filter = ExplorationFilter {
        agencies: arg_value(args, "--agencies").map(|list| {
            list.split(',')
                .map(str::trim)
                .filter(|a| !a.is_empty())
                .map(str::to_string)
                .collect()
        }),
        min_amount: parse_opt(args, "--min-amount")?,
        max_amount: parse_opt(args, "--max-amount")?,
    };

    let outcome = filter::explore(&records, &filter)?;
    filter::export_exploration(&outcome, &config.output_dir, delimiter)?;

    println!("=== EXPLORATION ===");
    println!("  rows kept:      {} of {}", outcome.rows.len(), records.len());
    if let Some((lo, hi)) = filter::amount_bounds(&outcome.rows) {
        println!("  amount range:   {lo:.2} .. {hi:.2}");
    }
    for s in &outcome.spread {
        println!(
            "  {:<14} n={:<6} median={:.2} iqr={:.2}..{:.2}",
            s.agency, s.count, s.median, s.q1, s.q3
        );
    }
    println!("  written to:     {}", config.output_dir.display());
    Ok(())
}

fn print_summary(summary: &RunSummary) {
    println!("=== RUN SUMMARY ===");
    println!("  total transactions:  {}", summary.total_transactions);
    println!("  anomalies detected:  {}", summary.anomalies_detected);
    println!("  detection rate:      {:.2}%", summary.detection_rate);
    if summary.unbucketed_count > 0 {
        println!("  unbucketed rows:     {} (see Unbucketed_Count)", summary.unbucketed_count);
    }
    println!("  files created:       {}", summary.files_created);
    println!("  output dir:          {}", summary.output_dir.display());
}

fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|a| a == flag)
}

fn arg_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn parse_opt<T: std::str::FromStr>(args: &[String], flag: &str) -> Result<Option<T>>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    arg_value(args, flag)
        .map(|v| v.parse::<T>().with_context(|| format!("{flag} {v}")))
        .transpose()
}
