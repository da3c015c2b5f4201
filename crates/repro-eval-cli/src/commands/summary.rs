//! Summary command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use repro_eval::{MetricSelection, ResultSet};
use tracing::debug;

use super::{METRIC_CHOICES, PerfArgs, print_summary};

#[derive(Args, Debug)]
pub struct SummaryArgs {
    /// Results JSON written by `repro-eval compare --json`
    #[arg(short, long)]
    input: PathBuf,

    /// Metrics to summarize
    #[arg(num_args = 1.., default_value = "all", value_parser = METRIC_CHOICES)]
    metrics: Vec<String>,

    #[command(flatten)]
    perf: PerfArgs,
}

pub fn run(args: SummaryArgs) -> Result<()> {
    let metrics = MetricSelection::parse(&args.metrics)?;
    let results = ResultSet::load(&args.input)
        .with_context(|| format!("Failed to load results from {}", args.input.display()))?;
    debug!("Loaded {} results from {}", results.len(), args.input.display());

    print_summary(&results, &metrics, &args.perf)
}
