//! Subcommand implementations.

pub mod compare;
pub mod summary;

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use repro_eval::{MetricSelection, PerfLog, ResultSet, SummaryReporter};
use tracing::warn;

/// Metric names accepted on the command line.
pub const METRIC_CHOICES: [&str; 5] = ["psnr", "ssim", "mse", "fid", "all"];

/// Performance-log options shared by `compare --summary` and `summary`.
#[derive(Args, Debug, Default)]
pub struct PerfArgs {
    /// Performance log to take per-target timings from
    #[arg(long, visible_alias = "plog")]
    pub perf_log: Option<PathBuf>,

    /// Tag preceding the timing in the perf log, e.g. "Mean Latency"
    #[arg(long, visible_alias = "ptag")]
    pub perf_tag: Option<String>,

    /// Extra tags every kept perf-log line must also contain
    #[arg(long, visible_alias = "extra-ptags", num_args = 1..)]
    pub extra_perf_tags: Vec<String>,
}

impl PerfArgs {
    /// Load the perf log, or `None` if not requested or not readable.
    pub fn load(&self) -> Result<Option<PerfLog>> {
        let (Some(path), Some(tag)) = (&self.perf_log, &self.perf_tag) else {
            if self.perf_log.is_some() {
                warn!("--perf-log given without --perf-tag; timings are not shown");
            }
            return Ok(None);
        };
        if !path.exists() {
            warn!("Perf log {} does not exist; timings are not shown", path.display());
            return Ok(None);
        }
        Ok(Some(PerfLog::load(path, tag, &self.extra_perf_tags)?))
    }
}

/// Print ranked tables for the selected metrics to stdout.
pub fn print_summary(
    results: &ResultSet,
    metrics: &MetricSelection,
    perf: &PerfArgs,
) -> Result<()> {
    let perf_log = perf.load()?;
    let mut reporter = SummaryReporter::new(results);
    if let Some(log) = &perf_log {
        reporter = reporter.with_perf_log(log);
    }
    print!("{}", reporter.render(metrics)?);
    Ok(())
}
