//! Compare command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use repro_eval::{
    DefaultVideoBackend, Metric, MetricSelection, Pattern, PatternOptions, ResultSet, RunConfig,
    Runner,
};
use tracing::{info, warn};

use super::{METRIC_CHOICES, PerfArgs, print_summary};

#[derive(Args, Debug)]
pub struct CompareArgs {
    /// Metrics to compute
    #[arg(num_args = 1.., default_value = "psnr", value_parser = METRIC_CHOICES)]
    metrics: Vec<String>,

    /// Ground-truth image file or directory
    #[arg(long, visible_alias = "i1")]
    img_true: Option<PathBuf>,

    /// Test image file or directory
    #[arg(long, visible_alias = "i2")]
    img_test: Option<PathBuf>,

    /// Ground-truth video file or directory
    #[arg(long, visible_alias = "v1")]
    video_true: Option<PathBuf>,

    /// Test video file or directory
    #[arg(long, visible_alias = "v2")]
    video_test: Option<PathBuf>,

    /// Directory whose subdirectories are each compared against --ref-img-dir
    #[arg(short = 'd', long)]
    img_source_dir: Option<PathBuf>,

    /// Reference image directory for 1-vs-N comparison
    #[arg(short = 'r', long)]
    ref_img_dir: Option<PathBuf>,

    /// Directory searched for videos compared against --ref-video
    #[arg(long, visible_alias = "vd")]
    video_source_dir: Option<PathBuf>,

    /// Reference video for 1-vs-N comparison
    #[arg(long, visible_alias = "rv")]
    ref_video: Option<PathBuf>,

    /// Batch size handed to the FID model
    #[arg(short = 'b', long, default_value_t = 1)]
    fid_batch_size: usize,

    /// Print ranked summary tables after the run
    #[arg(short, long)]
    summary: bool,

    #[command(flatten)]
    perf: PerfArgs,

    /// Save results as JSON (reusable with `repro-eval summary`)
    #[arg(long)]
    json: Option<PathBuf>,

    /// Save results as CSV
    #[arg(long)]
    csv: Option<PathBuf>,
}

pub fn run(args: CompareArgs, verbose: bool) -> Result<()> {
    let metrics = MetricSelection::parse(&args.metrics)?;
    let pattern = Pattern::from_options(PatternOptions {
        img_true: args.img_true,
        img_test: args.img_test,
        video_true: args.video_true,
        video_test: args.video_test,
        img_source_dir: args.img_source_dir,
        ref_img_dir: args.ref_img_dir,
        video_source_dir: args.video_source_dir,
        ref_video: args.ref_video,
    })?;

    let names: Vec<&str> = metrics.iter().map(Metric::key).collect();
    info!("Selected metrics: {names:?}");
    if metrics.contains(Metric::Fid) {
        warn!("FID needs a pretrained distance model, which this binary lacks; skipping FID");
    }

    let config = RunConfig::builder()
        .metrics(metrics.clone())
        .show_progress(verbose)
        .fid_batch_size(args.fid_batch_size)
        .build();
    let backend = DefaultVideoBackend;
    let runner = Runner::new(config, &backend);

    let mut results = ResultSet::new();
    runner.run(&pattern, &mut results)?;

    if let Some(path) = &args.json {
        results
            .save(path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!("Results saved to {}", path.display());
    }
    if let Some(path) = &args.csv {
        results
            .write_csv(path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!("Results saved to {}", path.display());
    }

    if args.summary {
        print_summary(&results, &metrics, &args.perf)?;
    }

    Ok(())
}
