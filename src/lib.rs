//! # repro-eval
//!
//! Reproducibility checks for generated images and videos.
//!
//! A run compares a ground-truth corpus against one or more test corpora
//! (for example outputs of an accelerated pipeline against its baseline),
//! computes PSNR, SSIM, MSE or FID, and ranks the results.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use repro_eval::{
//!     DefaultVideoBackend, MetricSelection, Pattern, PatternOptions, ResultSet, RunConfig, Runner,
//! };
//!
//! let config = RunConfig::builder()
//!     .metrics(MetricSelection::parse(&["psnr", "ssim"])?)
//!     .build();
//!
//! let pattern = Pattern::from_options(PatternOptions {
//!     img_source_dir: Some("outputs".into()),
//!     ref_img_dir: Some("outputs/baseline".into()),
//!     ..PatternOptions::default()
//! })?;
//!
//! let mut results = ResultSet::new();
//! Runner::new(config, &DefaultVideoBackend).run(&pattern, &mut results)?;
//! results.save("results.json")?;
//! ```
//!
//! ## Modules
//!
//! - [`corpus`]: input resolution, file discovery and basename pairing
//! - [`decode`]: image decoding
//! - [`video`]: frame extraction behind a pluggable backend
//! - [`metrics`]: quality metrics
//! - [`eval`]: the runner, aggregation and results
//! - [`summary`]: ranked summary tables and perf-log timings
//! - [`error`]: error types

pub mod corpus;
pub mod decode;
pub mod error;
pub mod eval;
pub mod metrics;
pub mod summary;
pub mod video;

pub use corpus::{ComparisonMode, ComparisonPair, CorpusInput};
pub use error::{Error, Result};
pub use eval::{
    aggregate::Aggregate,
    results::{MetricRecord, ResultSet, UnitKind},
    runner::{Pattern, PatternOptions, RunConfig, Runner},
};
pub use metrics::{Metric, MetricSelection, fid::DistanceModel};
pub use summary::{PerfLog, SummaryReporter};
pub use video::{DefaultVideoBackend, FrameSource, VideoBackend};
