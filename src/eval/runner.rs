//! Comparison patterns and the metric runner.
//!
//! A run takes one [`Pattern`] and computes every requested metric for every
//! comparison the pattern names, metric-major: all targets for the first
//! metric, then all targets for the next. Each comparison that produces a
//! mean is recorded in a [`ResultSet`].
//!
//! A failing comparison (undecodable file, dimension mismatch, missing
//! distance model) is logged and skipped so the remaining comparisons still
//! run. Only misconfigured inputs abort the whole run.

use std::path::{Path, PathBuf};

use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, error, info, warn};

use crate::corpus::{
    self, ComparisonMode, ComparisonPair, CorpusInput, IMAGE_EXTENSIONS, VIDEO_EXTENSIONS, basename,
};
use crate::decode::load_image;
use crate::error::{Error, Result};
use crate::eval::aggregate::{Aggregate, aggregate};
use crate::eval::results::{MetricRecord, ResultSet, UnitKind};
use crate::metrics::fid::DistanceModel;
use crate::metrics::{Metric, MetricSelection};
use crate::video::{self, Frame, VideoBackend};

/// Configuration for a run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Metrics to compute, in order.
    pub metrics: MetricSelection,

    /// Draw a progress bar while scoring directory and video comparisons.
    pub show_progress: bool,

    /// Units per batch handed to the distance model.
    pub fid_batch_size: usize,

    /// Extensions treated as images when pairing directories.
    pub image_extensions: Vec<String>,

    /// Extensions treated as videos when pairing directories.
    pub video_extensions: Vec<String>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl RunConfig {
    /// Create a new configuration builder.
    #[must_use]
    pub fn builder() -> RunConfigBuilder {
        RunConfigBuilder::default()
    }
}

/// Builder for [`RunConfig`].
#[derive(Debug, Default)]
pub struct RunConfigBuilder {
    metrics: Option<MetricSelection>,
    show_progress: bool,
    fid_batch_size: Option<usize>,
    image_extensions: Option<Vec<String>>,
    video_extensions: Option<Vec<String>>,
}

impl RunConfigBuilder {
    /// Set which metrics to compute.
    #[must_use]
    pub fn metrics(mut self, metrics: MetricSelection) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Enable or disable the progress bar.
    #[must_use]
    pub fn show_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Set the distance-model batch size (at least 1).
    #[must_use]
    pub fn fid_batch_size(mut self, batch_size: usize) -> Self {
        self.fid_batch_size = Some(batch_size.max(1));
        self
    }

    /// Override the recognized image extensions.
    #[must_use]
    pub fn image_extensions<S: Into<String>>(mut self, exts: impl IntoIterator<Item = S>) -> Self {
        self.image_extensions = Some(exts.into_iter().map(Into::into).collect());
        self
    }

    /// Override the recognized video extensions.
    #[must_use]
    pub fn video_extensions<S: Into<String>>(mut self, exts: impl IntoIterator<Item = S>) -> Self {
        self.video_extensions = Some(exts.into_iter().map(Into::into).collect());
        self
    }

    /// Build the configuration. Metrics default to PSNR alone.
    #[must_use]
    pub fn build(self) -> RunConfig {
        RunConfig {
            metrics: self
                .metrics
                .unwrap_or_else(|| std::iter::once(Metric::Psnr).collect()),
            show_progress: self.show_progress,
            fid_batch_size: self.fid_batch_size.unwrap_or(1),
            image_extensions: self.image_extensions.unwrap_or_else(|| owned(IMAGE_EXTENSIONS)),
            video_extensions: self.video_extensions.unwrap_or_else(|| owned(VIDEO_EXTENSIONS)),
        }
    }
}

/// Raw input options, one per command-line flag.
#[derive(Debug, Clone, Default)]
pub struct PatternOptions {
    /// Ground-truth image file or directory.
    pub img_true: Option<PathBuf>,
    /// Test image file or directory.
    pub img_test: Option<PathBuf>,
    /// Ground-truth video file or directory.
    pub video_true: Option<PathBuf>,
    /// Test video file or directory.
    pub video_test: Option<PathBuf>,
    /// Directory whose subdirectories are compared against `ref_img_dir`.
    pub img_source_dir: Option<PathBuf>,
    /// Reference image directory for the 1-vs-N image pattern.
    pub ref_img_dir: Option<PathBuf>,
    /// Directory searched for videos compared against `ref_video`.
    pub video_source_dir: Option<PathBuf>,
    /// Reference video for the 1-vs-N video pattern.
    pub ref_video: Option<PathBuf>,
}

/// What a run compares.
#[derive(Debug, Clone)]
pub enum Pattern {
    /// One image pair and/or one video pair. Either side may be absent.
    Single {
        /// Ground-truth and test image inputs.
        images: Option<(CorpusInput, CorpusInput)>,
        /// Ground-truth and test video files or directories.
        videos: Option<(PathBuf, PathBuf)>,
    },

    /// A reference directory against every sibling subdirectory.
    ImageOneVsMany {
        /// Reference image directory.
        reference_dir: PathBuf,
        /// Directory whose immediate subdirectories are the targets.
        source_dir: PathBuf,
    },

    /// A reference video against every other video under a directory.
    VideoOneVsMany {
        /// Reference video file.
        reference_video: PathBuf,
        /// Directory searched recursively for target videos.
        source_dir: PathBuf,
    },
}

impl Pattern {
    /// Select the pattern described by a set of input options.
    ///
    /// This performs no I/O.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConflictingPatterns`] if both 1-vs-N patterns are
    /// fully specified.
    pub fn from_options(options: PatternOptions) -> Result<Self> {
        let PatternOptions {
            img_true,
            img_test,
            video_true,
            video_test,
            img_source_dir,
            ref_img_dir,
            video_source_dir,
            ref_video,
        } = options;

        match (img_source_dir.zip(ref_img_dir), video_source_dir.zip(ref_video)) {
            (Some(_), Some(_)) => Err(Error::ConflictingPatterns),
            (Some((source_dir, reference_dir)), None) => Ok(Self::ImageOneVsMany {
                reference_dir,
                source_dir,
            }),
            (None, Some((source_dir, reference_video))) => Ok(Self::VideoOneVsMany {
                reference_video,
                source_dir,
            }),
            (None, None) => Ok(Self::Single {
                images: img_true
                    .zip(img_test)
                    .map(|(t, s)| (CorpusInput::from(t), CorpusInput::from(s))),
                videos: video_true.zip(video_test),
            }),
        }
    }
}

/// Computes metrics for a [`Pattern`].
pub struct Runner<'a> {
    config: RunConfig,
    video_backend: &'a dyn VideoBackend,
    distance_model: Option<&'a dyn DistanceModel>,
}

impl<'a> Runner<'a> {
    /// Create a runner without a distance model; FID comparisons are skipped.
    #[must_use]
    pub fn new(config: RunConfig, video_backend: &'a dyn VideoBackend) -> Self {
        Self {
            config,
            video_backend,
            distance_model: None,
        }
    }

    /// Attach the model used for FID.
    #[must_use]
    pub fn with_distance_model(mut self, model: &'a dyn DistanceModel) -> Self {
        self.distance_model = Some(model);
        self
    }

    /// Run every comparison the pattern names and record the results.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] when a video input pair mixes a file
    /// and a directory, or an I/O error if a 1-vs-N source directory cannot
    /// be listed. Per-comparison failures are logged, not returned.
    pub fn run(&self, pattern: &Pattern, results: &mut ResultSet) -> Result<()> {
        match pattern {
            Pattern::Single { images, videos } => {
                if images.is_none() && videos.is_none() {
                    warn!("Nothing to compare: no complete image or video input pair given");
                }
                for metric in self.config.metrics.iter() {
                    if let Some((true_input, test_input)) = images {
                        self.compare_images(metric, true_input, test_input, results)?;
                    }
                    if let Some((true_path, test_path)) = videos {
                        self.compare_videos(metric, true_path, test_path, results)?;
                    }
                }
                Ok(())
            }
            Pattern::ImageOneVsMany {
                reference_dir,
                source_dir,
            } => self.run_image_one_vs_many(reference_dir, source_dir, results),
            Pattern::VideoOneVsMany {
                reference_video,
                source_dir,
            } => self.run_video_one_vs_many(reference_video, source_dir, results),
        }
    }

    fn run_image_one_vs_many(
        &self,
        reference_dir: &Path,
        source_dir: &Path,
        results: &mut ResultSet,
    ) -> Result<()> {
        if !require_exists(source_dir) || !require_exists(reference_dir) {
            return Ok(());
        }

        let reference_name = basename(reference_dir);
        let targets: Vec<PathBuf> = corpus::list_subdirectories(source_dir)?
            .into_iter()
            .filter(|dir| basename(dir) != reference_name)
            .collect();
        if targets.is_empty() {
            warn!("No directories to compare against {reference_name} in {}", source_dir.display());
            return Ok(());
        }
        log_targets(&reference_name, &targets);

        let reference = CorpusInput::from(reference_dir);
        for metric in self.config.metrics.iter() {
            for target in &targets {
                let target = CorpusInput::from(target.as_path());
                self.compare_images(metric, &reference, &target, results)?;
            }
        }
        Ok(())
    }

    fn run_video_one_vs_many(
        &self,
        reference_video: &Path,
        source_dir: &Path,
        results: &mut ResultSet,
    ) -> Result<()> {
        if !require_exists(source_dir) || !require_exists(reference_video) {
            return Ok(());
        }

        let reference_name = basename(reference_video);
        let targets: Vec<PathBuf> = corpus::list_files(source_dir, &self.config.video_extensions)?
            .into_iter()
            .filter(|file| basename(file) != reference_name)
            .collect();
        if targets.is_empty() {
            warn!("No videos to compare against {reference_name} in {}", source_dir.display());
            return Ok(());
        }
        log_targets(&reference_name, &targets);

        for metric in self.config.metrics.iter() {
            for target in &targets {
                self.compare_videos(metric, reference_video, target, results)?;
            }
        }
        Ok(())
    }

    fn compare_images(
        &self,
        metric: Metric,
        true_input: &CorpusInput,
        test_input: &CorpusInput,
        results: &mut ResultSet,
    ) -> Result<()> {
        let on_disk = [true_input.path(), test_input.path()];
        if !on_disk.into_iter().flatten().all(require_exists) {
            return Ok(());
        }

        let outcome = self.score_images(metric, true_input, test_input);
        record_outcome(
            results,
            metric,
            &true_input.display_name(),
            &test_input.display_name(),
            UnitKind::Image,
            outcome,
        )
    }

    fn compare_videos(
        &self,
        metric: Metric,
        true_path: &Path,
        test_path: &Path,
        results: &mut ResultSet,
    ) -> Result<()> {
        if !require_exists(true_path) || !require_exists(test_path) {
            return Ok(());
        }

        let outcome = self.score_videos(metric, true_path, test_path);
        record_outcome(
            results,
            metric,
            &basename(true_path),
            &basename(test_path),
            UnitKind::Video,
            outcome,
        )
    }

    fn score_images(
        &self,
        metric: Metric,
        true_input: &CorpusInput,
        test_input: &CorpusInput,
    ) -> Result<Option<Aggregate>> {
        let Some(score) = metric.scorer() else {
            let (true_path, test_path) = (true_input.path(), test_input.path());
            return self.corpus_distance(metric, true_path, test_path, UnitKind::Image);
        };

        let mode = corpus::resolve(true_input, test_input);
        debug!("{metric}: {mode:?} comparison");
        if let (ComparisonMode::Directory, Some(true_dir), Some(test_dir)) =
            (mode, true_input.path(), test_input.path())
        {
            let pairs =
                corpus::collect_pairs(true_dir, test_dir, &self.config.image_extensions, "image")?;
            let bar = self.progress_bar(pairs.len(), metric);
            let result = aggregate(bar.wrap_iter(pairs.iter()), |pair: &ComparisonPair| {
                let true_img = load_image(&pair.true_path)?;
                let test_img = load_image(&pair.test_path)?;
                score(true_img.as_ref(), test_img.as_ref())
            });
            bar.finish_and_clear();
            return result;
        }

        // Single files and in-memory units are one sample per side.
        let true_img = load_unit(true_input)?;
        let test_img = load_unit(test_input)?;
        aggregate([(&true_img, &test_img)], |(a, b): (&Frame, &Frame)| {
            score(a.as_ref(), b.as_ref())
        })
    }

    fn score_videos(
        &self,
        metric: Metric,
        true_path: &Path,
        test_path: &Path,
    ) -> Result<Option<Aggregate>> {
        let Some(score) = metric.scorer() else {
            return self.corpus_distance(metric, Some(true_path), Some(test_path), UnitKind::Video);
        };

        let extensions = &self.config.video_extensions;
        let frames = video::extract(self.video_backend, true_path, test_path, extensions)?;
        if frames.is_empty() {
            return Ok(None);
        }
        debug!("{} frame pairs for {metric}", frames.len());

        let bar = self.progress_bar(frames.len(), metric);
        let result = aggregate(bar.wrap_iter(frames.iter()), |(a, b): (&Frame, &Frame)| {
            score(a.as_ref(), b.as_ref())
        });
        bar.finish_and_clear();
        result
    }

    fn corpus_distance(
        &self,
        metric: Metric,
        true_path: Option<&Path>,
        test_path: Option<&Path>,
        kind: UnitKind,
    ) -> Result<Option<Aggregate>> {
        let model = self
            .distance_model
            .ok_or_else(|| Error::MissingDistanceModel(metric.name().to_string()))?;
        let (Some(true_path), Some(test_path)) = (true_path, test_path) else {
            return Err(Error::UnsupportedFormat(format!(
                "{metric} compares files on disk, not in-memory images"
            )));
        };
        let batch_size = self.config.fid_batch_size;
        match kind {
            UnitKind::Image => model.compute_fid(true_path, test_path, batch_size),
            UnitKind::Video => model.compute_video_fid(true_path, test_path, batch_size),
        }
    }

    fn progress_bar(&self, len: usize, metric: Metric) -> ProgressBar {
        if !self.config.show_progress {
            return ProgressBar::hidden();
        }
        let bar = ProgressBar::new(len as u64);
        let template = "{msg:<5} {bar:40.cyan/blue} {pos}/{len} [{elapsed_precise}<{eta_precise}]";
        if let Ok(style) = ProgressStyle::with_template(template) {
            bar.set_style(style);
        }
        bar.set_message(metric.name());
        bar
    }
}

fn owned(exts: &[&str]) -> Vec<String> {
    exts.iter().map(|e| (*e).to_string()).collect()
}

fn load_unit(input: &CorpusInput) -> Result<Frame> {
    match input {
        CorpusInput::Path(path) => load_image(path),
        CorpusInput::Image(img) => Ok(img.clone()),
    }
}

fn require_exists(path: &Path) -> bool {
    if path.exists() {
        return true;
    }
    error!("{} does not exist", path.display());
    false
}

fn log_targets(reference_name: &str, targets: &[PathBuf]) {
    let names: Vec<String> = targets.iter().map(|t| basename(t)).collect();
    info!("Compare {reference_name} vs {names:?}, Num compares: {}", names.len());
}

fn record_outcome(
    results: &mut ResultSet,
    metric: Metric,
    true_name: &str,
    test_name: &str,
    kind: UnitKind,
    outcome: Result<Option<Aggregate>>,
) -> Result<()> {
    match outcome {
        Ok(Some(aggregate)) => {
            let record = MetricRecord::new(true_name, test_name, kind, metric, aggregate);
            info!("{}", record.label);
            results.record(record);
        }
        Ok(None) => warn!("{metric}: no valid samples for {true_name} vs {test_name}"),
        Err(err @ (Error::InvalidInput { .. } | Error::ConflictingPatterns)) => return Err(err),
        Err(err) => error!("{metric} {true_name} vs {test_name} skipped: {err}"),
    }
    Ok(())
}
