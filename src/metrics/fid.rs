//! Corpus-level distance metrics backed by a pretrained model.
//!
//! FID compares feature statistics of whole corpora rather than scoring
//! unit pairs, so it bypasses the per-unit aggregator. The model itself is
//! supplied by the caller through [`DistanceModel`]; pairing semantics are
//! the same basename policy as every other metric.

use std::path::Path;

use crate::error::Result;
use crate::eval::aggregate::Aggregate;

/// A pretrained model that scores two corpora as a whole.
///
/// Both methods return `Ok(None)` when nothing comparable was found, the
/// same "unavailable" outcome as a per-unit metric with zero valid samples.
/// `batch_size` is the number of units fed to the model at once.
pub trait DistanceModel {
    /// Distance between two images or two image directories.
    fn compute_fid(
        &self,
        true_path: &Path,
        test_path: &Path,
        batch_size: usize,
    ) -> Result<Option<Aggregate>>;

    /// Distance between the frames of two videos or two video directories.
    fn compute_video_fid(
        &self,
        true_path: &Path,
        test_path: &Path,
        batch_size: usize,
    ) -> Result<Option<Aggregate>>;
}
