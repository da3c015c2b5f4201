//! Quality metrics for comparing ground-truth and test units.
//!
//! Each [`Metric`] maps to a scoring function and a fixed direction of
//! improvement, so the computation path and the summary sort never disagree:
//!
//! | Metric | Better | Unit scorer |
//! |--------|--------|-------------|
//! | PSNR | higher | [`calculate_psnr`] (infinite for identical units) |
//! | SSIM | higher | [`ssim::calculate_ssim`] |
//! | MSE | lower | [`calculate_mse`] |
//! | FID | lower | none, computed per corpus by a [`fid::DistanceModel`] |

pub mod fid;
pub mod ssim;

use std::str::FromStr;

use imgref::ImgRef;
use rgb::RGB8;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Scoring function applied to one aligned unit pair.
pub type ScoreFn = fn(ImgRef<'_, RGB8>, ImgRef<'_, RGB8>) -> Result<f64>;

/// A quality metric the runner can compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    /// Peak signal-to-noise ratio in dB.
    Psnr,
    /// Structural similarity.
    Ssim,
    /// Mean squared error.
    Mse,
    /// Frechet distance from a pretrained feature model.
    Fid,
}

impl Metric {
    /// Every metric, in reporting order.
    pub const ALL: [Metric; 4] = [Self::Psnr, Self::Ssim, Self::Mse, Self::Fid];

    /// Upper-case display name used in labels and summaries.
    pub fn name(self) -> &'static str {
        match self {
            Self::Psnr => "PSNR",
            Self::Ssim => "SSIM",
            Self::Mse => "MSE",
            Self::Fid => "FID",
        }
    }

    /// Lower-case command-line name.
    pub fn key(self) -> &'static str {
        match self {
            Self::Psnr => "psnr",
            Self::Ssim => "ssim",
            Self::Mse => "mse",
            Self::Fid => "fid",
        }
    }

    /// Whether larger values mean closer to the ground truth.
    pub fn higher_is_better(self) -> bool {
        matches!(self, Self::Psnr | Self::Ssim)
    }

    /// Per-unit scoring function, or `None` for corpus-level metrics.
    pub fn scorer(self) -> Option<ScoreFn> {
        match self {
            Self::Psnr => Some(calculate_psnr),
            Self::Ssim => Some(ssim::calculate_ssim),
            Self::Mse => Some(calculate_mse),
            Self::Fid => None,
        }
    }
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Metric {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "psnr" => Ok(Self::Psnr),
            "ssim" => Ok(Self::Ssim),
            "mse" => Ok(Self::Mse),
            "fid" => Ok(Self::Fid),
            other => Err(Error::MetricCalculation {
                metric: other.to_string(),
                reason: "unknown metric (expected psnr, ssim, mse, fid or all)".to_string(),
            }),
        }
    }
}

/// An ordered, duplicate-free set of requested metrics.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MetricSelection(Vec<Metric>);

impl MetricSelection {
    /// Every metric.
    #[must_use]
    pub fn all() -> Self {
        Self(Metric::ALL.to_vec())
    }

    /// Parse metric names; `all` expands to every metric in place.
    ///
    /// Repeated metrics are kept once, at their first position.
    pub fn parse<S: AsRef<str>>(names: &[S]) -> Result<Self> {
        let mut selection = Self::default();
        for name in names {
            if name.as_ref().trim().eq_ignore_ascii_case("all") {
                for metric in Metric::ALL {
                    selection.push(metric);
                }
            } else {
                selection.push(name.as_ref().parse()?);
            }
        }
        Ok(selection)
    }

    fn push(&mut self, metric: Metric) {
        if !self.0.contains(&metric) {
            self.0.push(metric);
        }
    }

    /// Iterate in request order.
    pub fn iter(&self) -> impl Iterator<Item = Metric> + '_ {
        self.0.iter().copied()
    }

    /// Check whether a metric was requested.
    #[must_use]
    pub fn contains(&self, metric: Metric) -> bool {
        self.0.contains(&metric)
    }

    /// Number of requested metrics.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check whether nothing was requested.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<Metric> for MetricSelection {
    fn from_iter<I: IntoIterator<Item = Metric>>(iter: I) -> Self {
        let mut selection = Self::default();
        for metric in iter {
            selection.push(metric);
        }
        selection
    }
}

fn check_dimensions(reference: ImgRef<'_, RGB8>, test: ImgRef<'_, RGB8>) -> Result<()> {
    if reference.width() != test.width() || reference.height() != test.height() {
        return Err(Error::DimensionMismatch {
            expected: (reference.width(), reference.height()),
            actual: (test.width(), test.height()),
        });
    }
    Ok(())
}

fn squared_error_sum(reference: ImgRef<'_, RGB8>, test: ImgRef<'_, RGB8>) -> f64 {
    reference
        .pixels()
        .zip(test.pixels())
        .map(|(r, t)| {
            let dr = f64::from(r.r) - f64::from(t.r);
            let dg = f64::from(r.g) - f64::from(t.g);
            let db = f64::from(r.b) - f64::from(t.b);
            dr * dr + dg * dg + db * db
        })
        .sum()
}

/// Calculate the mean squared error over all RGB channel values.
///
/// Returns 0.0 for identical units.
pub fn calculate_mse(reference: ImgRef<'_, RGB8>, test: ImgRef<'_, RGB8>) -> Result<f64> {
    check_dimensions(reference, test)?;
    let sample_count = (reference.width() * reference.height() * 3) as f64;
    if sample_count == 0.0 {
        return Err(Error::MetricCalculation {
            metric: "MSE".to_string(),
            reason: "empty image".to_string(),
        });
    }
    Ok(squared_error_sum(reference, test) / sample_count)
}

/// Calculate PSNR between two RGB8 units with a peak value of 255.
///
/// Higher is better. Returns `f64::INFINITY` if the units are identical.
pub fn calculate_psnr(reference: ImgRef<'_, RGB8>, test: ImgRef<'_, RGB8>) -> Result<f64> {
    let mse = calculate_mse(reference, test)?;

    if mse == 0.0 {
        Ok(f64::INFINITY)
    } else {
        Ok(10.0 * (255.0_f64 * 255.0 / mse).log10())
    }
}
