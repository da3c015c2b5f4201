//! Error types for repro-eval operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for repro-eval operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while pairing, scoring, or summarizing corpora.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Failed to load an image file.
    #[error("Image load failed: {path}: {reason}")]
    ImageLoad {
        /// Path to the image that failed to load.
        path: PathBuf,
        /// Reason for the failure.
        reason: String,
    },

    /// Error from a video backend while opening or reading a stream.
    #[error("Video error ({backend}): {message}")]
    Video {
        /// Backend identifier.
        backend: String,
        /// Error message from the backend.
        message: String,
    },

    /// Image dimensions don't match between reference and test units.
    #[error("Dimension mismatch: expected {expected:?}, got {actual:?}")]
    DimensionMismatch {
        /// Expected dimensions (width, height).
        expected: (usize, usize),
        /// Actual dimensions (width, height).
        actual: (usize, usize),
    },

    /// Failed to calculate a quality metric.
    #[error("Metric calculation failed: {metric}: {reason}")]
    MetricCalculation {
        /// Name of the metric that failed.
        metric: String,
        /// Reason for the failure.
        reason: String,
    },

    /// An input path does not exist.
    #[error("Input does not exist: {0}")]
    MissingInput(PathBuf),

    /// No same-basename pairs were found between two directories.
    #[error("No valid {kind} pairs between {true_dir} and {test_dir}; basenames must match")]
    NoValidPairs {
        /// Unit kind being paired ("image" or "video").
        kind: &'static str,
        /// Ground-truth directory.
        true_dir: PathBuf,
        /// Test directory.
        test_dir: PathBuf,
    },

    /// Both 1-vs-N patterns were requested at once.
    #[error("Image and video 1-vs-N patterns are mutually exclusive")]
    ConflictingPatterns,

    /// An input pair is neither two files nor two directories.
    #[error("Invalid input: {true_path} and {test_path} must both be files or both be directories")]
    InvalidInput {
        /// Ground-truth path.
        true_path: PathBuf,
        /// Test path.
        test_path: PathBuf,
    },

    /// A result label carries no recognizable sample count.
    #[error("Malformed result label (no Num or Frames count): {0}")]
    MalformedLabel(String),

    /// A distance metric was requested without a model to compute it.
    #[error("No distance model available for {0}")]
    MissingDistanceModel(String),

    /// Unsupported image or video format.
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// I/O error wrapper.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Invalid perf-log tag pattern.
    #[error("Pattern error: {0}")]
    Pattern(#[from] regex::Error),
}

impl Error {
    /// Build a [`Error::Video`] from a backend name and any displayable message.
    pub fn video(backend: &str, message: impl std::fmt::Display) -> Self {
        Self::Video {
            backend: backend.to_string(),
            message: message.to_string(),
        }
    }
}
