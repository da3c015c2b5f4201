//! Corpus resolution for ground-truth and test inputs.
//!
//! A corpus is one side of a comparison: a single file, a directory tree of
//! files, or an image already decoded in memory. [`resolve`] decides how two
//! inputs are compared, [`list_files`] enumerates directory trees, and
//! [`pairing`] aligns the two listings.
//!
//! ## Example
//!
//! ```rust,ignore
//! use repro_eval::corpus::{self, ComparisonMode, CorpusInput};
//!
//! let truth = CorpusInput::from("outputs/reference");
//! let test = CorpusInput::from("outputs/cached");
//!
//! if corpus::resolve(&truth, &test) == ComparisonMode::Directory {
//!     let pairs = corpus::pairing::collect_pairs(
//!         truth.path().unwrap(),
//!         test.path().unwrap(),
//!         corpus::IMAGE_EXTENSIONS,
//!         "image",
//!     )?;
//! }
//! ```

mod discovery;
pub mod pairing;

use std::path::{Path, PathBuf};

use imgref::ImgVec;
use rgb::RGB8;

pub use discovery::{has_extension, list_files, list_subdirectories};
pub use pairing::{ComparisonPair, collect_pairs, match_pairs};

/// Recognized still-image extensions.
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "webp"];

/// Recognized video extensions.
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "avi", "mov", "mkv", "webm", "flv", "y4m"];

/// One side of a comparison.
#[derive(Clone)]
pub enum CorpusInput {
    /// A file or directory on disk.
    Path(PathBuf),

    /// An image that is already decoded.
    Image(ImgVec<RGB8>),
}

impl CorpusInput {
    /// Filesystem path, if this input lives on disk.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Path(path) => Some(path),
            Self::Image(_) => None,
        }
    }

    /// Name used in result labels: the path basename, or `<memory>`.
    #[must_use]
    pub fn display_name(&self) -> String {
        match self {
            Self::Path(path) => basename(path),
            Self::Image(_) => "<memory>".to_string(),
        }
    }
}

impl std::fmt::Debug for CorpusInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Path(path) => f.debug_tuple("Path").field(path).finish(),
            Self::Image(img) => write!(f, "Image({}x{})", img.width(), img.height()),
        }
    }
}

impl From<PathBuf> for CorpusInput {
    fn from(path: PathBuf) -> Self {
        Self::Path(path)
    }
}

impl From<&Path> for CorpusInput {
    fn from(path: &Path) -> Self {
        Self::Path(path.to_path_buf())
    }
}

impl From<&str> for CorpusInput {
    fn from(path: &str) -> Self {
        Self::Path(PathBuf::from(path))
    }
}

impl From<ImgVec<RGB8>> for CorpusInput {
    fn from(img: ImgVec<RGB8>) -> Self {
        Self::Image(img)
    }
}

/// How a ground-truth/test input pair is compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonMode {
    /// At least one side is an in-memory unit; no file listing.
    DirectUnit,
    /// Both sides are single files (or could not be classified).
    SingleFile,
    /// Both sides are directories whose contents are paired by basename.
    Directory,
}

/// Decide how two inputs are compared.
///
/// Anything that is not two files or two directories falls back to a
/// single-file comparison, so an invalid path fails at decode time.
#[must_use]
pub fn resolve(true_input: &CorpusInput, test_input: &CorpusInput) -> ComparisonMode {
    match (true_input.path(), test_input.path()) {
        (Some(true_path), Some(test_path)) => resolve_paths(true_path, test_path),
        _ => ComparisonMode::DirectUnit,
    }
}

/// Classify two on-disk paths.
#[must_use]
pub fn resolve_paths(true_path: &Path, test_path: &Path) -> ComparisonMode {
    if true_path.is_dir() && test_path.is_dir() {
        ComparisonMode::Directory
    } else {
        ComparisonMode::SingleFile
    }
}

/// Final path component as a string (empty if there is none).
#[must_use]
pub fn basename(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}
