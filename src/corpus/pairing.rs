//! Positional basename pairing between two sorted file lists.
//!
//! The two corpora are expected to come out of the same generation step in
//! the same order. Pairing walks both listings index by index and keeps a
//! position only when the basenames agree; a mismatch drops that position
//! from both sides without trying to re-align.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::corpus::discovery::list_files;
use crate::error::{Error, Result};

/// A ground-truth file and the test file it is compared against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonPair {
    /// Ground-truth file.
    pub true_path: PathBuf,
    /// Test file.
    pub test_path: PathBuf,
}

/// Align two sorted listings and keep positions whose basenames match.
///
/// At most `min(true_files.len(), test_files.len())` pairs are returned.
#[must_use]
pub fn match_pairs(true_files: &[PathBuf], test_files: &[PathBuf]) -> Vec<ComparisonPair> {
    true_files
        .iter()
        .zip(test_files)
        .filter(|(t, s)| t.file_name() == s.file_name())
        .map(|(t, s)| ComparisonPair {
            true_path: t.clone(),
            test_path: s.clone(),
        })
        .collect()
}

/// List both directories and pair their files.
///
/// `kind` names the unit type in diagnostics ("image" or "video").
/// Returns [`Error::NoValidPairs`] when no position matched.
pub fn collect_pairs<S: AsRef<str>>(
    true_dir: &Path,
    test_dir: &Path,
    extensions: &[S],
    kind: &'static str,
) -> Result<Vec<ComparisonPair>> {
    let true_files = list_files(true_dir, extensions)?;
    let test_files = list_files(test_dir, extensions)?;

    let pairs = match_pairs(&true_files, &test_files);
    if pairs.is_empty() {
        return Err(Error::NoValidPairs {
            kind,
            true_dir: true_dir.to_path_buf(),
            test_dir: test_dir.to_path_buf(),
        });
    }

    debug!(
        "{} {} pairs from {} true / {} test files",
        pairs.len(),
        kind,
        true_files.len(),
        test_files.len()
    );
    Ok(pairs)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths(root: &str, names: &[&str]) -> Vec<PathBuf> {
        names.iter().map(|n| Path::new(root).join(n)).collect()
    }

    #[test]
    fn test_mismatch_drops_position() {
        let truth = paths("true", &["a.png", "b.png"]);
        let test = paths("test", &["a.png", "c.png"]);

        let pairs = match_pairs(&truth, &test);
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].true_path, Path::new("true/a.png"));
        assert_eq!(pairs[0].test_path, Path::new("test/a.png"));
    }

    #[test]
    fn test_no_realignment_after_gap() {
        // "b" is missing on the test side, so every later position is off by one.
        let truth = paths("t", &["a.png", "b.png", "c.png", "d.png"]);
        let test = paths("s", &["a.png", "c.png", "d.png"]);

        let pairs = match_pairs(&truth, &test);
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].true_path, Path::new("t/a.png"));
    }

    #[test]
    fn test_bounded_by_shorter_list() {
        let truth = paths("t", &["a.png", "b.png", "c.png"]);
        let test = paths("s", &["a.png", "b.png"]);

        let pairs = match_pairs(&truth, &test);
        assert!(pairs.len() <= truth.len().min(test.len()));
        assert_eq!(pairs.len(), 2);
        for pair in &pairs {
            assert_eq!(pair.true_path.file_name(), pair.test_path.file_name());
        }
    }

    #[test]
    fn test_subdirectory_basenames_pair() {
        let truth = paths("t", &["x/a.png"]);
        let test = paths("s", &["y/a.png"]);
        assert_eq!(match_pairs(&truth, &test).len(), 1);
    }

    #[test]
    fn test_collect_pairs_reports_no_valid_pairs() {
        let truth = tempfile::tempdir().unwrap();
        let test = tempfile::tempdir().unwrap();
        std::fs::write(truth.path().join("a.png"), b"").unwrap();
        std::fs::write(test.path().join("b.png"), b"").unwrap();

        let result = collect_pairs(truth.path(), test.path(), &["png"], "image");
        assert!(matches!(result, Err(Error::NoValidPairs { kind: "image", .. })));
    }

    #[test]
    fn test_collect_pairs_empty_directories() {
        let truth = tempfile::tempdir().unwrap();
        let test = tempfile::tempdir().unwrap();
        let result = collect_pairs(truth.path(), test.path(), &["png"], "image");
        assert!(matches!(result, Err(Error::NoValidPairs { .. })));
    }
}
