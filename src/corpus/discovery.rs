//! File discovery in corpus directories.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{Error, Result};

/// List every file under `root` (recursively) whose extension is in
/// `extensions`, sorted by path.
///
/// Extensions are compared case-insensitively and without the leading dot.
/// Symbolic links to directories are not followed.
pub fn list_files<S: AsRef<str>>(root: &Path, extensions: &[S]) -> Result<Vec<PathBuf>> {
    if !root.exists() {
        return Err(Error::MissingInput(root.to_path_buf()));
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(root).follow_links(false) {
        let entry = entry.map_err(io::Error::from)?;
        // Symlinked directories are not descended into; symlinked files are kept.
        let path = entry.path();
        if path.is_file() && has_extension(path, extensions) {
            files.push(path.to_path_buf());
        }
    }
    files.sort();
    Ok(files)
}

/// List the immediate subdirectories of `root`, sorted by path.
pub fn list_subdirectories(root: &Path) -> Result<Vec<PathBuf>> {
    if !root.exists() {
        return Err(Error::MissingInput(root.to_path_buf()));
    }

    let mut dirs = Vec::new();
    for entry in fs::read_dir(root)? {
        let path = entry?.path();
        if path.is_dir() {
            dirs.push(path);
        }
    }
    dirs.sort();
    Ok(dirs)
}

/// Check whether `path` carries one of the given extensions.
pub fn has_extension<S: AsRef<str>>(path: &Path, extensions: &[S]) -> bool {
    let Some(extension) = path.extension().and_then(|s| s.to_str()) else {
        return false;
    };
    extensions
        .iter()
        .any(|ext| ext.as_ref().eq_ignore_ascii_case(extension))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, b"").unwrap();
    }

    #[test]
    fn test_list_files_recursive_and_sorted() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("b.png"));
        touch(&dir.path().join("a.PNG"));
        touch(&dir.path().join("nested/c.jpg"));
        touch(&dir.path().join("notes.txt"));

        let files = list_files(dir.path(), &["png", "jpg"]).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.strip_prefix(dir.path()).unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.PNG", "b.png", "nested/c.jpg"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_list_files_skips_symlinked_directories() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("a.png"));
        touch(&dir.path().join("elsewhere/b.png"));
        std::os::unix::fs::symlink(dir.path(), dir.path().join("loop")).unwrap();
        let elsewhere = dir.path().join("elsewhere");
        std::os::unix::fs::symlink(&elsewhere, dir.path().join("linked")).unwrap();
        std::os::unix::fs::symlink(dir.path().join("a.png"), dir.path().join("alias.png")).unwrap();

        let files = list_files(dir.path(), &["png"]).unwrap();
        assert_eq!(
            files,
            vec![
                dir.path().join("a.png"),
                dir.path().join("alias.png"),
                dir.path().join("elsewhere/b.png"),
            ]
        );
    }

    #[test]
    fn test_list_files_missing_root() {
        let result = list_files(Path::new("/no/such/corpus"), &["png"]);
        assert!(matches!(result, Err(Error::MissingInput(_))));
    }

    #[test]
    fn test_list_subdirectories() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("Y")).unwrap();
        fs::create_dir(dir.path().join("X")).unwrap();
        touch(&dir.path().join("file.png"));

        let dirs = list_subdirectories(dir.path()).unwrap();
        assert_eq!(dirs, vec![dir.path().join("X"), dir.path().join("Y")]);
    }

    #[test]
    fn test_has_extension() {
        assert!(has_extension(Path::new("clip.MP4"), &["mp4"]));
        assert!(!has_extension(Path::new("clip"), &["mp4"]));
        assert!(!has_extension(Path::new("clip.mp4.txt"), &["mp4"]));
    }
}
