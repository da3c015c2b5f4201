//! Video frame extraction for paired videos.
//!
//! Decoding is delegated to a [`VideoBackend`], which opens one
//! [`FrameSource`] per file. Extraction reads both sources of a pair in
//! lockstep and keeps only positions where both yielded a frame, so the
//! two frame sequences are always aligned.
//!
//! Sources are dropped before [`extract_frames`] returns, on every path,
//! so a directory run never holds more than two decoders open.

#[cfg(feature = "ffmpeg")]
pub mod ffmpeg;
pub mod y4m;

use std::path::Path;

use imgref::ImgVec;
use rgb::RGB8;
use tracing::{debug, error, warn};

use crate::corpus::{self, ComparisonMode, basename, has_extension};
use crate::error::{Error, Result};

/// One decoded video frame.
pub type Frame = ImgVec<RGB8>;

/// An open, sequentially readable video stream.
pub trait FrameSource {
    /// Frame count reported by the container, if known.
    ///
    /// This is an upper bound; a source may end before reaching it.
    fn frame_count(&self) -> Option<usize>;

    /// Read the next frame, or `None` at end of stream.
    fn next_frame(&mut self) -> Result<Option<Frame>>;
}

/// Opens video files for reading.
pub trait VideoBackend {
    /// Open a video file.
    fn open(&self, path: &Path) -> Result<Box<dyn FrameSource>>;
}

/// Backend that picks a decoder by file extension.
///
/// `.y4m` files use the built-in reader. Other containers need the
/// `ffmpeg` feature.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultVideoBackend;

impl VideoBackend for DefaultVideoBackend {
    fn open(&self, path: &Path) -> Result<Box<dyn FrameSource>> {
        if has_extension(path, &["y4m"]) {
            return Ok(Box::new(y4m::Y4mSource::open(path)?));
        }

        #[cfg(feature = "ffmpeg")]
        {
            Ok(Box::new(ffmpeg::FfmpegSource::open(path)?))
        }

        #[cfg(not(feature = "ffmpeg"))]
        {
            Err(Error::UnsupportedFormat(format!(
                "{} (build with the `ffmpeg` feature to decode compressed video)",
                path.display()
            )))
        }
    }
}

/// Aligned ground-truth and test frames.
#[derive(Default)]
pub struct FramePairs {
    /// Ground-truth frames.
    pub true_frames: Vec<Frame>,
    /// Test frames, same length as `true_frames`.
    pub test_frames: Vec<Frame>,
}

impl FramePairs {
    /// Number of aligned frame pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.true_frames.len()
    }

    /// Check whether no frame pair was extracted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.true_frames.is_empty()
    }

    /// Iterate over aligned `(true, test)` frame pairs.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (&Frame, &Frame)> {
        self.true_frames.iter().zip(self.test_frames.iter())
    }

    /// Append another set of pairs.
    pub fn append(&mut self, mut other: FramePairs) {
        self.true_frames.append(&mut other.true_frames);
        self.test_frames.append(&mut other.test_frames);
    }
}

/// Decode two videos into aligned frame sequences.
///
/// Reads at most `min(frame_count(true), frame_count(test))` pairs when both
/// counts are known, and stops early at the first position where either
/// stream ends or fails. A video that cannot be opened yields no frames.
pub fn extract_frames(
    backend: &dyn VideoBackend,
    true_path: &Path,
    test_path: &Path,
) -> FramePairs {
    let mut pairs = FramePairs::default();

    let (mut true_source, mut test_source) =
        match (backend.open(true_path), backend.open(test_path)) {
            (Ok(t), Ok(s)) => (t, s),
            (Err(err), _) | (_, Err(err)) => {
                error!("Could not open video files: {err}");
                return pairs;
            }
        };

    let limit = match (true_source.frame_count(), test_source.frame_count()) {
        (Some(t), Some(s)) => Some(t.min(s)),
        _ => None,
    };
    debug!(
        "{} vs {}: frame limit {:?}",
        basename(true_path),
        basename(test_path),
        limit
    );

    while limit.map_or(true, |limit| pairs.len() < limit) {
        let Some(true_frame) = read_or_stop(true_source.as_mut(), true_path) else {
            break;
        };
        let Some(test_frame) = read_or_stop(test_source.as_mut(), test_path) else {
            break;
        };
        pairs.true_frames.push(true_frame);
        pairs.test_frames.push(test_frame);
    }

    pairs
}

fn read_or_stop(source: &mut dyn FrameSource, path: &Path) -> Option<Frame> {
    match source.next_frame() {
        Ok(frame) => frame,
        Err(err) => {
            warn!("Stopped reading {}: {err}", path.display());
            None
        }
    }
}

/// Pair the videos of two directories by basename and concatenate their
/// aligned frames.
///
/// Returns [`Error::NoValidPairs`] when no video pair matched.
pub fn extract_dir_frames<S: AsRef<str>>(
    backend: &dyn VideoBackend,
    true_dir: &Path,
    test_dir: &Path,
    extensions: &[S],
) -> Result<FramePairs> {
    let video_pairs = corpus::collect_pairs(true_dir, test_dir, extensions, "video")?;
    debug!("video pairs: {:?}", video_pairs);

    let mut frames = FramePairs::default();
    for pair in &video_pairs {
        frames.append(extract_frames(backend, &pair.true_path, &pair.test_path));
    }
    Ok(frames)
}

/// Extract frames from two video files or two directories of videos.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] when one side is a file and the other a
/// directory, or either side is neither.
pub fn extract<S: AsRef<str>>(
    backend: &dyn VideoBackend,
    true_path: &Path,
    test_path: &Path,
    extensions: &[S],
) -> Result<FramePairs> {
    if true_path.is_file() && test_path.is_file() {
        return Ok(extract_frames(backend, true_path, test_path));
    }
    if corpus::resolve_paths(true_path, test_path) == ComparisonMode::Directory {
        return extract_dir_frames(backend, true_path, test_path, extensions);
    }
    Err(Error::InvalidInput {
        true_path: true_path.to_path_buf(),
        test_path: test_path.to_path_buf(),
    })
}


#[cfg(test)]
mod tests {
    use super::testing::{Script, ScriptedBackend};
    use super::*;

    #[test]
    fn test_truncates_to_shorter_video() {
        let backend = ScriptedBackend::new()
            .with("t.mp4", Script::frames(10, 1))
            .with("s.mp4", Script::frames(7, 2));

        let pairs = extract_frames(&backend, Path::new("t.mp4"), Path::new("s.mp4"));
        assert_eq!(pairs.len(), 7);
        assert_eq!(pairs.test_frames.len(), 7);
        assert_eq!(backend.open_handles.get(), 0);
    }

    #[test]
    fn test_stops_when_stream_ends_before_reported_count() {
        let short = Script {
            reported: Some(10),
            delivered: 4,
            fail_after: false,
            value: 0,
        };
        let backend = ScriptedBackend::new()
            .with("t.mp4", Script::frames(10, 1))
            .with("s.mp4", short);

        let pairs = extract_frames(&backend, Path::new("t.mp4"), Path::new("s.mp4"));
        assert_eq!(pairs.len(), 4);
        assert_eq!(backend.open_handles.get(), 0);
    }

    #[test]
    fn test_decode_failure_stops_and_releases() {
        let failing = Script {
            reported: Some(10),
            delivered: 3,
            fail_after: true,
            value: 0,
        };
        let backend = ScriptedBackend::new()
            .with("t.mp4", failing)
            .with("s.mp4", Script::frames(10, 1));

        let pairs = extract_frames(&backend, Path::new("t.mp4"), Path::new("s.mp4"));
        assert_eq!(pairs.len(), 3);
        assert_eq!(backend.open_handles.get(), 0);
    }

    #[test]
    fn test_unknown_frame_count_reads_until_end() {
        let unknown = Script {
            reported: None,
            delivered: 5,
            fail_after: false,
            value: 0,
        };
        let backend = ScriptedBackend::new()
            .with("t.mp4", unknown)
            .with("s.mp4", Script::frames(8, 1));

        let pairs = extract_frames(&backend, Path::new("t.mp4"), Path::new("s.mp4"));
        assert_eq!(pairs.len(), 5);
    }

    #[test]
    fn test_open_failure_yields_nothing_and_releases() {
        let backend = ScriptedBackend::new().with("t.mp4", Script::frames(5, 1));

        let pairs = extract_frames(&backend, Path::new("t.mp4"), Path::new("missing.mp4"));
        assert!(pairs.is_empty());
        assert_eq!(backend.open_handles.get(), 0);
    }

    #[test]
    fn test_dir_frames_concatenate_per_pair() {
        let truth = tempfile::tempdir().unwrap();
        let test = tempfile::tempdir().unwrap();
        for name in ["a.mp4", "b.mp4"] {
            std::fs::write(truth.path().join(name), b"").unwrap();
            std::fs::write(test.path().join(name), b"").unwrap();
        }

        let backend = ScriptedBackend::new()
            .with(truth.path().join("a.mp4"), Script::frames(3, 0))
            .with(test.path().join("a.mp4"), Script::frames(2, 0))
            .with(truth.path().join("b.mp4"), Script::frames(4, 0))
            .with(test.path().join("b.mp4"), Script::frames(4, 0));

        let pairs = extract_dir_frames(&backend, truth.path(), test.path(), &["mp4"]).unwrap();
        assert_eq!(pairs.len(), 6);
        assert_eq!(backend.opened.get(), 4);
        assert_eq!(backend.open_handles.get(), 0);
    }

    #[test]
    fn test_dir_without_pairs_is_an_error() {
        let truth = tempfile::tempdir().unwrap();
        let test = tempfile::tempdir().unwrap();
        std::fs::write(truth.path().join("a.mp4"), b"").unwrap();
        std::fs::write(test.path().join("b.mp4"), b"").unwrap();

        let backend = ScriptedBackend::new();
        let result = extract_dir_frames(&backend, truth.path(), test.path(), &["mp4"]);
        assert!(matches!(result, Err(Error::NoValidPairs { kind: "video", .. })));
    }

    #[test]
    fn test_mixed_file_and_directory_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.mp4");
        std::fs::write(&file, b"").unwrap();

        let backend = ScriptedBackend::new();
        let result = extract(&backend, &file, dir.path(), &["mp4"]);
        assert!(matches!(result, Err(Error::InvalidInput { .. })));
    }

    #[test]
    fn test_default_backend_rejects_unknown_container_without_ffmpeg() {
        if cfg!(feature = "ffmpeg") {
            return;
        }
        let result = DefaultVideoBackend.open(Path::new("clip.mp4"));
        assert!(matches!(result, Err(Error::UnsupportedFormat(_))));
    }
}
