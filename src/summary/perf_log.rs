//! Performance log filtering and `Tag: number` field extraction.
//!
//! A perf log is free-form text written by the system under test. Only
//! lines mentioning the perf tag and every extra tag (case-insensitive)
//! are kept. Timings are then looked up per compared target and averaged.

use std::path::Path;

use regex::{Regex, RegexBuilder};
use tracing::debug;

use crate::error::Result;

/// How a captured number is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Whole count such as `Num: 32`.
    Integer,
    /// Measurement such as `Mean Latency: 12.5`.
    Float,
}

/// A parsed field value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue {
    /// Parsed as [`FieldKind::Integer`].
    Integer(u64),
    /// Parsed as [`FieldKind::Float`].
    Float(f64),
}

impl FieldValue {
    /// The value as a float.
    #[must_use]
    pub fn as_f64(self) -> f64 {
        match self {
            Self::Integer(v) => v as f64,
            Self::Float(v) => v,
        }
    }
}

/// Compile the pattern for `"<tag>: <number>"`.
///
/// Spaces in the tag match any run of whitespace, and matching ignores case.
pub fn field_pattern(tag: &str) -> Result<Regex> {
    let tag = regex::escape(tag).replace(' ', r"\s+");
    Ok(RegexBuilder::new(&format!(r"{tag}:\s*(\d+\.?\d*)"))
        .case_insensitive(true)
        .build()?)
}

/// Extract the first number following `"<tag>:"` in `text`.
///
/// Returns `None` when the tag is absent or, for [`FieldKind::Integer`],
/// when the number has a fractional part.
pub fn parse_field(text: &str, tag: &str, kind: FieldKind) -> Result<Option<FieldValue>> {
    Ok(capture_field(&field_pattern(tag)?, text, kind))
}

fn capture_field(pattern: &Regex, text: &str, kind: FieldKind) -> Option<FieldValue> {
    let number = pattern.captures(text)?.get(1)?.as_str();
    match kind {
        FieldKind::Integer => number.parse().ok().map(FieldValue::Integer),
        FieldKind::Float => number.parse().ok().map(FieldValue::Float),
    }
}

/// Filtered lines of a performance log.
#[derive(Debug, Clone)]
pub struct PerfLog {
    pattern: Regex,
    lines: Vec<String>,
}

impl PerfLog {
    /// Filter log text down to the lines that mention `tag` and all of
    /// `extra_tags`. Kept lines are trimmed.
    pub fn from_text<S: AsRef<str>>(text: &str, tag: &str, extra_tags: &[S]) -> Result<Self> {
        let tag_lower = tag.to_lowercase();
        let extra_lower: Vec<String> = extra_tags
            .iter()
            .map(|t| t.as_ref().to_lowercase())
            .collect();

        let lines: Vec<String> = text
            .lines()
            .map(str::trim)
            .filter(|line| {
                let lower = line.to_lowercase();
                lower.contains(&tag_lower) && extra_lower.iter().all(|t| lower.contains(t.as_str()))
            })
            .map(str::to_string)
            .collect();
        debug!("Kept {} perf log lines for tag {tag:?}", lines.len());

        Ok(Self {
            pattern: field_pattern(tag)?,
            lines,
        })
    }

    /// Read and filter a log file.
    pub fn load<S: AsRef<str>>(
        path: impl AsRef<Path>,
        tag: &str,
        extra_tags: &[S],
    ) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_text(&text, tag, extra_tags)
    }

    /// Check whether no line was retained.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Mean timing over the retained lines that mention `target`.
    ///
    /// Lines mentioning the target without a parseable timing are ignored.
    #[must_use]
    pub fn timing_for(&self, target: &str) -> Option<f64> {
        let timings: Vec<f64> = self
            .lines
            .iter()
            .filter(|line| line.contains(target))
            .filter_map(|line| capture_field(&self.pattern, line, FieldKind::Float))
            .map(FieldValue::as_f64)
            .collect();
        if timings.is_empty() {
            return None;
        }
        Some(timings.iter().sum::<f64>() / timings.len() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOG: &str = "\
INFO boot
U1-Q0-C0-NONE mean latency: 10.0s
  U4-Q1-C1-NONE Mean Latency: 4.5s steps=28
U4-Q1-C1-NONE mean   latency: 5.5 s
cache stats U4-Q1-C1-NONE hits: 30 steps=28
DEBUG unrelated
";

    #[test]
    fn test_filter_requires_tag_and_every_extra_tag() {
        let log = PerfLog::from_text(LOG, "Mean Latency", &["STEPS=28"]).unwrap();
        assert_eq!(log.lines, vec!["U4-Q1-C1-NONE Mean Latency: 4.5s steps=28".to_string()]);

        let log = PerfLog::from_text(LOG, "latency", &["steps", "hits"]).unwrap();
        assert!(log.is_empty());
    }

    #[test]
    fn test_whitespace_in_tag_matches_runs() {
        let log = PerfLog::from_text(LOG, "Mean Latency", &[] as &[&str]).unwrap();
        // "mean   latency" fails the substring filter, though the field pattern accepts it.
        assert_eq!(log.lines.len(), 2);
        let value = parse_field("mean   latency: 5.5 s", "Mean Latency", FieldKind::Float).unwrap();
        assert_eq!(value, Some(FieldValue::Float(5.5)));
    }

    #[test]
    fn test_timing_is_averaged_per_target() {
        let log = PerfLog::from_text(LOG, "latency", &[] as &[&str]).unwrap();
        assert_eq!(log.timing_for("U4-Q1-C1-NONE"), Some(5.0));
        assert_eq!(log.timing_for("U1-Q0-C0-NONE"), Some(10.0));
        assert_eq!(log.timing_for("U9"), None);
    }

    #[test]
    fn test_parse_field_kinds() {
        let label = "a vs b, Num: 32, PSNR: 31.41592";
        let field = |tag, kind| parse_field(label, tag, kind).unwrap();
        assert_eq!(field("Num", FieldKind::Integer), Some(FieldValue::Integer(32)));
        assert_eq!(field("num", FieldKind::Integer), Some(FieldValue::Integer(32)));
        assert_eq!(field("PSNR", FieldKind::Float), Some(FieldValue::Float(31.41592)));
        assert_eq!(parse_field(label, "PSNR", FieldKind::Integer).unwrap(), None);
        assert_eq!(parse_field(label, "Frames", FieldKind::Integer).unwrap(), None);
    }

    #[test]
    fn test_tag_with_regex_metacharacters() {
        let value = parse_field("t(ms)+: 3", "t(ms)+", FieldKind::Integer).unwrap();
        assert_eq!(value.map(FieldValue::as_f64), Some(3.0));
    }

    #[test]
    fn test_load_missing_file_is_an_error() {
        assert!(PerfLog::load("/nonexistent/perf.log", "latency", &[] as &[&str]).is_err());
    }
}
