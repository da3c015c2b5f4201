//! Plain-text ranking tables over recorded results.
//!
//! For each metric, results are sorted best-first (descending for PSNR and
//! SSIM, ascending otherwise) and printed one row per comparison, framed by
//! a dashed banner:
//!
//! ```text
//! -------------------------------------------------
//!                  Summary: PSNR
//! -------------------------------------------------
//! R vs X  Num: 12  PSNR: 34.1200
//! R vs Y  Num: 12  PSNR: 29.8800
//! -------------------------------------------------
//! ```
//!
//! With a [`PerfLog`], every row gains a `Perf:` column holding the mean
//! timing logged for that row's compared target.

pub mod perf_log;

use std::cmp::Ordering;

use tracing::warn;

pub use perf_log::{FieldKind, FieldValue, PerfLog, parse_field};

use crate::error::{Error, Result};
use crate::eval::results::{MetricRecord, ResultSet, UnitKind};
use crate::metrics::{Metric, MetricSelection};

/// Renders summary tables for a [`ResultSet`].
pub struct SummaryReporter<'a> {
    results: &'a ResultSet,
    perf_log: Option<&'a PerfLog>,
}

impl<'a> SummaryReporter<'a> {
    /// Create a reporter without timings.
    #[must_use]
    pub fn new(results: &'a ResultSet) -> Self {
        Self {
            results,
            perf_log: None,
        }
    }

    /// Add a `Perf:` column from a filtered performance log.
    ///
    /// A log with no retained lines adds no column.
    #[must_use]
    pub fn with_perf_log(mut self, perf_log: &'a PerfLog) -> Self {
        self.perf_log = Some(perf_log).filter(|log| !log.is_empty());
        self
    }

    /// Render the tables of every selected metric, in selection order.
    ///
    /// Metrics without results are skipped with a warning.
    pub fn render(&self, metrics: &MetricSelection) -> Result<String> {
        let mut out = String::new();
        for metric in metrics.iter() {
            match self.render_metric(metric)? {
                Some(table) => out.push_str(&table),
                None => warn!("No results for {metric}, skipping its summary"),
            }
        }
        Ok(out)
    }

    /// Render the table for one metric, or `None` if it has no results.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedLabel`] if a label carries neither a `Num:`
    /// nor a `Frames:` count.
    pub fn render_metric(&self, metric: Metric) -> Result<Option<String>> {
        let mut records: Vec<&MetricRecord> = self.results.for_metric(metric).collect();
        if records.is_empty() {
            return Ok(None);
        }
        sort_best_first(&mut records, metric);

        let header_width = records
            .iter()
            .map(|r| r.header().chars().count())
            .max()
            .unwrap_or_default();

        let rows = records
            .iter()
            .map(|record| self.format_row(record, header_width))
            .collect::<Result<Vec<_>>>()?;

        let title = format!("Summary: {}", metric.name());
        let width = rows
            .iter()
            .map(|row| row.chars().count())
            .max()
            .unwrap_or_default()
            .max(title.chars().count());
        let padding = width - title.chars().count();
        let left = padding / 2;
        let rule = "-".repeat(width);

        let mut table = String::new();
        table.push_str(&rule);
        table.push('\n');
        table.push_str(&format!("{}{title}{}\n", " ".repeat(left), " ".repeat(padding - left)));
        table.push_str(&rule);
        table.push('\n');
        for row in &rows {
            table.push_str(row);
            table.push('\n');
        }
        table.push_str(&rule);
        table.push('\n');
        Ok(Some(table))
    }

    fn format_row(&self, record: &MetricRecord, header_width: usize) -> Result<String> {
        let (kind, count) = sample_count(&record.label)?;
        let mut row = format!(
            "{:<header_width$}  {}: {count}  {}: {:<7.4}",
            record.header(),
            kind.count_tag(),
            record.metric.name(),
            record.value
        );
        if let Some(log) = self.perf_log {
            match log.timing_for(record.compare_target()) {
                Some(timing) => row.push_str(&format!("  Perf: {timing:.2}")),
                None => row.push_str("  Perf: N/A"),
            }
        }
        Ok(row)
    }
}

/// Recover the unit kind and sample count embedded in a label.
fn sample_count(label: &str) -> Result<(UnitKind, u64)> {
    for kind in [UnitKind::Image, UnitKind::Video] {
        let field = parse_field(label, kind.count_tag(), FieldKind::Integer)?;
        if let Some(FieldValue::Integer(count)) = field {
            return Ok((kind, count));
        }
    }
    Err(Error::MalformedLabel(label.to_string()))
}

fn sort_best_first(records: &mut [&MetricRecord], metric: Metric) {
    let ascending = |a: &&MetricRecord, b: &&MetricRecord| {
        a.value.partial_cmp(&b.value).unwrap_or(Ordering::Equal)
    };
    if metric.higher_is_better() {
        records.sort_by(|a, b| ascending(b, a));
    } else {
        records.sort_by(ascending);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::aggregate::Aggregate;

    fn results(metric: Metric, kind: UnitKind, rows: &[(&str, f64)]) -> ResultSet {
        let mut set = ResultSet::new();
        for (target, value) in rows {
            set.record(MetricRecord::new(
                "R",
                target,
                kind,
                metric,
                Aggregate {
                    mean: *value,
                    count: 4,
                },
            ));
        }
        set
    }

    fn row_values(table: &str) -> Vec<&str> {
        table
            .lines()
            .filter(|line| line.starts_with("R vs"))
            .filter_map(|line| line.split(" vs ").nth(1))
            .filter_map(|rest| rest.split_whitespace().next())
            .collect()
    }

    #[test]
    fn test_higher_is_better_sorts_descending() {
        let set = results(Metric::Ssim, UnitKind::Image, &[("A", 0.6), ("B", 0.95), ("C", 0.8)]);
        let table = SummaryReporter::new(&set).render_metric(Metric::Ssim).unwrap().unwrap();
        assert_eq!(row_values(&table), vec!["B", "C", "A"]);
    }

    #[test]
    fn test_lower_is_better_sorts_ascending() {
        let set = results(Metric::Mse, UnitKind::Image, &[("A", 0.6), ("B", 0.95), ("C", 0.8)]);
        let table = SummaryReporter::new(&set).render_metric(Metric::Mse).unwrap().unwrap();
        assert_eq!(row_values(&table), vec!["A", "C", "B"]);
    }

    #[test]
    fn test_table_layout() {
        let set = results(Metric::Psnr, UnitKind::Image, &[("X", 34.12), ("LONGER", 29.88)]);
        let table = SummaryReporter::new(&set).render_metric(Metric::Psnr).unwrap().unwrap();
        let lines: Vec<&str> = table.lines().collect();

        assert_eq!(lines[3], "R vs X       Num: 4  PSNR: 34.1200");
        assert_eq!(lines[4], "R vs LONGER  Num: 4  PSNR: 29.8800");

        let width = lines[3].len();
        assert_eq!(lines.len(), 6);
        assert_eq!(lines[0], "-".repeat(width));
        assert_eq!(lines[2], lines[0]);
        assert_eq!(lines[5], lines[0]);
        assert_eq!(lines[1].len(), width);
        assert_eq!(lines[1].trim(), "Summary: PSNR");
        let left = (width - "Summary: PSNR".len()) / 2;
        assert!(lines[1].starts_with(&format!("{}Summary", " ".repeat(left))));
    }

    #[test]
    fn test_value_column_is_padded() {
        let set = results(Metric::Ssim, UnitKind::Video, &[("clip.mp4", 0.5)]);
        let table = SummaryReporter::new(&set).render_metric(Metric::Ssim).unwrap().unwrap();
        assert!(table.contains("R vs clip.mp4  Frames: 4  SSIM: 0.5000 \n"));
    }

    #[test]
    fn test_perf_column() {
        let set = results(Metric::Mse, UnitKind::Image, &[("U4-Q1", 2.0), ("U9", 3.0)]);
        let log = PerfLog::from_text(
            "U4-Q1 mean latency: 1.25\nU4-Q1 mean latency: 1.75\nother line",
            "Mean Latency",
            &[] as &[&str],
        )
        .unwrap();
        let table = SummaryReporter::new(&set)
            .with_perf_log(&log)
            .render_metric(Metric::Mse)
            .unwrap()
            .unwrap();

        assert!(table.contains("MSE: 2.0000   Perf: 1.50\n"));
        assert!(table.contains("MSE: 3.0000   Perf: N/A\n"));
    }

    #[test]
    fn test_empty_perf_log_adds_no_column() {
        let set = results(Metric::Mse, UnitKind::Image, &[("A", 1.0)]);
        let log = PerfLog::from_text("nothing relevant", "latency", &[] as &[&str]).unwrap();
        let table = SummaryReporter::new(&set)
            .with_perf_log(&log)
            .render_metric(Metric::Mse)
            .unwrap()
            .unwrap();
        assert!(!table.contains("Perf"));
    }

    #[test]
    fn test_metric_without_results_renders_nothing() {
        let set = results(Metric::Mse, UnitKind::Image, &[("A", 1.0)]);
        let reporter = SummaryReporter::new(&set);
        assert!(reporter.render_metric(Metric::Psnr).unwrap().is_none());

        let selection: MetricSelection = [Metric::Psnr, Metric::Mse].into_iter().collect();
        let out = reporter.render(&selection).unwrap();
        assert!(out.contains("Summary: MSE"));
        assert!(!out.contains("Summary: PSNR"));
    }

    #[test]
    fn test_malformed_label_is_an_error() {
        let mut set = ResultSet::new();
        set.record(MetricRecord {
            label: "R vs X, PSNR: 30.00000".to_string(),
            metric: Metric::Psnr,
            kind: UnitKind::Image,
            count: 1,
            value: 30.0,
        });
        let result = SummaryReporter::new(&set).render_metric(Metric::Psnr);
        assert!(matches!(result, Err(Error::MalformedLabel(_))));
    }
}
