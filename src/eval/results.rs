//! Labeled metric results collected over one run.
//!
//! Results are keyed by their label, which embeds both compared basenames
//! and the sample count, e.g. `U1-Q0 vs U4-Q1, Num: 32, PSNR: 31.41592`.
//! The summary recovers the compared target and the count from the label
//! alone, so the label format is part of the saved-results contract.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::eval::aggregate::Aggregate;
use crate::metrics::Metric;

/// What a sample count counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitKind {
    /// Still images (labels carry `Num:`).
    Image,
    /// Video frames (labels carry `Frames:`).
    Video,
}

impl UnitKind {
    /// Count token written into labels.
    pub fn count_tag(self) -> &'static str {
        match self {
            Self::Image => "Num",
            Self::Video => "Frames",
        }
    }
}

/// One metric value for one comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRecord {
    /// Formatted label, unique within a [`ResultSet`].
    pub label: String,
    /// Metric that produced the value.
    pub metric: Metric,
    /// Whether images or video frames were compared.
    pub kind: UnitKind,
    /// Number of samples behind the mean.
    pub count: usize,
    /// Mean score.
    pub value: f64,
}

impl MetricRecord {
    /// Build a record and its label from a finished aggregate.
    #[must_use]
    pub fn new(
        true_name: &str,
        test_name: &str,
        kind: UnitKind,
        metric: Metric,
        aggregate: Aggregate,
    ) -> Self {
        let label = format!(
            "{true_name} vs {test_name}, {}: {}, {}: {:.5}",
            kind.count_tag(),
            aggregate.count,
            metric.name(),
            aggregate.mean
        );
        Self {
            label,
            metric,
            kind,
            count: aggregate.count,
            value: aggregate.mean,
        }
    }

    /// First comma-delimited segment of the label (`"<true> vs <test>"`).
    #[must_use]
    pub fn header(&self) -> &str {
        self.label.split(',').next().unwrap_or_default().trim()
    }

    /// The compared target: the header text after `vs`.
    #[must_use]
    pub fn compare_target(&self) -> &str {
        let header = self.header();
        header
            .split_once(" vs ")
            .or_else(|| header.split_once("vs"))
            .map_or(header, |(_, target)| target.trim())
    }
}

/// Results accumulated across every comparison of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultSet {
    /// When the run started.
    pub timestamp: DateTime<Utc>,

    records: Vec<MetricRecord>,
}

impl Default for ResultSet {
    fn default() -> Self {
        Self::new()
    }
}

impl ResultSet {
    /// Create an empty result set.
    #[must_use]
    pub fn new() -> Self {
        Self {
            timestamp: Utc::now(),
            records: Vec::new(),
        }
    }

    /// Add a record. A record with the same label replaces the earlier one
    /// in place.
    pub fn record(&mut self, record: MetricRecord) {
        if let Some(existing) = self.records.iter_mut().find(|r| r.label == record.label) {
            *existing = record;
        } else {
            self.records.push(record);
        }
    }

    /// All records in insertion order.
    #[must_use]
    pub fn records(&self) -> &[MetricRecord] {
        &self.records
    }

    /// Records produced by one metric, in insertion order.
    pub fn for_metric(&self, metric: Metric) -> impl Iterator<Item = &MetricRecord> {
        self.records.iter().filter(move |r| r.metric == metric)
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check whether nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Load a result set saved with [`ResultSet::save`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Save as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), content)?;
        Ok(())
    }

    /// Write one CSV row per record.
    pub fn write_csv(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut wtr = csv::Writer::from_path(path.as_ref())?;

        wtr.write_record(["label", "metric", "kind", "count", "value"])?;
        for record in &self.records {
            wtr.write_record([
                record.label.as_str(),
                record.metric.key(),
                record.kind.count_tag(),
                &record.count.to_string(),
                &format!("{:.6}", record.value),
            ])?;
        }

        wtr.flush()?;
        Ok(())
    }
}
