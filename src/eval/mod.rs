//! Metric runs and their results.
//!
//! - [`runner::Runner`]: computes metrics for a [`runner::Pattern`]
//! - [`runner::RunConfig`]: metrics, extensions and progress display
//! - [`aggregate`]: mean aggregation with infinite-score exclusion
//! - [`results`]: labeled records and JSON/CSV export

pub mod aggregate;
pub mod results;
pub mod runner;

pub use aggregate::{Aggregate, MeanAccumulator, aggregate};
pub use results::{MetricRecord, ResultSet, UnitKind};
pub use runner::{Pattern, PatternOptions, RunConfig, Runner};
