//! Mean aggregation with degenerate-score exclusion.
//!
//! Scores equal to positive infinity (for example PSNR on identical units)
//! are dropped from both the sum and the sample count. A run where every
//! score was dropped has no mean at all, which is different from a mean of
//! zero.

use serde::{Deserialize, Serialize};

use tracing::debug;

use crate::error::Result;

/// Mean score over the valid samples of one comparison.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aggregate {
    /// Arithmetic mean of the valid scores.
    pub mean: f64,
    /// Number of scores that contributed to the mean.
    pub count: usize,
}

/// Running sum and count of valid scores.
#[derive(Debug, Clone, Copy, Default)]
pub struct MeanAccumulator {
    sum: f64,
    valid: usize,
    seen: usize,
}

impl MeanAccumulator {
    /// Create an empty accumulator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one score. Positive infinity is counted as seen but not valid.
    pub fn push(&mut self, score: f64) {
        self.seen += 1;
        if score != f64::INFINITY {
            self.sum += score;
            self.valid += 1;
        }
    }

    /// Number of scores pushed, including excluded ones.
    #[must_use]
    pub fn seen(&self) -> usize {
        self.seen
    }

    /// Reduce to a mean, or `None` if no score was valid.
    #[must_use]
    pub fn finish(&self) -> Option<Aggregate> {
        if self.valid == 0 {
            return None;
        }
        Some(Aggregate {
            mean: self.sum / self.valid as f64,
            count: self.valid,
        })
    }
}

/// Score every item and reduce to a mean over the non-infinite scores.
///
/// Stops at the first scoring error.
pub fn aggregate<T, I, F>(items: I, mut score: F) -> Result<Option<Aggregate>>
where
    I: IntoIterator<Item = T>,
    F: FnMut(T) -> Result<f64>,
{
    let mut acc = MeanAccumulator::new();
    for item in items {
        acc.push(score(item)?);
    }
    let excluded = acc.seen() - acc.valid;
    if excluded > 0 {
        debug!("Excluded {excluded} infinite scores out of {}", acc.seen());
    }
    Ok(acc.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_mean_of_finite_scores() {
        let result = aggregate([1.0, 2.0, 3.0, 4.0], Ok).unwrap().unwrap();
        assert!((result.mean - 2.5).abs() < 1e-12);
        assert_eq!(result.count, 4);
    }

    #[test]
    fn test_infinite_scores_excluded_from_sum_and_count() {
        let scores = [30.0, f64::INFINITY, 40.0, f64::INFINITY, 50.0];
        let result = aggregate(scores, Ok).unwrap().unwrap();
        assert!((result.mean - 40.0).abs() < 1e-12);
        assert_eq!(result.count, 3);
    }

    #[test]
    fn test_all_infinite_is_unavailable() {
        let result = aggregate([f64::INFINITY; 3], Ok).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_empty_is_unavailable() {
        let result = aggregate(Vec::<f64>::new(), Ok).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_negative_infinity_is_not_excluded() {
        let mut acc = MeanAccumulator::new();
        acc.push(f64::NEG_INFINITY);
        acc.push(1.0);
        let result = acc.finish().unwrap();
        assert_eq!(result.count, 2);
        assert!(result.mean.is_infinite());
        assert_eq!(acc.seen(), 2);
    }

    #[test]
    fn test_exclusion_property_over_mixed_sequences() {
        for n in 1..12usize {
            for k in 0..=n {
                let scores: Vec<f64> = (0..n)
                    .map(|i| if i < k { f64::INFINITY } else { i as f64 * 0.5 })
                    .collect();
                let result = aggregate(scores.iter().copied(), Ok).unwrap();
                if k == n {
                    assert!(result.is_none());
                } else {
                    let finite: Vec<f64> =
                        scores.iter().copied().filter(|s| s.is_finite()).collect();
                    let expected = finite.iter().sum::<f64>() / finite.len() as f64;
                    let result = result.unwrap();
                    assert_eq!(result.count, n - k);
                    assert!((result.mean - expected).abs() < 1e-12);
                }
            }
        }
    }

    #[test]
    fn test_scoring_error_propagates() {
        let result = aggregate([1.0, 2.0], |s| {
            if s > 1.5 {
                Err(Error::MetricCalculation {
                    metric: "TEST".to_string(),
                    reason: "boom".to_string(),
                })
            } else {
                Ok(s)
            }
        });
        assert!(result.is_err());
    }
}
