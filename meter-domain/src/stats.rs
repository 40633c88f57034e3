//! Descriptive statistics for a single series.
//!
//! Pure and stateless; the only edge case is empty input, which yields a
//! count of zero and NaN for every other statistic instead of an error.

use serde::Serialize;

/// Standard `describe()`-style summary: count, mean, sample standard
/// deviation, min, quartiles, max.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryStats {
    pub count: usize,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

impl SummaryStats {
    /// Computes summary statistics over the finite values of `values`.
    ///
    /// Non-finite entries are ignored. With no finite values the count is
    /// zero and every statistic is NaN. With a single value the sample
    /// standard deviation is NaN (undefined), matching the usual ddof=1
    /// convention.
    pub fn describe(values: &[f64]) -> Self {
        let mut vals: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
        let count = vals.len();
        if count == 0 {
            return Self {
                count: 0,
                mean: f64::NAN,
                std: f64::NAN,
                min: f64::NAN,
                q1: f64::NAN,
                median: f64::NAN,
                q3: f64::NAN,
                max: f64::NAN,
            };
        }

        let mean = vals.iter().sum::<f64>() / count as f64;
        let std = if count > 1 {
            let ss = vals.iter().map(|v| (v - mean).powi(2)).sum::<f64>();
            (ss / (count - 1) as f64).sqrt()
        } else {
            f64::NAN
        };

        vals.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        Self {
            count,
            mean,
            std,
            min: vals[0],
            q1: percentile(&vals, 0.25),
            median: percentile(&vals, 0.5),
            q3: percentile(&vals, 0.75),
            max: vals[count - 1],
        }
    }
}

/// Percentile of an ascending-sorted non-empty slice, with linear
/// interpolation between the two nearest ranks.
fn percentile(sorted: &[f64], p: f64) -> f64 {
    let rank = p * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        sorted[lo]
    } else {
        let frac = rank - lo as f64;
        sorted[lo] + (sorted[hi] - sorted[lo]) * frac
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describe_empty_series_is_nan_not_error() {
        let stats = SummaryStats::describe(&[]);
        assert_eq!(stats.count, 0);
        assert!(stats.mean.is_nan());
        assert!(stats.std.is_nan());
        assert!(stats.min.is_nan());
        assert!(stats.median.is_nan());
        assert!(stats.max.is_nan());
    }

    #[test]
    fn describe_small_series_matches_linear_quartiles() {
        let stats = SummaryStats::describe(&[4.0, 1.0, 3.0, 2.0]);
        assert_eq!(stats.count, 4);
        assert!((stats.mean - 2.5).abs() < 1e-12);
        assert!((stats.std - (5.0_f64 / 3.0).sqrt()).abs() < 1e-12);
        assert_eq!(stats.min, 1.0);
        assert!((stats.q1 - 1.75).abs() < 1e-12);
        assert!((stats.median - 2.5).abs() < 1e-12);
        assert!((stats.q3 - 3.25).abs() < 1e-12);
        assert_eq!(stats.max, 4.0);
    }

    #[test]
    fn describe_single_value_has_nan_std() {
        let stats = SummaryStats::describe(&[7.0]);
        assert_eq!(stats.count, 1);
        assert_eq!(stats.mean, 7.0);
        assert!(stats.std.is_nan());
        assert_eq!(stats.median, 7.0);
    }

    #[test]
    fn describe_ignores_non_finite_values() {
        let stats = SummaryStats::describe(&[1.0, f64::NAN, 2.0, f64::INFINITY, 3.0]);
        assert_eq!(stats.count, 3);
        assert!((stats.mean - 2.0).abs() < 1e-12);
        assert_eq!(stats.min, 1.0);
        assert_eq!(stats.max, 3.0);
    }
}
