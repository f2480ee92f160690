// src/statistics.rs - Descriptive statistics for batch summaries

use crate::error_function::z_value;

/// Significance level (percent) used when the requested one is out of range
pub const DEFAULT_ALPHA: f64 = 5.0;

/// Summary of one numeric sample.
///
/// Non-finite values are excluded from every figure; `excluded` counts them.
/// With no finite values all figures are NaN.
#[derive(Debug, Clone, PartialEq)]
pub struct DescriptiveStatistics {
    /// Finite values the figures are based on
    pub count: usize,
    pub excluded: usize,
    pub mean: f64,
    pub median: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    pub percentile_1: f64,
    pub percentile_99: f64,
    /// Half-width of the confidence interval around the mean
    pub confidence_interval: f64,
    /// Significance level (percent) the interval was computed for
    pub alpha: f64,
    /// Sample indices where the sign flips relative to the previous finite value
    pub zero_crossings: Vec<usize>,
}

impl DescriptiveStatistics {
    /// `alpha` is a percentage in (0, 100); anything else falls back to 5
    pub fn compute(sample: &[f64], alpha: f64) -> Self {
        let alpha = if alpha > 0.0 && alpha < 100.0 { alpha } else { DEFAULT_ALPHA };

        let mut sorted: Vec<f64> = sample.iter().copied().filter(|v| v.is_finite()).collect();
        sorted.sort_by(f64::total_cmp);

        let n = sorted.len();
        let excluded = sample.len() - n;
        let zero_crossings = zero_crossings(sample);

        if n == 0 {
            return Self {
                count: 0,
                excluded,
                mean: f64::NAN,
                median: f64::NAN,
                std_dev: f64::NAN,
                min: f64::NAN,
                max: f64::NAN,
                percentile_1: f64::NAN,
                percentile_99: f64::NAN,
                confidence_interval: f64::NAN,
                alpha,
                zero_crossings,
            };
        }

        let mean = sorted.iter().sum::<f64>() / n as f64;
        let std_dev = if n > 1 {
            let sum_sq: f64 = sorted.iter().map(|v| (v - mean).powi(2)).sum();
            (sum_sq / (n - 1) as f64).sqrt()
        } else {
            0.0
        };

        Self {
            count: n,
            excluded,
            mean,
            median: sorted[n / 2],
            std_dev,
            min: sorted[0],
            max: sorted[n - 1],
            percentile_1: rounded_percentile(&sorted, 0.01),
            percentile_99: rounded_percentile(&sorted, 0.99),
            confidence_interval: z_value(alpha) * std_dev / (n as f64).sqrt(),
            alpha,
            zero_crossings,
        }
    }
}

/// Value at the rounded index `q * n`, clamped to the sample
fn rounded_percentile(sorted: &[f64], q: f64) -> f64 {
    let idx = (q * sorted.len() as f64).round() as usize;
    sorted[idx.min(sorted.len() - 1)]
}

fn zero_crossings(sample: &[f64]) -> Vec<usize> {
    let mut crossings = Vec::new();
    let mut previous: Option<f64> = None;

    for (i, &v) in sample.iter().enumerate() {
        if !v.is_finite() {
            continue;
        }
        if let Some(p) = previous {
            if (p < 0.0) != (v < 0.0) {
                crossings.push(i);
            }
        }
        previous = Some(v);
    }

    crossings
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn small_sample_summary() {
        let stats = DescriptiveStatistics::compute(&[3.0, 1.0, 5.0, 2.0, 4.0], 5.0);

        assert_eq!(stats.count, 5);
        assert_eq!(stats.excluded, 0);
        assert_approx_eq!(stats.mean, 3.0);
        assert_approx_eq!(stats.median, 3.0);
        assert_approx_eq!(stats.min, 1.0);
        assert_approx_eq!(stats.max, 5.0);
        assert_approx_eq!(stats.std_dev, 2.5f64.sqrt());
        assert_approx_eq!(stats.percentile_1, 1.0);
        assert_approx_eq!(stats.percentile_99, 5.0);
        assert_approx_eq!(stats.confidence_interval, 1.96 * 2.5f64.sqrt() / 5f64.sqrt(), 1e-2);
    }

    #[test]
    fn interval_narrows_with_sample_size() {
        let mut previous = f64::INFINITY;
        for k in [2usize, 4, 8, 16, 32] {
            let sample: Vec<f64> = (0..2 * k).map(|i| if i % 2 == 0 { 1.0 } else { 3.0 }).collect();
            let ci = DescriptiveStatistics::compute(&sample, 5.0).confidence_interval;
            assert!(ci < previous, "k={} ci={} previous={}", k, ci, previous);
            previous = ci;
        }
    }

    #[test]
    fn non_finite_values_are_excluded() {
        let stats = DescriptiveStatistics::compute(&[1.0, f64::NAN, 3.0, f64::INFINITY], 5.0);
        assert_eq!(stats.count, 2);
        assert_eq!(stats.excluded, 2);
        assert_approx_eq!(stats.mean, 2.0);
        assert_approx_eq!(stats.max, 3.0);
    }

    #[test]
    fn empty_and_all_nan_samples_are_undefined() {
        for sample in [vec![], vec![f64::NAN, f64::NEG_INFINITY]] {
            let stats = DescriptiveStatistics::compute(&sample, 5.0);
            assert_eq!(stats.count, 0);
            assert!(stats.mean.is_nan());
            assert!(stats.median.is_nan());
            assert!(stats.confidence_interval.is_nan());
        }
    }

    #[test]
    fn single_value_has_zero_spread() {
        let stats = DescriptiveStatistics::compute(&[7.0], 5.0);
        assert_eq!(stats.std_dev, 0.0);
        assert_eq!(stats.confidence_interval, 0.0);
    }

    #[test]
    fn invalid_alpha_falls_back_to_default() {
        assert_eq!(DescriptiveStatistics::compute(&[1.0, 2.0], 0.0).alpha, DEFAULT_ALPHA);
        assert_eq!(DescriptiveStatistics::compute(&[1.0, 2.0], 150.0).alpha, DEFAULT_ALPHA);
        assert_eq!(DescriptiveStatistics::compute(&[1.0, 2.0], 10.0).alpha, 10.0);
    }

    #[test]
    fn zero_crossings_skip_non_finite_values() {
        let stats = DescriptiveStatistics::compute(&[1.0, -1.0, f64::NAN, -2.0, 3.0], 5.0);
        assert_eq!(stats.zero_crossings, vec![1, 4]);
    }
}
