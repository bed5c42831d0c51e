//! Summary statistics over `f64` samples.
//!
//! Functions return `None` rather than NaN when the sample cannot support the statistic.

/// Arithmetic mean.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Population variance (divide by n).
pub fn population_variance(values: &[f64]) -> Option<f64> {
    let mean = mean(values)?;
    let n = values.len() as f64;
    Some(values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n)
}

/// Sample standard deviation (divide by n - 1).
pub fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let mean = mean(values)?;
    let n = values.len() as f64;
    let variance = values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1.0);
    Some(variance.sqrt())
}

/// Population covariance of two equal length samples.
pub fn population_covariance(a: &[f64], b: &[f64]) -> Option<f64> {
    if a.len() != b.len() {
        return None;
    }
    let (mean_a, mean_b) = (mean(a)?, mean(b)?);
    let n = a.len() as f64;
    let cov = a
        .iter()
        .zip(b)
        .map(|(x, y)| (x - mean_a) * (y - mean_b))
        .sum::<f64>();
    Some(cov / n)
}

/// Percentile with linear interpolation between closest ranks.
///
/// `pct` is in `[0, 100]`.
pub fn percentile(values: &[f64], pct: f64) -> Option<f64> {
    if values.is_empty() || !pct.is_finite() {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let rank = (pct.clamp(0.0, 100.0) / 100.0) * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let weight = rank - lower as f64;

    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * weight)
}

/// Z-score of `value` against `history` using the sample standard deviation.
///
/// Returns `None` if the standard deviation is degenerate.
pub fn zscore(value: f64, history: &[f64]) -> Option<f64> {
    let mean = mean(history)?;
    let std = sample_std(history)?;

    if std < 1e-12 {
        return None;
    }

    Some((value - mean) / std)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_and_variance() {
        assert_eq!(mean(&[]), None);
        assert_eq!(mean(&[1.0, 2.0, 3.0]), Some(2.0));
        assert_eq!(population_variance(&[1.0, 2.0, 3.0, 4.0]), Some(1.25));
        assert_eq!(sample_std(&[1.0]), None);
        let std = sample_std(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert!((std - 2.138089935).abs() < 1e-6);
    }

    #[test]
    fn test_covariance() {
        let cov = population_covariance(&[1.0, 2.0, 3.0], &[2.0, 4.0, 6.0]).unwrap();
        assert!((cov - 4.0 / 3.0).abs() < 1e-12);
        assert_eq!(population_covariance(&[1.0], &[1.0, 2.0]), None);
    }

    #[test]
    fn test_percentile() {
        struct TestCase {
            pct: f64,
            expected: f64,
        }

        let values = [1.0, 2.0, 3.0, 4.0, 5.0];
        let tests = vec![
            TestCase { pct: 0.0, expected: 1.0 },   // TC0
            TestCase { pct: 50.0, expected: 3.0 },  // TC1
            TestCase { pct: 95.0, expected: 4.8 },  // TC2
            TestCase { pct: 100.0, expected: 5.0 }, // TC3
        ];

        for (index, test) in tests.into_iter().enumerate() {
            let actual = percentile(&values, test.pct).unwrap();
            assert!((actual - test.expected).abs() < 1e-9, "TC{} failed", index);
        }

        assert_eq!(percentile(&[], 50.0), None);
    }

    #[test]
    fn test_zscore_degenerate() {
        assert_eq!(zscore(1.0, &[1.0, 1.0, 1.0]), None);
        let z = zscore(3.0, &[1.0, 2.0, 3.0]).unwrap();
        assert!((z - 1.0).abs() < 1e-12);
    }
}
