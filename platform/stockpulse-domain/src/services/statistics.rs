//! Sample statistics used by the detectors.
//!
//! Every function is total: degenerate samples map to `None` or `0.0`, never a panic or NaN.

pub fn mean(sample: &[f64]) -> Option<f64> {
    if sample.is_empty() {
        return None;
    }
    Some(sample.iter().sum::<f64>() / sample.len() as f64)
}

/// Variance with denominator `N` (population), not `N - 1`.
pub fn population_variance(sample: &[f64]) -> Option<f64> {
    let mean = mean(sample)?;
    if is_flat(sample) {
        return Some(0.0);
    }
    let sum_sq: f64 = sample
        .iter()
        .map(|value| {
            let diff = value - mean;
            diff * diff
        })
        .sum();
    Some((sum_sq / sample.len() as f64).max(0.0))
}

pub fn population_std_dev(sample: &[f64]) -> Option<f64> {
    population_variance(sample).map(f64::sqrt)
}

/// Distance of `value` from the sample mean, in population standard deviations.
///
/// Fewer than two observations, or a perfectly flat sample, score `0.0` whatever `value` is.
pub fn z_score(sample: &[f64], value: f64) -> f64 {
    if sample.len() < 2 {
        return 0.0;
    }
    let (Some(mean), Some(std_dev)) = (mean(sample), population_std_dev(sample)) else {
        return 0.0;
    };
    if std_dev == 0.0 || !std_dev.is_finite() {
        return 0.0;
    }
    let z = (value - mean) / std_dev;
    if z.is_finite() {
        z
    } else {
        0.0
    }
}

// Summing identical values can drift the mean by an ulp, which would turn a flat
// history into a tiny non-zero deviation.
fn is_flat(sample: &[f64]) -> bool {
    match sample.split_first() {
        Some((first, rest)) => rest.iter().all(|value| value == first),
        None => true,
    }
}
