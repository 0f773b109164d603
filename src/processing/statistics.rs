//! Descriptive statistics of one axis.
//!
//! Mean and extrema come from statrs. Standard deviation, skewness and
//! kurtosis come from two-pass central moments, so a constant window has
//! exactly zero spread. Skewness and kurtosis use the biased estimators:
//! `g1 = m3 / m2^1.5` and `g2 = m4 / m2^2 - 3` (excess kurtosis), where `mk`
//! is the k-th central moment with divisor `n`.

use statrs::statistics::Statistics;

use super::AnalysisError;
use crate::types::StatisticalSummary;

/// Summarize `values`.
///
/// # Errors
/// [`AnalysisError::InvalidInput`] for an empty slice.
pub fn analyze_stats(values: &[f64]) -> Result<StatisticalSummary, AnalysisError> {
    if values.is_empty() {
        return Err(AnalysisError::insufficient(1, 0, "statistics"));
    }

    let mean = Statistics::mean(values);
    let max = Statistics::max(values);
    let min = Statistics::min(values);

    let (m2, m3, m4) = central_moments(values, mean);
    let std_dev = m2.sqrt();
    let (skewness, kurtosis) = if m2 > 0.0 {
        (Some(m3 / m2.powf(1.5)), Some(m4 / (m2 * m2) - 3.0))
    } else {
        (None, None)
    };

    Ok(StatisticalSummary {
        mean,
        std_dev,
        skewness,
        kurtosis,
        max,
        min,
    })
}

/// Second, third and fourth central moments (divisor `n`).
fn central_moments(values: &[f64], mean: f64) -> (f64, f64, f64) {
    let n = values.len() as f64;
    let (s2, s3, s4) = values.iter().fold((0.0, 0.0, 0.0), |(s2, s3, s4), &v| {
        let d = v - mean;
        let d2 = d * d;
        (s2 + d2, s3 + d2 * d, s4 + d2 * d2)
    });
    (s2 / n, s3 / n, s4 / n)
}
