//! Range and correlation statistics.

use super::StatsError;
use serde::{Deserialize, Serialize};

/// Closed interval of observed values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
}

impl ValueRange {
    /// The fallback used when there is nothing to measure.
    pub const DEFAULT: ValueRange = ValueRange { min: 0.0, max: 1.0 };

    /// Width of the interval.
    pub fn span(&self) -> f64 {
        self.max - self.min
    }
}

impl Default for ValueRange {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Min and max of the finite values in `values`.
///
/// An empty slice is an error. A non-empty slice whose values are all
/// NaN or infinite yields [`ValueRange::DEFAULT`].
pub fn range(values: &[f64]) -> Result<ValueRange, StatsError> {
    if values.is_empty() {
        return Err(StatsError::EmptyInput);
    }

    let folded = values
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(None, |acc: Option<ValueRange>, v| {
            Some(match acc {
                Some(r) => ValueRange {
                    min: r.min.min(v),
                    max: r.max.max(v),
                },
                None => ValueRange { min: v, max: v },
            })
        });

    Ok(folded.unwrap_or(ValueRange::DEFAULT))
}

/// Like [`range`], but an empty input also falls back to the default.
pub fn range_or_default(values: &[f64]) -> ValueRange {
    range(values).unwrap_or_default()
}

/// Pearson correlation coefficient of two paired series.
///
/// Returns `Ok(None)` when fewer than two pairs are given or either series
/// has zero variance: a constant series has no linear correlation.
pub fn pearson_correlation(xs: &[f64], ys: &[f64]) -> Result<Option<f64>, StatsError> {
    if xs.len() != ys.len() {
        return Err(StatsError::LengthMismatch {
            left: xs.len(),
            right: ys.len(),
        });
    }

    let n = xs.len();
    if n < 2 {
        return Ok(None);
    }

    let mean_x = xs.iter().sum::<f64>() / n as f64;
    let mean_y = ys.iter().sum::<f64>() / n as f64;

    let mut covariance = 0.0;
    let mut variance_x = 0.0;
    let mut variance_y = 0.0;
    for (x, y) in xs.iter().zip(ys) {
        let dx = x - mean_x;
        let dy = y - mean_y;
        covariance += dx * dy;
        variance_x += dx * dx;
        variance_y += dy * dy;
    }

    let denominator = (variance_x * variance_y).sqrt();
    if denominator == 0.0 || !denominator.is_finite() {
        return Ok(None);
    }

    let r = covariance / denominator;
    if r.is_finite() {
        Ok(Some(r.clamp(-1.0, 1.0)))
    } else {
        Ok(None)
    }
}

/// Describes the strength of a correlation for display.
pub fn describe_correlation(r: Option<f64>) -> &'static str {
    match r.map(f64::abs) {
        None => "undefined",
        Some(a) if a >= 0.7 => "strong",
        Some(a) if a >= 0.4 => "moderate",
        Some(a) if a >= 0.1 => "weak",
        Some(_) => "none",
    }
}
