//! Numeric helpers shared by every report.
//!
//! All functions are pure. Non-finite inputs (NaN, ±∞) are treated as
//! non-numeric and filtered out before anything is computed. Results are
//! returned unrounded unless stated otherwise; callers pick their precision
//! with [`round_to`].

#![allow(clippy::cast_precision_loss)]

use serde::{Deserialize, Serialize};

/// Box-plot summary. Quartiles use the Tukey hinge method (median of each
/// half, the middle element shared by both halves for odd lengths); no linear
/// interpolation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FiveNumberSummary {
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

impl FiveNumberSummary {
    /// Values in box-plot order: `[min, q1, median, q3, max]`.
    pub const fn as_array(&self) -> [f64; 5] {
        [self.min, self.q1, self.median, self.q3, self.max]
    }
}

fn finite(values: &[f64]) -> impl Iterator<Item = f64> + '_ {
    values.iter().copied().filter(|v| v.is_finite())
}

fn sorted_finite(values: &[f64]) -> Vec<f64> {
    let mut sorted: Vec<f64> = finite(values).collect();
    sorted.sort_by(f64::total_cmp);
    sorted
}

fn median_of_sorted(sorted: &[f64]) -> f64 {
    let n = sorted.len();
    if n == 0 {
        return 0.0;
    }
    let mid = n / 2;
    if n % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Round half away from zero to `decimals` places.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10_f64.powi(i32::try_from(decimals).unwrap_or(i32::MAX));
    if !factor.is_finite() {
        return value;
    }
    (value * factor).round() / factor
}

/// Median of the numeric values, 0 for empty input.
pub fn median(values: &[f64]) -> f64 {
    median_of_sorted(&sorted_finite(values))
}

/// Largest numeric value, 0 for empty input.
pub fn max(values: &[f64]) -> f64 {
    finite(values).reduce(f64::max).unwrap_or(0.0)
}

/// Smallest numeric value, 0 for empty input.
pub fn min(values: &[f64]) -> f64 {
    finite(values).reduce(f64::min).unwrap_or(0.0)
}

/// Arithmetic mean, 0 for empty input.
pub fn mean(values: &[f64]) -> f64 {
    let (sum, count) = finite(values).fold((0.0, 0_usize), |(s, c), v| (s + v, c + 1));
    if count == 0 { 0.0 } else { sum / count as f64 }
}

/// Sample standard deviation (n - 1 denominator), 0 for fewer than two values.
pub fn std_dev(values: &[f64]) -> f64 {
    let numeric: Vec<f64> = finite(values).collect();
    if numeric.len() < 2 {
        return 0.0;
    }
    let avg = numeric.iter().sum::<f64>() / numeric.len() as f64;
    let sum_sq: f64 = numeric.iter().map(|v| (v - avg).powi(2)).sum();
    (sum_sq / (numeric.len() - 1) as f64).sqrt()
}

/// Five-number summary rounded to two decimals, `None` for empty input.
pub fn five_number_summary(values: &[f64]) -> Option<FiveNumberSummary> {
    let sorted = sorted_finite(values);
    let n = sorted.len();
    if n == 0 {
        return None;
    }
    let lower = &sorted[..n.div_ceil(2)];
    let upper = &sorted[n / 2..];
    Some(FiveNumberSummary {
        min: round_to(sorted[0], 2),
        q1: round_to(median_of_sorted(lower), 2),
        median: round_to(median_of_sorted(&sorted), 2),
        q3: round_to(median_of_sorted(upper), 2),
        max: round_to(sorted[n - 1], 2),
    })
}

/// `numerator / denominator * 100`, or 0 when the denominator is not positive.
pub fn percentage(numerator: f64, denominator: f64) -> f64 {
    if denominator <= 0.0 || !denominator.is_finite() || !numerator.is_finite() {
        return 0.0;
    }
    numerator / denominator * 100.0
}
