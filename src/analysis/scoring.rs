//! Weighted composite score

use crate::models::FactorSet;
use crate::models::analysis::clamp_unit;

/// Weights in [`FactorSet::as_array`] order: coverage, fiber, population,
/// business, signal. They sum to 1.0.
pub const WEIGHTS: [f64; 5] = [0.20, 0.15, 0.25, 0.30, 0.10];

/// Dot product of weights and factors, in `[0, 1]`
#[must_use]
pub fn score(factors: &FactorSet) -> f64 {
    let total: f64 = WEIGHTS
        .iter()
        .zip(factors.as_array())
        .map(|(weight, value)| weight * value)
        .sum();
    clamp_unit(total)
}
