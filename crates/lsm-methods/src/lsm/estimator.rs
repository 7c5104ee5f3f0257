//! Discounting of extracted payoffs and the Monte Carlo price estimate.

use lsm_core::{Rate, Real, Time};
use lsm_math::statistics::Statistics;
use rayon::prelude::*;

use super::exercise::PayoffMatrix;

/// Monte Carlo price with its standard error.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceEstimate {
    /// Mean of the discounted path payoffs.
    pub price: Real,
    /// Standard error of the mean (`0` for a single path).
    pub std_error: Real,
}

/// Discount every path's payoffs to time zero with `e^{−r·i·Δt}` and sum
/// over dates.
///
/// After first-exercise extraction each row has at most one nonzero entry,
/// so the sum is the present value of that single exercise.
pub fn discounted_payoffs(matrix: &PayoffMatrix, rate: Rate, dt: Time) -> Vec<Real> {
    let discounts: Vec<Real> = (0..matrix.dates())
        .map(|i| (-rate * i as Real * dt).exp())
        .collect();
    (0..matrix.paths())
        .into_par_iter()
        .map(|j| {
            matrix
                .row(j)
                .iter()
                .zip(&discounts)
                .map(|(v, d)| v * d)
                .sum::<Real>()
        })
        .collect()
}

/// Average the discounted payoffs across paths.
pub fn estimate_price(matrix: &PayoffMatrix, rate: Rate, dt: Time) -> PriceEstimate {
    // Accumulated in path order so that a seed reproduces the estimate
    // bit for bit, whatever the thread count.
    let stats = Statistics::from_samples(&discounted_payoffs(matrix, rate, dt));
    PriceEstimate {
        price: stats.mean().unwrap_or(0.0),
        std_error: stats.error_estimate().unwrap_or(0.0),
    }
}
