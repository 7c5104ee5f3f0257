//! # lsm-math
//!
//! Numerical building blocks for least-squares Monte Carlo: the Chebyshev
//! basis with its input scaling, ridge regression via the SVD (over
//! nalgebra), normal distribution functions, a seeded Mersenne Twister and
//! a sample statistics accumulator.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// ── Modules ───────────────────────────────────────────────────────────────────

/// Chebyshev polynomials of the first kind and `[-1, 1]` scaling.
pub mod chebyshev;

/// Probability distributions.
pub mod distributions;

/// Thin SVD with a rank threshold.
pub mod matrix_utilities;

/// Random number generators.
pub mod random_numbers;

/// Ridge-regularised least squares.
pub mod ridge_regression;

/// Statistics accumulators.
pub mod statistics;

// ── Convenience re-exports ────────────────────────────────────────────────────

pub use chebyshev::{scale_to_unit_interval, ChebyshevBasis, UnitIntervalScaling};
pub use distributions::{normal_cdf, normal_cdf_inverse, normal_pdf};
pub use matrix_utilities::Svd;
pub use random_numbers::{entropy_seed, InverseCumulativeNormalRng, NormalSource};
pub use ridge_regression::{ridge_fitted_values, RidgeAdjoint, RidgeRegression};
pub use statistics::Statistics;
