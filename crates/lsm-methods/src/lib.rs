//! # lsm-methods
//!
//! Numerical methods for least-squares Monte Carlo:
//!
//! * [`monte_carlo`]: seeded Euler path simulation and its reverse sweep
//! * [`lsm`]: cashflows, Longstaff–Schwartz backward induction, first
//!   exercise extraction and the discounted price estimator

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// ── Modules ───────────────────────────────────────────────────────────────────

/// Monte Carlo simulation: path ensembles and their generation.
pub mod monte_carlo;

/// Longstaff–Schwartz regression-based early exercise.
pub mod lsm;

// ── Convenience re-exports ────────────────────────────────────────────────────

pub use lsm::{
    estimate_price, BackwardInduction, CashflowTable, DegeneracyPolicy, ExerciseSignal,
    InductionAdjoint, InductionResult, PayoffMatrix, PriceEstimate,
};
pub use monte_carlo::{PathAdjoint, PathEnsemble, PathSimulator};
