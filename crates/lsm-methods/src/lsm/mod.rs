//! Longstaff–Schwartz least-squares Monte Carlo for a Bermudan put.
//!
//! A pricing run flows through these stages:
//!
//! 1. [`CashflowTable`]: intrinsic values `max(0, K − S)` on every date.
//! 2. [`BackwardInduction`]: from maturity back to the first exercise date,
//!    regress the discounted value of holding on a Chebyshev basis of the
//!    rescaled spot and decide where exercise beats continuation.
//! 3. [`PayoffMatrix`]: the cashflows kept where exercise was signalled,
//!    reduced to the first exercise per path.
//! 4. [`estimate_price`]: discount each path's payoff from its exercise date
//!    and average.
//!
//! Each stage also exposes the reverse-mode adjoint needed for pathwise
//! Greeks.

mod cashflow;
mod estimator;
mod exercise;
mod induction;

pub use cashflow::{put_payoff, CashflowTable};
pub use estimator::{discounted_payoffs, estimate_price, PriceEstimate};
pub use exercise::{ExerciseSignal, PayoffMatrix};
pub use induction::{
    BackwardInduction, DegeneracyPolicy, InductionAdjoint, InductionResult, RegressionRecord,
};
