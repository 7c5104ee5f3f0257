//! # lsm
//!
//! Least-squares Monte Carlo (Longstaff–Schwartz) pricing of a Bermudan put
//! under Euler-discretised geometric Brownian motion, with pathwise adjoint
//! Greeks.
//!
//! This crate is a **façade** that re-exports all public items from the
//! underlying workspace crates. Application code should depend on this
//! crate rather than the individual `lsm-*` crates.
//!
//! ## Quick start
//!
//! ```rust
//! use lsm::{GreeksEngine, LongstaffSchwartzEngine, ModelParameters};
//!
//! let params = ModelParameters::default().with_paths(2_000).with_seed(42);
//!
//! let results = LongstaffSchwartzEngine::new(params)?.calculate()?;
//! assert!(results.price >= results.european_price - 3.0 * results.std_error);
//!
//! let greeks = GreeksEngine::new(params)?.calculate()?.greeks;
//! assert!(greeks.delta < 0.0);
//! # Ok::<(), lsm::Error>(())
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

/// Core types, aliases, parameters and error definitions.
pub use lsm_core as core;

/// Chebyshev basis, ridge regression, RNG and statistics.
pub use lsm_math as math;

/// Stochastic process definitions.
pub use lsm_processes as processes;

/// Path simulation and backward induction.
pub use lsm_methods as methods;

/// Pricing and greeks engines.
pub use lsm_pricingengines as pricingengines;

pub use lsm_core::{DifferentiableParameter, Error, ModelParameters, Result};
pub use lsm_methods::DegeneracyPolicy;
pub use lsm_pricingengines::{
    black_scholes_put, ExerciseBoundaryPoint, Greeks, GreeksEngine, GreeksMethod, GreeksResults,
    LongstaffSchwartzEngine, LsmResults, RepeatedResults,
};
