//! # lsm-pricingengines
//!
//! Pricing engines for the Bermudan put.
//!
//! ## Engines
//!
//! - [`LongstaffSchwartzEngine`]: least-squares Monte Carlo price, standard
//!   error, European reference on the same paths and exercise boundary
//! - [`GreeksEngine`]: `∂Price/∂{S₀, σ, K, r}` by a reverse sweep through
//!   the whole pipeline, or by bumped re-pricing on common random numbers
//! - [`black_scholes_put`]: closed-form European put, the analytic reference

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod analytic_european_engine;
pub mod greeks;
pub mod longstaff_schwartz_engine;

pub use analytic_european_engine::{black_scholes_put, black_scholes_put_greeks};
pub use greeks::{Greeks, GreeksEngine, GreeksMethod, GreeksResults};
pub use longstaff_schwartz_engine::{
    ExerciseBoundaryPoint, LongstaffSchwartzEngine, LsmResults, RepeatedResults,
};
