//! # lsm-processes
//!
//! One-dimensional stochastic processes and their Euler–Maruyama
//! discretisation, including the pathwise sensitivities of a single step
//! needed by the adjoint Greeks.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod geometric_brownian_motion;
pub mod stochastic_process;

pub use geometric_brownian_motion::{EulerStepPartials, GeometricBrownianMotionProcess};
pub use stochastic_process::StochasticProcess1D;
