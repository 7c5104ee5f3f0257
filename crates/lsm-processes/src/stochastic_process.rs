//! `StochasticProcess1D`: the scalar diffusion interface.
//!
//! A process `dX = μ(t,X) dt + σ(t,X) dW` is described by its drift and
//! diffusion coefficients; the provided methods advance the state with one
//! Euler–Maruyama step.

use lsm_core::{Real, Time};

/// A 1-dimensional stochastic process `dX = μ(t,X) dt + σ(t,X) dW`.
pub trait StochasticProcess1D: std::fmt::Debug + Send + Sync {
    /// Initial value of the process.
    fn x0(&self) -> Real;

    /// Drift `μ(t, x)`.
    fn drift_1d(&self, t: Time, x: Real) -> Real;

    /// Diffusion `σ(t, x)`.
    fn diffusion_1d(&self, t: Time, x: Real) -> Real;

    /// First-order expectation `x + μ(t,x)·Δt`.
    fn expectation_1d(&self, t: Time, x: Real, dt: Time) -> Real {
        x + self.drift_1d(t, x) * dt
    }

    /// Standard deviation `σ(t,x) · √Δt`.
    fn std_deviation_1d(&self, t: Time, x: Real, dt: Time) -> Real {
        self.diffusion_1d(t, x) * dt.sqrt()
    }

    /// Euler step: `E + σ·√Δt · dw`.
    fn evolve_1d(&self, t: Time, x: Real, dt: Time, dw: Real) -> Real {
        self.expectation_1d(t, x, dt) + self.std_deviation_1d(t, x, dt) * dw
    }
}
