//! Geometric Brownian motion under the risk-neutral measure.
//!
//! ```text
//! dS = r·S·dt + σ·S·dW
//! ```
//!
//! Paths are generated with the Euler–Maruyama scheme
//! `S_{t+Δt} = S_t · (1 + rΔt + σ√Δt·Z)`, not the exact log-normal step, so
//! that a single step is a polynomial in `(S_t, r, σ)` with the simple
//! partial derivatives exposed by [`GeometricBrownianMotionProcess::step_partials`].

use crate::stochastic_process::StochasticProcess1D;
use lsm_core::{errors::Error, ModelParameters, Real, Result, Time};

/// Geometric Brownian motion with constant rate and volatility.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeometricBrownianMotionProcess {
    x0: Real,
    rate: Real,
    sigma: Real,
}

/// Partial derivatives of one Euler step `S' = S·(1 + rΔt + σ√Δt·Z)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EulerStepPartials {
    /// `∂S'/∂S`
    pub d_state: Real,
    /// `∂S'/∂r`
    pub d_rate: Real,
    /// `∂S'/∂σ`
    pub d_volatility: Real,
}

impl GeometricBrownianMotionProcess {
    /// Create a new process.
    ///
    /// `x0` must be strictly positive and `sigma` non-negative; all inputs
    /// must be finite.
    pub fn new(x0: Real, rate: Real, sigma: Real) -> Result<Self> {
        if !(x0.is_finite() && x0 > 0.0) {
            return Err(Error::invalid_parameter(
                "spot",
                format!("initial value must be positive and finite, got {x0}"),
            ));
        }
        if !rate.is_finite() {
            return Err(Error::invalid_parameter("rate", format!("must be finite, got {rate}")));
        }
        if !(sigma.is_finite() && sigma >= 0.0) {
            return Err(Error::invalid_parameter(
                "volatility",
                format!("must be non-negative and finite, got {sigma}"),
            ));
        }
        Ok(Self { x0, rate, sigma })
    }

    /// The process implied by a set of model parameters.
    pub fn from_parameters(params: &ModelParameters) -> Result<Self> {
        Self::new(params.spot, params.rate, params.volatility)
    }

    /// Risk-free rate `r`.
    pub fn rate(&self) -> Real {
        self.rate
    }

    /// Volatility `σ`.
    pub fn volatility(&self) -> Real {
        self.sigma
    }

    /// The multiplicative Euler growth factor `1 + rΔt + σ√Δt·Z`.
    #[inline]
    pub fn growth_factor(&self, dt: Time, dw: Real) -> Real {
        1.0 + self.rate * dt + self.sigma * dt.sqrt() * dw
    }

    /// Partials of `evolve_1d(t, x, dt, dw)` with respect to the state and
    /// the model parameters.
    #[inline]
    pub fn step_partials(&self, x: Real, dt: Time, dw: Real) -> EulerStepPartials {
        EulerStepPartials {
            d_state: self.growth_factor(dt, dw),
            d_rate: x * dt,
            d_volatility: x * dt.sqrt() * dw,
        }
    }
}

impl StochasticProcess1D for GeometricBrownianMotionProcess {
    fn x0(&self) -> Real {
        self.x0
    }

    fn drift_1d(&self, _t: Time, x: Real) -> Real {
        self.rate * x
    }

    fn diffusion_1d(&self, _t: Time, x: Real) -> Real {
        self.sigma * x
    }

    fn evolve_1d(&self, _t: Time, x: Real, dt: Time, dw: Real) -> Real {
        x * self.growth_factor(dt, dw)
    }
}
