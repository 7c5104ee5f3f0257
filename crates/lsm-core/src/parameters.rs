//! Model parameters for one pricing run.
//!
//! [`ModelParameters`] is an immutable value passed explicitly into every
//! component; there is no process-wide mutable state.  Setters follow the
//! `with_*` builder style and return a modified copy.

use crate::errors::{Error, Result};
use crate::{DiscountFactor, Rate, Real, Size, Time, Volatility};

/// Scalar inputs of the Longstaff–Schwartz put pricer.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ModelParameters {
    /// Initial asset price `S₀`.
    pub spot: Real,
    /// Volatility `σ`.
    pub volatility: Volatility,
    /// Strike `K`.
    pub strike: Real,
    /// Continuously-compounded risk-free rate `r`.
    pub rate: Rate,
    /// Maturity `T` in years.
    pub maturity: Time,
    /// Number of time steps `m` (exercise dates are steps `1..=m`).
    pub steps: Size,
    /// Number of simulated paths `n`.
    pub paths: Size,
    /// Number of Chebyshev basis functions `p` (`T₀ … T_{p−1}`).
    pub order: Size,
    /// Ridge penalty `λ`.
    pub ridge_penalty: Real,
    /// Seed of the normal source; `None` draws one from entropy.
    #[cfg_attr(feature = "serde", serde(default))]
    pub seed: Option<u64>,
}

impl Default for ModelParameters {
    /// The reference put of Longstaff & Schwartz (2001), table 1, first row.
    fn default() -> Self {
        Self {
            spot: 36.0,
            volatility: 0.2,
            strike: 40.0,
            rate: 0.06,
            maturity: 1.0,
            steps: 50,
            paths: 10_000,
            order: 4,
            ridge_penalty: 100.0,
            seed: None,
        }
    }
}

impl ModelParameters {
    /// Check every parameter against its domain.
    ///
    /// Returns the first violation as [`Error::InvalidParameter`].
    pub fn validate(&self) -> Result<()> {
        check_finite("spot", self.spot)?;
        check_finite("volatility", self.volatility)?;
        check_finite("strike", self.strike)?;
        check_finite("rate", self.rate)?;
        check_finite("maturity", self.maturity)?;
        check_finite("ridge_penalty", self.ridge_penalty)?;
        if self.spot <= 0.0 {
            return Err(Error::invalid_parameter(
                "spot",
                format!("must be positive, got {}", self.spot),
            ));
        }
        if self.volatility < 0.0 {
            return Err(Error::invalid_parameter(
                "volatility",
                format!("must be non-negative, got {}", self.volatility),
            ));
        }
        if self.strike <= 0.0 {
            return Err(Error::invalid_parameter(
                "strike",
                format!("must be positive, got {}", self.strike),
            ));
        }
        if self.maturity <= 0.0 {
            return Err(Error::invalid_parameter(
                "maturity",
                format!("must be positive, got {}", self.maturity),
            ));
        }
        if self.steps == 0 {
            return Err(Error::invalid_parameter("steps", "must be at least 1"));
        }
        if self.paths == 0 {
            return Err(Error::invalid_parameter("paths", "must be at least 1"));
        }
        if self.order == 0 {
            return Err(Error::invalid_parameter("order", "must be at least 1"));
        }
        if self.ridge_penalty < 0.0 {
            return Err(Error::invalid_parameter(
                "ridge_penalty",
                format!("must be non-negative, got {}", self.ridge_penalty),
            ));
        }
        Ok(())
    }

    /// Time increment `Δt = T / m`.
    pub fn dt(&self) -> Time {
        self.maturity / self.steps as Real
    }

    /// One-step discount factor `e^{−rΔt}`.
    pub fn discount_factor(&self) -> DiscountFactor {
        (-self.rate * self.dt()).exp()
    }

    /// Discount factor from step `i` back to time zero, `e^{−r·i·Δt}`.
    pub fn discount_to_origin(&self, step: Size) -> DiscountFactor {
        (-self.rate * step as Real * self.dt()).exp()
    }

    /// Read one of the differentiable inputs.
    pub fn get(&self, parameter: DifferentiableParameter) -> Real {
        match parameter {
            DifferentiableParameter::Spot => self.spot,
            DifferentiableParameter::Volatility => self.volatility,
            DifferentiableParameter::Strike => self.strike,
            DifferentiableParameter::Rate => self.rate,
        }
    }

    /// Copy with one differentiable input replaced.
    pub fn with(self, parameter: DifferentiableParameter, value: Real) -> Self {
        match parameter {
            DifferentiableParameter::Spot => self.with_spot(value),
            DifferentiableParameter::Volatility => self.with_volatility(value),
            DifferentiableParameter::Strike => self.with_strike(value),
            DifferentiableParameter::Rate => self.with_rate(value),
        }
    }

    /// Copy with a new spot.
    pub fn with_spot(mut self, spot: Real) -> Self {
        self.spot = spot;
        self
    }

    /// Copy with a new volatility.
    pub fn with_volatility(mut self, volatility: Volatility) -> Self {
        self.volatility = volatility;
        self
    }

    /// Copy with a new strike.
    pub fn with_strike(mut self, strike: Real) -> Self {
        self.strike = strike;
        self
    }

    /// Copy with a new risk-free rate.
    pub fn with_rate(mut self, rate: Rate) -> Self {
        self.rate = rate;
        self
    }

    /// Copy with a new maturity.
    pub fn with_maturity(mut self, maturity: Time) -> Self {
        self.maturity = maturity;
        self
    }

    /// Copy with a new number of time steps.
    pub fn with_steps(mut self, steps: Size) -> Self {
        self.steps = steps;
        self
    }

    /// Copy with a new number of paths.
    pub fn with_paths(mut self, paths: Size) -> Self {
        self.paths = paths;
        self
    }

    /// Copy with a new basis size.
    pub fn with_order(mut self, order: Size) -> Self {
        self.order = order;
        self
    }

    /// Copy with a new ridge penalty.
    pub fn with_ridge_penalty(mut self, ridge_penalty: Real) -> Self {
        self.ridge_penalty = ridge_penalty;
        self
    }

    /// Copy with a fixed seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

fn check_finite(name: &'static str, value: Real) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(Error::invalid_parameter(
            name,
            format!("must be finite, got {value}"),
        ))
    }
}

/// The scalar inputs the price is differentiated against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DifferentiableParameter {
    /// Initial asset price `S₀`.
    Spot,
    /// Volatility `σ`.
    Volatility,
    /// Strike `K`.
    Strike,
    /// Risk-free rate `r`.
    Rate,
}

impl DifferentiableParameter {
    /// All differentiable inputs in canonical order `{S₀, σ, K, r}`.
    pub const ALL: [DifferentiableParameter; 4] = [
        DifferentiableParameter::Spot,
        DifferentiableParameter::Volatility,
        DifferentiableParameter::Strike,
        DifferentiableParameter::Rate,
    ];
}
