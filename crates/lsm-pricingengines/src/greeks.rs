//! Sensitivities of the least-squares Monte Carlo price.
//!
//! The default method is a reverse (adjoint) sweep through the whole
//! pricing run, chaining hand-derived adjoints stage by stage:
//!
//! ```text
//! price ← discounting ← first-exercise extraction ← payoff matrix
//!       ← backward induction (ridge, Chebyshev basis, scaling)
//!       ← cashflows ← Euler paths
//! ```
//!
//! The exercise decision `C > Cont` is piecewise constant in the inputs, so
//! its pathwise derivative is zero.  The price depends on the continuation
//! regressions only through which date is exercised, so the adjoints that
//! reach the induction stage are zero and its reverse pass is a structural
//! pass-through: it runs through the ridge, basis and scaling adjoints but
//! contributes nothing.  Gradients reach the model inputs through the
//! cashflow at each path's exercise date, its discount factor and the
//! simulated path.
//!
//! The primal of the sweep is exactly the plain pricing run, so the price
//! reported alongside the Greeks is the one [`LongstaffSchwartzEngine`]
//! would return for the same seed.
//!
//! [`GreeksMethod::FiniteDifference`] re-prices with each input bumped up
//! and down on the same seed (common random numbers).  It is noisier,
//! carries an `O(h²)` bias and picks up exercise decisions that flip under
//! the bump.

use lsm_core::{errors::Error, DifferentiableParameter, ModelParameters, Real, Result};
use lsm_methods::DegeneracyPolicy;
use rayon::prelude::*;
use tracing::{debug, info_span};

use crate::longstaff_schwartz_engine::{LongstaffSchwartzEngine, LsmResults, PricingRun};

/// First-order sensitivities of the put price.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Greeks {
    /// `∂P/∂S₀`
    pub delta: Real,
    /// `∂P/∂σ`
    pub vega: Real,
    /// `∂P/∂K`
    pub strike: Real,
    /// `∂P/∂r`
    pub rho: Real,
}

impl Greeks {
    /// Sensitivity to one input.
    pub fn get(&self, parameter: DifferentiableParameter) -> Real {
        match parameter {
            DifferentiableParameter::Spot => self.delta,
            DifferentiableParameter::Volatility => self.vega,
            DifferentiableParameter::Strike => self.strike,
            DifferentiableParameter::Rate => self.rho,
        }
    }

    fn set(&mut self, parameter: DifferentiableParameter, value: Real) {
        match parameter {
            DifferentiableParameter::Spot => self.delta = value,
            DifferentiableParameter::Volatility => self.vega = value,
            DifferentiableParameter::Strike => self.strike = value,
            DifferentiableParameter::Rate => self.rho = value,
        }
    }
}

/// How Greeks are computed.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum GreeksMethod {
    /// Reverse sweep through the pricing run.
    #[default]
    Adjoint,
    /// Central differences on common random numbers.  Each input `θ` is
    /// bumped by `relative_bump · |θ|` (or `relative_bump` when `θ = 0`);
    /// volatility falls back to a forward difference when the down bump
    /// would be negative.
    FiniteDifference {
        /// Bump size relative to the input value.
        relative_bump: Real,
    },
}

/// Price and Greeks from one seed.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GreeksResults {
    /// The pricing run at the unbumped inputs.
    pub results: LsmResults,
    /// `∂P/∂{S₀, σ, K, r}`.
    pub greeks: Greeks,
    /// Method used.
    pub method: GreeksMethod,
}

/// Computes the price together with its Greeks.
#[derive(Debug, Clone, Copy)]
pub struct GreeksEngine {
    engine: LongstaffSchwartzEngine,
    method: GreeksMethod,
}

impl GreeksEngine {
    /// Create an engine using the adjoint method.
    pub fn new(params: ModelParameters) -> Result<Self> {
        Ok(Self {
            engine: LongstaffSchwartzEngine::new(params)?,
            method: GreeksMethod::default(),
        })
    }

    /// Select the differentiation method.
    pub fn with_method(mut self, method: GreeksMethod) -> Result<Self> {
        if let GreeksMethod::FiniteDifference { relative_bump } = method {
            if !(relative_bump.is_finite() && relative_bump > 0.0) {
                return Err(Error::invalid_parameter(
                    "relative_bump",
                    format!("must be positive and finite, got {relative_bump}"),
                ));
            }
        }
        self.method = method;
        Ok(self)
    }

    /// Replace the handling of zero-dispersion regression dates.
    pub fn with_degeneracy_policy(mut self, policy: DegeneracyPolicy) -> Self {
        self.engine = self.engine.with_degeneracy_policy(policy);
        self
    }

    /// Selected method.
    pub fn method(&self) -> GreeksMethod {
        self.method
    }

    /// Price and Greeks on the configured seed (or a fresh one).
    pub fn calculate(&self) -> Result<GreeksResults> {
        self.calculate_with_seed(self.engine.resolve_seed())
    }

    /// Price and Greeks on the normal stream of `seed`.
    pub fn calculate_with_seed(&self, seed: u64) -> Result<GreeksResults> {
        let span = info_span!("lsm_greeks", method = ?self.method, seed);
        let _enter = span.enter();

        let run = self.engine.run(seed)?;
        let greeks = match self.method {
            GreeksMethod::Adjoint => self.adjoint(&run)?,
            GreeksMethod::FiniteDifference { relative_bump } => {
                self.finite_difference(seed, relative_bump)?
            }
        };
        Ok(GreeksResults {
            results: self.engine.summarise(&run),
            greeks,
            method: self.method,
        })
    }

    fn adjoint(&self, run: &PricingRun) -> Result<Greeks> {
        let p = self.engine.parameters();
        let m = p.steps;
        let n = p.paths;
        let dt = p.dt();
        let weight = 1.0 / n as Real;

        // price = (1/n) Σ_j D(τ_j) · C[τ_j][j], D(i) = e^{−r·i·Δt}
        let mut cashflow_bar = vec![vec![0.0; n]; m + 1];
        let mut rate_bar = 0.0;
        for (j, tau) in run.exercise_steps.iter().enumerate() {
            if let Some(i) = *tau {
                let d = p.discount_to_origin(i);
                cashflow_bar[i][j] += d * weight;
                rate_bar -= i as Real * dt * d * run.cashflows.at(i)[j] * weight;
            }
        }

        // Structural pass-through: Value and Cont reach the price only via
        // the exercise indicator, so their seeds are zero.
        let zeros = vec![vec![0.0; n]; m + 1];
        let induction = run.induction.adjoint(
            self.engine.induction(),
            &run.cashflows,
            zeros.clone(),
            &zeros,
        )?;
        for (acc, add) in cashflow_bar.iter_mut().zip(&induction.cashflow) {
            for (a, b) in acc.iter_mut().zip(add) {
                *a += b;
            }
        }
        rate_bar -= dt * p.discount_factor() * induction.discount;

        let mut spot_bar = induction.spot;
        let strike_bar = run.cashflows.adjoint(&cashflow_bar, &mut spot_bar)?;
        let path = run
            .ensemble
            .adjoint(self.engine.simulator().process(), spot_bar)?;

        debug!(delta = path.spot, vega = path.volatility, "adjoint sweep");
        Ok(Greeks {
            delta: path.spot,
            vega: path.volatility,
            strike: strike_bar,
            rho: path.rate + rate_bar,
        })
    }

    fn finite_difference(&self, seed: u64, relative_bump: Real) -> Result<Greeks> {
        let base = *self.engine.parameters();
        let policy = self.engine.degeneracy_policy();
        let price = |params: ModelParameters| -> Result<Real> {
            Ok(LongstaffSchwartzEngine::new(params)?
                .with_degeneracy_policy(policy)
                .calculate_with_seed(seed)?
                .price)
        };

        let sensitivities = DifferentiableParameter::ALL
            .to_vec()
            .into_par_iter()
            .map(|parameter| {
                let x = base.get(parameter);
                let h = if x == 0.0 { relative_bump } else { relative_bump * x.abs() };
                let up = price(base.with(parameter, x + h))?;
                let value = if parameter == DifferentiableParameter::Volatility && x - h < 0.0 {
                    (up - price(base)?) / h
                } else {
                    (up - price(base.with(parameter, x - h))?) / (2.0 * h)
                };
                debug!(?parameter, bump = h, value, "finite difference");
                Ok((parameter, value))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut greeks = Greeks::default();
        for (parameter, value) in sensitivities {
            greeks.set(parameter, value);
        }
        Ok(greeks)
    }
}
