//! Backward induction over the exercise dates.
//!
//! ```text
//! Value[m] = disc · C[m]
//! for i = m−1 … 1:
//!     Cont[i]  = ridge(cheb(scale(S[i])), Value[i+1])
//!     Value[i] = disc · (C[i] if C[i] > Cont[i] else Value[i+1])
//! ```
//!
//! Date 0 is the valuation date and is never regressed or exercised.  Each
//! date is a barrier: the regression needs the full cross-section of
//! `Value[i+1]`, while the per-path work inside a date runs in parallel.

use lsm_core::{errors::Error, DiscountFactor, ModelParameters, Real, Result, Size};
use lsm_math::{ChebyshevBasis, RidgeRegression, UnitIntervalScaling};
use nalgebra::DMatrix;
use rayon::prelude::*;
use tracing::{debug, warn};

use super::cashflow::CashflowTable;
use super::exercise::ExerciseSignal;
use crate::monte_carlo::PathEnsemble;

/// What to do when a regression date has zero cross-sectional dispersion.
///
/// This happens whenever all paths sit at the same level, e.g. with zero
/// volatility or a single path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DegeneracyPolicy {
    /// Abort with [`Error::DegenerateInput`] carrying the step index.
    Fail,
    /// The state carries no information, so estimate the continuation
    /// value by the cross-sectional mean of `Value[i+1]`.
    #[default]
    CrossSectionMean,
}

/// How the continuation value of one date was obtained.
#[derive(Debug, Clone)]
pub enum RegressionRecord {
    /// Ridge regression on the Chebyshev basis of the rescaled spot.
    Fitted {
        /// Affine map of the cross-section onto `[−1, 1]`.
        scaling: UnitIntervalScaling,
        /// The rescaled cross-section.
        scaled: Vec<Real>,
        /// Chebyshev design matrix of `scaled`.
        design: DMatrix<Real>,
        /// The fit itself.
        regression: RidgeRegression,
    },
    /// Degenerate date: continuation is the mean of the next values.
    CrossSectionMean,
}

/// Configured Longstaff–Schwartz backward induction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackwardInduction {
    basis: ChebyshevBasis,
    penalty: Real,
    policy: DegeneracyPolicy,
}

/// Everything the induction produced, kept for extraction and the adjoint.
#[derive(Debug, Clone)]
pub struct InductionResult {
    discount: DiscountFactor,
    values: Vec<Vec<Real>>,
    continuation: Vec<Vec<Real>>,
    signals: Vec<ExerciseSignal>,
    records: Vec<Option<RegressionRecord>>,
}

/// Adjoints of the induction inputs.
#[derive(Debug, Clone)]
pub struct InductionAdjoint {
    /// `∂L/∂C[i][j]` for every date and path.
    pub cashflow: Vec<Vec<Real>>,
    /// `∂L/∂S[i][j]` through the regressions' abscissae.
    pub spot: Vec<Vec<Real>>,
    /// `∂L/∂disc` for the one-step discount factor.
    pub discount: Real,
}

impl BackwardInduction {
    /// Regress on Chebyshev polynomials `T_0 … T_{order−1}` with ridge
    /// penalty `penalty`.
    pub fn new(order: Size, penalty: Real) -> Result<Self> {
        if order == 0 {
            return Err(Error::invalid_parameter("order", "at least one basis function is required"));
        }
        if !(penalty.is_finite() && penalty >= 0.0) {
            return Err(Error::invalid_parameter(
                "ridge_penalty",
                format!("must be non-negative and finite, got {penalty}"),
            ));
        }
        Ok(Self {
            basis: ChebyshevBasis::new(order)?,
            penalty,
            policy: DegeneracyPolicy::default(),
        })
    }

    /// The induction configured by `params.order` and `params.ridge_penalty`.
    pub fn from_parameters(params: &ModelParameters) -> Result<Self> {
        Self::new(params.order, params.ridge_penalty)
    }

    /// Replace the degeneracy policy.
    pub fn with_policy(mut self, policy: DegeneracyPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Number of basis functions.
    pub fn order(&self) -> Size {
        self.basis.order()
    }

    /// Ridge penalty `λ`.
    pub fn penalty(&self) -> Real {
        self.penalty
    }

    /// Active degeneracy policy.
    pub fn policy(&self) -> DegeneracyPolicy {
        self.policy
    }

    /// Run the induction from maturity back to date 1.
    pub fn run(
        &self,
        ensemble: &PathEnsemble,
        cashflows: &CashflowTable,
        discount: DiscountFactor,
    ) -> Result<InductionResult> {
        let m = ensemble.steps();
        let n = ensemble.paths();
        if cashflows.dates() != m + 1 || cashflows.at(0).len() != n {
            return Err(Error::InvalidArgument(format!(
                "cashflow table does not match {n} paths × {} dates",
                m + 1
            )));
        }

        let mut values: Vec<Vec<Real>> = vec![Vec::new(); m + 1];
        let mut continuation: Vec<Vec<Real>> = vec![Vec::new(); m + 1];
        let mut records: Vec<Option<RegressionRecord>> = (0..=m).map(|_| None).collect();
        let mut signals = Vec::with_capacity(m);

        let terminal = cashflows.at(m);
        values[m] = terminal.par_iter().map(|&c| discount * c).collect();
        continuation[m] = vec![0.0; n];
        signals.push(ExerciseSignal::new(m, terminal.iter().map(|&c| c > 0.0).collect()));

        for i in (1..m).rev() {
            let (cont, record) = self.continuation_at(i, ensemble.cross_section(i), &values[i + 1])?;
            if let Some(bad) = cont.iter().find(|v| !v.is_finite()) {
                return Err(Error::NumericalInstability {
                    step: i,
                    reason: format!("continuation estimate is {bad}"),
                });
            }

            let flows = cashflows.at(i);
            let exercise: Vec<bool> = flows
                .par_iter()
                .zip(cont.par_iter())
                .map(|(&c, &k)| c > k)
                .collect();
            values[i] = exercise
                .par_iter()
                .zip(flows.par_iter().zip(values[i + 1].par_iter()))
                .map(|(&ex, (&c, &next))| discount * if ex { c } else { next })
                .collect();

            let signal = ExerciseSignal::new(i, exercise);
            debug!(step = i, exercised = signal.count(), "regression date");
            signals.push(signal);
            continuation[i] = cont;
            records[i] = Some(record);
        }
        signals.reverse();

        Ok(InductionResult {
            discount,
            values,
            continuation,
            signals,
            records,
        })
    }

    fn continuation_at(
        &self,
        step: Size,
        spots: &[Real],
        target: &[Real],
    ) -> Result<(Vec<Real>, RegressionRecord)> {
        if let Some(bad) = spots.iter().chain(target).find(|v| !v.is_finite()) {
            return Err(Error::NumericalInstability {
                step,
                reason: format!("cross-section contains {bad}"),
            });
        }
        match UnitIntervalScaling::fit(spots) {
            Ok(scaling) => {
                let scaled = scaling.transform(spots);
                let design = self.basis.design_matrix(&scaled)?;
                let regression =
                    RidgeRegression::fit(&design, target, self.penalty).map_err(|e| e.at_step(step))?;
                let cont = regression.fitted_values().to_vec();
                Ok((
                    cont,
                    RegressionRecord::Fitted {
                        scaling,
                        scaled,
                        design,
                        regression,
                    },
                ))
            }
            Err(Error::DegenerateInput { reason, .. }) => match self.policy {
                DegeneracyPolicy::Fail => Err(Error::DegenerateInput {
                    step: Some(step),
                    reason,
                }),
                DegeneracyPolicy::CrossSectionMean => {
                    warn!(step, %reason, "degenerate cross-section, using mean continuation value");
                    let mean = target.iter().sum::<Real>() / target.len() as Real;
                    Ok((vec![mean; target.len()], RegressionRecord::CrossSectionMean))
                }
            },
            Err(e) => Err(e),
        }
    }
}

impl InductionResult {
    /// Number of time steps `m`.
    pub fn steps(&self) -> Size {
        self.values.len() - 1
    }

    /// One-step discount factor used by the recursion.
    pub fn discount(&self) -> DiscountFactor {
        self.discount
    }

    /// `Value[step]` for `1 ≤ step ≤ m`, discounted to `step − 1`.
    pub fn value(&self, step: Size) -> &[Real] {
        &self.values[step]
    }

    /// Continuation estimates at `step` (`Cont[m]` is zero).
    pub fn continuation(&self, step: Size) -> &[Real] {
        &self.continuation[step]
    }

    /// Exercise signals for dates `1 ..= m`, in chronological order.
    pub fn signals(&self) -> &[ExerciseSignal] {
        &self.signals
    }

    /// Exercise signal at `step` (`1 ≤ step ≤ m`).
    pub fn signal(&self, step: Size) -> &ExerciseSignal {
        &self.signals[step - 1]
    }

    /// How the continuation value at `step` was obtained; `None` for date 0
    /// and maturity.
    pub fn record(&self, step: Size) -> Option<&RegressionRecord> {
        self.records.get(step).and_then(Option::as_ref)
    }

    /// Reverse-mode adjoint of the induction.
    ///
    /// `value_bar[i]` and `continuation_bar[i]` seed the adjoints of
    /// `Value[i]` and `Cont[i]` (entries for date 0 are ignored).  The
    /// exercise comparison is piecewise constant, so it routes adjoints to
    /// whichever branch was taken without contributing a derivative of its
    /// own.  Continuation seeds flow back through the ridge solve, the
    /// Chebyshev basis and the scaling onto `Value[i+1]` and `S[i]`; zero
    /// seeds are skipped since they contribute nothing.
    pub fn adjoint(
        &self,
        induction: &BackwardInduction,
        cashflows: &CashflowTable,
        mut value_bar: Vec<Vec<Real>>,
        continuation_bar: &[Vec<Real>],
    ) -> Result<InductionAdjoint> {
        let m = self.steps();
        let n = self.values[m].len();
        let fits = |rows: &[Vec<Real>]| {
            rows.len() == m + 1 && rows.iter().skip(1).all(|r| r.len() == n)
        };
        if !fits(&value_bar) || !fits(continuation_bar) || cashflows.dates() != m + 1 {
            return Err(Error::InvalidArgument(format!(
                "induction adjoint seeds must be {} × {n}",
                m + 1
            )));
        }

        let mut cashflow = vec![vec![0.0; n]; m + 1];
        let mut spot = vec![vec![0.0; n]; m + 1];
        let mut discount_bar = 0.0;
        let disc = self.discount;

        for i in 1..m {
            let (head, tail) = value_bar.split_at_mut(i + 1);
            let v_bar = &head[i];
            let next_bar = &mut tail[0];
            let signal = self.signal(i);
            let flows = cashflows.at(i);

            for j in 0..n {
                let vb = v_bar[j];
                if vb == 0.0 {
                    continue;
                }
                if signal.is_set(j) {
                    cashflow[i][j] += disc * vb;
                    discount_bar += vb * flows[j];
                } else {
                    next_bar[j] += disc * vb;
                    discount_bar += vb * self.values[i + 1][j];
                }
            }

            let c_bar = &continuation_bar[i];
            if c_bar.iter().all(|&v| v == 0.0) {
                continue;
            }
            match self.record(i) {
                Some(RegressionRecord::Fitted {
                    scaling,
                    scaled,
                    design,
                    regression,
                }) => {
                    let adj = regression
                        .adjoint(design, &self.values[i + 1], c_bar)
                        .map_err(|e| e.at_step(i))?;
                    for (nb, tb) in next_bar.iter_mut().zip(&adj.target_bar) {
                        *nb += tb;
                    }
                    let z_bar = induction.basis.adjoint(scaled, &adj.design_bar)?;
                    scaling.adjoint(scaled, &z_bar, &mut spot[i]);
                }
                Some(RegressionRecord::CrossSectionMean) => {
                    let share = c_bar.iter().sum::<Real>() / n as Real;
                    for nb in next_bar.iter_mut() {
                        *nb += share;
                    }
                }
                None => {
                    return Err(Error::Runtime(format!("no regression recorded at step {i}")));
                }
            }
        }

        let terminal = cashflows.at(m);
        for j in 0..n {
            let vb = value_bar[m][j];
            cashflow[m][j] += disc * vb;
            discount_bar += vb * terminal[j];
        }

        Ok(InductionAdjoint {
            cashflow,
            spot,
            discount: discount_bar,
        })
    }
}
