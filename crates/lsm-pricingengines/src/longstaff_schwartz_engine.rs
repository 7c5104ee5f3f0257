//! Longstaff–Schwartz least-squares Monte Carlo engine for the Bermudan put.
//!
//! One run simulates Euler GBM paths, computes the put cashflows, performs
//! the regression-based backward induction, keeps each path's first
//! signalled exercise and averages the discounted payoffs.  A run is fully
//! determined by its seed.

use lsm_core::{errors::Error, ModelParameters, Real, Result, Size, Time};
use lsm_math::{random_numbers::entropy_seed, Statistics};
use lsm_methods::{
    estimate_price, BackwardInduction, CashflowTable, DegeneracyPolicy, InductionResult,
    PathEnsemble, PathSimulator, PayoffMatrix, PriceEstimate,
};
use rayon::prelude::*;
use tracing::{debug, info, info_span};

/// Exercise diagnostics for one decision date.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ExerciseBoundaryPoint {
    /// Date index `i` (`1 ..= m`).
    pub step: Size,
    /// Exercise date in years.
    pub time: Time,
    /// Number of paths whose first exercise is this date.
    pub exercised_paths: Size,
    /// Largest spot at which a path first exercised here, the estimate of
    /// the put's exercise boundary; `None` when no path exercised.
    pub boundary_spot: Option<Real>,
}

/// Output of a single pricing run.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LsmResults {
    /// Monte Carlo estimate of the Bermudan put price.
    pub price: Real,
    /// Standard error of `price`.
    pub std_error: Real,
    /// European put price estimated on the same paths.
    pub european_price: Real,
    /// `price − european_price`.
    pub early_exercise_premium: Real,
    /// Exercise diagnostics for dates `1 ..= m`, in chronological order.
    pub exercise_boundary: Vec<ExerciseBoundaryPoint>,
    /// Seed of the normal stream, for reproducing the run.
    pub seed: u64,
}

/// Output of [`LongstaffSchwartzEngine::calculate_repeated`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RepeatedResults {
    /// Each independent run, in seed order.
    pub runs: Vec<LsmResults>,
    /// Average of the run prices.
    pub mean_price: Real,
    /// Standard error of `mean_price` across runs (`0` for a single run).
    pub std_error: Real,
}

/// Everything produced by one run, kept for the adjoint sweep.
#[derive(Debug, Clone)]
pub(crate) struct PricingRun {
    pub(crate) ensemble: PathEnsemble,
    pub(crate) cashflows: CashflowTable,
    pub(crate) induction: InductionResult,
    pub(crate) exercise_steps: Vec<Option<Size>>,
    pub(crate) estimate: PriceEstimate,
    pub(crate) seed: u64,
}

/// Least-squares Monte Carlo pricing engine.
#[derive(Debug, Clone, Copy)]
pub struct LongstaffSchwartzEngine {
    params: ModelParameters,
    simulator: PathSimulator,
    induction: BackwardInduction,
}

impl LongstaffSchwartzEngine {
    /// Create an engine; the parameters are validated here, before any
    /// simulation.
    pub fn new(params: ModelParameters) -> Result<Self> {
        params.validate()?;
        Ok(Self {
            params,
            simulator: PathSimulator::from_parameters(&params)?,
            induction: BackwardInduction::from_parameters(&params)?,
        })
    }

    /// Replace the handling of zero-dispersion regression dates.
    pub fn with_degeneracy_policy(mut self, policy: DegeneracyPolicy) -> Self {
        self.induction = self.induction.with_policy(policy);
        self
    }

    /// Model parameters of the engine.
    pub fn parameters(&self) -> &ModelParameters {
        &self.params
    }

    /// Active degeneracy policy.
    pub fn degeneracy_policy(&self) -> DegeneracyPolicy {
        self.induction.policy()
    }

    pub(crate) fn simulator(&self) -> &PathSimulator {
        &self.simulator
    }

    pub(crate) fn induction(&self) -> &BackwardInduction {
        &self.induction
    }

    /// The configured seed, or a fresh one from OS entropy.
    pub(crate) fn resolve_seed(&self) -> u64 {
        self.params.seed.unwrap_or_else(entropy_seed)
    }

    /// Price the put.
    pub fn calculate(&self) -> Result<LsmResults> {
        self.calculate_with_seed(self.resolve_seed())
    }

    /// Price the put on the normal stream of `seed`, ignoring the
    /// configured seed.
    pub fn calculate_with_seed(&self, seed: u64) -> Result<LsmResults> {
        let run = self.run(seed)?;
        Ok(self.summarise(&run))
    }

    /// `runs` independent prices on seeds `s, s+1, …`, where `s` is the
    /// configured seed or a fresh one.  Runs execute in parallel.
    pub fn calculate_repeated(&self, runs: Size) -> Result<RepeatedResults> {
        if runs == 0 {
            return Err(Error::invalid_parameter("runs", "at least one run is required"));
        }
        let base = self.resolve_seed();
        let results = (0..runs as u64)
            .into_par_iter()
            .map(|k| self.calculate_with_seed(base.wrapping_add(k)))
            .collect::<Result<Vec<_>>>()?;

        let stats = results.iter().fold(Statistics::new(), |mut s, r| {
            s.add(r.price);
            s
        });
        Ok(RepeatedResults {
            mean_price: stats.mean().unwrap_or(0.0),
            std_error: stats.error_estimate().unwrap_or(0.0),
            runs: results,
        })
    }

    pub(crate) fn run(&self, seed: u64) -> Result<PricingRun> {
        let p = &self.params;
        let span = info_span!(
            "lsm_pricing",
            paths = p.paths,
            steps = p.steps,
            order = p.order,
            seed
        );
        let _enter = span.enter();

        let ensemble = self.simulator.simulate_seeded(seed);
        let cashflows = CashflowTable::new(&ensemble, p.strike);
        let induction = self
            .induction
            .run(&ensemble, &cashflows, p.discount_factor())?;

        let mut payoffs = PayoffMatrix::from_signals(&cashflows, induction.signals())?;
        let exercise_steps = payoffs.extract_first_exercise();
        let estimate = estimate_price(&payoffs, p.rate, p.dt());
        info!(price = estimate.price, std_error = estimate.std_error, "priced");

        Ok(PricingRun {
            ensemble,
            cashflows,
            induction,
            exercise_steps,
            estimate,
            seed,
        })
    }

    pub(crate) fn summarise(&self, run: &PricingRun) -> LsmResults {
        let p = &self.params;
        let m = p.steps;
        let terminal_df = p.discount_to_origin(m);
        let terminal = run.cashflows.at(m);
        let european_price =
            terminal.iter().map(|c| terminal_df * c).sum::<Real>() / terminal.len() as Real;

        let exercise_boundary = self.exercise_boundary(run);
        debug!(
            exercised = exercise_boundary.iter().map(|b| b.exercised_paths).sum::<Size>(),
            "exercise boundary"
        );

        LsmResults {
            price: run.estimate.price,
            std_error: run.estimate.std_error,
            european_price,
            early_exercise_premium: run.estimate.price - european_price,
            exercise_boundary,
            seed: run.seed,
        }
    }

    fn exercise_boundary(&self, run: &PricingRun) -> Vec<ExerciseBoundaryPoint> {
        let m = self.params.steps;
        let mut points: Vec<ExerciseBoundaryPoint> = (1..=m)
            .map(|step| ExerciseBoundaryPoint {
                step,
                time: run.ensemble.time(step),
                exercised_paths: 0,
                boundary_spot: None,
            })
            .collect();
        for (j, tau) in run.exercise_steps.iter().enumerate() {
            if let Some(step) = *tau {
                let point = &mut points[step - 1];
                let spot = run.ensemble.cross_section(step)[j];
                point.exercised_paths += 1;
                point.boundary_spot = Some(point.boundary_spot.map_or(spot, |b| b.max(spot)));
            }
        }
        points
    }
}
