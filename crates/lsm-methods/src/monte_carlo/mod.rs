//! Monte Carlo path simulation.
//!
//! # Overview
//!
//! * [`PathSimulator`]: evolves `n` paths of a GBM over a uniform grid
//! * [`PathEnsemble`]: the simulated levels and the shocks that drove them
//!
//! Levels are stored step-major: one cross-section of length `n` per date.
//! Normals are drawn step by step and, within a step, in path order, so a
//! seed determines the ensemble bit for bit regardless of how many threads
//! perform the per-step update.

use lsm_core::{errors::Error, ModelParameters, Real, Result, Size, Time};
use lsm_math::random_numbers::{InverseCumulativeNormalRng, NormalSource};
use lsm_processes::{GeometricBrownianMotionProcess, StochasticProcess1D};
use rayon::prelude::*;

// ─── PathEnsemble ─────────────────────────────────────────────────────────────

/// `n` simulated paths observed at `m + 1` equally spaced dates.
#[derive(Debug, Clone)]
pub struct PathEnsemble {
    dt: Time,
    levels: Vec<Vec<Real>>,
    shocks: Vec<Vec<Real>>,
}

/// Adjoints of the simulation inputs.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PathAdjoint {
    /// `∂L/∂S₀`
    pub spot: Real,
    /// `∂L/∂r` through the drift of the Euler steps.
    pub rate: Real,
    /// `∂L/∂σ`
    pub volatility: Real,
}

impl PathEnsemble {
    /// Number of time steps `m`.
    pub fn steps(&self) -> Size {
        self.shocks.len()
    }

    /// Number of paths `n`.
    pub fn paths(&self) -> Size {
        self.levels.first().map_or(0, Vec::len)
    }

    /// Time increment `Δt`.
    pub fn dt(&self) -> Time {
        self.dt
    }

    /// Time of observation `step`.
    pub fn time(&self, step: Size) -> Time {
        step as Real * self.dt
    }

    /// All path levels at observation `step` (`0 ..= m`).
    pub fn cross_section(&self, step: Size) -> &[Real] {
        &self.levels[step]
    }

    /// The normals that moved the paths from `step` to `step + 1`.
    pub fn shocks(&self, step: Size) -> &[Real] {
        &self.shocks[step]
    }

    /// Reverse sweep through the Euler recursion.
    ///
    /// `spot_bar[i][j]` holds the adjoint of the level of path `j` at
    /// `step i` accumulated by everything downstream of the simulation.
    /// The sweep walks backwards in time, folding each date into the one
    /// before it through the partials of the Euler step, and returns the
    /// adjoints of `S₀`, `r` and `σ`.
    pub fn adjoint(
        &self,
        process: &GeometricBrownianMotionProcess,
        mut spot_bar: Vec<Vec<Real>>,
    ) -> Result<PathAdjoint> {
        if spot_bar.len() != self.levels.len()
            || spot_bar.iter().any(|row| row.len() != self.paths())
        {
            return Err(Error::InvalidArgument(format!(
                "path adjoint must be {} × {}",
                self.levels.len(),
                self.paths()
            )));
        }
        let dt = self.dt;
        let mut rate = 0.0;
        let mut volatility = 0.0;

        for i in (0..self.steps()).rev() {
            let (head, tail) = spot_bar.split_at_mut(i + 1);
            let next_bar = &tail[0];
            let here_bar = &mut head[i];
            let parameter_bars: Vec<(Real, Real)> = here_bar
                .par_iter_mut()
                .zip(next_bar.par_iter())
                .zip(self.levels[i].par_iter().zip(self.shocks[i].par_iter()))
                .map(|((x_bar, &y_bar), (&x, &z))| {
                    let d = process.step_partials(x, dt, z);
                    *x_bar += y_bar * d.d_state;
                    (y_bar * d.d_rate, y_bar * d.d_volatility)
                })
                .collect();
            // Summed in path order to keep the sweep reproducible.
            for (r_bar, s_bar) in parameter_bars {
                rate += r_bar;
                volatility += s_bar;
            }
        }

        Ok(PathAdjoint {
            spot: spot_bar[0].iter().sum(),
            rate,
            volatility,
        })
    }
}

// ─── PathSimulator ────────────────────────────────────────────────────────────

/// Generates [`PathEnsemble`]s of a geometric Brownian motion with the
/// Euler–Maruyama scheme.
#[derive(Debug, Clone, Copy)]
pub struct PathSimulator {
    process: GeometricBrownianMotionProcess,
    dt: Time,
    steps: Size,
    paths: Size,
}

impl PathSimulator {
    /// Create a simulator over `steps` equal steps up to `maturity`.
    pub fn new(
        process: GeometricBrownianMotionProcess,
        maturity: Time,
        steps: Size,
        paths: Size,
    ) -> Result<Self> {
        if !(maturity.is_finite() && maturity > 0.0) {
            return Err(Error::invalid_parameter(
                "maturity",
                format!("must be positive and finite, got {maturity}"),
            ));
        }
        if steps == 0 {
            return Err(Error::invalid_parameter("steps", "at least one step is required"));
        }
        if paths == 0 {
            return Err(Error::invalid_parameter("paths", "at least one path is required"));
        }
        Ok(Self {
            process,
            dt: maturity / steps as Real,
            steps,
            paths,
        })
    }

    /// The simulator described by a validated set of model parameters.
    pub fn from_parameters(params: &ModelParameters) -> Result<Self> {
        params.validate()?;
        Self::new(
            GeometricBrownianMotionProcess::from_parameters(params)?,
            params.maturity,
            params.steps,
            params.paths,
        )
    }

    /// The simulated process.
    pub fn process(&self) -> &GeometricBrownianMotionProcess {
        &self.process
    }

    /// Simulate an ensemble, drawing normals from `rng`.
    pub fn simulate<R: NormalSource>(&self, rng: &mut R) -> PathEnsemble {
        let mut levels = Vec::with_capacity(self.steps + 1);
        let mut shocks = Vec::with_capacity(self.steps);
        levels.push(vec![self.process.x0(); self.paths]);

        for i in 0..self.steps {
            let mut z = vec![0.0; self.paths];
            rng.fill_normals(&mut z);

            let t = i as Real * self.dt;
            let next: Vec<Real> = levels[i]
                .par_iter()
                .zip(z.par_iter())
                .map(|(&x, &dw)| self.process.evolve_1d(t, x, self.dt, dw))
                .collect();
            levels.push(next);
            shocks.push(z);
        }

        PathEnsemble {
            dt: self.dt,
            levels,
            shocks,
        }
    }

    /// Simulate with a fresh Mersenne Twister stream seeded by `seed`.
    pub fn simulate_seeded(&self, seed: u64) -> PathEnsemble {
        self.simulate(&mut InverseCumulativeNormalRng::new(seed))
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
