//! Exercise decisions and the first-exercise payoff matrix.

use lsm_core::{errors::Error, Real, Result, Size};
use rayon::prelude::*;

use super::cashflow::CashflowTable;

/// Per-path "exercise is optimal here" flags for one date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExerciseSignal {
    step: Size,
    exercise: Vec<bool>,
}

impl ExerciseSignal {
    /// Wrap the flags computed at `step`.
    pub fn new(step: Size, exercise: Vec<bool>) -> Self {
        Self { step, exercise }
    }

    /// Date the signal belongs to.
    pub fn step(&self) -> Size {
        self.step
    }

    /// Whether exercise is signalled on `path`.
    #[inline]
    pub fn is_set(&self, path: Size) -> bool {
        self.exercise[path]
    }

    /// The raw flags, one per path.
    pub fn as_slice(&self) -> &[bool] {
        &self.exercise
    }

    /// Number of paths with the signal set.
    pub fn count(&self) -> Size {
        self.exercise.iter().filter(|&&e| e).count()
    }
}

/// Paths × dates matrix of exercise payoffs.
///
/// Built with the cashflow wherever exercise is signalled and zero
/// elsewhere.  After [`extract_first_exercise`](Self::extract_first_exercise)
/// each row holds at most one nonzero entry: its first exercise.
#[derive(Debug, Clone, PartialEq)]
pub struct PayoffMatrix {
    paths: Size,
    dates: Size,
    data: Vec<Real>,
}

impl PayoffMatrix {
    /// Assemble the raw (pre-extraction) payoff matrix.
    ///
    /// Date 0 never carries a signal, so its column is zero.
    pub fn from_signals(cashflows: &CashflowTable, signals: &[ExerciseSignal]) -> Result<Self> {
        let dates = cashflows.dates();
        let paths = cashflows.at(0).len();
        for signal in signals {
            if signal.step == 0 || signal.step >= dates || signal.exercise.len() != paths {
                return Err(Error::InvalidArgument(format!(
                    "exercise signal at step {} does not fit {paths} paths × {dates} dates",
                    signal.step
                )));
            }
        }
        let mut data = vec![0.0; paths * dates];
        data.par_chunks_mut(dates).enumerate().for_each(|(j, row)| {
            for signal in signals.iter().filter(|s| s.is_set(j)) {
                row[signal.step] = cashflows.at(signal.step)[j];
            }
        });
        Ok(Self { paths, dates, data })
    }

    /// Build from explicit rows (one per path).
    pub fn from_rows(rows: &[Vec<Real>]) -> Result<Self> {
        let dates = rows.first().map_or(0, Vec::len);
        if rows.iter().any(|r| r.len() != dates) {
            return Err(Error::InvalidArgument("payoff rows have different lengths".into()));
        }
        Ok(Self {
            paths: rows.len(),
            dates,
            data: rows.concat(),
        })
    }

    /// Number of paths (rows).
    pub fn paths(&self) -> Size {
        self.paths
    }

    /// Number of dates (columns).
    pub fn dates(&self) -> Size {
        self.dates
    }

    /// Payoffs of one path across all dates.
    pub fn row(&self, path: Size) -> &[Real] {
        &self.data[path * self.dates..(path + 1) * self.dates]
    }

    /// Single entry.
    pub fn get(&self, path: Size, step: Size) -> Real {
        self.data[path * self.dates + step]
    }

    /// Keep only the first strictly positive entry of every row.
    ///
    /// Entries before it (zero or negative) and after it are zeroed; rows
    /// without a positive entry become all zero.  Returns the retained
    /// column per path.  Applying the extraction twice changes nothing.
    pub fn extract_first_exercise(&mut self) -> Vec<Option<Size>> {
        if self.dates == 0 {
            return vec![None; self.paths];
        }
        self.data
            .par_chunks_mut(self.dates)
            .map(|row| {
                let first = row.iter().position(|&v| v > 0.0);
                for (i, v) in row.iter_mut().enumerate() {
                    if Some(i) != first {
                        *v = 0.0;
                    }
                }
                first
            })
            .collect()
    }
}
