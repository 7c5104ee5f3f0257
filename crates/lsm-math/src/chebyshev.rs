//! Chebyshev polynomial basis on `[−1, 1]` and the per-date affine scaling
//! that maps a cross-section onto that interval.
//!
//! The basis columns are `T₀ … T_{p−1}`, evaluated with the three-term
//! recurrence
//!
//! ```text
//! T₀(x) = 1,  T₁(x) = x,  T_k(x) = 2x·T_{k−1}(x) − T_{k−2}(x)
//! ```
//!
//! which is only stable on `[−1, 1]`; callers rescale with
//! [`UnitIntervalScaling`] first.  Both types expose reverse-mode adjoints so
//! that sensitivities can be propagated through a regression on this basis.

use nalgebra::DMatrix;
use rayon::prelude::*;
use lsm_core::{
    errors::{Error, Result},
    Real, Size,
};

/// Slack allowed around `[−1, 1]` for rounding in the scaling step.
const DOMAIN_TOLERANCE: Real = 1e-12;

// ─── Scaling ──────────────────────────────────────────────────────────────────

/// Affine map sending the observed minimum of a cross-section to `−1` and
/// the observed maximum to `+1`.
///
/// The map is re-derived from each cross-section; it is never shared across
/// dates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitIntervalScaling {
    min: Real,
    max: Real,
    argmin: Size,
    argmax: Size,
}

impl UnitIntervalScaling {
    /// Derive the scaling from the observed range of `xs`.
    ///
    /// Fails with [`Error::DegenerateInput`] when `xs` is empty or has zero
    /// dispersion (`min == max`), and with [`Error::InvalidArgument`] when it
    /// contains non-finite values.
    pub fn fit(xs: &[Real]) -> Result<Self> {
        if xs.is_empty() {
            return Err(Error::degenerate("cannot scale an empty cross-section"));
        }
        if let Some(bad) = xs.iter().find(|x| !x.is_finite()) {
            return Err(Error::InvalidArgument(format!(
                "cross-section contains a non-finite value ({bad})"
            )));
        }
        let (mut argmin, mut argmax) = (0, 0);
        for (i, &x) in xs.iter().enumerate() {
            if x < xs[argmin] {
                argmin = i;
            }
            if x > xs[argmax] {
                argmax = i;
            }
        }
        let (min, max) = (xs[argmin], xs[argmax]);
        if min == max {
            return Err(Error::degenerate(format!(
                "cross-section has zero dispersion (all values equal {min})"
            )));
        }
        Ok(Self {
            min,
            max,
            argmin,
            argmax,
        })
    }

    /// Observed minimum.
    pub fn min(&self) -> Real {
        self.min
    }

    /// Observed maximum.
    pub fn max(&self) -> Real {
        self.max
    }

    /// Map one value: `2(x − min)/(max − min) − 1`.
    #[inline]
    pub fn apply(&self, x: Real) -> Real {
        2.0 * (x - self.min) / (self.max - self.min) - 1.0
    }

    /// Map every value of a cross-section.
    pub fn transform(&self, xs: &[Real]) -> Vec<Real> {
        xs.iter().map(|&x| self.apply(x)).collect()
    }

    /// Reverse-mode adjoint of [`transform`](Self::transform).
    ///
    /// Given the scaled values `scaled` and their adjoints `scaled_bar`,
    /// accumulates the adjoints of the raw cross-section into `xs_bar`.
    /// Besides the direct term, the observed minimum and maximum are
    /// functions of the entries at `argmin`/`argmax`, which pick up the
    /// sensitivity of every scaled value to the range.
    pub fn adjoint(&self, scaled: &[Real], scaled_bar: &[Real], xs_bar: &mut [Real]) {
        let range = self.max - self.min;
        let mut min_bar = 0.0;
        let mut max_bar = 0.0;
        for ((&z, &z_bar), x_bar) in scaled.iter().zip(scaled_bar).zip(xs_bar.iter_mut()) {
            *x_bar += z_bar * 2.0 / range;
            min_bar += z_bar * (z - 1.0) / range;
            max_bar -= z_bar * (z + 1.0) / range;
        }
        xs_bar[self.argmin] += min_bar;
        xs_bar[self.argmax] += max_bar;
    }
}

/// Rescale a cross-section onto `[−1, 1]` using its own range.
///
/// Convenience wrapper around [`UnitIntervalScaling`].
pub fn scale_to_unit_interval(xs: &[Real]) -> Result<Vec<Real>> {
    Ok(UnitIntervalScaling::fit(xs)?.transform(xs))
}

// ─── Basis ────────────────────────────────────────────────────────────────────

/// The first `order` Chebyshev polynomials of the first kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChebyshevBasis {
    order: Size,
}

impl ChebyshevBasis {
    /// Basis `T₀ … T_{order−1}`; `order` must be at least 1.
    pub fn new(order: Size) -> Result<Self> {
        lsm_core::ensure!(order >= 1, "Chebyshev basis needs at least one polynomial");
        Ok(Self { order })
    }

    /// Number of basis functions (columns of the design matrix).
    pub fn order(&self) -> Size {
        self.order
    }

    /// Write `T₀(x) … T_{p−1}(x)` into `out` (length `order`).
    #[inline]
    pub fn values_into(&self, x: Real, out: &mut [Real]) {
        out[0] = 1.0;
        if self.order > 1 {
            out[1] = x;
        }
        for k in 2..self.order {
            out[k] = 2.0 * x * out[k - 1] - out[k - 2];
        }
    }

    /// `T₀(x) … T_{p−1}(x)`.
    pub fn values(&self, x: Real) -> Vec<Real> {
        let mut out = vec![0.0; self.order];
        self.values_into(x, &mut out);
        out
    }

    /// `T'₀(x) … T'_{p−1}(x)` from the differentiated recurrence
    /// `T'_k = 2T_{k−1} + 2x·T'_{k−1} − T'_{k−2}`.
    pub fn derivatives(&self, x: Real) -> Vec<Real> {
        let t = self.values(x);
        let mut d = vec![0.0; self.order];
        if self.order > 1 {
            d[1] = 1.0;
        }
        for k in 2..self.order {
            d[k] = 2.0 * t[k - 1] + 2.0 * x * d[k - 1] - d[k - 2];
        }
        d
    }

    /// Build the `n × order` design matrix with `X[i, k] = T_k(xs[i])`.
    ///
    /// Every abscissa must lie in `[−1, 1]` (up to rounding).
    pub fn design_matrix(&self, xs: &[Real]) -> Result<DMatrix<Real>> {
        if let Some(&x) = xs.iter().find(|x| !(x.abs() <= 1.0 + DOMAIN_TOLERANCE)) {
            return Err(Error::Precondition(format!(
                "Chebyshev abscissa {x} outside [-1, 1]; rescale the cross-section first"
            )));
        }
        let p = self.order;
        let mut rows = vec![0.0; xs.len() * p];
        rows.par_chunks_mut(p)
            .zip(xs.par_iter())
            .for_each(|(row, &x)| self.values_into(x, row));
        Ok(DMatrix::from_row_slice(xs.len(), p, &rows))
    }

    /// Reverse-mode adjoint of [`design_matrix`](Self::design_matrix):
    /// `x̄ᵢ = Σ_k X̄[i, k] · T'_k(xᵢ)`.
    pub fn adjoint(&self, xs: &[Real], design_bar: &DMatrix<Real>) -> Result<Vec<Real>> {
        if design_bar.shape() != (xs.len(), self.order) {
            return Err(Error::InvalidArgument(format!(
                "design adjoint is {:?}, expected ({}, {})",
                design_bar.shape(),
                xs.len(),
                self.order
            )));
        }
        Ok(xs
            .par_iter()
            .enumerate()
            .map(|(i, &x)| {
                self.derivatives(x)
                    .iter()
                    .enumerate()
                    .map(|(k, dk)| design_bar[(i, k)] * dk)
                    .sum::<Real>()
            })
            .collect())
    }
}
