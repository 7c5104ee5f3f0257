//! Matrix decompositions used by the regression layer.
//!
//! Wraps nalgebra's SVD so that non-convergence and non-finite input surface
//! as [`Error`] values instead of panics or endless iteration.

use nalgebra::{DMatrix, DVector};
use lsm_core::{
    errors::{Error, Result},
    Real,
};

/// Iteration cap handed to nalgebra's SVD (`0` would mean "unbounded").
const SVD_MAX_ITERATIONS: usize = 10_000;

/// Thin singular value decomposition `A = U · diag(s) · Vᵀ`.
///
/// For an `n × p` input, `u` is `n × k`, `singular_values` has length `k`
/// and `v_t` is `k × p`, with `k = min(n, p)`.
#[derive(Debug, Clone)]
pub struct Svd {
    /// Left singular vectors.
    pub u: DMatrix<Real>,
    /// Singular values (non-negative, unordered).
    pub singular_values: DVector<Real>,
    /// Right singular vectors, transposed.
    pub v_t: DMatrix<Real>,
}

impl Svd {
    /// Compute the thin SVD of `m`.
    ///
    /// Fails with [`Error::InvalidArgument`] on non-finite entries and with
    /// [`Error::DegenerateInput`] if the iteration does not converge.
    pub fn new(m: &DMatrix<Real>) -> Result<Self> {
        if m.iter().any(|x| !x.is_finite()) {
            return Err(Error::InvalidArgument(
                "matrix contains non-finite entries".into(),
            ));
        }
        let svd = m
            .clone()
            .try_svd(true, true, Real::EPSILON, SVD_MAX_ITERATIONS)
            .ok_or_else(|| Error::degenerate("singular value decomposition did not converge"))?;
        match (svd.u, svd.v_t) {
            (Some(u), Some(v_t)) => Ok(Self {
                u,
                singular_values: svd.singular_values,
                v_t,
            }),
            _ => Err(Error::Runtime("SVD factors were not computed".into())),
        }
    }

    /// Largest singular value (zero for an empty matrix).
    pub fn max_singular_value(&self) -> Real {
        self.singular_values.iter().copied().fold(0.0, Real::max)
    }

    /// Default rank threshold `max(n, p) · ε · s_max`.
    pub fn default_tolerance(&self) -> Real {
        let dim = self.u.nrows().max(self.v_t.ncols());
        dim as Real * Real::EPSILON * self.max_singular_value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn retained(svd: &Svd) -> usize {
        let tol = svd.default_tolerance();
        svd.singular_values.iter().filter(|&&s| s > tol).count()
    }

    #[test]
    fn svd_reconstructs_matrix() {
        let a = DMatrix::from_row_slice(4, 2, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 9.0]);
        let svd = Svd::new(&a).unwrap();
        assert_eq!(svd.u.shape(), (4, 2));
        assert_eq!(svd.v_t.shape(), (2, 2));
        let rebuilt = &svd.u * DMatrix::from_diagonal(&svd.singular_values) * &svd.v_t;
        for (x, y) in rebuilt.iter().zip(a.iter()) {
            assert_relative_eq!(x, y, epsilon = 1e-12);
        }
        assert_eq!(retained(&svd), 2);
    }

    #[test]
    fn rank_deficient_matrix() {
        let a = DMatrix::from_row_slice(3, 2, &[1.0, 2.0, 2.0, 4.0, 3.0, 6.0]);
        let svd = Svd::new(&a).unwrap();
        assert_eq!(retained(&svd), 1);
    }

    #[test]
    fn non_finite_input_is_rejected() {
        let a = DMatrix::from_row_slice(2, 1, &[1.0, Real::NAN]);
        assert!(matches!(Svd::new(&a), Err(Error::InvalidArgument(_))));
    }
}
