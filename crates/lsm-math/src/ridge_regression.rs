//! Ridge-regularised linear least squares.
//!
//! Solves
//!
//! ```text
//! β = argmin_z ‖X z − y‖² + λ ‖z‖²
//! ```
//!
//! through the thin SVD `X = U diag(s) Vᵀ`:
//! `β = V diag(s / (s² + λ)) Uᵀ y`.  Singular values below
//! `max(n, p) · ε · s_max` are dropped, so for `λ = 0` and a rank-deficient
//! design the result is the minimum-norm least-squares solution rather than
//! a failure.
//!
//! Callers of the Longstaff–Schwartz recursion consume the in-sample fitted
//! values `ŷ = Xβ`; the coefficients are kept for diagnostics.  The fit is
//! differentiable: [`RidgeRegression::adjoint`] maps an adjoint of `ŷ` back
//! onto the design matrix and the target.

use nalgebra::{DMatrix, DVector};
use lsm_core::{
    errors::{Error, Result},
    Real,
};

use crate::matrix_utilities::Svd;

/// Result of a ridge regression fit.
#[derive(Debug, Clone)]
pub struct RidgeRegression {
    penalty: Real,
    coefficients: DVector<Real>,
    fitted: DVector<Real>,
    // Right factors of the design's SVD; singular values below the rank
    // threshold are stored as zero.
    singular_values: DVector<Real>,
    v_t: DMatrix<Real>,
}

/// Adjoints of the regression inputs.
#[derive(Debug, Clone)]
pub struct RidgeAdjoint {
    /// `∂L/∂X`, same shape as the design matrix.
    pub design_bar: DMatrix<Real>,
    /// `∂L/∂y`, one entry per observation.
    pub target_bar: Vec<Real>,
}

impl RidgeRegression {
    /// Fit `target ≈ design · β` with ridge penalty `penalty ≥ 0`.
    pub fn fit(design: &DMatrix<Real>, target: &[Real], penalty: Real) -> Result<Self> {
        let (n, p) = design.shape();
        if target.len() != n {
            return Err(Error::InvalidArgument(format!(
                "target has {} observations, design matrix has {n} rows",
                target.len()
            )));
        }
        if p == 0 {
            return Err(Error::InvalidArgument("design matrix has no columns".into()));
        }
        if !(penalty >= 0.0) || !penalty.is_finite() {
            return Err(Error::InvalidArgument(format!(
                "ridge penalty must be finite and non-negative, got {penalty}"
            )));
        }
        if target.iter().any(|y| !y.is_finite()) {
            return Err(Error::InvalidArgument(
                "regression target contains non-finite values".into(),
            ));
        }

        let svd = Svd::new(design)?;
        let threshold = svd.default_tolerance();
        let singular_values = svd.singular_values.map(|s| if s > threshold { s } else { 0.0 });
        let y = DVector::from_column_slice(target);

        // β = V diag(s/(s²+λ)) Uᵀy
        let mut projected = svd.u.transpose() * &y;
        for (k, &s) in singular_values.iter().enumerate() {
            projected[k] *= if s > 0.0 { s / (s * s + penalty) } else { 0.0 };
        }
        let coefficients = svd.v_t.transpose() * projected;
        let fitted = design * &coefficients;

        Ok(Self {
            penalty,
            coefficients,
            fitted,
            singular_values,
            v_t: svd.v_t,
        })
    }

    /// The ridge penalty `λ` used for the fit.
    pub fn penalty(&self) -> Real {
        self.penalty
    }

    /// Fitted coefficients `β` (one per design column).
    pub fn coefficients(&self) -> &DVector<Real> {
        &self.coefficients
    }

    /// In-sample fitted values `ŷ = Xβ`.
    pub fn fitted_values(&self) -> &[Real] {
        self.fitted.as_slice()
    }

    /// Consume the fit and return the fitted values.
    pub fn into_fitted_values(self) -> Vec<Real> {
        self.fitted.iter().copied().collect()
    }

    /// Reverse-mode adjoint of the fitted values.
    ///
    /// With `A = XᵀX + λI`, `β̄ = Xᵀ ŷ̄` and `w = A⁻¹ β̄`:
    ///
    /// ```text
    /// ȳ = X w
    /// X̄ = ŷ̄ βᵀ + y wᵀ − X (w βᵀ + β wᵀ)
    /// ```
    ///
    /// `β̄` lies in the row space of `X`, so `A⁻¹` is applied through the
    /// fit's own factors as `V diag(1/(s² + λ)) Vᵀ`, restricted to the
    /// retained singular values.  `design` and `target` must be the inputs
    /// passed to [`fit`](Self::fit).
    pub fn adjoint(
        &self,
        design: &DMatrix<Real>,
        target: &[Real],
        fitted_bar: &[Real],
    ) -> Result<RidgeAdjoint> {
        let (n, p) = design.shape();
        if target.len() != n || fitted_bar.len() != n || self.coefficients.len() != p {
            return Err(Error::InvalidArgument(format!(
                "adjoint inputs do not match the fitted {n}×{p} problem"
            )));
        }
        let g = DVector::from_column_slice(fitted_bar);
        let y = DVector::from_column_slice(target);
        let beta = &self.coefficients;

        let mut projected = &self.v_t * (design.transpose() * &g);
        for (k, &s) in self.singular_values.iter().enumerate() {
            projected[k] *= if s > 0.0 { 1.0 / (s * s + self.penalty) } else { 0.0 };
        }
        let w = self.v_t.transpose() * projected;
        let target_bar = design * &w;
        let design_bar = &g * beta.transpose() + &y * w.transpose()
            - design * (&w * beta.transpose() + beta * w.transpose());

        Ok(RidgeAdjoint {
            design_bar,
            target_bar: target_bar.iter().copied().collect(),
        })
    }
}

/// Fit a ridge regression and return only the in-sample fitted values.
pub fn ridge_fitted_values(
    design: &DMatrix<Real>,
    target: &[Real],
    penalty: Real,
) -> Result<Vec<Real>> {
    Ok(RidgeRegression::fit(design, target, penalty)?.into_fitted_values())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sample_design() -> (DMatrix<Real>, Vec<Real>) {
        let xs: Vec<Real> = (0..25).map(|i| -1.0 + i as Real / 12.0).collect();
        let design = DMatrix::from_fn(xs.len(), 3, |i, k| xs[i].powi(k as i32));
        let noise = [0.02, -0.01, 0.015, -0.03, 0.005];
        let y = xs
            .iter()
            .enumerate()
            .map(|(i, x)| 1.0 - 2.0 * x + 0.5 * x * x + noise[i % noise.len()])
            .collect();
        (design, y)
    }

    #[test]
    fn zero_penalty_matches_normal_equations() {
        let (design, y) = sample_design();
        let fit = RidgeRegression::fit(&design, &y, 0.0).unwrap();

        let xt = design.transpose();
        let beta = (&xt * &design)
            .try_inverse()
            .unwrap()
            * (&xt * DVector::from_column_slice(&y));
        let ols = &design * beta;
        for (a, b) in fit.fitted_values().iter().zip(ols.iter()) {
            assert_relative_eq!(*a, *b, epsilon = 1e-6);
        }
    }

    #[test]
    fn exact_polynomial_is_recovered_without_penalty() {
        let xs: Vec<Real> = (0..10).map(|i| i as Real * 0.1).collect();
        let design = DMatrix::from_fn(10, 2, |i, k| xs[i].powi(k as i32));
        let y: Vec<Real> = xs.iter().map(|x| 2.0 + 3.0 * x).collect();
        let fit = RidgeRegression::fit(&design, &y, 0.0).unwrap();
        assert_relative_eq!(fit.coefficients()[0], 2.0, epsilon = 1e-10);
        assert_relative_eq!(fit.coefficients()[1], 3.0, epsilon = 1e-10);
    }

    #[test]
    fn penalty_matches_regularised_normal_equations() {
        let (design, y) = sample_design();
        let lambda = 4.0;
        let fit = RidgeRegression::fit(&design, &y, lambda).unwrap();

        let xt = design.transpose();
        let gram = &xt * &design + DMatrix::<Real>::identity(3, 3) * lambda;
        let beta = gram.try_inverse().unwrap() * (&xt * DVector::from_column_slice(&y));
        for j in 0..3 {
            assert_relative_eq!(fit.coefficients()[j], beta[j], epsilon = 1e-10);
        }
    }

    #[test]
    fn penalty_shrinks_coefficients() {
        let (design, y) = sample_design();
        let loose = RidgeRegression::fit(&design, &y, 0.0).unwrap();
        let tight = RidgeRegression::fit(&design, &y, 100.0).unwrap();
        assert!(tight.coefficients().norm() < loose.coefficients().norm());
    }

    #[test]
    fn collinear_design_gives_minimum_norm_solution() {
        // Two identical columns: any split of the slope fits, the minimum-norm
        // one splits it evenly.
        let xs = [1.0, 2.0, 3.0, 4.0];
        let design = DMatrix::from_fn(4, 2, |i, _| xs[i]);
        let y: Vec<Real> = xs.iter().map(|x| 2.0 * x).collect();
        let fit = RidgeRegression::fit(&design, &y, 0.0).unwrap();
        assert_relative_eq!(fit.coefficients()[0], 1.0, epsilon = 1e-10);
        assert_relative_eq!(fit.coefficients()[1], 1.0, epsilon = 1e-10);
        for (f, t) in fit.fitted_values().iter().zip(&y) {
            assert_relative_eq!(*f, *t, epsilon = 1e-10);
        }
    }

    #[test]
    fn more_columns_than_rows_is_well_defined() {
        let design = DMatrix::from_row_slice(2, 3, &[1.0, 0.5, -0.5, 1.0, -0.5, -0.5]);
        let fit = RidgeRegression::fit(&design, &[1.0, 2.0], 1.0).unwrap();
        assert!(fit.fitted_values().iter().all(|v| v.is_finite()));
    }

    #[test]
    fn mismatched_shapes_are_rejected() {
        let design = DMatrix::<Real>::zeros(3, 2);
        assert!(matches!(
            RidgeRegression::fit(&design, &[1.0, 2.0], 0.0),
            Err(Error::InvalidArgument(_))
        ));
        assert!(RidgeRegression::fit(&design, &[1.0, 2.0, 3.0], -1.0).is_err());
        assert!(RidgeRegression::fit(&design, &[1.0, Real::NAN, 3.0], 0.0).is_err());
    }

    #[test]
    fn adjoint_matches_finite_differences() {
        let (design, y) = sample_design();
        let lambda = 0.7;
        let weights: Vec<Real> = (0..y.len()).map(|i| ((i * 7) % 5) as Real - 2.0).collect();
        let objective = |design: &DMatrix<Real>, y: &[Real]| -> Real {
            ridge_fitted_values(design, y, lambda)
                .unwrap()
                .iter()
                .zip(&weights)
                .map(|(f, w)| f * w)
                .sum()
        };

        let fit = RidgeRegression::fit(&design, &y, lambda).unwrap();
        let adj = fit.adjoint(&design, &y, &weights).unwrap();
        let h = 1e-6;

        for i in [0, 7, 19] {
            let mut up = y.clone();
            let mut down = y.clone();
            up[i] += h;
            down[i] -= h;
            let fd = (objective(&design, &up[..]) - objective(&design, &down[..])) / (2.0 * h);
            assert_relative_eq!(adj.target_bar[i], fd, epsilon = 1e-6);
        }
        for (i, k) in [(0, 0), (3, 1), (12, 2), (24, 1)] {
            let mut up = design.clone();
            let mut down = design.clone();
            up[(i, k)] += h;
            down[(i, k)] -= h;
            let fd = (objective(&up, &y[..]) - objective(&down, &y[..])) / (2.0 * h);
            assert_relative_eq!(adj.design_bar[(i, k)], fd, epsilon = 1e-5);
        }
    }

    #[test]
    fn adjoint_agrees_with_explicit_gram_inverse() {
        let (design, y) = sample_design();
        let lambda = 100.0;
        let fit = RidgeRegression::fit(&design, &y, lambda).unwrap();
        let seed: Vec<Real> = (0..y.len()).map(|i| (i as Real * 0.37).sin()).collect();
        let adj = fit.adjoint(&design, &y, &seed).unwrap();

        let xt = design.transpose();
        let gram = &xt * &design + DMatrix::<Real>::identity(3, 3) * lambda;
        let w = gram.try_inverse().unwrap() * (&xt * DVector::from_column_slice(&seed));
        let target_bar = &design * w;
        for (a, b) in adj.target_bar.iter().zip(target_bar.iter()) {
            assert_relative_eq!(*a, *b, epsilon = 1e-10);
        }
    }

    #[test]
    fn adjoint_with_more_columns_than_rows_matches_gram_inverse() {
        let design = DMatrix::from_row_slice(2, 3, &[1.0, 0.5, -0.5, 1.0, -0.5, -0.5]);
        let lambda = 0.5;
        let fit = RidgeRegression::fit(&design, &[1.0, 2.0], lambda).unwrap();
        let adj = fit.adjoint(&design, &[1.0, 2.0], &[0.3, -1.1]).unwrap();

        let xt = design.transpose();
        let gram = &xt * &design + DMatrix::<Real>::identity(3, 3) * lambda;
        let w = gram.try_inverse().unwrap() * (&xt * DVector::from_column_slice(&[0.3, -1.1]));
        let target_bar = &design * w;
        for (a, b) in adj.target_bar.iter().zip(target_bar.iter()) {
            assert_relative_eq!(*a, *b, epsilon = 1e-10);
        }
    }

    #[test]
    fn zero_adjoint_seed_gives_zero_adjoints() {
        let (design, y) = sample_design();
        let fit = RidgeRegression::fit(&design, &y, 100.0).unwrap();
        let adj = fit.adjoint(&design, &y, &vec![0.0; y.len()]).unwrap();
        assert!(adj.target_bar.iter().all(|&v| v == 0.0));
        assert!(adj.design_bar.iter().all(|&v| v == 0.0));
    }
}
