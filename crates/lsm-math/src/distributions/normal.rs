//! Standard normal density, distribution and quantile.
//!
//! The distribution and its inverse are expressed through the complementary
//! error function, so they are accurate to a few ulps across the whole real
//! line.  Finite-difference checks of analytic Greeks rely on that.

use lsm_core::Real;
use statrs::function::erf::{erfc, erfc_inv};
use std::f64::consts::SQRT_2;

/// `1/√(2π)`
const INV_SQRT_TWO_PI: Real = 0.398_942_280_401_432_7;

/// Density `φ(x) = e^{−x²/2}/√(2π)`.
#[inline]
pub fn normal_pdf(x: Real) -> Real {
    INV_SQRT_TWO_PI * (-0.5 * x * x).exp()
}

/// `Φ(x) = ½·erfc(−x/√2)`.
///
/// Written through `erfc` rather than `1 + erf` so the lower tail keeps its
/// relative precision.
#[inline]
pub fn normal_cdf(x: Real) -> Real {
    0.5 * erfc(-x / SQRT_2)
}

/// Quantile `Φ⁻¹(p) = −√2·erfc⁻¹(2p)`.
///
/// Returns `−∞`/`+∞` at `p = 0`/`p = 1` and NaN outside `[0, 1]`.
pub fn normal_cdf_inverse(p: Real) -> Real {
    if !(0.0..=1.0).contains(&p) {
        return Real::NAN;
    }
    if p == 0.0 {
        return Real::NEG_INFINITY;
    }
    if p == 1.0 {
        return Real::INFINITY;
    }
    -SQRT_2 * erfc_inv(2.0 * p)
}
