//! Analytic European put (Black–Scholes).
//!
//! The Bermudan put is worth at least its European counterpart; the closed
//! form serves as a lower reference for the least-squares Monte Carlo price
//! and for its Greeks.

use lsm_core::Real;
use lsm_math::distributions::{normal_cdf, normal_pdf};

use crate::greeks::Greeks;

struct Terms {
    df: Real,
    nd1: Real,
    nd2: Real,
    npd1: Real,
    sqrt_t: Real,
}

fn terms(spot: Real, strike: Real, rate: Real, volatility: Real, t: Real) -> Terms {
    let sqrt_t = t.sqrt();
    let std_dev = volatility * sqrt_t;
    let df = (-rate * t).exp();
    let fwd = spot / df;

    let (d1, d2) = if std_dev > 1e-15 {
        let d1 = ((spot / strike).ln() + (rate + 0.5 * volatility * volatility) * t) / std_dev;
        (d1, d1 - std_dev)
    } else {
        let big = if fwd > strike { 1e15 } else { -1e15 };
        (big, big)
    };

    Terms {
        df,
        nd1: normal_cdf(-d1),
        nd2: normal_cdf(-d2),
        npd1: normal_pdf(d1),
        sqrt_t,
    }
}

/// Black–Scholes price of a European put without dividends.
///
/// $$P = K e^{-rT} N(-d_2) - S N(-d_1)$$
///
/// At or past expiry the intrinsic value is returned.
pub fn black_scholes_put(spot: Real, strike: Real, rate: Real, volatility: Real, t: Real) -> Real {
    if t <= 0.0 {
        return (strike - spot).max(0.0);
    }
    let x = terms(spot, strike, rate, volatility, t);
    strike * x.df * x.nd2 - spot * x.nd1
}

/// Black–Scholes sensitivities of the European put to `S`, `σ`, `K`, `r`
/// (per unit change, not per percent).
pub fn black_scholes_put_greeks(
    spot: Real,
    strike: Real,
    rate: Real,
    volatility: Real,
    t: Real,
) -> Greeks {
    if t <= 0.0 {
        let itm = strike > spot;
        return Greeks {
            delta: if itm { -1.0 } else { 0.0 },
            vega: 0.0,
            strike: if itm { 1.0 } else { 0.0 },
            rho: 0.0,
        };
    }
    let x = terms(spot, strike, rate, volatility, t);
    Greeks {
        delta: -x.nd1,
        vega: spot * x.npd1 * x.sqrt_t,
        strike: x.df * x.nd2,
        rho: -strike * t * x.df * x.nd2,
    }
}
