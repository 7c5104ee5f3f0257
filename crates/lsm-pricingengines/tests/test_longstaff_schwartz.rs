//! End-to-end pricing tests for the least-squares Monte Carlo engine.

use approx::assert_relative_eq;
use lsm_core::{errors::Error, ModelParameters, Real};
use lsm_methods::DegeneracyPolicy;
use lsm_pricingengines::{black_scholes_put, LongstaffSchwartzEngine};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn price(params: ModelParameters) -> Real {
    LongstaffSchwartzEngine::new(params)
        .unwrap()
        .calculate()
        .unwrap()
        .price
}

// ─── Reference values ─────────────────────────────────────────────────────────

#[test]
fn longstaff_schwartz_reference_put() {
    init_tracing();
    // S=36, K=40, r=6%, σ=20%, T=1, 50 dates: American value ≈ 4.48,
    // European value 3.844.
    let res = LongstaffSchwartzEngine::new(ModelParameters::default().with_seed(2024))
        .unwrap()
        .calculate()
        .unwrap();
    assert!(
        res.price > 4.2 && res.price < 4.7,
        "LSMC put = {:.4} ± {:.4}",
        res.price,
        res.std_error
    );
    assert!(res.std_error < 0.05, "std error = {}", res.std_error);
    let bs = black_scholes_put(36.0, 40.0, 0.06, 0.2, 1.0);
    assert!(
        (res.european_price - bs).abs() < 4.0 * res.std_error + 0.05,
        "same-path European {:.4} vs Black-Scholes {bs:.4}",
        res.european_price
    );
}

#[test]
fn early_exercise_premium_is_non_negative() {
    init_tracing();
    // λ = 100 is an absolute penalty: with a few thousand paths it shrinks
    // the continuation estimate enough to trigger premature exercise, which
    // can push the price below the European one (S=44, σ=40% at n=4000).
    // The premium is only reliably non-negative once n is large next to λ.
    for (spot, vol) in [(36.0, 0.2), (40.0, 0.2), (44.0, 0.4)] {
        let params = ModelParameters::default()
            .with_spot(spot)
            .with_volatility(vol)
            .with_paths(40_000)
            .with_seed(7);
        let res = LongstaffSchwartzEngine::new(params).unwrap().calculate().unwrap();
        assert!(
            res.price >= res.european_price - 3.0 * res.std_error,
            "S={spot} σ={vol}: LSMC {:.4} below European {:.4}",
            res.price,
            res.european_price
        );
    }
}

// ─── Zero volatility ──────────────────────────────────────────────────────────

#[test]
fn zero_volatility_price_is_best_deterministic_exercise() {
    init_tracing();
    let params = ModelParameters::default()
        .with_volatility(0.0)
        .with_paths(100)
        .with_seed(1);
    let dt = params.dt();
    let growth = 1.0 + params.rate * dt;
    let expected = (1..=params.steps)
        .map(|i| {
            let spot = params.spot * growth.powi(i as i32);
            params.discount_to_origin(i) * (params.strike - spot).max(0.0)
        })
        .fold(0.0, Real::max);

    let a = price(params);
    let b = price(params.with_seed(99));
    assert_relative_eq!(a, expected, epsilon = 1e-10);
    assert_eq!(a, b);
}

#[test]
fn zero_volatility_fails_under_strict_degeneracy_policy() {
    let params = ModelParameters::default().with_volatility(0.0).with_paths(10).with_seed(1);
    let err = LongstaffSchwartzEngine::new(params)
        .unwrap()
        .with_degeneracy_policy(DegeneracyPolicy::Fail)
        .calculate()
        .unwrap_err();
    assert!(
        matches!(err, Error::DegenerateInput { step: Some(49), .. }),
        "unexpected error: {err}"
    );
}

#[test]
fn single_path_prices_without_regression() {
    let res = LongstaffSchwartzEngine::new(ModelParameters::default().with_paths(1).with_seed(5))
        .unwrap()
        .calculate()
        .unwrap();
    assert!(res.price >= 0.0 && res.price.is_finite());
    assert_eq!(res.std_error, 0.0);
}

// ─── Monotonicity and reproducibility ─────────────────────────────────────────

#[test]
fn price_is_monotone_in_strike_and_spot() {
    let base = ModelParameters::default().with_paths(2_000).with_seed(11);

    let by_strike: Vec<Real> = [36.0, 38.0, 40.0, 42.0, 44.0]
        .iter()
        .map(|&k| price(base.with_strike(k)))
        .collect();
    for w in by_strike.windows(2) {
        assert!(w[1] >= w[0], "price decreased in strike: {by_strike:?}");
    }

    let by_spot: Vec<Real> = [32.0, 36.0, 40.0, 44.0]
        .iter()
        .map(|&s| price(base.with_spot(s)))
        .collect();
    for w in by_spot.windows(2) {
        assert!(w[1] <= w[0], "price increased in spot: {by_spot:?}");
    }
}

#[test]
fn same_seed_reproduces_results_exactly() {
    let params = ModelParameters::default().with_paths(3_000).with_seed(123);
    let engine = LongstaffSchwartzEngine::new(params).unwrap();
    let a = engine.calculate().unwrap();
    let b = engine.calculate().unwrap();
    assert_eq!(a, b);

    let c = engine.calculate_with_seed(124).unwrap();
    assert_ne!(a.price, c.price);
}

#[test]
fn repeated_runs_average_close_to_single_run() {
    let engine =
        LongstaffSchwartzEngine::new(ModelParameters::default().with_paths(2_000).with_seed(1))
            .unwrap();
    let rep = engine.calculate_repeated(8).unwrap();
    assert_eq!(rep.runs.len(), 8);
    assert!(rep.std_error > 0.0);
    assert!((rep.mean_price - 4.45).abs() < 0.25, "mean = {}", rep.mean_price);
}

// ─── Exercise boundary ────────────────────────────────────────────────────────

#[test]
fn exercise_boundary_stays_below_strike() {
    let res = LongstaffSchwartzEngine::new(ModelParameters::default().with_paths(5_000).with_seed(3))
        .unwrap()
        .calculate()
        .unwrap();
    let exercised: usize = res.exercise_boundary.iter().map(|b| b.exercised_paths).sum();
    assert!(exercised > 0 && exercised <= 5_000);
    for point in &res.exercise_boundary {
        assert_relative_eq!(point.time, point.step as Real * 0.02, epsilon = 1e-12);
        if let Some(spot) = point.boundary_spot {
            assert!(spot < 40.0, "boundary {spot} at step {}", point.step);
        }
    }
}

// ─── Validation ───────────────────────────────────────────────────────────────

#[test]
fn invalid_parameters_are_named() {
    let base = ModelParameters::default();
    let cases: [(ModelParameters, &str); 9] = [
        (base.with_spot(0.0), "spot"),
        (base.with_volatility(-0.2), "volatility"),
        (base.with_strike(-1.0), "strike"),
        (base.with_rate(Real::NAN), "rate"),
        (base.with_maturity(0.0), "maturity"),
        (base.with_steps(0), "steps"),
        (base.with_paths(0), "paths"),
        (base.with_order(0), "order"),
        (base.with_ridge_penalty(-1.0), "ridge_penalty"),
    ];
    for (params, expected) in cases {
        match LongstaffSchwartzEngine::new(params) {
            Err(Error::InvalidParameter { name, .. }) => assert_eq!(name, expected),
            other => panic!("{expected}: expected InvalidParameter, got {other:?}"),
        }
    }
}
