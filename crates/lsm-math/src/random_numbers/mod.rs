//! Random number generators.
//!
//! Seeded Mersenne Twister (via the `rand_mt` crate) mapped through the
//! inverse normal CDF.  Every stream is fully determined by its seed, which
//! is what makes a pricing run reproducible.

use lsm_core::Real;
use rand_mt::Mt19937GenRand64;

/// A source of independent standard-normal deviates.
pub trait NormalSource {
    /// Draw the next `N(0, 1)` deviate.
    fn next_normal(&mut self) -> Real;

    /// Fill `out` with consecutive draws.
    fn fill_normals(&mut self, out: &mut [Real]) {
        for z in out.iter_mut() {
            *z = self.next_normal();
        }
    }
}

/// A uniform pseudo-random number generator based on the Mersenne Twister
/// MT19937-64 algorithm.
pub struct MersenneTwisterUniformRng {
    rng: Mt19937GenRand64,
}

impl MersenneTwisterUniformRng {
    /// Create a new generator with the given seed.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mt19937GenRand64::new(seed),
        }
    }

    /// Generate the next uniform deviate in `[0, 1)`.
    pub fn next_real(&mut self) -> Real {
        // Map u64 to [0.0, 1.0)
        let u: u64 = self.rng.next_u64();
        u as f64 / (u64::MAX as f64 + 1.0)
    }
}

/// An inverse-cumulative normal random number generator.
///
/// Wraps a uniform Mersenne Twister and transforms its output through the
/// inverse CDF of the standard normal distribution.
pub struct InverseCumulativeNormalRng {
    inner: MersenneTwisterUniformRng,
}

impl InverseCumulativeNormalRng {
    /// Create a new generator backed by a Mersenne Twister with the given
    /// seed.
    pub fn new(seed: u64) -> Self {
        Self {
            inner: MersenneTwisterUniformRng::new(seed),
        }
    }

    /// Generate the next standard-normal deviate.
    pub fn next_real(&mut self) -> Real {
        // Avoid exact 0 or 1 which would produce ±∞
        let u = loop {
            let u = self.inner.next_real();
            if u > 0.0 && u < 1.0 {
                break u;
            }
        };
        crate::distributions::normal_cdf_inverse(u)
    }
}

impl NormalSource for InverseCumulativeNormalRng {
    fn next_normal(&mut self) -> Real {
        self.next_real()
    }
}

/// Draw a fresh seed from operating-system entropy.
///
/// Used when a run is not given an explicit seed; the drawn seed is reported
/// back so that the run can be repeated.
pub fn entropy_seed() -> u64 {
    rand::random()
}
