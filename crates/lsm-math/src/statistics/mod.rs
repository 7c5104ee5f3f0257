//! Sample statistics for Monte Carlo estimators.

use lsm_core::Real;

/// Incremental accumulator of mean and variance.  Samples are added in
/// order, so the result for a given sample sequence is bit-reproducible.
#[derive(Debug, Clone, Copy)]
pub struct Statistics {
    count: usize,
    sum: Real,
    sum_sq: Real,
}

impl Default for Statistics {
    fn default() -> Self {
        Self::new()
    }
}

impl Statistics {
    /// Create a new empty accumulator.
    pub fn new() -> Self {
        Self {
            count: 0,
            sum: 0.0,
            sum_sq: 0.0,
        }
    }

    /// Build an accumulator from a slice of samples.
    pub fn from_samples(samples: &[Real]) -> Self {
        let mut s = Self::new();
        for &x in samples {
            s.add(x);
        }
        s
    }

    /// Add a single sample.
    pub fn add(&mut self, x: Real) {
        self.count += 1;
        self.sum += x;
        self.sum_sq += x * x;
    }

    /// Number of samples.
    pub fn samples(&self) -> usize {
        self.count
    }

    /// Sample mean.  Returns `None` if no samples have been added.
    pub fn mean(&self) -> Option<Real> {
        (self.count > 0).then(|| self.sum / self.count as Real)
    }

    /// Unbiased (Bessel-corrected) variance.  Returns `None` for fewer than
    /// 2 samples.
    pub fn variance(&self) -> Option<Real> {
        if self.count < 2 {
            return None;
        }
        let n = self.count as Real;
        let m = self.sum / n;
        // Rounding can push the raw second moment slightly below m².
        let s2 = (self.sum_sq / n - m * m).max(0.0);
        Some(s2 * n / (n - 1.0))
    }

    /// Standard deviation.  Returns `None` for fewer than 2 samples.
    pub fn std_dev(&self) -> Option<Real> {
        self.variance().map(Real::sqrt)
    }

    /// Standard error of the mean, `σ / √n`.  Returns `None` for fewer than
    /// 2 samples.
    pub fn error_estimate(&self) -> Option<Real> {
        self.std_dev().map(|s| s / (self.count as Real).sqrt())
    }
}
