// src/mc/control_variate.rs
//! Control-Variate Estimator
//!
//! # Mathematical Framework
//!
//! Given a target payoff X and a correlated control Z with known
//! expectation E[Z], the adjusted estimator
//! ```text
//! X̂ = mean(X) - ĉ (mean(Z) - E[Z]),   ĉ = Cov(X, Z) / Var(Z)
//! ```
//! has variance (1 - ρ²_{XZ}) Var(mean(X)) — the better the control
//! correlates, the more variance it removes.
//!
//! The accumulator keeps five running sums (x, z, x², z², xz) plus the
//! sample count, so the optimal coefficient is an online regression: one
//! pass over the samples, no replay. E[Z] is supplied by the caller from a
//! closed-form collaborator before any sample is added and never updated
//! during accumulation.

use crate::mc::dispatch::Accumulator;

/// Controls with sample variance below this are ignored (ĉ = 0).
const VAR_FLOOR: f64 = 1e-12;

/// Online control-variate accumulator.
#[derive(Debug, Clone, Copy)]
pub struct ControlVariateEstimator {
    sum_x: f64,
    sum_z: f64,
    sum_xx: f64,
    sum_zz: f64,
    sum_xz: f64,
    expected_z: f64,
    n: u64,
}

impl ControlVariateEstimator {
    /// New accumulator with the control's known expectation.
    pub fn new(expected_z: f64) -> Self {
        ControlVariateEstimator {
            sum_x: 0.0,
            sum_z: 0.0,
            sum_xx: 0.0,
            sum_zz: 0.0,
            sum_xz: 0.0,
            expected_z,
            n: 0,
        }
    }

    /// Add one (payoff, control) sample.
    #[inline]
    pub fn add(&mut self, x: f64, z: f64) {
        self.sum_x += x;
        self.sum_z += z;
        self.sum_xx += x * x;
        self.sum_zz += z * z;
        self.sum_xz += x * z;
        self.n += 1;
    }

    pub fn len(&self) -> u64 {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    pub fn expected_z(&self) -> f64 {
        self.expected_z
    }

    /// Optimal coefficient ĉ = sample Cov(X, Z) / sample Var(Z).
    ///
    /// Returns 0 for a (near-)constant control, which collapses the
    /// adjusted estimate to the plain mean.
    pub fn coefficient(&self) -> f64 {
        if self.n == 0 {
            return 0.0;
        }
        let n = self.n as f64;
        let mean_x = self.sum_x / n;
        let mean_z = self.sum_z / n;
        let var_z = self.sum_zz / n - mean_z * mean_z;
        if var_z < VAR_FLOOR {
            return 0.0;
        }
        let cov_xz = self.sum_xz / n - mean_x * mean_z;
        cov_xz / var_z
    }

    /// Adjusted estimate mean(X) - ĉ (mean(Z) - E[Z]).
    pub fn adjusted_mean(&self) -> f64 {
        if self.n == 0 {
            return 0.0;
        }
        let n = self.n as f64;
        let mean_x = self.sum_x / n;
        let mean_z = self.sum_z / n;
        mean_x - self.coefficient() * (mean_z - self.expected_z)
    }

    /// Plain (unadjusted) sample mean of X.
    pub fn raw_mean(&self) -> f64 {
        if self.n == 0 {
            return 0.0;
        }
        self.sum_x / self.n as f64
    }
}

impl Accumulator for ControlVariateEstimator {
    fn merge(&mut self, other: Self) {
        self.sum_x += other.sum_x;
        self.sum_z += other.sum_z;
        self.sum_xx += other.sum_xx;
        self.sum_zz += other.sum_zz;
        self.sum_xz += other.sum_xz;
        self.n += other.n;
    }
}
