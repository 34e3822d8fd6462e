// src/models/black76.rs
//! Black-76 forward dynamics
//!
//! Same log-normal machinery as GBM but on a forward price, which is a
//! martingale under the forward measure: the drift carries no cost of
//! carry, only the -σ²/2 Itô term. Discounting still uses e^(-rT).

use std::f64;

#[derive(Debug, Clone, Copy)]
pub struct Black76Params {
    pub f0: f64,
    pub r: f64,
    pub sigma: f64,
    pub t: f64,
}

/// Black-76 kernel with precomputed constants.
#[derive(Debug, Clone, Copy)]
pub struct Black76 {
    pub params: Black76Params,
    drift_t: f64,
    vol_sqrt_t: f64,
    drift_dt: f64,
    vol_sqrt_dt: f64,
    pub discount: f64,
}

impl Black76 {
    pub fn new(params: Black76Params, steps: usize) -> Self {
        let dt = params.t / steps as f64;
        let half_var = 0.5 * params.sigma * params.sigma;
        Black76 {
            params,
            drift_t: -half_var * params.t,
            vol_sqrt_t: params.sigma * params.t.sqrt(),
            drift_dt: -half_var * dt,
            vol_sqrt_dt: params.sigma * dt.sqrt(),
            discount: (-params.r * params.t).exp(),
        }
    }

    /// Terminal kernel: F(T) from a single normal draw.
    #[inline]
    pub fn terminal(&self, z: f64) -> f64 {
        self.params.f0 * (self.drift_t + self.vol_sqrt_t * z).exp()
    }

    /// Stepped kernel: F(t+Δ) from F(t) and one normal draw.
    #[inline]
    pub fn step(&self, f: f64, z: f64) -> f64 {
        f * (self.drift_dt + self.vol_sqrt_dt * z).exp()
    }
}
