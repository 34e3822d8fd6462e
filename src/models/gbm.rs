// src/models/gbm.rs
//! Geometric Brownian Motion
//!
//! # Mathematical Framework
//!
//! Under the risk-neutral measure the spot follows:
//! ```text
//! dS_t = r S_t dt + σ S_t dW_t
//! ```
//!
//! With exact solution:
//! ```text
//! S_T = S_0 * exp((r - σ²/2)T + σ√T * Z),   Z ~ N(0,1)
//! ```
//!
//! The stepped kernel applies the same exact update over each increment Δ,
//! so a GBM path has no discretization bias at its vertices.

use std::f64;

/// Raw GBM inputs for one pricing call.
#[derive(Debug, Clone, Copy)]
pub struct GbmParams {
    pub s0: f64,
    pub r: f64,
    pub sigma: f64,
    pub t: f64,
}

/// GBM kernel with precomputed step and terminal constants.
///
/// Stack-scoped for the duration of one pricing call.
#[derive(Debug, Clone, Copy)]
pub struct Gbm {
    pub params: GbmParams,
    drift_t: f64,
    vol_sqrt_t: f64,
    drift_dt: f64,
    vol_sqrt_dt: f64,
    /// Discount factor e^(-rT).
    pub discount: f64,
}

impl Gbm {
    pub fn new(params: GbmParams, steps: usize) -> Self {
        let dt = params.t / steps as f64;
        let half_var = 0.5 * params.sigma * params.sigma;
        Gbm {
            params,
            drift_t: (params.r - half_var) * params.t,
            vol_sqrt_t: params.sigma * params.t.sqrt(),
            drift_dt: (params.r - half_var) * dt,
            vol_sqrt_dt: params.sigma * dt.sqrt(),
            discount: (-params.r * params.t).exp(),
        }
    }

    /// Terminal kernel: S(T) from a single normal draw.
    #[inline]
    pub fn terminal(&self, z: f64) -> f64 {
        self.params.s0 * (self.drift_t + self.vol_sqrt_t * z).exp()
    }

    /// Stepped kernel: S(t+Δ) from S(t) and one normal draw.
    #[inline]
    pub fn step(&self, s: f64, z: f64) -> f64 {
        s * (self.drift_dt + self.vol_sqrt_dt * z).exp()
    }
}
