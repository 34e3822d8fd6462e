// src/models/merton.rs
//! Merton Jump-Diffusion Model
//!
//! # Mathematical Framework
//!
//! The spot carries a GBM diffusion plus compound-Poisson jumps:
//! ```text
//! dS_t / S_t = (r - λκ) dt + σ dW_t + (J - 1) dN_t
//! ```
//! where N_t is a Poisson process of intensity λ, jump log-returns are
//! N(μ_j, σ_j²), and κ = e^(μ_j + σ_j²/2) - 1 compensates the drift so the
//! discounted spot stays a martingale.
//!
//! # Jump Count Sampling
//!
//! The per-step jump count has mean λΔ. For λΔ < 0.1 a Bernoulli trial is a
//! cheap approximation (the probability of two or more jumps is O((λΔ)²));
//! otherwise the count comes from the inverse-transform loop on a running
//! product of uniforms. Both consume the path's own RNG stream, so seed
//! determinism is preserved.

use crate::error::{validation::*, PricingResult};
use crate::rng::Xoshiro256;
use std::f64;

/// Below this jump mean a Bernoulli trial replaces the Poisson inversion.
const BERNOULLI_THRESHOLD: f64 = 0.1;

#[derive(Clone, Copy, Debug)]
pub struct MertonParams {
    pub s0: f64,
    pub r: f64,
    pub sigma: f64,
    pub lambda: f64,  // Jump intensity
    pub mu_j: f64,    // Mean of log-jump size
    pub sigma_j: f64, // Std dev of log-jump size
    pub t: f64,
}

impl MertonParams {
    /// Mean jump-size compensator κ = e^(μ_j + σ_j²/2) - 1.
    pub fn jump_compensator(&self) -> f64 {
        (self.mu_j + 0.5 * self.sigma_j * self.sigma_j).exp() - 1.0
    }
}

/// Merton kernel with precomputed step constants.
#[derive(Clone, Copy, Debug)]
pub struct Merton {
    pub params: MertonParams,
    drift_dt: f64,
    vol_sqrt_dt: f64,
    lambda_dt: f64,
    pub discount: f64,
}

impl Merton {
    pub fn new(params: MertonParams, steps: usize) -> PricingResult<Self> {
        validate_positive("s0", params.s0)?;
        validate_finite("r", params.r)?;
        validate_non_negative("sigma", params.sigma)?;
        validate_non_negative("lambda", params.lambda)?;
        validate_finite("mu_j", params.mu_j)?;
        validate_non_negative("sigma_j", params.sigma_j)?;
        validate_non_negative("t", params.t)?;
        validate_steps(steps)?;

        let dt = params.t / steps as f64;
        let kappa = params.jump_compensator();
        Ok(Merton {
            params,
            drift_dt: (params.r - params.lambda * kappa - 0.5 * params.sigma * params.sigma) * dt,
            vol_sqrt_dt: params.sigma * dt.sqrt(),
            lambda_dt: params.lambda * dt,
            discount: (-params.r * params.t).exp(),
        })
    }

    /// One step: diffusion normal + Poisson jump count + jump log-returns.
    ///
    /// Normal draws are scaled by `z_sign` for antithetic mirroring; the
    /// Poisson uniforms are replayed unmirrored.
    #[inline]
    pub fn step(&self, s: &mut f64, rng: &mut Xoshiro256, z_sign: f64) {
        let z = z_sign * rng.next_normal();
        let mut log_ret = self.drift_dt + self.vol_sqrt_dt * z;

        let jumps = poisson_count(rng, self.lambda_dt);
        for _ in 0..jumps {
            log_ret += self.params.mu_j + self.params.sigma_j * z_sign * rng.next_normal();
        }

        *s *= log_ret.exp();
    }
}

/// Poisson draw with mean `mean` from the given stream.
///
/// Bernoulli approximation below the threshold; Knuth's inverse-transform
/// loop on a product of uniforms otherwise.
fn poisson_count(rng: &mut Xoshiro256, mean: f64) -> u32 {
    if mean <= 0.0 {
        return 0;
    }
    if mean < BERNOULLI_THRESHOLD {
        return if rng.next_uniform() < mean { 1 } else { 0 };
    }

    let limit = (-mean).exp();
    let mut count = 0u32;
    let mut product = 1.0;
    loop {
        product *= rng.next_uniform();
        if product <= limit {
            return count;
        }
        count += 1;
    }
}
