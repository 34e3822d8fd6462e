// src/models/sabr.rs
//! SABR Stochastic-Alpha-Beta-Rho Model
//!
//! # Mathematical Framework
//!
//! The forward and its volatility evolve as:
//! ```text
//! dF_t = σ_t F_t^β dW_t^(1)
//! dσ_t = ν σ_t dW_t^(2)
//! ```
//! with dW^(1), dW^(2) correlated at ρ via the same 2×2 Cholesky factor the
//! Heston kernel uses.
//!
//! # Discretization
//!
//! Plain Euler on both factors. The forward is absorbed at zero — the CEV
//! diffusion vanishes there, so once a path hits F = 0 it stays there for
//! the remainder. The volatility is floored at 1e-10 to keep later CEV
//! powers and divisions well defined. With β = 1 the dynamics approach
//! lognormal and prices approach Black-76.

use crate::error::{validation::*, PricingError, PricingResult};
use std::f64;

/// Floor applied to the volatility factor.
const SIGMA_FLOOR: f64 = 1e-10;

#[derive(Clone, Copy, Debug)]
pub struct SabrParams {
    pub f0: f64,    // Initial forward
    pub alpha: f64, // Initial volatility σ_0
    pub beta: f64,  // CEV exponent
    pub rho: f64,   // Forward/vol correlation
    pub nu: f64,    // Vol-of-vol
    pub r: f64,     // Discount rate
    pub t: f64,     // Maturity
}

/// SABR kernel with precomputed step constants.
#[derive(Clone, Copy, Debug)]
pub struct Sabr {
    pub params: SabrParams,
    sqrt_dt: f64,
    rho_bar: f64,
    pub discount: f64,
}

impl Sabr {
    pub fn new(params: SabrParams, steps: usize) -> PricingResult<Self> {
        validate_positive("f0", params.f0)?;
        validate_positive("alpha", params.alpha)?;
        validate_non_negative("nu", params.nu)?;
        validate_correlation("rho", params.rho)?;
        validate_non_negative("t", params.t)?;
        validate_steps(steps)?;
        if !(0.0..=1.0).contains(&params.beta) {
            return Err(PricingError::InvalidParameters {
                parameter: "beta".to_string(),
                value: params.beta,
                constraint: "must be in range [0, 1]".to_string(),
            });
        }

        let dt = params.t / steps as f64;
        Ok(Sabr {
            params,
            sqrt_dt: dt.sqrt(),
            rho_bar: (1.0 - params.rho * params.rho).sqrt(),
            discount: (-params.r * params.t).exp(),
        })
    }

    /// One Euler step of (F, σ).
    ///
    /// `z1`, `z2` are independent standard normals; the caller controls the
    /// draw order and antithetic sign.
    #[inline]
    pub fn step(&self, f: &mut f64, vol: &mut f64, z1: f64, z2: f64) {
        if *f <= 0.0 {
            // Absorbed: the forward stays at zero for the rest of the path.
            *f = 0.0;
            return;
        }

        let w_f = z1;
        let w_v = self.params.rho * z1 + self.rho_bar * z2;

        let f_next = *f + *vol * f.powf(self.params.beta) * self.sqrt_dt * w_f;
        let vol_next = *vol + self.params.nu * *vol * self.sqrt_dt * w_v;

        *f = if f_next <= 0.0 { 0.0 } else { f_next };
        *vol = vol_next.max(SIGMA_FLOOR);
    }
}
