// src/models/heston.rs
//! Heston Stochastic Volatility Model
//!
//! # Mathematical Framework
//!
//! The Heston model describes asset price evolution with stochastic variance:
//! ```text
//! dS_t = r S_t dt + √V_t S_t dW_t^(1)
//! dV_t = κ(θ - V_t) dt + ξ√V_t dW_t^(2)
//! ```
//!
//! Where:
//! - S_t: Asset price
//! - V_t: Instantaneous variance
//! - κ: Mean reversion speed
//! - θ: Long-term variance level
//! - ξ: Volatility of variance (vol-of-vol)
//! - ρ: Correlation between dW^(1) and dW^(2)
//!
//! The correlated increments come from a 2×2 Cholesky factor:
//! ```text
//! W₁ = Z₁,   W₂ = ρ Z₁ + √(1-ρ²) Z₂
//! ```
//!
//! # Feller Condition
//!
//! Variance stays strictly positive almost surely when:
//! ```text
//! 2κθ > ξ²
//! ```
//! Violating it is not an error, but it biases the Euler scheme (the QE
//! scheme is designed to absorb it); a warning is logged at construction.
//!
//! # Discretization Schemes
//!
//! - **Full-truncation Euler** (default): the variance drift sees the
//!   untruncated value, the diffusion sees √max(v,0); post-update values are
//!   kept as-is and only re-truncated on read.
//! - **Quadratic-Exponential** (Andersen 2008): moment-matched sampling of
//!   V(t+Δ) — a shifted squared normal when ψ = s²/m² ≤ 1.5, otherwise a
//!   mixture with an atom at zero of mass (ψ-1)/(ψ+1) and an exponential
//!   tail — with the spot integrated against a trapezoidal approximation of
//!   the integrated variance plus ρ/ξ correction terms.

use crate::error::{validation::*, PricingResult};
use crate::rng::Xoshiro256;
use log::warn;
use std::f64;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum HestonScheme {
    #[default]
    FullTruncationEuler,
    QuadraticExponential,
}

#[derive(Clone, Copy, Debug)]
pub struct HestonParams {
    pub s0: f64,    // Initial spot
    pub v0: f64,    // Initial variance
    pub r: f64,     // Risk-free rate
    pub kappa: f64, // Mean reversion speed
    pub theta: f64, // Long-term variance
    pub xi: f64,    // Vol-of-vol
    pub rho: f64,   // Spot/variance correlation
    pub t: f64,     // Maturity
}

impl HestonParams {
    /// Feller predicate 2κθ > ξ².
    pub fn feller(&self) -> bool {
        2.0 * self.kappa * self.theta > self.xi * self.xi
    }
}

/// Heston kernel with precomputed per-step constants.
#[derive(Clone, Copy, Debug)]
pub struct Heston {
    pub params: HestonParams,
    pub scheme: HestonScheme,
    dt: f64,
    sqrt_dt: f64,
    rho_bar: f64, // √(1-ρ²)
    exp_kdt: f64, // e^(-κΔ), QE first-moment decay
    qe_c1: f64,   // ξ²e^(-κΔ)(1-e^(-κΔ))/κ
    qe_c2: f64,   // θξ²(1-e^(-κΔ))²/(2κ)
    k0: f64,
    k1: f64,
    k2: f64,
    k3: f64,
    k4: f64,
    pub discount: f64,
}

/// QE scheme switching threshold ψ_c.
const PSI_CRITICAL: f64 = 1.5;

impl Heston {
    pub fn new(params: HestonParams, steps: usize) -> PricingResult<Self> {
        Self::with_scheme(params, steps, HestonScheme::default())
    }

    pub fn with_scheme(
        params: HestonParams,
        steps: usize,
        scheme: HestonScheme,
    ) -> PricingResult<Self> {
        validate_positive("s0", params.s0)?;
        validate_non_negative("v0", params.v0)?;
        validate_finite("r", params.r)?;
        validate_positive("kappa", params.kappa)?;
        validate_positive("theta", params.theta)?;
        validate_positive("xi", params.xi)?;
        validate_correlation("rho", params.rho)?;
        validate_non_negative("t", params.t)?;
        validate_steps(steps)?;

        if !params.feller() {
            warn!(
                "Feller condition violated: 2κθ = {:.6} ≤ ξ² = {:.6}; variance may hit zero",
                2.0 * params.kappa * params.theta,
                params.xi * params.xi
            );
        }

        let dt = params.t / steps as f64;
        let exp_kdt = (-params.kappa * dt).exp();
        let kr_over_xi = params.kappa * params.rho / params.xi;
        // Trapezoidal weights γ₁ = γ₂ = ½ for the integrated variance.
        let gamma = 0.5;

        Ok(Heston {
            params,
            scheme,
            dt,
            sqrt_dt: dt.sqrt(),
            rho_bar: (1.0 - params.rho * params.rho).sqrt(),
            exp_kdt,
            qe_c1: params.xi * params.xi * exp_kdt * (1.0 - exp_kdt) / params.kappa,
            qe_c2: params.theta * params.xi * params.xi * (1.0 - exp_kdt) * (1.0 - exp_kdt)
                / (2.0 * params.kappa),
            k0: -params.rho * params.kappa * params.theta / params.xi * dt,
            k1: gamma * dt * (kr_over_xi - 0.5) - params.rho / params.xi,
            k2: gamma * dt * (kr_over_xi - 0.5) + params.rho / params.xi,
            k3: gamma * dt * (1.0 - params.rho * params.rho),
            k4: gamma * dt * (1.0 - params.rho * params.rho),
            discount: (-params.r * params.t).exp(),
        })
    }

    /// One step of the configured scheme.
    ///
    /// Every normal draw is scaled by `z_sign` (±1) so antithetic pairing
    /// can mirror a whole path; uniform draws are replayed unmirrored.
    #[inline]
    pub fn step(&self, s: &mut f64, v: &mut f64, rng: &mut Xoshiro256, z_sign: f64) {
        match self.scheme {
            HestonScheme::FullTruncationEuler => self.step_euler(s, v, rng, z_sign),
            HestonScheme::QuadraticExponential => self.step_qe(s, v, rng, z_sign),
        }
    }

    /// Full-truncation Euler step.
    ///
    /// The variance drift uses the untruncated v, the diffusions use
    /// √max(v,0). The updated variance is stored as-is (possibly negative)
    /// and only truncated again on the next read.
    fn step_euler(&self, s: &mut f64, v: &mut f64, rng: &mut Xoshiro256, z_sign: f64) {
        let z1 = z_sign * rng.next_normal();
        let z2 = z_sign * rng.next_normal();
        let w_s = z1;
        let w_v = self.params.rho * z1 + self.rho_bar * z2;

        let v_plus = v.max(0.0);
        let sqrt_v = v_plus.sqrt();

        *s *= ((self.params.r - 0.5 * v_plus) * self.dt + sqrt_v * self.sqrt_dt * w_s).exp();
        *v += self.params.kappa * (self.params.theta - *v) * self.dt
            + self.params.xi * sqrt_v * self.sqrt_dt * w_v;
    }

    /// Andersen Quadratic-Exponential step.
    fn step_qe(&self, s: &mut f64, v: &mut f64, rng: &mut Xoshiro256, z_sign: f64) {
        let v_plus = v.max(0.0);

        // Conditional mean and variance of V(t+Δ) given V(t).
        let m = self.params.theta + (v_plus - self.params.theta) * self.exp_kdt;
        let s2 = v_plus * self.qe_c1 + self.qe_c2;
        let psi = s2 / (m * m);

        let v_next = if psi <= PSI_CRITICAL {
            // Shifted square of a normal, moment-matched through b².
            let inv_psi2 = 2.0 / psi;
            let b2 = inv_psi2 - 1.0 + (inv_psi2 * (inv_psi2 - 1.0)).sqrt();
            let a = m / (1.0 + b2);
            let zv = z_sign * rng.next_normal();
            let shifted = b2.sqrt() + zv;
            a * shifted * shifted
        } else {
            // Atom at zero of mass p, exponential tail beyond.
            let p = (psi - 1.0) / (psi + 1.0);
            let beta = (1.0 - p) / m;
            let u = rng.next_uniform();
            if u <= p {
                0.0
            } else {
                ((1.0 - p) / (1.0 - u)).ln() / beta
            }
        };

        let zs = z_sign * rng.next_normal();
        let d_log_s = self.params.r * self.dt
            + self.k0
            + self.k1 * v_plus
            + self.k2 * v_next
            + (self.k3 * v_plus + self.k4 * v_next).sqrt() * zs;

        *s *= d_log_s.exp();
        *v = v_next;
    }
}
