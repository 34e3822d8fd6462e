// src/analytics/merton_analytic.rs
//! Merton (1976) jump-diffusion series price.
//!
//! Conditioning on the number of jumps n over [0, T], the price is a
//! Poisson-weighted series of Black-Scholes prices:
//! ```text
//! V = Σ_{n≥0} e^(-λ'T) (λ'T)^n / n! · BS(S, K, r_n, σ_n, T)
//! λ'  = λ(1 + κ),   κ = e^(μ_j + σ_j²/2) - 1
//! σ_n² = σ² + n σ_j² / T
//! r_n  = r - λκ + n (μ_j + σ_j²/2) / T
//! ```
//! The series is truncated once the Poisson weight falls below 1e-12
//! (λ = 0 collapses to the single Black-Scholes term).

use crate::analytics::bs_analytic;
use crate::mc::payoffs::OptionType;

/// Truncation threshold on the Poisson weight.
const WEIGHT_EPS: f64 = 1e-12;

/// Hard cap on the number of series terms.
const MAX_TERMS: usize = 170;

#[allow(clippy::too_many_arguments)]
pub fn merton_price(
    opt: OptionType,
    s: f64,
    k: f64,
    r: f64,
    sigma: f64,
    lambda: f64,
    mu_j: f64,
    sigma_j: f64,
    t: f64,
) -> f64 {
    let log_jump_mean = mu_j + 0.5 * sigma_j * sigma_j;
    let kappa = log_jump_mean.exp() - 1.0;
    let lambda_prime = lambda * (1.0 + kappa);

    let mut price = 0.0;
    let mut weight = (-lambda_prime * t).exp(); // n = 0 term
    for n in 0..MAX_TERMS {
        if n > 0 {
            weight *= lambda_prime * t / n as f64;
        }
        if weight < WEIGHT_EPS && n > 0 {
            break;
        }

        let nf = n as f64;
        let sigma_n = (sigma * sigma + nf * sigma_j * sigma_j / t).sqrt();
        let r_n = r - lambda * kappa + nf * log_jump_mean / t;
        let term = match opt {
            OptionType::Call => bs_analytic::bs_call_price(s, k, r_n, sigma_n, t),
            OptionType::Put => bs_analytic::bs_put_price(s, k, r_n, sigma_n, t),
        };
        price += weight * term;
    }
    price
}
