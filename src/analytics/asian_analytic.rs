// src/analytics/asian_analytic.rs
//! Closed form for the discretely averaged geometric Asian option.
//!
//! With m observations at t_i = iT/m (the initial fixing excluded), the
//! geometric average G = (Π S_i)^(1/m) of GBM is itself lognormal:
//! ```text
//! ln G ~ N( ln S₀ + μ_G T,  σ_G² T )
//! μ_G T  = (r - σ²/2) T (m+1) / (2m)
//! σ_G²   = σ² (m+1)(2m+1) / (6m²)
//! ```
//! so the price is a Black-Scholes formula on the shifted lognormal:
//! ```text
//! C = e^(-rT) [ E[G] Φ(d₁) - K Φ(d₂) ],   E[G] = S₀ e^(μ_G T + σ_G² T / 2)
//! d₁ = [ln(S₀/K) + μ_G T + σ_G² T] / (σ_G √T),   d₂ = d₁ - σ_G √T
//! ```
//! This expectation is the natural control for the arithmetic-Asian
//! estimator (the averages are highly correlated path by path).

use crate::math_utils::norm_cdf;
use crate::mc::payoffs::OptionType;

/// Discrete geometric Asian price with `m` averaging observations.
pub fn geometric_asian_price(
    opt: OptionType,
    s0: f64,
    k: f64,
    r: f64,
    sigma: f64,
    t: f64,
    m: usize,
) -> f64 {
    let discount = (-r * t).exp();
    let mf = m as f64;

    let var_g = sigma * sigma * (mf + 1.0) * (2.0 * mf + 1.0) / (6.0 * mf * mf);
    let mu_t = (r - 0.5 * sigma * sigma) * t * (mf + 1.0) / (2.0 * mf);
    let vol_g = (var_g * t).sqrt();

    if vol_g <= 0.0 {
        let forward_avg = s0 * mu_t.exp();
        return discount * opt.intrinsic(forward_avg, k);
    }

    let expected_g = s0 * (mu_t + 0.5 * var_g * t).exp();
    let d1 = ((s0 / k).ln() + mu_t + var_g * t) / vol_g;
    let d2 = d1 - vol_g;

    match opt {
        OptionType::Call => discount * (expected_g * norm_cdf(d1) - k * norm_cdf(d2)),
        OptionType::Put => discount * (k * norm_cdf(-d2) - expected_g * norm_cdf(-d1)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::bs_analytic;

    #[test]
    fn test_below_european() {
        // The average is less volatile than the terminal value.
        let asian = geometric_asian_price(OptionType::Call, 100.0, 100.0, 0.05, 0.2, 1.0, 12);
        let european = bs_analytic::bs_call_price(100.0, 100.0, 0.05, 0.2, 1.0);
        assert!(asian < european, "{} should be below {}", asian, european);
        assert!(asian > 0.0);
    }

    #[test]
    fn test_single_observation_is_european() {
        // m = 1 averages only the terminal fixing.
        let asian = geometric_asian_price(OptionType::Call, 100.0, 95.0, 0.05, 0.2, 1.0, 1);
        let european = bs_analytic::bs_call_price(100.0, 95.0, 0.05, 0.2, 1.0);
        assert!((asian - european).abs() < 1e-10);
    }

    #[test]
    fn test_put_call_parity_on_average() {
        // C - P = e^(-rT) (E[G] - K).
        let (s0, k, r, sigma, t, m) = (100.0, 100.0, 0.05, 0.2, 1.0, 12);
        let c = geometric_asian_price(OptionType::Call, s0, k, r, sigma, t, m);
        let p = geometric_asian_price(OptionType::Put, s0, k, r, sigma, t, m);

        let mf = m as f64;
        let var_g = sigma * sigma * (mf + 1.0) * (2.0 * mf + 1.0) / (6.0 * mf * mf);
        let mu_t = (r - 0.5 * sigma * sigma) * t * (mf + 1.0) / (2.0 * mf);
        let expected_g = s0 * (mu_t + 0.5 * var_g * t).exp();
        let parity = (-r * t).exp() * (expected_g - k);

        assert!((c - p - parity).abs() < 1e-10);
    }

    #[test]
    fn test_more_observations_lower_value() {
        // Averaging over more fixings shrinks the effective volatility.
        let few = geometric_asian_price(OptionType::Call, 100.0, 100.0, 0.05, 0.2, 1.0, 4);
        let many = geometric_asian_price(OptionType::Call, 100.0, 100.0, 0.05, 0.2, 1.0, 252);
        assert!(many < few);
    }
}
