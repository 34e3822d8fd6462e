// src/analytics/sabr_hagan.rs
//! Hagan et al. (2002) SABR lognormal implied volatility.
//!
//! The asymptotic expansion maps SABR parameters (α, β, ρ, ν) into a
//! Black-76 implied volatility:
//! ```text
//! σ_B(F, K) = A · z/x(z) · [1 + B·T]
//! z    = ν/α (FK)^((1-β)/2) ln(F/K)
//! x(z) = ln[(√(1-2ρz+z²) + z - ρ) / (1-ρ)]
//! ```
//! with the standard (1-β) log-moneyness corrections in A and the ATM
//! limit z/x(z) → 1. Prices follow by feeding σ_B into Black-76.

use crate::analytics::black76_analytic;
use crate::mc::payoffs::OptionType;

/// z/x(z) is replaced by its limit 1 below this |z|.
const Z_EPS: f64 = 1e-7;

/// Hagan lognormal implied volatility for a forward F and strike K.
#[allow(clippy::many_single_char_names)]
pub fn sabr_implied_vol(
    f: f64,
    k: f64,
    t: f64,
    alpha: f64,
    beta: f64,
    rho: f64,
    nu: f64,
) -> f64 {
    let one_minus_beta = 1.0 - beta;
    let log_fk = (f / k).ln();
    let fk_pow = (f * k).powf(one_minus_beta / 2.0);

    // Correction term common to the ATM and general branches.
    let b = one_minus_beta * one_minus_beta / 24.0 * alpha * alpha / (fk_pow * fk_pow)
        + rho * beta * nu * alpha / (4.0 * fk_pow)
        + (2.0 - 3.0 * rho * rho) / 24.0 * nu * nu;

    let z = nu / alpha * fk_pow * log_fk;
    let z_over_x = if z.abs() < Z_EPS {
        1.0
    } else {
        let x = (((1.0 - 2.0 * rho * z + z * z).sqrt() + z - rho) / (1.0 - rho)).ln();
        z / x
    };

    let denom = fk_pow
        * (1.0
            + one_minus_beta * one_minus_beta / 24.0 * log_fk * log_fk
            + one_minus_beta.powi(4) / 1920.0 * log_fk.powi(4));

    alpha / denom * z_over_x * (1.0 + b * t)
}

/// SABR European price: Hagan implied vol fed into Black-76.
#[allow(clippy::too_many_arguments)]
pub fn sabr_price(
    opt: OptionType,
    f: f64,
    k: f64,
    r: f64,
    t: f64,
    alpha: f64,
    beta: f64,
    rho: f64,
    nu: f64,
) -> f64 {
    let vol = sabr_implied_vol(f, k, t, alpha, beta, rho, nu);
    match opt {
        OptionType::Call => black76_analytic::b76_call_price(f, k, r, vol, t),
        OptionType::Put => black76_analytic::b76_put_price(f, k, r, vol, t),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lognormal_limit() {
        // β = 1, ν = 0: the SABR vol is exactly α.
        let vol = sabr_implied_vol(100.0, 110.0, 1.0, 0.25, 1.0, 0.0, 0.0);
        assert!((vol - 0.25).abs() < 1e-12, "got {}", vol);
    }

    #[test]
    fn test_atm_vol_beta_one() {
        // ATM with β = 1: σ ≈ α [1 + ((ραν)/4 + (2-3ρ²)ν²/24) T].
        let (alpha, rho, nu, t) = (0.2, -0.3, 0.4, 1.0);
        let vol = sabr_implied_vol(100.0, 100.0, t, alpha, 1.0, rho, nu);
        let expected =
            alpha * (1.0 + (rho * nu * alpha / 4.0 + (2.0 - 3.0 * rho * rho) / 24.0 * nu * nu) * t);
        assert!((vol - expected).abs() < 1e-10, "{} vs {}", vol, expected);
    }

    #[test]
    fn test_smile_is_convex_around_atm() {
        // Negative ρ skews the smile downward in strike.
        let atm = sabr_implied_vol(100.0, 100.0, 1.0, 0.2, 0.7, -0.4, 0.5);
        let low = sabr_implied_vol(100.0, 80.0, 1.0, 0.2, 0.7, -0.4, 0.5);
        let high = sabr_implied_vol(100.0, 120.0, 1.0, 0.2, 0.7, -0.4, 0.5);
        assert!(low > atm, "downside vol {} should exceed ATM {}", low, atm);
        assert!(high.is_finite() && high > 0.0);
    }

    #[test]
    fn test_price_positive_and_below_forward() {
        let price = sabr_price(OptionType::Call, 100.0, 100.0, 0.05, 1.0, 0.2, 1.0, -0.3, 0.4);
        assert!(price > 0.0);
        assert!(price < 100.0);
    }
}
