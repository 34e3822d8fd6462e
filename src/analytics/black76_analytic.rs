// src/analytics/black76_analytic.rs
//! Analytical Black-76 formulas for options on forwards.
//!
//! ```text
//! C = e^(-rT) [F·Φ(d₁) - K·Φ(d₂)]
//! d₁ = [ln(F/K) + σ²T/2] / (σ√T),   d₂ = d₁ - σ√T
//! ```

use crate::math_utils::{norm_cdf, norm_pdf};

fn d1(f: f64, k: f64, sigma: f64, t: f64) -> f64 {
    ((f / k).ln() + 0.5 * sigma * sigma * t) / (sigma * t.sqrt())
}

/// Black-76 call on a forward.
pub fn b76_call_price(f: f64, k: f64, r: f64, sigma: f64, t: f64) -> f64 {
    if sigma * t.sqrt() <= 0.0 {
        return (-r * t).exp() * (f - k).max(0.0);
    }
    let d1 = d1(f, k, sigma, t);
    let d2 = d1 - sigma * t.sqrt();
    (-r * t).exp() * (f * norm_cdf(d1) - k * norm_cdf(d2))
}

/// Black-76 put on a forward.
pub fn b76_put_price(f: f64, k: f64, r: f64, sigma: f64, t: f64) -> f64 {
    if sigma * t.sqrt() <= 0.0 {
        return (-r * t).exp() * (k - f).max(0.0);
    }
    let d1 = d1(f, k, sigma, t);
    let d2 = d1 - sigma * t.sqrt();
    (-r * t).exp() * (k * norm_cdf(-d2) - f * norm_cdf(-d1))
}

/// Call delta with respect to the forward: e^(-rT) Φ(d₁).
pub fn b76_call_delta(f: f64, k: f64, r: f64, sigma: f64, t: f64) -> f64 {
    (-r * t).exp() * norm_cdf(d1(f, k, sigma, t))
}

/// Put delta with respect to the forward: -e^(-rT) Φ(-d₁).
pub fn b76_put_delta(f: f64, k: f64, r: f64, sigma: f64, t: f64) -> f64 {
    -(-r * t).exp() * norm_cdf(-d1(f, k, sigma, t))
}

/// Vega: e^(-rT) F φ(d₁) √T. Identical for calls and puts.
pub fn b76_vega(f: f64, k: f64, r: f64, sigma: f64, t: f64) -> f64 {
    (-r * t).exp() * f * norm_pdf(d1(f, k, sigma, t)) * t.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_call_parity_on_forward() {
        let f = 100.0;
        let k = 95.0;
        let r = 0.05;
        let sigma = 0.25;
        let t = 0.5;
        let c = b76_call_price(f, k, r, sigma, t);
        let p = b76_put_price(f, k, r, sigma, t);
        let parity = (-r * t).exp() * (f - k);
        assert!((c - p - parity).abs() < 1e-10);
    }

    #[test]
    fn test_atm_forward_symmetry() {
        // At F = K the call and put have equal value.
        let c = b76_call_price(100.0, 100.0, 0.05, 0.2, 1.0);
        let p = b76_put_price(100.0, 100.0, 0.05, 0.2, 1.0);
        assert!((c - p).abs() < 1e-12);
    }

    #[test]
    fn test_matches_bs_with_forward_spot() {
        // Black-76 on the forward F = S e^(rT) reproduces Black-Scholes.
        let s: f64 = 100.0;
        let r: f64 = 0.05;
        let t: f64 = 1.0;
        let f = s * (r * t).exp();
        let b76 = b76_call_price(f, 100.0, r, 0.2, t);
        let bs = crate::analytics::bs_analytic::bs_call_price(s, 100.0, r, 0.2, t);
        assert!((b76 - bs).abs() < 1e-10);
    }

    #[test]
    fn test_degenerate() {
        assert_eq!(b76_call_price(110.0, 100.0, 0.0, 0.2, 0.0), 10.0);
    }
}
