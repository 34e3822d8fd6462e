// src/analytics/bs_analytic.rs
//! Analytical Black-Scholes formulas for European and digital options.
//!
//! # Mathematical Foundation
//!
//! Under the Black-Scholes model, the underlying follows:
//! ```text
//! dS_t = r S_t dt + σ S_t dW_t
//! ```
//!
//! The risk-neutral pricing formula gives:
//! ```text
//! V(S,t) = e^(-r(T-t)) * E^Q[payoff(S_T) | S_t = S]
//! ```
//!
//! For European options this has closed-form solutions involving the
//! cumulative normal distribution Φ(x):
//! ```text
//! C = S·Φ(d₁) - K·e^(-rT)·Φ(d₂)
//! d₁ = [ln(S/K) + (r + σ²/2)T] / (σ√T),   d₂ = d₁ - σ√T
//! ```
//!
//! T = 0 and σ = 0 collapse to the (discounted) intrinsic of the forward.

use crate::math_utils::{norm_cdf, norm_pdf};

fn d1(s: f64, k: f64, r: f64, sigma: f64, t: f64) -> f64 {
    ((s / k).ln() + (r + 0.5 * sigma * sigma) * t) / (sigma * t.sqrt())
}

/// Black-Scholes European call option price.
pub fn bs_call_price(s: f64, k: f64, r: f64, sigma: f64, t: f64) -> f64 {
    if sigma * t.sqrt() <= 0.0 {
        return (-r * t).exp() * (s * (r * t).exp() - k).max(0.0);
    }
    let d1 = d1(s, k, r, sigma, t);
    let d2 = d1 - sigma * t.sqrt();
    s * norm_cdf(d1) - k * (-r * t).exp() * norm_cdf(d2)
}

/// Black-Scholes European put option price.
pub fn bs_put_price(s: f64, k: f64, r: f64, sigma: f64, t: f64) -> f64 {
    if sigma * t.sqrt() <= 0.0 {
        return (-r * t).exp() * (k - s * (r * t).exp()).max(0.0);
    }
    let d1 = d1(s, k, r, sigma, t);
    let d2 = d1 - sigma * t.sqrt();
    k * (-r * t).exp() * norm_cdf(-d2) - s * norm_cdf(-d1)
}

/// Call Delta: ∂C/∂S = Φ(d₁).
pub fn bs_call_delta(s: f64, k: f64, r: f64, sigma: f64, t: f64) -> f64 {
    norm_cdf(d1(s, k, r, sigma, t))
}

/// Put Delta: ∂P/∂S = Φ(d₁) - 1.
pub fn bs_put_delta(s: f64, k: f64, r: f64, sigma: f64, t: f64) -> f64 {
    norm_cdf(d1(s, k, r, sigma, t)) - 1.0
}

/// Gamma: ∂²V/∂S² = φ(d₁) / (S σ √T). Identical for calls and puts.
pub fn bs_gamma(s: f64, k: f64, r: f64, sigma: f64, t: f64) -> f64 {
    norm_pdf(d1(s, k, r, sigma, t)) / (s * sigma * t.sqrt())
}

/// Vega: ∂V/∂σ = S φ(d₁) √T. Identical for calls and puts.
pub fn bs_vega(s: f64, k: f64, r: f64, sigma: f64, t: f64) -> f64 {
    s * norm_pdf(d1(s, k, r, sigma, t)) * t.sqrt()
}

/// Call Theta: -S φ(d₁) σ / (2√T) - r K e^(-rT) Φ(d₂).
pub fn bs_call_theta(s: f64, k: f64, r: f64, sigma: f64, t: f64) -> f64 {
    let d1 = d1(s, k, r, sigma, t);
    let d2 = d1 - sigma * t.sqrt();
    (-s * norm_pdf(d1) * sigma) / (2.0 * t.sqrt()) - r * k * (-r * t).exp() * norm_cdf(d2)
}

/// Call Rho: K T e^(-rT) Φ(d₂).
pub fn bs_call_rho(s: f64, k: f64, r: f64, sigma: f64, t: f64) -> f64 {
    let d1 = d1(s, k, r, sigma, t);
    let d2 = d1 - sigma * t.sqrt();
    k * t * (-r * t).exp() * norm_cdf(d2)
}

/// Cash-or-nothing digital call: Q e^(-rT) Φ(d₂).
pub fn bs_digital_cash_call(s: f64, k: f64, q: f64, r: f64, sigma: f64, t: f64) -> f64 {
    let d2 = d1(s, k, r, sigma, t) - sigma * t.sqrt();
    q * (-r * t).exp() * norm_cdf(d2)
}

/// Cash-or-nothing digital put: Q e^(-rT) Φ(-d₂).
pub fn bs_digital_cash_put(s: f64, k: f64, q: f64, r: f64, sigma: f64, t: f64) -> f64 {
    let d2 = d1(s, k, r, sigma, t) - sigma * t.sqrt();
    q * (-r * t).exp() * norm_cdf(-d2)
}

/// Asset-or-nothing digital call: S Φ(d₁).
pub fn bs_digital_asset_call(s: f64, k: f64, r: f64, sigma: f64, t: f64) -> f64 {
    s * norm_cdf(d1(s, k, r, sigma, t))
}

/// Asset-or-nothing digital put: S Φ(-d₁).
pub fn bs_digital_asset_put(s: f64, k: f64, r: f64, sigma: f64, t: f64) -> f64 {
    s * norm_cdf(-d1(s, k, r, sigma, t))
}
