// src/analytics/barrier_analytic.rs
//! Analytic down-barrier calls (Reiner-Rubinstein / Merton).
//!
//! For a continuously monitored down barrier H with H ≤ min(S, K) and no
//! rebate, the knock-in call has the closed form
//! ```text
//! C_di = S (H/S)^(2λ) Φ(y) - K e^(-rT) (H/S)^(2λ-2) Φ(y - σ√T)
//! λ = (r + σ²/2) / σ²
//! y = ln(H² / (S K)) / (σ√T) + λ σ√T
//! ```
//! and in/out parity gives C_do = C - C_di against the vanilla call C.
//!
//! A barrier at or above the spot knocks immediately: C_di degenerates to
//! the vanilla and C_do to zero. The H ≤ K restriction is a documented
//! precondition — the H > K branch of the Reiner-Rubinstein family is not
//! carried here.

use crate::analytics::bs_analytic;
use crate::math_utils::norm_cdf;

/// Down-and-in call (H ≤ K, continuous monitoring, zero rebate).
pub fn down_and_in_call(s: f64, k: f64, h: f64, r: f64, sigma: f64, t: f64) -> f64 {
    if h >= s {
        // Already through the barrier: the option is live.
        return bs_analytic::bs_call_price(s, k, r, sigma, t);
    }
    if sigma * t.sqrt() <= 0.0 {
        return 0.0; // a deterministic path above H never knocks in
    }

    let sqrt_t = t.sqrt();
    let lambda = (r + 0.5 * sigma * sigma) / (sigma * sigma);
    let y = (h * h / (s * k)).ln() / (sigma * sqrt_t) + lambda * sigma * sqrt_t;

    s * (h / s).powf(2.0 * lambda) * norm_cdf(y)
        - k * (-r * t).exp() * (h / s).powf(2.0 * lambda - 2.0) * norm_cdf(y - sigma * sqrt_t)
}

/// Down-and-out call (H ≤ K, continuous monitoring, zero rebate) via
/// in/out parity with the vanilla.
pub fn down_and_out_call(s: f64, k: f64, h: f64, r: f64, sigma: f64, t: f64) -> f64 {
    if h >= s {
        return 0.0;
    }
    (bs_analytic::bs_call_price(s, k, r, sigma, t) - down_and_in_call(s, k, h, r, sigma, t))
        .max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_out_parity_is_exact() {
        let (s, k, h, r, sigma, t) = (100.0, 100.0, 80.0, 0.05, 0.2, 1.0);
        let vanilla = bs_analytic::bs_call_price(s, k, r, sigma, t);
        let sum = down_and_in_call(s, k, h, r, sigma, t) + down_and_out_call(s, k, h, r, sigma, t);
        assert!((sum - vanilla).abs() < 1e-10);
    }

    #[test]
    fn test_remote_barrier_leaves_vanilla() {
        let (s, k, r, sigma, t) = (100.0, 100.0, 0.05, 0.2, 1.0);
        let dout = down_and_out_call(s, k, 1.0, r, sigma, t);
        let vanilla = bs_analytic::bs_call_price(s, k, r, sigma, t);
        assert!(
            (dout - vanilla).abs() < 1e-6,
            "an unreachable barrier should not bite: {} vs {}",
            dout,
            vanilla
        );
    }

    #[test]
    fn test_barrier_at_spot_knocks_immediately() {
        let (s, k, r, sigma, t) = (100.0, 100.0, 0.05, 0.2, 1.0);
        assert_eq!(down_and_out_call(s, k, s, r, sigma, t), 0.0);
        let din = down_and_in_call(s, k, s, r, sigma, t);
        let vanilla = bs_analytic::bs_call_price(s, k, r, sigma, t);
        assert!((din - vanilla).abs() < 1e-12);
    }

    #[test]
    fn test_tighter_barrier_cheapens_knock_out() {
        let (s, k, r, sigma, t) = (100.0, 100.0, 0.05, 0.2, 1.0);
        let loose = down_and_out_call(s, k, 70.0, r, sigma, t);
        let tight = down_and_out_call(s, k, 90.0, r, sigma, t);
        assert!(
            tight < loose,
            "a closer barrier must cost value: {} vs {}",
            tight,
            loose
        );
    }
}
