// src/analytics/lookback_analytic.rs
//! Goldman-Sosin-Gatto floating-strike lookback formulas.
//!
//! Re-derived from the published Goldman, Sosin & Gatto (1979) results for
//! continuously monitored extrema of GBM. For a running minimum m ≤ S and
//! running maximum M ≥ S (both equal to S for a freshly written option):
//!
//! ```text
//! call = S Φ(a₁) - S (σ²/2r) Φ(-a₁) - m e^(-rT) [Φ(a₂) - (σ²/2r) e^(Y₁) Φ(-a₃)]
//! a₁ = [ln(S/m) + (r + σ²/2)T] / (σ√T)
//! a₂ = a₁ - σ√T
//! a₃ = [ln(S/m) + (-r + σ²/2)T] / (σ√T)
//! Y₁ = -2 (r - σ²/2) ln(S/m) / σ²
//!
//! put = M e^(-rT) [Φ(b₁) - (σ²/2r) e^(Y₂) Φ(-b₃)] + S (σ²/2r) Φ(-b₂) - S Φ(b₂)
//! b₁ = [ln(M/S) + (-r + σ²/2)T] / (σ√T)
//! b₂ = b₁ - σ√T
//! b₃ = [ln(M/S) + (r - σ²/2)T] / (σ√T)
//! Y₂ = 2 (r - σ²/2) ln(M/S) / σ²
//! ```
//!
//! The σ²/2r terms require r > 0. Discrete Monte Carlo monitoring observes
//! less extreme extrema, so simulated prices sit slightly below these
//! continuous-monitoring values; comparisons are loose by construction.

use crate::math_utils::norm_cdf;

/// Floating-strike lookback call, running minimum `min` (fresh: min = s).
///
/// Requires r > 0.
pub fn floating_lookback_call(s: f64, min: f64, r: f64, sigma: f64, t: f64) -> f64 {
    let sqrt_t = t.sqrt();
    let vol_t = sigma * sqrt_t;
    let ratio = sigma * sigma / (2.0 * r);
    let log_sm = (s / min).ln();

    let a1 = (log_sm + (r + 0.5 * sigma * sigma) * t) / vol_t;
    let a2 = a1 - vol_t;
    let a3 = (log_sm + (-r + 0.5 * sigma * sigma) * t) / vol_t;
    let y1 = -2.0 * (r - 0.5 * sigma * sigma) * log_sm / (sigma * sigma);

    s * norm_cdf(a1) - s * ratio * norm_cdf(-a1)
        - min * (-r * t).exp() * (norm_cdf(a2) - ratio * y1.exp() * norm_cdf(-a3))
}

/// Floating-strike lookback put, running maximum `max` (fresh: max = s).
///
/// Requires r > 0.
pub fn floating_lookback_put(s: f64, max: f64, r: f64, sigma: f64, t: f64) -> f64 {
    let sqrt_t = t.sqrt();
    let vol_t = sigma * sqrt_t;
    let ratio = sigma * sigma / (2.0 * r);
    let log_ms = (max / s).ln();

    let b1 = (log_ms + (-r + 0.5 * sigma * sigma) * t) / vol_t;
    let b2 = b1 - vol_t;
    let b3 = (log_ms + (r - 0.5 * sigma * sigma) * t) / vol_t;
    let y2 = 2.0 * (r - 0.5 * sigma * sigma) * log_ms / (sigma * sigma);

    max * (-r * t).exp() * (norm_cdf(b1) - ratio * y2.exp() * norm_cdf(-b3))
        + s * ratio * norm_cdf(-b2)
        - s * norm_cdf(b2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_published_call_value() {
        // Goldman-Sosin-Gatto benchmark: S = m = 50, r = 10%, σ = 40%,
        // T = 0.25 → 8.04.
        let c = floating_lookback_call(50.0, 50.0, 0.1, 0.4, 0.25);
        assert!((c - 8.04).abs() < 0.01, "expected 8.04, got {}", c);
    }

    #[test]
    fn test_published_put_value() {
        // Companion benchmark: S = M = 50, r = 10%, σ = 40%, T = 0.25 → 7.79.
        let p = floating_lookback_put(50.0, 50.0, 0.1, 0.4, 0.25);
        assert!((p - 7.79).abs() < 0.01, "expected 7.79, got {}", p);
    }

    #[test]
    fn test_dominates_vanilla() {
        // A floating lookback call pays S_T - min ≥ S_T - K for K = S₀,
        // so it must be worth more than the ATM European call.
        let lookback = floating_lookback_call(100.0, 100.0, 0.05, 0.2, 1.0);
        let european = crate::analytics::bs_analytic::bs_call_price(100.0, 100.0, 0.05, 0.2, 1.0);
        assert!(lookback > european);
    }

    #[test]
    fn test_deeper_extremum_raises_value() {
        // A lower running minimum can only increase the call payoff.
        let fresh = floating_lookback_call(100.0, 100.0, 0.05, 0.2, 1.0);
        let seasoned = floating_lookback_call(100.0, 90.0, 0.05, 0.2, 1.0);
        assert!(seasoned > fresh);

        let fresh_put = floating_lookback_put(100.0, 100.0, 0.05, 0.2, 1.0);
        let seasoned_put = floating_lookback_put(100.0, 110.0, 0.05, 0.2, 1.0);
        assert!(seasoned_put > fresh_put);
    }
}
