// src/mc/barrier.rs
//! Barrier option pricing with Brownian-bridge monitoring.
//!
//! # Monitoring
//!
//! Paths are monitored discretely at every vertex AND corrected between
//! vertices with a Brownian bridge. For a segment (s₁, s₂) that stays on
//! the safe side of barrier H, the conditional probability that the
//! continuous path crossed in between is
//! ```text
//! p = exp(-2 · ln(s₁/H) · ln(s₂/H) / (σ²Δ))
//! ```
//! (the product of logs is positive on the safe side for both up and down
//! barriers, so the same expression covers both directions). The segment
//! counts as hit when one uniform draw u < p. If either endpoint already
//! violates the barrier the segment is a hit outright and no bridge draw is
//! consumed.
//!
//! The bridge uniforms come from the same stream as the path normals, so
//! seed determinism carries through.
//!
//! # Payoff
//!
//! Knock-in pays the vanilla payoff iff any segment hit; knock-out pays the
//! vanilla payoff iff no segment hit, else the constant rebate.

use crate::context::SimContext;
use crate::error::{validation::*, PricingResult};
use crate::mc::dispatch::{dispatch, SumStats};
use crate::mc::engine::sim_counts;
use crate::mc::payoffs::{BarrierStyle, OptionType};
use crate::models::{Gbm, GbmParams};
use crate::rng::Xoshiro256;

/// Crossing probability of the bridge between two safe-side vertices.
#[inline]
fn bridge_hit_probability(s1: f64, s2: f64, h: f64, var_dt: f64) -> f64 {
    if var_dt <= 0.0 {
        return 0.0;
    }
    (-2.0 * (s1 / h).ln() * (s2 / h).ln() / var_dt).exp()
}

#[allow(clippy::too_many_arguments)]
fn try_barrier(
    ctx: &SimContext,
    opt: OptionType,
    style: BarrierStyle,
    s0: f64,
    k: f64,
    h: f64,
    rebate: f64,
    r: f64,
    sigma: f64,
    t: f64,
) -> PricingResult<f64> {
    validate_positive("s0", s0)?;
    validate_positive("k", k)?;
    validate_positive("h", h)?;
    validate_non_negative("rebate", rebate)?;
    validate_finite("r", r)?;
    validate_non_negative("sigma", sigma)?;
    validate_non_negative("t", t)?;
    validate_paths(ctx.paths())?;
    validate_steps(ctx.steps())?;

    let steps = ctx.steps();
    let gbm = Gbm::new(GbmParams { s0, r, sigma, t }, steps);
    let dt = t / steps as f64;
    let var_dt = sigma * sigma * dt;
    let up = style.is_up();
    let knock_in = style.is_in();

    let touched = move |s: f64| if up { s >= h } else { s <= h };

    let run_path = move |rng: &mut Xoshiro256, sign: f64| -> f64 {
        let mut s_prev = s0;
        let mut hit = touched(s_prev);
        for _ in 0..steps {
            let s_next = gbm.step(s_prev, sign * rng.next_normal());
            if !hit {
                if touched(s_next) {
                    hit = true;
                } else {
                    let p = bridge_hit_probability(s_prev, s_next, h, var_dt);
                    if rng.next_uniform() < p {
                        hit = true;
                    }
                }
            }
            s_prev = s_next;
        }

        let vanilla = opt.intrinsic(s_prev, k);
        if knock_in {
            if hit {
                vanilla
            } else {
                0.0
            }
        } else if hit {
            rebate
        } else {
            vanilla
        }
    };

    if sigma == 0.0 || t == 0.0 {
        // The path is deterministic; one silent run prices every path.
        let mut rng = ctx.master_rng();
        return Ok(gbm.discount * run_path(&mut rng, 0.0));
    }

    let antithetic = ctx.antithetic();
    let (sims, reported) = sim_counts(ctx.paths(), antithetic);
    let stats = dispatch(
        &ctx.master_rng(),
        sims,
        ctx.threads(),
        SumStats::default,
        |rng, _idx, acc| {
            if antithetic {
                let mut mirror = rng.clone();
                acc.add(run_path(rng, 1.0));
                acc.add(run_path(&mut mirror, -1.0));
            } else {
                acc.add(run_path(rng, 1.0));
            }
        },
    )?;
    Ok(gbm.discount * stats.mean_over(reported))
}

/// Barrier option price under GBM with Brownian-bridge monitoring.
#[allow(clippy::too_many_arguments)]
pub fn barrier_price(
    ctx: &mut SimContext,
    opt: OptionType,
    style: BarrierStyle,
    s0: f64,
    k: f64,
    h: f64,
    rebate: f64,
    r: f64,
    sigma: f64,
    t: f64,
) -> f64 {
    ctx.clear_error();
    match try_barrier(ctx, opt, style, s0, k, h, rebate, r, sigma, t) {
        Ok(price) => price,
        Err(e) => {
            ctx.record_error(e.code());
            0.0
        }
    }
}
