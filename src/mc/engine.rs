// src/mc/engine.rs
//! Context-facing Monte Carlo pricing operations.
//!
//! Every public operation takes a simulation context and a scalar parameter
//! tuple and returns a price. Error paths record a code in the context's
//! last-error slot and return zero; the internal `try_*` functions carry
//! `Result` and fold to the sentinel only here at the outer wrapper.
//!
//! # Variance Reduction
//!
//! - **Antithetic pairing** (context flag): each simulation index consumes
//!   one normal draw vector and evaluates the payoff at both +Z and -Z;
//!   both samples enter the accumulator and the mean divides by 2·pairs.
//!   Stepped kernels mirror the whole path by cloning the stream state and
//!   replaying it with negated normals.
//! - **Control variates** (context flag): European pairs the terminal spot
//!   (E[Z] = S₀e^(rT)); arithmetic Asian pairs the geometric-Asian payoff
//!   with its closed-form expectation.
//!
//! # Degenerate Inputs
//!
//! T = 0 or σ = 0 are valid: the path collapses to the deterministic
//! forward and the price is the (discounted) intrinsic, computed
//! analytically without consuming any random draws.

use crate::analytics::asian_analytic;
use crate::context::SimContext;
use crate::error::{validation::*, PricingResult};
use crate::math_utils::inverse_norm_cdf;
use crate::mc::control_variate::ControlVariateEstimator;
use crate::mc::dispatch::{dispatch, SumStats};
use crate::mc::payoffs::{Averaging, DigitalKind, OptionType, Payoff, StrikeKind};
use crate::mc::sobol::SobolSequence;
use crate::models::{
    Black76, Black76Params, Gbm, GbmParams, Heston, HestonParams, HestonScheme, Merton,
    MertonParams, Sabr, SabrParams,
};
use crate::rng::Xoshiro256;
use log::debug;

/// Simulation index count and reported sample count for a requested path count.
///
/// Antithetic pairing runs ⌈paths/2⌉ pairs and reports 2·pairs samples.
pub(crate) fn sim_counts(paths: usize, antithetic: bool) -> (usize, usize) {
    if antithetic {
        let pairs = (paths + 1) / 2;
        (pairs, 2 * pairs)
    } else {
        (paths, paths)
    }
}

fn is_degenerate(sigma: f64, t: f64) -> bool {
    sigma == 0.0 || t == 0.0
}

/// The zero-volatility path: S_i = S₀·e^(r·iΔ) at every vertex.
fn degenerate_path(s0: f64, r: f64, t: f64, steps: usize) -> Vec<f64> {
    let dt = t / steps as f64;
    (0..=steps)
        .map(|i| s0 * (r * dt * i as f64).exp())
        .collect()
}

fn validate_vanilla(s0: f64, k: f64, r: f64, sigma: f64, t: f64) -> PricingResult<()> {
    validate_positive("s0", s0)?;
    validate_positive("k", k)?;
    validate_finite("r", r)?;
    validate_non_negative("sigma", sigma)?;
    validate_non_negative("t", t)?;
    Ok(())
}

/// Simulate one GBM path of `steps` increments; normals scaled by `sign`.
fn gbm_path(gbm: &Gbm, rng: &mut Xoshiro256, steps: usize, sign: f64) -> Vec<f64> {
    let mut path = Vec::with_capacity(steps + 1);
    let mut s = gbm.params.s0;
    path.push(s);
    for _ in 0..steps {
        s = gbm.step(s, sign * rng.next_normal());
        path.push(s);
    }
    path
}

// ---------------------------------------------------------------------------
// European under GBM
// ---------------------------------------------------------------------------

fn try_european(
    ctx: &SimContext,
    opt: OptionType,
    s0: f64,
    k: f64,
    r: f64,
    sigma: f64,
    t: f64,
) -> PricingResult<f64> {
    validate_vanilla(s0, k, r, sigma, t)?;
    validate_paths(ctx.paths())?;

    let gbm = Gbm::new(GbmParams { s0, r, sigma, t }, 1);
    if is_degenerate(sigma, t) {
        let forward = s0 * (r * t).exp();
        return Ok(gbm.discount * opt.intrinsic(forward, k));
    }

    let antithetic = ctx.antithetic();
    let (sims, reported) = sim_counts(ctx.paths(), antithetic);
    let master = ctx.master_rng();

    if ctx.control_variate() {
        // Control: the terminal spot, whose expectation is the forward.
        let expected_spot = s0 * (r * t).exp();
        let est = dispatch(
            &master,
            sims,
            ctx.threads(),
            || ControlVariateEstimator::new(expected_spot),
            |rng, _idx, acc| {
                let z = rng.next_normal();
                let st = gbm.terminal(z);
                acc.add(opt.intrinsic(st, k), st);
                if antithetic {
                    let st2 = gbm.terminal(-z);
                    acc.add(opt.intrinsic(st2, k), st2);
                }
            },
        )?;
        debug!(
            "european cv: n={} c={:.4} mean={:.6}",
            est.len(),
            est.coefficient(),
            est.adjusted_mean()
        );
        Ok(gbm.discount * est.adjusted_mean())
    } else {
        let stats = dispatch(
            &master,
            sims,
            ctx.threads(),
            SumStats::default,
            |rng, _idx, acc| {
                let z = rng.next_normal();
                acc.add(opt.intrinsic(gbm.terminal(z), k));
                if antithetic {
                    acc.add(opt.intrinsic(gbm.terminal(-z), k));
                }
            },
        )?;
        debug!(
            "european mc: n={} stderr={:.6}",
            reported,
            (stats.variance_of_mean(reported)).sqrt() * gbm.discount
        );
        Ok(gbm.discount * stats.mean_over(reported))
    }
}

/// European option price under GBM.
pub fn european_price(
    ctx: &mut SimContext,
    opt: OptionType,
    s0: f64,
    k: f64,
    r: f64,
    sigma: f64,
    t: f64,
) -> f64 {
    ctx.clear_error();
    match try_european(ctx, opt, s0, k, r, sigma, t) {
        Ok(price) => price,
        Err(e) => {
            ctx.record_error(e.code());
            0.0
        }
    }
}

// ---------------------------------------------------------------------------
// European on a quasi-random (Sobol) stream
// ---------------------------------------------------------------------------

fn try_european_qmc(
    ctx: &SimContext,
    opt: OptionType,
    s0: f64,
    k: f64,
    r: f64,
    sigma: f64,
    t: f64,
) -> PricingResult<f64> {
    validate_vanilla(s0, k, r, sigma, t)?;
    validate_paths(ctx.paths())?;

    let gbm = Gbm::new(GbmParams { s0, r, sigma, t }, 1);
    if is_degenerate(sigma, t) {
        let forward = s0 * (r * t).exp();
        return Ok(gbm.discount * opt.intrinsic(forward, k));
    }

    // The Sobol recurrence is serial, so this pricer runs inline regardless
    // of the context thread count; it is deterministic by construction.
    let mut sobol = SobolSequence::new(1)?;
    let mut point = [0.0];
    let mut sum = 0.0;
    for _ in 0..ctx.paths() {
        sobol.next_into(&mut point);
        let z = inverse_norm_cdf(point[0]);
        sum += opt.intrinsic(gbm.terminal(z), k);
    }
    Ok(gbm.discount * sum / ctx.paths() as f64)
}

/// European option price under GBM driven by the Sobol sequence.
pub fn european_price_qmc(
    ctx: &mut SimContext,
    opt: OptionType,
    s0: f64,
    k: f64,
    r: f64,
    sigma: f64,
    t: f64,
) -> f64 {
    ctx.clear_error();
    match try_european_qmc(ctx, opt, s0, k, r, sigma, t) {
        Ok(price) => price,
        Err(e) => {
            ctx.record_error(e.code());
            0.0
        }
    }
}

// ---------------------------------------------------------------------------
// Black-76 European on a forward
// ---------------------------------------------------------------------------

fn try_black76(
    ctx: &SimContext,
    opt: OptionType,
    f0: f64,
    k: f64,
    r: f64,
    sigma: f64,
    t: f64,
) -> PricingResult<f64> {
    validate_vanilla(f0, k, r, sigma, t)?;
    validate_paths(ctx.paths())?;

    let model = Black76::new(Black76Params { f0, r, sigma, t }, 1);
    if is_degenerate(sigma, t) {
        // The forward is driftless: the degenerate terminal is F₀.
        return Ok(model.discount * opt.intrinsic(f0, k));
    }

    let antithetic = ctx.antithetic();
    let (sims, reported) = sim_counts(ctx.paths(), antithetic);
    let stats = dispatch(
        &ctx.master_rng(),
        sims,
        ctx.threads(),
        SumStats::default,
        |rng, _idx, acc| {
            let z = rng.next_normal();
            acc.add(opt.intrinsic(model.terminal(z), k));
            if antithetic {
                acc.add(opt.intrinsic(model.terminal(-z), k));
            }
        },
    )?;
    Ok(model.discount * stats.mean_over(reported))
}

/// European option price on a forward under Black-76 dynamics.
pub fn black76_price(
    ctx: &mut SimContext,
    opt: OptionType,
    f0: f64,
    k: f64,
    r: f64,
    sigma: f64,
    t: f64,
) -> f64 {
    ctx.clear_error();
    match try_black76(ctx, opt, f0, k, r, sigma, t) {
        Ok(price) => price,
        Err(e) => {
            ctx.record_error(e.code());
            0.0
        }
    }
}

// ---------------------------------------------------------------------------
// Heston European
// ---------------------------------------------------------------------------

fn try_heston(
    ctx: &SimContext,
    opt: OptionType,
    k: f64,
    params: HestonParams,
    scheme: HestonScheme,
) -> PricingResult<f64> {
    validate_positive("k", k)?;
    validate_paths(ctx.paths())?;
    let steps = ctx.steps();
    let heston = Heston::with_scheme(params, steps, scheme)?;

    if params.t == 0.0 {
        return Ok(opt.intrinsic(params.s0, k));
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
                let snapshot = rng.clone();
                let (mut s, mut v) = (params.s0, params.v0);
                for _ in 0..steps {
                    heston.step(&mut s, &mut v, rng, 1.0);
                }
                acc.add(opt.intrinsic(s, k));

                let mut mirror = snapshot;
                let (mut s2, mut v2) = (params.s0, params.v0);
                for _ in 0..steps {
                    heston.step(&mut s2, &mut v2, &mut mirror, -1.0);
                }
                acc.add(opt.intrinsic(s2, k));
            } else {
                let (mut s, mut v) = (params.s0, params.v0);
                for _ in 0..steps {
                    heston.step(&mut s, &mut v, rng, 1.0);
                }
                acc.add(opt.intrinsic(s, k));
            }
        },
    )?;
    Ok(heston.discount * stats.mean_over(reported))
}

/// European option price under the Heston stochastic-volatility model.
pub fn heston_price(
    ctx: &mut SimContext,
    opt: OptionType,
    k: f64,
    params: HestonParams,
    scheme: HestonScheme,
) -> f64 {
    ctx.clear_error();
    match try_heston(ctx, opt, k, params, scheme) {
        Ok(price) => price,
        Err(e) => {
            ctx.record_error(e.code());
            0.0
        }
    }
}

// ---------------------------------------------------------------------------
// SABR European
// ---------------------------------------------------------------------------

fn try_sabr(
    ctx: &SimContext,
    opt: OptionType,
    k: f64,
    params: SabrParams,
) -> PricingResult<f64> {
    validate_positive("k", k)?;
    validate_paths(ctx.paths())?;
    let steps = ctx.steps();
    let sabr = Sabr::new(params, steps)?;

    if params.t == 0.0 {
        return Ok(opt.intrinsic(params.f0, k));
    }

    let antithetic = ctx.antithetic();
    let (sims, reported) = sim_counts(ctx.paths(), antithetic);

    let run_path = |rng: &mut Xoshiro256, sign: f64| -> f64 {
        let (mut f, mut vol) = (params.f0, params.alpha);
        for _ in 0..steps {
            let z1 = sign * rng.next_normal();
            let z2 = sign * rng.next_normal();
            sabr.step(&mut f, &mut vol, z1, z2);
        }
        opt.intrinsic(f, k)
    };

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
    Ok(sabr.discount * stats.mean_over(reported))
}

/// European option price on a forward under SABR dynamics.
pub fn sabr_price(ctx: &mut SimContext, opt: OptionType, k: f64, params: SabrParams) -> f64 {
    ctx.clear_error();
    match try_sabr(ctx, opt, k, params) {
        Ok(price) => price,
        Err(e) => {
            ctx.record_error(e.code());
            0.0
        }
    }
}

// ---------------------------------------------------------------------------
// Merton jump-diffusion European
// ---------------------------------------------------------------------------

fn try_merton(
    ctx: &SimContext,
    opt: OptionType,
    k: f64,
    params: MertonParams,
) -> PricingResult<f64> {
    validate_positive("k", k)?;
    validate_paths(ctx.paths())?;
    let steps = ctx.steps();
    let merton = Merton::new(params, steps)?;

    if params.t == 0.0 {
        return Ok(opt.intrinsic(params.s0, k));
    }

    let antithetic = ctx.antithetic();
    let (sims, reported) = sim_counts(ctx.paths(), antithetic);

    let run_path = |rng: &mut Xoshiro256, sign: f64| -> f64 {
        let mut s = params.s0;
        for _ in 0..steps {
            merton.step(&mut s, rng, sign);
        }
        opt.intrinsic(s, k)
    };

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
    Ok(merton.discount * stats.mean_over(reported))
}

/// European option price under Merton jump-diffusion.
pub fn merton_price(ctx: &mut SimContext, opt: OptionType, k: f64, params: MertonParams) -> f64 {
    ctx.clear_error();
    match try_merton(ctx, opt, k, params) {
        Ok(price) => price,
        Err(e) => {
            ctx.record_error(e.code());
            0.0
        }
    }
}

// ---------------------------------------------------------------------------
// Asian
// ---------------------------------------------------------------------------

fn try_asian(
    ctx: &SimContext,
    opt: OptionType,
    averaging: Averaging,
    strike: StrikeKind,
    s0: f64,
    k: f64,
    r: f64,
    sigma: f64,
    t: f64,
) -> PricingResult<f64> {
    validate_positive("s0", s0)?;
    if strike == StrikeKind::Fixed {
        validate_positive("k", k)?;
    }
    validate_finite("r", r)?;
    validate_non_negative("sigma", sigma)?;
    validate_non_negative("t", t)?;
    validate_paths(ctx.paths())?;
    validate_steps(ctx.steps())?;

    let obs = ctx.steps();
    let gbm = Gbm::new(GbmParams { s0, r, sigma, t }, obs);
    let payoff = match strike {
        StrikeKind::Fixed => Payoff::AsianFixed { opt, averaging, k },
        StrikeKind::Floating => Payoff::AsianFloating { opt, averaging },
    };

    if is_degenerate(sigma, t) {
        let path = degenerate_path(s0, r, t, obs);
        return Ok(gbm.discount * payoff.calculate(&path));
    }

    let antithetic = ctx.antithetic();
    let (sims, reported) = sim_counts(ctx.paths(), antithetic);
    let master = ctx.master_rng();

    let use_cv =
        ctx.control_variate() && averaging == Averaging::Arithmetic && strike == StrikeKind::Fixed;

    if use_cv {
        // Control: the geometric-Asian payoff on the same path, whose
        // discounted expectation has a closed form.
        let control = Payoff::AsianFixed {
            opt,
            averaging: Averaging::Geometric,
            k,
        };
        let expected_control =
            asian_analytic::geometric_asian_price(opt, s0, k, r, sigma, t, obs) / gbm.discount;
        let est = dispatch(
            &master,
            sims,
            ctx.threads(),
            || ControlVariateEstimator::new(expected_control),
            |rng, _idx, acc| {
                if antithetic {
                    let mut mirror = rng.clone();
                    let path = gbm_path(&gbm, rng, obs, 1.0);
                    acc.add(payoff.calculate(&path), control.calculate(&path));
                    let path2 = gbm_path(&gbm, &mut mirror, obs, -1.0);
                    acc.add(payoff.calculate(&path2), control.calculate(&path2));
                } else {
                    let path = gbm_path(&gbm, rng, obs, 1.0);
                    acc.add(payoff.calculate(&path), control.calculate(&path));
                }
            },
        )?;
        debug!("asian cv: n={} c={:.4}", est.len(), est.coefficient());
        Ok(gbm.discount * est.adjusted_mean())
    } else {
        let stats = dispatch(
            &master,
            sims,
            ctx.threads(),
            SumStats::default,
            |rng, _idx, acc| {
                if antithetic {
                    let mut mirror = rng.clone();
                    acc.add(payoff.calculate(&gbm_path(&gbm, rng, obs, 1.0)));
                    acc.add(payoff.calculate(&gbm_path(&gbm, &mut mirror, obs, -1.0)));
                } else {
                    acc.add(payoff.calculate(&gbm_path(&gbm, rng, obs, 1.0)));
                }
            },
        )?;
        Ok(gbm.discount * stats.mean_over(reported))
    }
}

/// Asian option price under GBM; the context step count sets the number of
/// averaging observations.
#[allow(clippy::too_many_arguments)]
pub fn asian_price(
    ctx: &mut SimContext,
    opt: OptionType,
    averaging: Averaging,
    strike: StrikeKind,
    s0: f64,
    k: f64,
    r: f64,
    sigma: f64,
    t: f64,
) -> f64 {
    ctx.clear_error();
    match try_asian(ctx, opt, averaging, strike, s0, k, r, sigma, t) {
        Ok(price) => price,
        Err(e) => {
            ctx.record_error(e.code());
            0.0
        }
    }
}

// ---------------------------------------------------------------------------
// Lookback
// ---------------------------------------------------------------------------

fn try_lookback(
    ctx: &SimContext,
    opt: OptionType,
    strike: StrikeKind,
    s0: f64,
    k: f64,
    r: f64,
    sigma: f64,
    t: f64,
) -> PricingResult<f64> {
    validate_positive("s0", s0)?;
    if strike == StrikeKind::Fixed {
        validate_positive("k", k)?;
    }
    validate_finite("r", r)?;
    validate_non_negative("sigma", sigma)?;
    validate_non_negative("t", t)?;
    validate_paths(ctx.paths())?;
    validate_steps(ctx.steps())?;

    let steps = ctx.steps();
    let gbm = Gbm::new(GbmParams { s0, r, sigma, t }, steps);
    let payoff = match strike {
        StrikeKind::Fixed => Payoff::LookbackFixed { opt, k },
        StrikeKind::Floating => Payoff::LookbackFloating { opt },
    };

    if is_degenerate(sigma, t) {
        let path = degenerate_path(s0, r, t, steps);
        return Ok(gbm.discount * payoff.calculate(&path));
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
                acc.add(payoff.calculate(&gbm_path(&gbm, rng, steps, 1.0)));
                acc.add(payoff.calculate(&gbm_path(&gbm, &mut mirror, steps, -1.0)));
            } else {
                acc.add(payoff.calculate(&gbm_path(&gbm, rng, steps, 1.0)));
            }
        },
    )?;
    Ok(gbm.discount * stats.mean_over(reported))
}

/// Lookback option price under GBM (fixed or floating strike).
pub fn lookback_price(
    ctx: &mut SimContext,
    opt: OptionType,
    strike: StrikeKind,
    s0: f64,
    k: f64,
    r: f64,
    sigma: f64,
    t: f64,
) -> f64 {
    ctx.clear_error();
    match try_lookback(ctx, opt, strike, s0, k, r, sigma, t) {
        Ok(price) => price,
        Err(e) => {
            ctx.record_error(e.code());
            0.0
        }
    }
}

// ---------------------------------------------------------------------------
// Digital
// ---------------------------------------------------------------------------

fn try_digital(
    ctx: &SimContext,
    opt: OptionType,
    kind: DigitalKind,
    s0: f64,
    k: f64,
    q: f64,
    r: f64,
    sigma: f64,
    t: f64,
) -> PricingResult<f64> {
    validate_vanilla(s0, k, r, sigma, t)?;
    if kind == DigitalKind::CashOrNothing {
        validate_positive("q", q)?;
    }
    validate_paths(ctx.paths())?;

    let gbm = Gbm::new(GbmParams { s0, r, sigma, t }, 1);
    let payoff = match kind {
        DigitalKind::CashOrNothing => Payoff::DigitalCash { opt, k, q },
        DigitalKind::AssetOrNothing => Payoff::DigitalAsset { opt, k },
    };

    if is_degenerate(sigma, t) {
        let forward = s0 * (r * t).exp();
        return Ok(gbm.discount * payoff.calculate(&[s0, forward]));
    }

    let antithetic = ctx.antithetic();
    let (sims, reported) = sim_counts(ctx.paths(), antithetic);
    let stats = dispatch(
        &ctx.master_rng(),
        sims,
        ctx.threads(),
        SumStats::default,
        |rng, _idx, acc| {
            let z = rng.next_normal();
            acc.add(payoff.calculate(&[s0, gbm.terminal(z)]));
            if antithetic {
                acc.add(payoff.calculate(&[s0, gbm.terminal(-z)]));
            }
        },
    )?;
    Ok(gbm.discount * stats.mean_over(reported))
}

/// Digital (binary) option price under GBM.
#[allow(clippy::too_many_arguments)]
pub fn digital_price(
    ctx: &mut SimContext,
    opt: OptionType,
    kind: DigitalKind,
    s0: f64,
    k: f64,
    q: f64,
    r: f64,
    sigma: f64,
    t: f64,
) -> f64 {
    ctx.clear_error();
    match try_digital(ctx, opt, kind, s0, k, q, r, sigma, t) {
        Ok(price) => price,
        Err(e) => {
            ctx.record_error(e.code());
            0.0
        }
    }
}
