// src/mc/lsm.rs
//! Early exercise via least-squares Monte Carlo (Longstaff-Schwartz).
//!
//! # Algorithm
//!
//! 1. Simulate all paths forward, storing the spot at every exercise
//!    opportunity (an N×S table).
//! 2. Seed the cash-flow vector with the terminal intrinsic payoff.
//! 3. Walk backward over the exercise opportunities: discount all cash
//!    flows over the gap, regress the in-the-money cash flows on three
//!    basis functions of x = S/K — {1, 1-x, 1-2x+x²/2} — via the normal
//!    equations (LU with partial pivoting), and exercise wherever the
//!    immediate intrinsic beats the fitted continuation.
//!    Steps with fewer in-the-money rows than the basis dimension, or a
//!    singular regression matrix, are skipped.
//! 4. One final discount to time zero; the mean over paths is the price,
//!    floored at the time-zero intrinsic (exercise at inception).
//!
//! The American pricer exercises at every simulation step. The Bermudan
//! pricer takes an explicit schedule of exercise instants (fractions of
//! maturity terminating at 1.0), simulates a finer grid — at least 10
//! sub-steps per gap with a floor of 50 — and runs the same backward
//! induction over the snapshot columns only.
//!
//! # Contract
//!
//! For non-dividend-paying calls early exercise is never optimal, so the
//! result must match the European price to regression noise.

use crate::context::SimContext;
use crate::error::{validation::*, PricingError, PricingResult};
use crate::mc::payoffs::OptionType;
use crate::models::{Gbm, GbmParams};
use crate::rng::Xoshiro256;
use log::debug;
use nalgebra::{Matrix3, Vector3};
use ndarray::Array2;
use std::thread;

/// Number of regression basis functions.
const BASIS_DIM: usize = 3;

/// Minimum sub-steps of the fine Bermudan grid.
const MIN_BERMUDAN_GRID: usize = 50;

/// Sub-steps per exercise gap on the fine Bermudan grid.
const SUBSTEPS_PER_GAP: usize = 10;

/// Weighted Laguerre basis of x = S/K: {1, 1-x, 1-2x+x²/2}.
#[inline]
fn basis(x: f64) -> [f64; 3] {
    [1.0, 1.0 - x, 1.0 - 2.0 * x + 0.5 * x * x]
}

/// Forward-simulate the spot table: one row per path, one column per
/// snapshot index of the simulation grid.
///
/// Rows are partitioned over workers exactly like the dispatcher partitions
/// simulation indices: worker `i` owns rows [⌊i·N/T⌋, ⌊(i+1)·N/T⌋) and the
/// master RNG jumped `i` times.
fn fill_spot_table(
    gbm: &Gbm,
    master: &Xoshiro256,
    threads: usize,
    paths: usize,
    grid_steps: usize,
    snapshots: &[usize],
) -> PricingResult<Array2<f64>> {
    let cols = snapshots.len();
    let mut table = Array2::<f64>::zeros((paths, cols));

    let fill_rows = |rng: &mut Xoshiro256, rows: &mut [f64]| {
        for row in rows.chunks_exact_mut(cols) {
            let mut s = gbm.params.s0;
            let mut snap = 0;
            for step in 1..=grid_steps {
                s = gbm.step(s, rng.next_normal());
                if snap < cols && snapshots[snap] == step {
                    row[snap] = s;
                    snap += 1;
                }
            }
        }
    };

    // Array2::zeros is contiguous row-major, so the flat view always exists.
    let flat = match table.as_slice_mut() {
        Some(slice) => slice,
        None => {
            return Err(PricingError::NumericalInstability {
                method: "LSM spot table".to_string(),
                reason: "table buffer is not contiguous".to_string(),
            })
        }
    };

    if threads <= 1 {
        let mut rng = master.clone();
        fill_rows(&mut rng, flat);
        return Ok(table);
    }

    thread::scope(|scope| -> PricingResult<()> {
        let mut handles = Vec::with_capacity(threads);
        let mut rest = flat;
        let mut stream = master.clone();

        for worker in 0..threads {
            let lo = worker * paths / threads;
            let hi = (worker + 1) * paths / threads;
            let (mine, tail) = std::mem::take(&mut rest).split_at_mut((hi - lo) * cols);
            rest = tail;
            let mut rng = stream.clone();
            stream.jump();

            let fill = &fill_rows;
            let spawned = thread::Builder::new()
                .name(format!("lsm-worker-{}", worker))
                .spawn_scoped(scope, move || fill(&mut rng, mine));

            match spawned {
                Ok(handle) => handles.push(handle),
                Err(e) => {
                    for handle in handles {
                        let _ = handle.join();
                    }
                    return Err(PricingError::ThreadSpawn {
                        worker,
                        reason: e.to_string(),
                    });
                }
            }
        }

        for (worker, handle) in handles.into_iter().enumerate() {
            handle.join().map_err(|_| PricingError::ThreadSpawn {
                worker,
                reason: "worker panicked".to_string(),
            })?;
        }
        Ok(())
    })?;

    Ok(table)
}

/// Backward induction over the exercise instants.
///
/// `spots` holds one column per instant; `instants` are fractions of
/// maturity, strictly increasing and terminating at 1.0.
fn backward_induction(
    spots: &Array2<f64>,
    opt: OptionType,
    k: f64,
    r: f64,
    t: f64,
    instants: &[f64],
) -> f64 {
    let paths = spots.nrows();
    let m = instants.len();

    let mut cash: Vec<f64> = (0..paths)
        .map(|i| opt.intrinsic(spots[[i, m - 1]], k))
        .collect();

    let mut itm: Vec<usize> = Vec::with_capacity(paths);
    for j in (0..m - 1).rev() {
        let gap_discount = (-r * (instants[j + 1] - instants[j]) * t).exp();
        for cf in cash.iter_mut() {
            *cf *= gap_discount;
        }

        itm.clear();
        itm.extend((0..paths).filter(|&i| opt.intrinsic(spots[[i, j]], k) > 0.0));
        if itm.len() < BASIS_DIM {
            continue;
        }

        // Normal equations AᵀA β = Aᵀy over the in-the-money subset.
        let mut ata = Matrix3::<f64>::zeros();
        let mut aty = Vector3::<f64>::zeros();
        for &i in &itm {
            let phi = basis(spots[[i, j]] / k);
            for a in 0..BASIS_DIM {
                for b in 0..BASIS_DIM {
                    ata[(a, b)] += phi[a] * phi[b];
                }
                aty[a] += phi[a] * cash[i];
            }
        }

        let beta = match ata.lu().solve(&aty) {
            Some(beta) => beta,
            None => continue, // singular design matrix
        };

        for &i in &itm {
            let phi = basis(spots[[i, j]] / k);
            let continuation = beta[0] * phi[0] + beta[1] * phi[1] + beta[2] * phi[2];
            let intrinsic = opt.intrinsic(spots[[i, j]], k);
            if intrinsic > continuation {
                cash[i] = intrinsic;
            }
        }
    }

    let first_discount = (-r * instants[0] * t).exp();
    cash.iter().sum::<f64>() / paths as f64 * first_discount
}

#[allow(clippy::too_many_arguments)]
fn lsm_price(
    ctx: &SimContext,
    opt: OptionType,
    s0: f64,
    k: f64,
    r: f64,
    t: f64,
    grid_steps: usize,
    instants: &[f64],
    sigma: f64,
) -> PricingResult<f64> {
    let gbm = Gbm::new(GbmParams { s0, r, sigma, t }, grid_steps);

    let snapshots: Vec<usize> = {
        let mut idx = Vec::with_capacity(instants.len());
        let mut prev = 0usize;
        for &frac in instants {
            let raw = (frac * grid_steps as f64).round() as usize;
            let step = raw.max(prev + 1).min(grid_steps);
            idx.push(step);
            prev = step;
        }
        idx
    };

    let spots = fill_spot_table(&gbm, &ctx.master_rng(), ctx.threads(), ctx.paths(), grid_steps, &snapshots)?;
    let mean = backward_induction(&spots, opt, k, r, t, instants);
    debug!("lsm: paths={} instants={} mean={:.6}", ctx.paths(), instants.len(), mean);

    // Exercise at inception bounds the estimate from below.
    Ok(mean.max(opt.intrinsic(s0, k)))
}

fn try_american(
    ctx: &SimContext,
    opt: OptionType,
    s0: f64,
    k: f64,
    r: f64,
    sigma: f64,
    t: f64,
) -> PricingResult<f64> {
    validate_positive("s0", s0)?;
    validate_positive("k", k)?;
    validate_finite("r", r)?;
    validate_non_negative("sigma", sigma)?;
    validate_non_negative("t", t)?;
    validate_paths(ctx.paths())?;
    validate_steps(ctx.steps())?;

    if t == 0.0 {
        return Ok(opt.intrinsic(s0, k));
    }

    // American = uniform schedule with one exercise instant per step.
    let steps = ctx.steps();
    let instants: Vec<f64> = (1..=steps).map(|j| j as f64 / steps as f64).collect();
    lsm_price(ctx, opt, s0, k, r, t, steps, &instants, sigma)
}

/// American option price via least-squares Monte Carlo; the context step
/// count sets the exercise grid.
pub fn american_price(
    ctx: &mut SimContext,
    opt: OptionType,
    s0: f64,
    k: f64,
    r: f64,
    sigma: f64,
    t: f64,
) -> f64 {
    ctx.clear_error();
    match try_american(ctx, opt, s0, k, r, sigma, t) {
        Ok(price) => price,
        Err(e) => {
            ctx.record_error(e.code());
            0.0
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn try_bermudan(
    ctx: &SimContext,
    opt: OptionType,
    s0: f64,
    k: f64,
    r: f64,
    sigma: f64,
    t: f64,
    schedule: &[f64],
) -> PricingResult<f64> {
    validate_positive("s0", s0)?;
    validate_positive("k", k)?;
    validate_finite("r", r)?;
    validate_non_negative("sigma", sigma)?;
    validate_non_negative("t", t)?;
    validate_paths(ctx.paths())?;

    if schedule.is_empty() {
        return Err(PricingError::InvalidConfiguration {
            field: "schedule".to_string(),
            reason: "must contain at least one exercise instant".to_string(),
        });
    }
    let mut prev = 0.0;
    for &frac in schedule {
        if !(frac > prev && frac <= 1.0) {
            return Err(PricingError::InvalidConfiguration {
                field: "schedule".to_string(),
                reason: "instants must be strictly increasing in (0, 1]".to_string(),
            });
        }
        prev = frac;
    }
    if (prev - 1.0).abs() > 1e-12 {
        return Err(PricingError::InvalidConfiguration {
            field: "schedule".to_string(),
            reason: "the last instant must be the maturity (1.0)".to_string(),
        });
    }

    if t == 0.0 {
        return Ok(opt.intrinsic(s0, k));
    }

    // Fine grid: at least 10 sub-steps per exercise gap, floor of 50.
    let grid_steps = (SUBSTEPS_PER_GAP * schedule.len()).max(MIN_BERMUDAN_GRID);
    lsm_price(ctx, opt, s0, k, r, t, grid_steps, schedule, sigma)
}

/// Bermudan option price via least-squares Monte Carlo over an explicit
/// exercise schedule (fractions of maturity terminating at 1.0).
#[allow(clippy::too_many_arguments)]
pub fn bermudan_price(
    ctx: &mut SimContext,
    opt: OptionType,
    s0: f64,
    k: f64,
    r: f64,
    sigma: f64,
    t: f64,
    schedule: &[f64],
) -> f64 {
    ctx.clear_error();
    match try_bermudan(ctx, opt, s0, k, r, sigma, t, schedule) {
        Ok(price) => price,
        Err(e) => {
            ctx.record_error(e.code());
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    fn ctx_with(paths: usize, steps: usize, seed: u64) -> SimContext {
        let mut ctx = SimContext::with_seed(seed);
        ctx.set_paths(paths);
        ctx.set_steps(steps);
        ctx
    }

    #[test]
    fn test_basis_functions() {
        let phi = basis(1.0);
        assert_eq!(phi[0], 1.0);
        assert_eq!(phi[1], 0.0);
        assert!((phi[2] - (-0.5)).abs() < 1e-12);
    }

    #[test]
    fn test_american_put_above_european() {
        let mut ctx = ctx_with(20_000, 50, 42);
        let american = american_price(&mut ctx, OptionType::Put, 100.0, 100.0, 0.05, 0.2, 1.0);
        let mut ctx2 = ctx_with(20_000, 50, 42);
        let european = crate::mc::engine::european_price(
            &mut ctx2,
            OptionType::Put,
            100.0,
            100.0,
            0.05,
            0.2,
            1.0,
        );
        assert!(
            american + 0.15 >= european,
            "American put {} must dominate European put {}",
            american,
            european
        );
    }

    #[test]
    fn test_american_call_matches_european() {
        // No dividends: early exercise of a call is never optimal.
        let mut ctx = ctx_with(20_000, 50, 42);
        let american = american_price(&mut ctx, OptionType::Call, 100.0, 100.0, 0.05, 0.2, 1.0);
        let mut ctx2 = ctx_with(20_000, 50, 42);
        let european = crate::mc::engine::european_price(
            &mut ctx2,
            OptionType::Call,
            100.0,
            100.0,
            0.05,
            0.2,
            1.0,
        );
        assert!(
            (american - european).abs() < 0.5,
            "American call {} should equal European call {} to regression noise",
            american,
            european
        );
    }

    #[test]
    fn test_deep_itm_put_floored_at_intrinsic() {
        let mut ctx = ctx_with(20_000, 50, 42);
        let price = american_price(&mut ctx, OptionType::Put, 50.0, 100.0, 0.05, 0.2, 1.0);
        assert!(price >= 50.0, "deep ITM put {} must dominate intrinsic 50", price);
        assert!(price <= 55.0, "deep ITM put {} unreasonably high", price);
    }

    #[test]
    fn test_bermudan_schedule_validation() {
        let mut ctx = ctx_with(1_000, 50, 42);
        // Not terminating at 1.0.
        let p = bermudan_price(&mut ctx, OptionType::Put, 100.0, 100.0, 0.05, 0.2, 1.0, &[0.5]);
        assert_eq!(p, 0.0);
        assert_eq!(ctx.last_error(), ErrorCode::InvalidArgument);

        // Not increasing.
        let p = bermudan_price(
            &mut ctx,
            OptionType::Put,
            100.0,
            100.0,
            0.05,
            0.2,
            1.0,
            &[0.5, 0.25, 1.0],
        );
        assert_eq!(p, 0.0);
        assert_eq!(ctx.last_error(), ErrorCode::InvalidArgument);

        // Empty.
        let p = bermudan_price(&mut ctx, OptionType::Put, 100.0, 100.0, 0.05, 0.2, 1.0, &[]);
        assert_eq!(p, 0.0);
        assert_eq!(ctx.last_error(), ErrorCode::InvalidArgument);
    }

    #[test]
    fn test_bermudan_between_european_and_american() {
        let mut ctx = ctx_with(20_000, 50, 42);
        let american = american_price(&mut ctx, OptionType::Put, 100.0, 100.0, 0.05, 0.2, 1.0);

        let schedule: Vec<f64> = (1..=4).map(|j| j as f64 / 4.0).collect();
        let mut ctx2 = ctx_with(20_000, 50, 42);
        let bermudan = bermudan_price(
            &mut ctx2,
            OptionType::Put,
            100.0,
            100.0,
            0.05,
            0.2,
            1.0,
            &schedule,
        );

        let mut ctx3 = ctx_with(20_000, 50, 42);
        let european = crate::mc::engine::european_price(
            &mut ctx3,
            OptionType::Put,
            100.0,
            100.0,
            0.05,
            0.2,
            1.0,
        );

        assert!(
            european <= bermudan + 0.3 && bermudan <= american + 0.3,
            "ordering violated: E={} B={} A={}",
            european,
            bermudan,
            american
        );
    }

    #[test]
    fn test_zero_maturity_is_intrinsic() {
        let mut ctx = ctx_with(1_000, 50, 42);
        let price = american_price(&mut ctx, OptionType::Put, 90.0, 100.0, 0.05, 0.2, 0.0);
        assert_eq!(price, 10.0);
    }
}
