// src/mc/dispatch.rs
//! Parallel dispatch and reduction.
//!
//! # Protocol
//!
//! A pricing call fans its simulation index range [0, N) out over exactly T
//! worker threads. Worker `i`:
//! - owns the range [⌊i·N/T⌋, ⌊(i+1)·N/T⌋) — the ranges partition [0, N);
//! - owns an RNG equal to the master state jumped exactly `i` times;
//! - owns its accumulator and transient buffers; workers never interact
//!   after initialization, and no locks are held inside the inner loop.
//!
//! For T = 1 the call runs inline on the caller's thread with no
//! synchronization at all. After all joins complete, partial accumulators
//! are merged in thread-id order, so the result is a deterministic function
//! of (seed, thread count, path count). Changing the thread count changes
//! the bit-exact result; reproducibility is only claimed at constant thread
//! count.
//!
//! # Failure
//!
//! If worker `i` fails to spawn, workers 0..i-1 are joined (the scope
//! guarantees this), resources are released, and the call maps to the
//! threading-error code.

use crate::error::{PricingError, PricingResult};
use crate::rng::Xoshiro256;
use log::debug;
use std::thread;

/// Per-thread partial state merged during reduction.
pub trait Accumulator: Send {
    /// Fold another partial into this one. Called in thread-id order.
    fn merge(&mut self, other: Self);
}

/// Plain sum / sum-of-squares partial accumulator.
#[derive(Debug, Clone, Copy, Default)]
pub struct SumStats {
    pub sum: f64,
    pub sum_sq: f64,
    pub n: u64,
}

impl SumStats {
    #[inline]
    pub fn add(&mut self, x: f64) {
        self.sum += x;
        self.sum_sq += x * x;
        self.n += 1;
    }

    /// Sample mean over `count` samples (the caller supplies the divisor so
    /// antithetic pairing can report 2·pairs).
    pub fn mean_over(&self, count: usize) -> f64 {
        self.sum / count as f64
    }

    /// Variance of the mean estimator over `count` samples.
    pub fn variance_of_mean(&self, count: usize) -> f64 {
        let n = count as f64;
        if n < 2.0 {
            return 0.0;
        }
        let mean = self.sum / n;
        ((self.sum_sq / n - mean * mean) / (n - 1.0)).max(0.0)
    }
}

impl Accumulator for SumStats {
    fn merge(&mut self, other: Self) {
        self.sum += other.sum;
        self.sum_sq += other.sum_sq;
        self.n += other.n;
    }
}

/// Run `sims` simulation indices over `threads` workers and reduce.
///
/// `init` builds each worker's accumulator; `body` processes one simulation
/// index with the worker's own RNG. The master is cloned, never advanced.
pub fn dispatch<A, I, F>(
    master: &Xoshiro256,
    sims: usize,
    threads: usize,
    init: I,
    body: F,
) -> PricingResult<A>
where
    A: Accumulator,
    I: Fn() -> A + Sync,
    F: Fn(&mut Xoshiro256, usize, &mut A) + Sync,
{
    if threads <= 1 {
        let mut rng = master.clone();
        let mut acc = init();
        for idx in 0..sims {
            body(&mut rng, idx, &mut acc);
        }
        return Ok(acc);
    }

    debug!("dispatching {} simulations over {} workers", sims, threads);

    thread::scope(|scope| {
        let mut handles = Vec::with_capacity(threads);
        let mut stream = master.clone();

        for worker in 0..threads {
            let lo = worker * sims / threads;
            let hi = (worker + 1) * sims / threads;
            let mut rng = stream.clone();
            stream.jump();

            let init = &init;
            let body = &body;
            let spawned = thread::Builder::new()
                .name(format!("mc-worker-{}", worker))
                .spawn_scoped(scope, move || {
                    let mut acc = init();
                    for idx in lo..hi {
                        body(&mut rng, idx, &mut acc);
                    }
                    acc
                });

            match spawned {
                Ok(handle) => handles.push(handle),
                Err(e) => {
                    // Drain already-running workers before reporting; their
                    // partials are discarded.
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

        // Reduction: partial sums added in thread-id order.
        let mut merged: Option<A> = None;
        for (worker, handle) in handles.into_iter().enumerate() {
            let partial = handle.join().map_err(|_| PricingError::ThreadSpawn {
                worker,
                reason: "worker panicked".to_string(),
            })?;
            match merged.as_mut() {
                Some(acc) => acc.merge(partial),
                None => merged = Some(partial),
            }
        }
        // threads >= 2 here, so at least one partial was produced.
        merged.ok_or_else(|| PricingError::ThreadSpawn {
            worker: 0,
            reason: "no worker results".to_string(),
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sum_indices(master: &Xoshiro256, sims: usize, threads: usize) -> SumStats {
        dispatch(master, sims, threads, SumStats::default, |_rng, idx, acc| {
            acc.add(idx as f64)
        })
        .expect("dispatch should succeed")
    }

    #[test]
    fn test_partition_covers_all_indices() {
        let master = Xoshiro256::from_seed_u64(42);
        for threads in [1, 2, 3, 4, 7] {
            let stats = sum_indices(&master, 1000, threads);
            assert_eq!(stats.n, 1000);
            assert_eq!(stats.sum, (0..1000).sum::<usize>() as f64);
        }
    }

    #[test]
    fn test_same_thread_count_is_bit_identical() {
        let master = Xoshiro256::from_seed_u64(42);
        let run = |threads: usize| {
            dispatch(&master, 10_000, threads, SumStats::default, |rng, _idx, acc| {
                acc.add(rng.next_normal())
            })
            .expect("dispatch should succeed")
        };
        let a = run(4);
        let b = run(4);
        assert_eq!(a.sum.to_bits(), b.sum.to_bits());
        assert_eq!(a.sum_sq.to_bits(), b.sum_sq.to_bits());
    }

    #[test]
    fn test_thread_count_changes_result() {
        let master = Xoshiro256::from_seed_u64(42);
        let run = |threads: usize| {
            dispatch(&master, 10_000, threads, SumStats::default, |rng, _idx, acc| {
                acc.add(rng.next_normal())
            })
            .expect("dispatch should succeed")
            .sum
        };
        // Different substream assignment: documented non-invariance.
        assert_ne!(run(1).to_bits(), run(4).to_bits());
    }

    #[test]
    fn test_worker_streams_are_jumped_master() {
        // Thread i must consume the master jumped i times: emulate two
        // workers by hand and compare against the dispatcher.
        let master = Xoshiro256::from_seed_u64(42);
        let sims = 10;

        let parallel = dispatch(&master, sims, 2, SumStats::default, |rng, _idx, acc| {
            acc.add(rng.next_uniform())
        })
        .expect("dispatch should succeed");

        // Reduction adds whole partials in thread-id order, so the
        // reference sums each worker's range separately first.
        let mut sum0 = 0.0;
        let mut rng0 = master.clone();
        for _ in 0..5 {
            sum0 += rng0.next_uniform();
        }
        let mut sum1 = 0.0;
        let mut rng1 = master.jumped(1);
        for _ in 0..5 {
            sum1 += rng1.next_uniform();
        }

        assert_eq!(parallel.sum.to_bits(), (sum0 + sum1).to_bits());
    }

    #[test]
    fn test_variance_of_mean() {
        let mut stats = SumStats::default();
        for x in [1.0, 2.0, 3.0, 4.0] {
            stats.add(x);
        }
        assert!((stats.mean_over(4) - 2.5).abs() < 1e-12);
        // Sample variance of {1,2,3,4} is 5/3; variance of the mean is 5/12.
        assert!((stats.variance_of_mean(4) - 5.0 / 12.0).abs() < 1e-9);
    }
}
