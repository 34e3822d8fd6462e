// src/context.rs
//! Simulation context: the process-local configuration object behind every
//! pricing call.
//!
//! A context carries the simulation shape (path count, step count, seed,
//! thread count), the variance-reduction switches, a model identifier, the
//! last-error slot and the master RNG state. Two contexts are fully
//! independent; a single context assumes one active pricing call at a time.

use crate::error::ErrorCode;
use crate::models::ModelKind;
use crate::rng::Xoshiro256;
use bitflags::bitflags;

/// Default number of simulation paths.
pub const DEFAULT_PATHS: usize = 100_000;
/// Default number of time steps for path-dependent pricers.
pub const DEFAULT_STEPS: usize = 252;
/// Default master seed.
pub const DEFAULT_SEED: u64 = 0;

bitflags! {
    /// Variance-reduction switches carried by the context.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct VarianceReduction: u32 {
        const NONE            = 0;
        const ANTITHETIC      = 1 << 0;
        const CONTROL_VARIATE = 1 << 1;
    }
}

/// Simulation context
///
/// Setter invariants: zero path/step counts are rejected silently (the
/// prior value is kept) and the thread count never drops below 1. Setting
/// the seed rebuilds the master RNG state; the master is read-only during
/// pricing — each call clones it and derives per-thread substreams by
/// jumping, so repeated calls with the same configuration are bit-identical.
#[derive(Debug, Clone)]
pub struct SimContext {
    paths: usize,
    steps: usize,
    seed: u64,
    threads: usize,
    vr: VarianceReduction,
    model: ModelKind,
    last_error: ErrorCode,
    master: Xoshiro256,
}

impl SimContext {
    /// New context with default configuration.
    pub fn new() -> Self {
        SimContext {
            paths: DEFAULT_PATHS,
            steps: DEFAULT_STEPS,
            seed: DEFAULT_SEED,
            threads: 1,
            vr: VarianceReduction::NONE,
            model: ModelKind::Gbm,
            last_error: ErrorCode::Success,
            master: Xoshiro256::from_seed_u64(DEFAULT_SEED),
        }
    }

    /// New context seeded from `seed`.
    pub fn with_seed(seed: u64) -> Self {
        let mut ctx = SimContext::new();
        ctx.set_seed(seed);
        ctx
    }

    /// Number of worker threads matching the available cores.
    pub fn auto_threads() -> usize {
        num_cpus::get().max(1)
    }

    pub fn paths(&self) -> usize {
        self.paths
    }

    /// Set the path count. Zero is rejected silently.
    pub fn set_paths(&mut self, paths: usize) {
        if paths > 0 {
            self.paths = paths;
        }
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Set the step/observation count. Zero is rejected silently.
    pub fn set_steps(&mut self, steps: usize) {
        if steps > 0 {
            self.steps = steps;
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Set the master seed and rebuild the master RNG state.
    pub fn set_seed(&mut self, seed: u64) {
        self.seed = seed;
        self.master = Xoshiro256::from_seed_u64(seed);
    }

    pub fn threads(&self) -> usize {
        self.threads
    }

    /// Set the worker thread count. Zero is rejected silently.
    pub fn set_threads(&mut self, threads: usize) {
        if threads > 0 {
            self.threads = threads;
        }
    }

    pub fn antithetic(&self) -> bool {
        self.vr.contains(VarianceReduction::ANTITHETIC)
    }

    pub fn set_antithetic(&mut self, enabled: bool) {
        self.vr.set(VarianceReduction::ANTITHETIC, enabled);
    }

    pub fn control_variate(&self) -> bool {
        self.vr.contains(VarianceReduction::CONTROL_VARIATE)
    }

    pub fn set_control_variate(&mut self, enabled: bool) {
        self.vr.set(VarianceReduction::CONTROL_VARIATE, enabled);
    }

    pub fn variance_reduction(&self) -> VarianceReduction {
        self.vr
    }

    pub fn model(&self) -> ModelKind {
        self.model
    }

    pub fn set_model(&mut self, model: ModelKind) {
        self.model = model;
    }

    /// Last error recorded by a pricing operation.
    pub fn last_error(&self) -> ErrorCode {
        self.last_error
    }

    /// Fixed English string for the last error.
    pub fn last_error_string(&self) -> &'static str {
        self.last_error.as_str()
    }

    /// Record an error code (used by the sentinel-returning wrappers).
    pub fn record_error(&mut self, code: ErrorCode) {
        self.last_error = code;
    }

    /// Clear the last-error slot back to success.
    pub fn clear_error(&mut self) {
        self.last_error = ErrorCode::Success;
    }

    /// Clone of the master RNG state for one pricing call.
    ///
    /// The master itself is never advanced; worker `i` of the call jumps
    /// the clone `i` times.
    pub fn master_rng(&self) -> Xoshiro256 {
        self.master.clone()
    }
}

impl Default for SimContext {
    fn default() -> Self {
        SimContext::new()
    }
}
