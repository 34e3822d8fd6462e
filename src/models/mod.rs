// src/models/mod.rs
//! Stochastic model kernels.
//!
//! Each model exposes a parameter block with precomputed constants (the hot
//! inner loop performs only adds, multiplies and one exponential per step)
//! and two kernel shapes: *terminal-only* where closed-form drift allows one
//! normal draw to produce S(T), and *stepped* where n draws produce a path.

pub mod black76;
pub mod gbm;
pub mod heston;
pub mod merton;
pub mod sabr;

pub use black76::{Black76, Black76Params};
pub use gbm::{Gbm, GbmParams};
pub use heston::{Heston, HestonParams, HestonScheme};
pub use merton::{Merton, MertonParams};
pub use sabr::{Sabr, SabrParams};

/// Identifier for the stochastic model a context is configured with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModelKind {
    #[default]
    Gbm,
    Black76,
    Heston,
    Sabr,
    MertonJump,
}
