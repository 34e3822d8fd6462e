// src/mc/mod.rs
//! Monte Carlo pricing: parallel dispatch, payoff evaluation, the pricing
//! operations, early exercise, quasi-random sequences and variance
//! reduction.

pub mod barrier;
pub mod control_variate;
pub mod dispatch;
pub mod engine;
pub mod lsm;
pub mod payoffs;
pub mod sobol;

pub use barrier::barrier_price;
pub use control_variate::ControlVariateEstimator;
pub use engine::{
    asian_price, black76_price, digital_price, european_price, european_price_qmc, heston_price,
    lookback_price, merton_price, sabr_price,
};
pub use lsm::{american_price, bermudan_price};
pub use payoffs::{Averaging, BarrierStyle, DigitalKind, OptionType, Payoff, StrikeKind};
pub use sobol::SobolSequence;
