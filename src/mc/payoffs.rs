// src/mc/payoffs.rs
//! Option Payoff Functions
//!
//! # Mathematical Definitions
//!
//! Payoffs operate on a simulated price path `[S_0, S_1, ..., S_T]`
//! (index 0 holds the initial value). Terminal payoffs read only the last
//! vertex; path-dependent payoffs fold over the whole slice.
//!
//! ## Vanilla
//! - **Call**: max(S_T - K, 0)
//! - **Put**: max(K - S_T, 0)
//!
//! ## Path-Dependent
//! - **Asian**: vanilla on the path average (arithmetic or geometric;
//!   index 0 is excluded from the average)
//! - **Lookback**: driven by the running min/max of the path
//! - **Digital**: indicator on the terminal value

use std::f64;

/// Call/put discriminator. The numeric values match the external surface
/// (call = 0, put = 1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionType {
    Call = 0,
    Put = 1,
}

impl OptionType {
    /// Vanilla intrinsic max(±(s - k), 0).
    #[inline]
    pub fn intrinsic(self, s: f64, k: f64) -> f64 {
        match self {
            OptionType::Call => (s - k).max(0.0),
            OptionType::Put => (k - s).max(0.0),
        }
    }
}

/// Arithmetic vs geometric averaging for Asian payoffs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Averaging {
    Arithmetic,
    Geometric,
}

/// Fixed vs floating strike for Asian and lookback payoffs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrikeKind {
    Fixed,
    Floating,
}

/// Cash-or-nothing vs asset-or-nothing for digital payoffs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DigitalKind {
    CashOrNothing,
    AssetOrNothing,
}

/// Barrier style: up/down crossing direction × knock-in/knock-out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BarrierStyle {
    DownIn,
    DownOut,
    UpIn,
    UpOut,
}

impl BarrierStyle {
    /// True for barriers above the spot (crossed from below).
    #[inline]
    pub fn is_up(self) -> bool {
        matches!(self, BarrierStyle::UpIn | BarrierStyle::UpOut)
    }

    /// True for knock-in styles (payoff activates on a hit).
    #[inline]
    pub fn is_in(self) -> bool {
        matches!(self, BarrierStyle::DownIn | BarrierStyle::UpIn)
    }
}

/// Path payoff evaluator for the path-dependent pricers
#[derive(Debug, Clone, Copy)]
pub enum Payoff {
    /// Vanilla on the terminal value.
    European { opt: OptionType, k: f64 },

    /// Fixed-strike Asian: vanilla on (average, K).
    AsianFixed {
        opt: OptionType,
        averaging: Averaging,
        k: f64,
    },

    /// Floating-strike Asian: vanilla on (terminal, average).
    AsianFloating {
        opt: OptionType,
        averaging: Averaging,
    },

    /// Fixed-strike lookback: call max(max(S) - K, 0), put max(K - min(S), 0).
    LookbackFixed { opt: OptionType, k: f64 },

    /// Floating-strike lookback: call S_T - min(S), put max(S) - S_T.
    LookbackFloating { opt: OptionType },

    /// Cash-or-nothing digital: Q·1[S_T > K] (put: <).
    DigitalCash { opt: OptionType, k: f64, q: f64 },

    /// Asset-or-nothing digital: S_T·1[S_T > K] (put: <).
    DigitalAsset { opt: OptionType, k: f64 },
}

impl Payoff {
    /// Evaluate the payoff on a full price path.
    pub fn calculate(&self, path: &[f64]) -> f64 {
        let terminal = match path.last() {
            Some(&s) => s,
            None => return 0.0,
        };

        match *self {
            Payoff::European { opt, k } => opt.intrinsic(terminal, k),

            Payoff::AsianFixed { opt, averaging, k } => {
                let avg = path_average(path, averaging);
                opt.intrinsic(avg, k)
            }

            Payoff::AsianFloating { opt, averaging } => {
                let avg = path_average(path, averaging);
                opt.intrinsic(terminal, avg)
            }

            Payoff::LookbackFixed { opt, k } => match opt {
                OptionType::Call => (path_max(path) - k).max(0.0),
                OptionType::Put => (k - path_min(path)).max(0.0),
            },

            Payoff::LookbackFloating { opt } => match opt {
                // Non-negative by construction: the extremum brackets S_T.
                OptionType::Call => terminal - path_min(path),
                OptionType::Put => path_max(path) - terminal,
            },

            Payoff::DigitalCash { opt, k, q } => {
                let in_the_money = match opt {
                    OptionType::Call => terminal > k,
                    OptionType::Put => terminal < k,
                };
                if in_the_money {
                    q
                } else {
                    0.0
                }
            }

            Payoff::DigitalAsset { opt, k } => {
                let in_the_money = match opt {
                    OptionType::Call => terminal > k,
                    OptionType::Put => terminal < k,
                };
                if in_the_money {
                    terminal
                } else {
                    0.0
                }
            }
        }
    }
}

/// Average over the observation vertices (index 0 excluded).
fn path_average(path: &[f64], averaging: Averaging) -> f64 {
    let obs = &path[1..];
    if obs.is_empty() {
        return path[0];
    }
    match averaging {
        Averaging::Arithmetic => obs.iter().sum::<f64>() / obs.len() as f64,
        Averaging::Geometric => {
            (obs.iter().map(|&s| s.ln()).sum::<f64>() / obs.len() as f64).exp()
        }
    }
}

fn path_min(path: &[f64]) -> f64 {
    path.iter().copied().fold(f64::INFINITY, f64::min)
}

fn path_max(path: &[f64]) -> f64 {
    path.iter().copied().fold(f64::NEG_INFINITY, f64::max)
}
