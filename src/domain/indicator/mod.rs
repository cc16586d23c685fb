//! Technical indicator library.
//!
//! Every indicator is a pure function over price/volume slices ordered oldest
//! to newest, ending at "now". Inputs are never mutated. Insufficient history,
//! zero periods and non-finite results all produce `None` rather than an
//! error; callers treat `None` as "not enough data yet".
//!
//! Where an indicator takes several slices of different lengths, they are
//! right-aligned: the most recent bars line up and the longer slice is
//! truncated from the front.

pub mod atr;
pub mod bollinger;
pub mod ema;
pub mod macd;
pub mod obv;
pub mod rsi;
pub mod sma;
pub mod stddev;
pub mod stochastic;
pub mod volume_spike;
pub mod vwap;

pub use atr::{atr, true_range};
pub use bollinger::{bollinger, BollingerBands};
pub use ema::{ema, ema_series};
pub use macd::{macd, MacdValue};
pub use obv::obv;
pub use rsi::rsi;
pub use sma::{mean, sma};
pub use stddev::population_stddev;
pub use stochastic::{stochastic, StochasticValue};
pub use volume_spike::{volume_spike, VolumeSpike};
pub use vwap::vwap;

/// `Some(v)` only for finite values.
pub(crate) fn finite(v: f64) -> Option<f64> {
    v.is_finite().then_some(v)
}

/// The last `n` elements of `values`.
pub(crate) fn tail(values: &[f64], n: usize) -> &[f64] {
    &values[values.len().saturating_sub(n)..]
}
