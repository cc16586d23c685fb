//! Stochastic Oscillator.
//!
//! %K = 100 × (close - lowest_low) / (highest_high - lowest_low) over the last
//! k bars, or 50 when the range is zero.
//! %D = SMA(d) of %K, with %K recomputed for each of the last d windows. With
//! fewer than k + d - 1 bars, %D averages the windows that are available.

use crate::domain::indicator::{finite, sma::mean, tail};

pub const NEUTRAL_K: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StochasticValue {
    pub k: f64,
    pub d: f64,
}

/// %K for the window of `period` bars ending at `end` (inclusive).
fn percent_k(highs: &[f64], lows: &[f64], closes: &[f64], end: usize, period: usize) -> f64 {
    let start = end + 1 - period;
    let highest = highs[start..=end]
        .iter()
        .copied()
        .fold(f64::NEG_INFINITY, f64::max);
    let lowest = lows[start..=end]
        .iter()
        .copied()
        .fold(f64::INFINITY, f64::min);
    let range = highest - lowest;
    if range == 0.0 {
        NEUTRAL_K
    } else {
        100.0 * (closes[end] - lowest) / range
    }
}

pub fn stochastic(
    highs: &[f64],
    lows: &[f64],
    closes: &[f64],
    k_period: usize,
    d_period: usize,
) -> Option<StochasticValue> {
    let n = highs.len().min(lows.len()).min(closes.len());
    if k_period == 0 || d_period == 0 || n < k_period {
        return None;
    }
    let (highs, lows, closes) = (tail(highs, n), tail(lows, n), tail(closes, n));

    let windows = (n - k_period + 1).min(d_period);
    let ks: Vec<f64> = (0..windows)
        .rev()
        .map(|back| percent_k(highs, lows, closes, n - 1 - back, k_period))
        .collect();

    Some(StochasticValue {
        k: finite(*ks.last()?)?,
        d: mean(&ks)?,
    })
}
