//! Average True Range.
//!
//! TR[i] = max(high - low, |high - prev_close|, |low - prev_close|)
//! ATR = simple mean of the last n true ranges. The first bar has no previous
//! close, so n + 1 bars are needed.

use crate::domain::indicator::{finite, sma::mean, tail};

/// max(high - low, |high - prev_close|, |low - prev_close|)
pub fn true_range(high: f64, low: f64, prev_close: f64) -> f64 {
    let hl = high - low;
    let hc = (high - prev_close).abs();
    let lc = (low - prev_close).abs();
    hl.max(hc).max(lc)
}

pub fn atr(highs: &[f64], lows: &[f64], closes: &[f64], period: usize) -> Option<f64> {
    let n = highs.len().min(lows.len()).min(closes.len());
    let needed = period.checked_add(1)?;
    if period == 0 || n < needed {
        return None;
    }
    let (highs, lows, closes) = (tail(highs, n), tail(lows, n), tail(closes, n));

    let ranges: Vec<f64> = (1..n)
        .map(|i| true_range(highs[i], lows[i], closes[i - 1]))
        .collect();
    mean(tail(&ranges, period)).and_then(finite)
}
