//! MACD (Moving Average Convergence Divergence).
//!
//! MACD Line = EMA(fast) - EMA(slow)
//! Signal Line = EMA(signal) over the full MACD line history, recomputed from
//! the price history on every call rather than carried as incremental state
//! Histogram = MACD Line - Signal Line
//!
//! Produces a value once `slow + signal` prices are available.

use crate::domain::indicator::{ema, ema_series, finite};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MacdValue {
    pub line: f64,
    pub signal: f64,
    pub histogram: f64,
}

/// MACD line history, one value per price from `max(fast, slow) - 1` onwards.
fn macd_line_history(prices: &[f64], fast: usize, slow: usize) -> Vec<f64> {
    let fast_series = ema_series(prices, fast);
    let slow_series = ema_series(prices, slow);
    let start = fast.max(slow) - 1;
    (start..prices.len())
        .map(|i| fast_series[i + 1 - fast] - slow_series[i + 1 - slow])
        .collect()
}

pub fn macd(prices: &[f64], fast: usize, slow: usize, signal_period: usize) -> Option<MacdValue> {
    if fast == 0 || slow == 0 || signal_period == 0 {
        return None;
    }
    let needed = slow.max(fast).checked_add(signal_period)?;
    if prices.len() < needed {
        return None;
    }

    let history = macd_line_history(prices, fast, slow);
    let line = finite(*history.last()?)?;
    let signal = ema(&history, signal_period)?;

    Some(MacdValue {
        line,
        signal,
        histogram: finite(line - signal)?,
    })
}
