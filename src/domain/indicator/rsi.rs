//! RSI (Relative Strength Index) with Wilder's smoothing.
//!
//! - First average: simple mean of gains/losses over the first n deltas
//! - Subsequent: avg = (prev_avg * (n-1) + current) / n
//!
//! Formula: RSI = 100 - (100 / (1 + avg_gain / avg_loss))
//! If avg_loss == 0: RSI = 100
//!
//! Needs n + 1 prices (n deltas) before it produces a value.

use crate::domain::indicator::finite;

pub fn rsi(prices: &[f64], period: usize) -> Option<f64> {
    let needed = period.checked_add(1)?;
    if period == 0 || prices.len() < needed {
        return None;
    }

    let deltas: Vec<f64> = prices.windows(2).map(|w| w[1] - w[0]).collect();
    let gain = |d: f64| if d > 0.0 { d } else { 0.0 };
    let loss = |d: f64| if d < 0.0 { -d } else { 0.0 };

    let mut avg_gain = deltas[..period].iter().map(|d| gain(*d)).sum::<f64>() / period as f64;
    let mut avg_loss = deltas[..period].iter().map(|d| loss(*d)).sum::<f64>() / period as f64;

    for d in &deltas[period..] {
        avg_gain = (avg_gain * (period - 1) as f64 + gain(*d)) / period as f64;
        avg_loss = (avg_loss * (period - 1) as f64 + loss(*d)) / period as f64;
    }

    let value = if avg_loss == 0.0 {
        100.0
    } else {
        100.0 - (100.0 / (1.0 + avg_gain / avg_loss))
    };
    finite(value)
}
