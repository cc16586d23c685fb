//! Exponential Moving Average.
//!
//! k = 2/(n+1), seeded with the SMA of the first n prices, then
//! EMA[i] = P[i]*k + EMA[i-1]*(1-k).

use crate::domain::indicator::finite;

/// EMA values from index `period - 1` onwards. Empty when there is not enough
/// history or `period` is 0.
pub fn ema_series(prices: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || prices.len() < period {
        return Vec::new();
    }

    let k = 2.0 / (period as f64 + 1.0);
    let mut values = Vec::with_capacity(prices.len() - period + 1);
    let mut ema = prices[..period].iter().sum::<f64>() / period as f64;
    values.push(ema);

    for price in &prices[period..] {
        ema = price * k + ema * (1.0 - k);
        values.push(ema);
    }

    values
}

/// EMA at the most recent price.
pub fn ema(prices: &[f64], period: usize) -> Option<f64> {
    ema_series(prices, period).last().copied().and_then(finite)
}
