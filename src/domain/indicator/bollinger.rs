//! Bollinger Bands.
//!
//! - Middle: SMA over n periods
//! - Upper: Middle + (k × StdDev)
//! - Lower: Middle - (k × StdDev)
//!
//! StdDev is the population standard deviation of the same window. A
//! negative multiplier is read by magnitude so `upper >= middle >= lower`
//! always holds.

use crate::domain::indicator::{finite, population_stddev, sma, tail};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BollingerBands {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

pub fn bollinger(prices: &[f64], period: usize, k: f64) -> Option<BollingerBands> {
    let middle = sma(prices, period)?;
    let stddev = population_stddev(tail(prices, period))?;
    let width = finite(k.abs() * stddev)?;

    Some(BollingerBands {
        upper: middle + width,
        middle,
        lower: middle - width,
    })
}
