//! Market data snapshot fed to one engine run.
//!
//! Histories are ordered oldest to newest and end at "now"; the scalar fields
//! are expected to equal the last history element. That invariant is not
//! checked.

use crate::domain::ohlcv::OhlcvBar;
use serde::Deserialize;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct MarketData {
    pub close: f64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub volume: f64,
    pub close_history: Vec<f64>,
    pub high_history: Vec<f64>,
    pub low_history: Vec<f64>,
    pub volume_history: Vec<f64>,
}

impl MarketData {
    /// Snapshot whose "now" is the last bar. `window` caps how many bars of
    /// history are kept (0 keeps all). `None` for an empty slice.
    pub fn from_bars(bars: &[OhlcvBar], window: usize) -> Option<Self> {
        let last = bars.last()?;
        let start = if window == 0 {
            0
        } else {
            bars.len().saturating_sub(window)
        };
        let bars = &bars[start..];

        Some(Self {
            close: last.close,
            open: last.open,
            high: last.high,
            low: last.low,
            volume: last.volume,
            close_history: bars.iter().map(|b| b.close).collect(),
            high_history: bars.iter().map(|b| b.high).collect(),
            low_history: bars.iter().map(|b| b.low).collect(),
            volume_history: bars.iter().map(|b| b.volume).collect(),
        })
    }

    /// Snapshot built from closing prices only; high/low equal the close and
    /// volume is zero.
    pub fn from_closes(closes: &[f64]) -> Self {
        let last = closes.last().copied().unwrap_or_default();
        Self {
            close: last,
            open: last,
            high: last,
            low: last,
            volume: 0.0,
            close_history: closes.to_vec(),
            high_history: closes.to_vec(),
            low_history: closes.to_vec(),
            volume_history: vec![0.0; closes.len()],
        }
    }
}
