#![allow(dead_code)]

use chrono::NaiveDate;
use serde_json::{json, Value as JsonValue};
use strategraph::domain::engine::{StrategyDefinition, StrategyGraph};
use strategraph::domain::error::StrategraphError;
pub use strategraph::domain::market::MarketData;
pub use strategraph::domain::ohlcv::OhlcvBar;
use strategraph::ports::data_port::DataPort;

pub struct MockDataPort {
    pub bars: Vec<OhlcvBar>,
    pub error: Option<String>,
}

impl MockDataPort {
    pub fn new(bars: Vec<OhlcvBar>) -> Self {
        Self { bars, error: None }
    }

    pub fn with_error(mut self, reason: &str) -> Self {
        self.error = Some(reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_ohlcv(
        &self,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<OhlcvBar>, StrategraphError> {
        if let Some(reason) = &self.error {
            return Err(StrategraphError::Data {
                reason: reason.clone(),
            });
        }
        Ok(self
            .bars
            .iter()
            .filter(|b| start_date.is_none_or(|s| b.date >= s))
            .filter(|b| end_date.is_none_or(|e| b.date <= e))
            .cloned()
            .collect())
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn make_bar(date: &str, close: f64) -> OhlcvBar {
    OhlcvBar {
        date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
        open: close - 0.5,
        high: close + 1.0,
        low: close - 1.0,
        close,
        volume: 1000.0,
    }
}

/// One bar per day from 2024-01-01, closes from `closes`.
pub fn bars_from_closes(closes: &[f64]) -> Vec<OhlcvBar> {
    let start = date(2024, 1, 1);
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| OhlcvBar {
            date: start + chrono::Duration::days(i as i64),
            open: close - 0.5,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume: 1000.0 + (i % 7) as f64 * 100.0,
        })
        .collect()
}

pub fn rising(count: usize, start: f64, step: f64) -> Vec<f64> {
    (0..count).map(|i| start + step * i as f64).collect()
}

pub fn market(closes: &[f64]) -> MarketData {
    MarketData::from_bars(&bars_from_closes(closes), 0).unwrap()
}

pub fn definition(doc: JsonValue) -> StrategyDefinition {
    serde_json::from_value(doc).unwrap()
}

pub fn build(doc: JsonValue) -> StrategyGraph {
    StrategyGraph::build(&definition(doc)).unwrap()
}

/// EMA(fast) > EMA(slow) feeding a BUY signal node.
pub fn ema_cross_strategy(fast: usize, slow: usize) -> JsonValue {
    json!({
        "nodes": [
            {"id": "ema_fast", "type": "ema", "params": {"period": fast}},
            {"id": "ema_slow", "type": "ema", "params": {"period": slow}},
            {"id": "cmp", "type": "compare", "params": {"operator": ">"}},
            {"id": "buy", "type": "signal", "params": {"signal_type": "BUY"}}
        ],
        "connections": [
            {"source": "ema_fast", "target": "cmp", "sourcePort": "value", "targetPort": "a"},
            {"source": "ema_slow", "target": "cmp", "sourcePort": "value", "targetPort": "b"},
            {"source": "cmp", "target": "buy", "sourcePort": "result", "targetPort": "input"}
        ]
    })
}

/// RSI signal port feeding an untyped signal node.
pub fn rsi_strategy() -> JsonValue {
    json!({
        "nodes": [
            {"id": "rsi", "type": "rsi", "params": {"period": 14, "mode": "oversold"}},
            {"id": "sig", "type": "signal"}
        ],
        "connections": [
            {"source": "rsi", "target": "sig", "sourcePort": "signal"}
        ]
    })
}
