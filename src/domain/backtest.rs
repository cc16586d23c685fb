//! Backtest driver.
//!
//! Replays a bar series through a built [`StrategyGraph`], one snapshot per
//! bar. The snapshot for bar `i` is built from bars `..=i` only, so no
//! evaluation can see the future. Signals are paired into trades with raw
//! price P&L; sizing, costs and performance metrics are left to the caller.
//!
//! # Pairing Rules
//!
//! - Flat + BUY opens a long; flat + SELL opens a short when `allow_short`.
//! - SELL closes an open long; BUY closes an open short.
//! - A signal in the direction of the open position is ignored.
//! - Closing and re-opening never happen on the same bar.

use crate::domain::direction::Direction;
use crate::domain::engine::StrategyGraph;
use crate::domain::error::StrategraphError;
use crate::domain::market::MarketData;
use crate::domain::ohlcv::OhlcvBar;
use crate::ports::archive_port::ArchivePort;
use chrono::NaiveDate;
use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BacktestConfig {
    /// Bars skipped before the first evaluation.
    pub warmup_bars: usize,
    /// Bars of history per snapshot; 0 keeps everything up to the bar.
    pub history_window: usize,
    pub allow_short: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SignalEvent {
    pub date: NaiveDate,
    pub direction: Direction,
    pub price: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Long,
    Short,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trade {
    pub side: Side,
    pub entry_date: NaiveDate,
    pub entry_price: f64,
    pub exit_date: NaiveDate,
    pub exit_price: f64,
    pub pnl: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpenPosition {
    pub side: Side,
    pub entry_date: NaiveDate,
    pub entry_price: f64,
}

impl OpenPosition {
    fn close(self, exit_date: NaiveDate, exit_price: f64) -> Trade {
        let pnl = match self.side {
            Side::Long => exit_price - self.entry_price,
            Side::Short => self.entry_price - exit_price,
        };
        Trade {
            side: self.side,
            entry_date: self.entry_date,
            entry_price: self.entry_price,
            exit_date,
            exit_price,
            pnl,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BacktestResult {
    pub events: Vec<SignalEvent>,
    pub trades: Vec<Trade>,
    /// Position still open after the last bar.
    pub open_position: Option<OpenPosition>,
    pub bars_evaluated: usize,
}

impl BacktestResult {
    pub fn total_pnl(&self) -> f64 {
        self.trades.iter().map(|t| t.pnl).sum()
    }
}

pub fn run_backtest(
    graph: &StrategyGraph,
    bars: &[OhlcvBar],
    config: &BacktestConfig,
    mut archive: Option<&mut dyn ArchivePort>,
) -> Result<BacktestResult, StrategraphError> {
    let mut result = BacktestResult::default();

    for i in config.warmup_bars..bars.len() {
        let bar = &bars[i];
        let Some(market) = MarketData::from_bars(&bars[..=i], config.history_window) else {
            continue;
        };
        let eval = graph.evaluate(&market);
        result.bars_evaluated += 1;

        if let Some(sink) = archive.as_deref_mut() {
            sink.record(bar.date, &eval.debug)?;
        }

        let Some(direction) = eval.signal else {
            continue;
        };
        tracing::debug!(date = %bar.date, %direction, price = bar.close, "signal");
        result.events.push(SignalEvent {
            date: bar.date,
            direction,
            price: bar.close,
        });
        apply_signal(&mut result, direction, bar, config.allow_short);
    }

    if let Some(sink) = archive {
        sink.flush()?;
    }

    tracing::info!(
        bars = result.bars_evaluated,
        signals = result.events.len(),
        trades = result.trades.len(),
        pnl = result.total_pnl(),
        "backtest complete"
    );
    Ok(result)
}

fn apply_signal(result: &mut BacktestResult, direction: Direction, bar: &OhlcvBar, allow_short: bool) {
    let open_side = result.open_position.as_ref().map(|p| p.side);
    match (open_side, direction) {
        (Some(Side::Long), Direction::Sell) | (Some(Side::Short), Direction::Buy) => {
            if let Some(position) = result.open_position.take() {
                result.trades.push(position.close(bar.date, bar.close));
            }
        }
        (None, Direction::Buy) => {
            result.open_position = Some(OpenPosition {
                side: Side::Long,
                entry_date: bar.date,
                entry_price: bar.close,
            });
        }
        (None, Direction::Sell) if allow_short => {
            result.open_position = Some(OpenPosition {
                side: Side::Short,
                entry_date: bar.date,
                entry_price: bar.close,
            });
        }
        _ => {}
    }
}
