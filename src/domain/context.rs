//! Per-run signal context.
//!
//! Nodes never write shared state. Each node execution returns zero or more
//! [`ContextEvent`]s, and the engine folds them, in execution order, into a
//! fresh [`SignalContext`] once the topological pass is complete.
//!
//! Fold rules: indicator fields are last-writer-wins (a later RSI node
//! overrides an earlier one); `signal_fires` is sticky and `signal_type`
//! keeps the first direction that fired.

use crate::domain::direction::Direction;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq)]
pub enum ContextEvent {
    RsiZone { oversold: bool, overbought: bool },
    EmaTrend { bullish: bool, bearish: bool },
    MacdMomentum { histogram: f64 },
    SignalFired { direction: Option<Direction> },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SignalContext {
    pub rsi_oversold: bool,
    pub rsi_overbought: bool,
    pub ema_bullish: bool,
    pub ema_bearish: bool,
    pub macd_bullish: bool,
    pub macd_bearish: bool,
    pub signal_fires: bool,
    pub signal_type: Option<Direction>,
}

impl SignalContext {
    pub fn apply(&mut self, event: &ContextEvent) {
        match event {
            ContextEvent::RsiZone {
                oversold,
                overbought,
            } => {
                self.rsi_oversold = *oversold;
                self.rsi_overbought = *overbought;
            }
            ContextEvent::EmaTrend { bullish, bearish } => {
                self.ema_bullish = *bullish;
                self.ema_bearish = *bearish;
            }
            ContextEvent::MacdMomentum { histogram } => {
                self.macd_bullish = *histogram > 0.0;
                self.macd_bearish = *histogram < 0.0;
            }
            ContextEvent::SignalFired { direction } => {
                if !self.signal_fires {
                    self.signal_type = *direction;
                }
                self.signal_fires = true;
            }
        }
    }

    pub fn fold<'a, I>(events: I) -> Self
    where
        I: IntoIterator<Item = &'a ContextEvent>,
    {
        let mut ctx = SignalContext::default();
        for event in events {
            ctx.apply(event);
        }
        ctx
    }
}
