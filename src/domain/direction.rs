//! Trade direction and the inference table used when a signal fires without
//! an explicit direction.
//!
//! The priority order is data, not control flow: [`DirectionRules`] holds an
//! ordered list of `(Cue, Direction)` pairs and a fallback. The default table
//! reads RSI zones first, then EMA trend, then MACD momentum, then BUY.

use crate::domain::context::SignalContext;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Buy,
    Sell,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Buy => write!(f, "BUY"),
            Direction::Sell => write!(f, "SELL"),
        }
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "buy" | "long" => Ok(Direction::Buy),
            "sell" | "short" => Ok(Direction::Sell),
            other => Err(format!("unknown direction '{}'", other)),
        }
    }
}

/// A piece of indicator state direction inference can key on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cue {
    RsiOversold,
    RsiOverbought,
    EmaBullish,
    EmaBearish,
    MacdBullish,
    MacdBearish,
}

impl Cue {
    pub const ALL: [Cue; 6] = [
        Cue::RsiOversold,
        Cue::RsiOverbought,
        Cue::EmaBullish,
        Cue::EmaBearish,
        Cue::MacdBullish,
        Cue::MacdBearish,
    ];

    /// The direction a cue implies when it is present.
    pub fn implied_direction(self) -> Direction {
        match self {
            Cue::RsiOversold | Cue::EmaBullish | Cue::MacdBullish => Direction::Buy,
            Cue::RsiOverbought | Cue::EmaBearish | Cue::MacdBearish => Direction::Sell,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Cue::RsiOversold => "rsi_oversold",
            Cue::RsiOverbought => "rsi_overbought",
            Cue::EmaBullish => "ema_bullish",
            Cue::EmaBearish => "ema_bearish",
            Cue::MacdBullish => "macd_bullish",
            Cue::MacdBearish => "macd_bearish",
        }
    }

    fn is_present(self, ctx: &SignalContext) -> bool {
        match self {
            Cue::RsiOversold => ctx.rsi_oversold,
            Cue::RsiOverbought => ctx.rsi_overbought,
            Cue::EmaBullish => ctx.ema_bullish,
            Cue::EmaBearish => ctx.ema_bearish,
            Cue::MacdBullish => ctx.macd_bullish,
            Cue::MacdBearish => ctx.macd_bearish,
        }
    }
}

impl FromStr for Cue {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Cue::ALL
            .into_iter()
            .find(|cue| cue.name() == wanted)
            .ok_or_else(|| format!("unknown cue '{}'", s.trim()))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DirectionRules {
    pub priority: Vec<(Cue, Direction)>,
    pub fallback: Direction,
}

impl Default for DirectionRules {
    fn default() -> Self {
        Self::from_cues(&Cue::ALL, Direction::Buy)
    }
}

impl DirectionRules {
    pub fn from_cues(cues: &[Cue], fallback: Direction) -> Self {
        Self {
            priority: cues
                .iter()
                .map(|cue| (*cue, cue.implied_direction()))
                .collect(),
            fallback,
        }
    }

    /// First cue present in the context decides; otherwise the fallback.
    pub fn infer(&self, ctx: &SignalContext) -> Direction {
        self.priority
            .iter()
            .find(|(cue, _)| cue.is_present(ctx))
            .map(|(_, direction)| *direction)
            .unwrap_or(self.fallback)
    }
}
