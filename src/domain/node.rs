//! Strategy graph nodes.
//!
//! A node arrives as a loosely-typed [`NodeSpec`] (`{id, type, params}`) and is
//! parsed once into a [`Node`] whose [`NodeKind`] carries typed, defaulted
//! parameters. Unrecognised type tags become [`NodeKind::Unknown`] so that a
//! graph using a newer node type still runs.

use crate::domain::connection::{normalize_node_id, NodeId};
use crate::domain::direction::Direction;
use serde::Deserialize;
use serde_json::{Map, Value as JsonValue};

pub const DEFAULT_RSI_PERIOD: usize = 14;
pub const DEFAULT_OVERSOLD: f64 = 30.0;
pub const DEFAULT_OVERBOUGHT: f64 = 70.0;
pub const DEFAULT_MA_PERIOD: usize = 20;
pub const DEFAULT_MACD_FAST: usize = 12;
pub const DEFAULT_MACD_SLOW: usize = 26;
pub const DEFAULT_MACD_SIGNAL: usize = 9;
pub const DEFAULT_BOLLINGER_PERIOD: usize = 20;
pub const DEFAULT_BOLLINGER_K: f64 = 2.0;
pub const DEFAULT_ATR_PERIOD: usize = 14;
pub const DEFAULT_STOCH_K: usize = 14;
pub const DEFAULT_STOCH_D: usize = 3;
pub const DEFAULT_STOCH_OVERSOLD: f64 = 20.0;
pub const DEFAULT_STOCH_OVERBOUGHT: f64 = 80.0;
pub const DEFAULT_SPIKE_PERIOD: usize = 20;
pub const DEFAULT_SPIKE_MULTIPLIER: f64 = 2.0;

/// Largest accepted lookback. Larger values are clamped, which leaves the
/// indicator without enough history.
pub const MAX_PERIOD: usize = 1_000_000;

/// A node as it appears in a strategy document.
#[derive(Debug, Clone, Deserialize)]
pub struct NodeSpec {
    pub id: JsonValue,
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(default, alias = "data")]
    pub params: Map<String, JsonValue>,
}

/// Which side of a reference level satisfies a condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Above,
    Below,
}

/// RSI / Stochastic zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Zone {
    Oversold,
    Overbought,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Momentum {
    Bullish,
    Bearish,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Band {
    Lower,
    Upper,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Gt,
    Ge,
    Lt,
    Le,
    Eq,
    Ne,
}

impl CompareOp {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            ">" | "gt" | "greater" | "greater_than" => Some(CompareOp::Gt),
            ">=" | "gte" | "ge" => Some(CompareOp::Ge),
            "<" | "lt" | "less" | "less_than" => Some(CompareOp::Lt),
            "<=" | "lte" | "le" => Some(CompareOp::Le),
            "==" | "=" | "eq" | "equal" | "equals" => Some(CompareOp::Eq),
            "!=" | "<>" | "ne" | "neq" | "not_equal" => Some(CompareOp::Ne),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Price,
    Constant {
        value: f64,
    },
    Rsi {
        period: usize,
        oversold: f64,
        overbought: f64,
        zone: Zone,
    },
    Ema {
        period: usize,
        level: Level,
    },
    Sma {
        period: usize,
        level: Level,
    },
    Macd {
        fast: usize,
        slow: usize,
        signal: usize,
        momentum: Momentum,
    },
    Bollinger {
        period: usize,
        k: f64,
        band: Band,
    },
    Vwap {
        level: Level,
    },
    Atr {
        period: usize,
        threshold: f64,
        level: Level,
    },
    Obv {
        threshold: f64,
        level: Level,
    },
    Stochastic {
        k_period: usize,
        d_period: usize,
        oversold: f64,
        overbought: f64,
        zone: Zone,
    },
    VolumeSpike {
        period: usize,
        multiplier: f64,
    },
    And,
    Or,
    Not,
    Compare {
        op: CompareOp,
        threshold: Option<f64>,
    },
    Threshold {
        threshold: f64,
        level: Level,
    },
    Crossover {
        level: Level,
    },
    Signal {
        direction: Option<Direction>,
    },
    Output,
    Unknown(String),
}

/// Read-only view over a node's params with lenient typed getters.
struct Params<'a>(&'a Map<String, JsonValue>);

impl<'a> Params<'a> {
    fn raw(&self, keys: &[&str]) -> Option<&'a JsonValue> {
        keys.iter().find_map(|k| self.0.get(*k)).filter(|v| !v.is_null())
    }

    fn f64(&self, keys: &[&str]) -> Option<f64> {
        let value: Option<f64> = match self.raw(keys)? {
            JsonValue::Number(n) => n.as_f64(),
            JsonValue::String(s) => s.trim().parse().ok(),
            _ => None,
        };
        value.filter(|v| v.is_finite())
    }

    fn f64_or(&self, keys: &[&str], default: f64) -> f64 {
        self.f64(keys).unwrap_or(default)
    }

    fn usize_or(&self, keys: &[&str], default: usize) -> usize {
        match self.f64(keys) {
            Some(v) if v >= 0.0 && v.fract() == 0.0 => v.min(MAX_PERIOD as f64) as usize,
            _ => default,
        }
    }

    fn text(&self, keys: &[&str]) -> Option<String> {
        match self.raw(keys)? {
            JsonValue::String(s) => Some(s.trim().to_ascii_lowercase()),
            _ => None,
        }
    }

    fn level(&self, keys: &[&str], default: Level) -> Level {
        match self.text(keys).as_deref() {
            Some("above" | "over" | "bullish" | "up" | "greater" | ">") => Level::Above,
            Some("below" | "under" | "bearish" | "down" | "less" | "<") => Level::Below,
            _ => default,
        }
    }

    fn zone(&self) -> Zone {
        match self.text(&["mode", "condition", "zone"]).as_deref() {
            Some("overbought" | "sell" | "above") => Zone::Overbought,
            _ => Zone::Oversold,
        }
    }
}

impl NodeKind {
    /// Parse a type tag and its params. Tags are case-insensitive.
    pub fn parse(node_type: &str, params: &Map<String, JsonValue>) -> Self {
        let p = Params(params);
        let tag = node_type.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        match tag.as_str() {
            "price" | "market_data" | "marketdata" | "close" => NodeKind::Price,
            "constant" | "number" | "value" => NodeKind::Constant {
                value: p.f64_or(&["value", "constant"], 0.0),
            },
            "rsi" => NodeKind::Rsi {
                period: p.usize_or(&["period", "length"], DEFAULT_RSI_PERIOD),
                oversold: p.f64_or(&["oversold", "lower"], DEFAULT_OVERSOLD),
                overbought: p.f64_or(&["overbought", "upper"], DEFAULT_OVERBOUGHT),
                zone: p.zone(),
            },
            "ema" => NodeKind::Ema {
                period: p.usize_or(&["period", "length"], DEFAULT_MA_PERIOD),
                level: p.level(&["mode", "condition"], Level::Above),
            },
            "sma" | "ma" => NodeKind::Sma {
                period: p.usize_or(&["period", "length"], DEFAULT_MA_PERIOD),
                level: p.level(&["mode", "condition"], Level::Above),
            },
            "macd" => NodeKind::Macd {
                fast: p.usize_or(&["fast", "fast_period", "fastPeriod"], DEFAULT_MACD_FAST),
                slow: p.usize_or(&["slow", "slow_period", "slowPeriod"], DEFAULT_MACD_SLOW),
                signal: p.usize_or(
                    &["signal", "signal_period", "signalPeriod"],
                    DEFAULT_MACD_SIGNAL,
                ),
                momentum: match p.level(&["mode", "condition"], Level::Above) {
                    Level::Above => Momentum::Bullish,
                    Level::Below => Momentum::Bearish,
                },
            },
            "bollinger" | "bollinger_bands" | "bollingerbands" | "bb" => NodeKind::Bollinger {
                period: p.usize_or(&["period", "length"], DEFAULT_BOLLINGER_PERIOD),
                k: p.f64_or(
                    &["std_dev", "stdDev", "k", "multiplier", "std"],
                    DEFAULT_BOLLINGER_K,
                ),
                band: match p.text(&["mode", "band", "condition"]).as_deref() {
                    Some("upper" | "overbought" | "above") => Band::Upper,
                    _ => Band::Lower,
                },
            },
            "vwap" => NodeKind::Vwap {
                level: p.level(&["mode", "condition"], Level::Above),
            },
            "atr" => NodeKind::Atr {
                period: p.usize_or(&["period", "length"], DEFAULT_ATR_PERIOD),
                threshold: p.f64_or(&["threshold"], 0.0),
                level: p.level(&["mode", "condition"], Level::Above),
            },
            "obv" => NodeKind::Obv {
                threshold: p.f64_or(&["threshold"], 0.0),
                level: p.level(&["mode", "condition"], Level::Above),
            },
            "stochastic" | "stoch" => NodeKind::Stochastic {
                k_period: p.usize_or(&["k_period", "kPeriod", "period"], DEFAULT_STOCH_K),
                d_period: p.usize_or(&["d_period", "dPeriod"], DEFAULT_STOCH_D),
                oversold: p.f64_or(&["oversold", "lower"], DEFAULT_STOCH_OVERSOLD),
                overbought: p.f64_or(&["overbought", "upper"], DEFAULT_STOCH_OVERBOUGHT),
                zone: p.zone(),
            },
            "volume_spike" | "volumespike" | "volume" => NodeKind::VolumeSpike {
                period: p.usize_or(&["period", "lookback"], DEFAULT_SPIKE_PERIOD),
                multiplier: p.f64_or(&["multiplier", "threshold"], DEFAULT_SPIKE_MULTIPLIER),
            },
            "and" => NodeKind::And,
            "or" => NodeKind::Or,
            "not" => NodeKind::Not,
            "compare" | "comparison" | "condition" => NodeKind::Compare {
                op: p
                    .text(&["operator", "op", "comparison"])
                    .and_then(|op| CompareOp::parse(&op))
                    .unwrap_or(CompareOp::Gt),
                threshold: p.f64(&["threshold", "value"]),
            },
            "threshold" => NodeKind::Threshold {
                threshold: p.f64_or(&["threshold", "value"], 0.0),
                level: p.level(&["direction", "mode"], Level::Above),
            },
            "crossover" | "cross" => NodeKind::Crossover {
                level: p.level(&["direction", "mode"], Level::Above),
            },
            "signal" | "buy" | "sell" => NodeKind::Signal {
                direction: match tag.as_str() {
                    "buy" => Some(Direction::Buy),
                    "sell" => Some(Direction::Sell),
                    _ => p
                        .text(&["signal_type", "signalType", "type", "direction", "action"])
                        .and_then(|d| d.parse().ok()),
                },
            },
            "output" | "result" => NodeKind::Output,
            _ => NodeKind::Unknown(node_type.to_string()),
        }
    }

    /// Canonical lowercase tag, used in logs.
    pub fn tag(&self) -> &str {
        match self {
            NodeKind::Price => "price",
            NodeKind::Constant { .. } => "constant",
            NodeKind::Rsi { .. } => "rsi",
            NodeKind::Ema { .. } => "ema",
            NodeKind::Sma { .. } => "sma",
            NodeKind::Macd { .. } => "macd",
            NodeKind::Bollinger { .. } => "bollinger",
            NodeKind::Vwap { .. } => "vwap",
            NodeKind::Atr { .. } => "atr",
            NodeKind::Obv { .. } => "obv",
            NodeKind::Stochastic { .. } => "stochastic",
            NodeKind::VolumeSpike { .. } => "volume_spike",
            NodeKind::And => "and",
            NodeKind::Or => "or",
            NodeKind::Not => "not",
            NodeKind::Compare { .. } => "compare",
            NodeKind::Threshold { .. } => "threshold",
            NodeKind::Crossover { .. } => "crossover",
            NodeKind::Signal { .. } => "signal",
            NodeKind::Output => "output",
            NodeKind::Unknown(tag) => tag,
        }
    }
}

/// A parsed, immutable graph node.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: NodeId,
    /// The id as written in the strategy document.
    pub label: String,
    pub kind: NodeKind,
}

impl Node {
    pub fn new(id: NodeId, label: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            id,
            label: label.into(),
            kind,
        }
    }

    /// Returns `None` when the id is neither a number nor a string.
    pub fn from_spec(spec: &NodeSpec) -> Option<Self> {
        let id = normalize_node_id(&spec.id)?;
        let label = match &spec.id {
            JsonValue::String(s) => s.trim().to_string(),
            other => other.to_string(),
        };
        Some(Self::new(id, label, NodeKind::parse(&spec.node_type, &spec.params)))
    }
}
