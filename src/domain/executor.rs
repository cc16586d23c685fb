//! Node execution.
//!
//! [`execute`] runs one node against its resolved inputs and the market
//! snapshot. It returns the node's published ports and any context events
//! for the engine to fold; it never touches state outside its return value.
//!
//! # Port Semantics
//!
//! - Indicator nodes publish their numbers plus a derived boolean `signal`.
//!   Undefined results publish `Null` numbers and `signal = false`, and emit
//!   no event.
//! - Logic nodes publish `result`. Inputs are read through strict boolean
//!   coercion, so a raw indicator magnitude is never "truthy".
//! - Signal nodes publish `signal`; output nodes publish `result`.
//! - Unknown node types pass their inputs through unchanged.

use crate::domain::context::ContextEvent;
use crate::domain::indicator;
use crate::domain::inputs::{Inputs, PortMap};
use crate::domain::market::MarketData;
use crate::domain::node::{Band, CompareOp, Level, Momentum, NodeKind, Zone};
use crate::domain::value::{Signal, Value};

/// Tolerance for `==` / `!=` in compare nodes.
pub const COMPARE_EPSILON: f64 = 0.0001;

const PRICE_PORTS: [&str; 3] = ["prices", "price", "input"];

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeResult {
    pub outputs: PortMap,
    pub events: Vec<ContextEvent>,
}

impl NodeResult {
    fn ports<const N: usize>(pairs: [(&str, Value); N]) -> Self {
        Self {
            outputs: pairs
                .into_iter()
                .map(|(port, value)| (port.to_string(), value))
                .collect(),
            events: Vec::new(),
        }
    }

    fn with_event(mut self, event: ContextEvent) -> Self {
        self.events.push(event);
        self
    }
}

pub fn execute(kind: &NodeKind, inputs: Inputs, market: &MarketData) -> NodeResult {
    match kind {
        NodeKind::Price => NodeResult::ports([
            ("open", market.open.into()),
            ("high", market.high.into()),
            ("low", market.low.into()),
            ("close", market.close.into()),
            ("volume", market.volume.into()),
            ("value", market.close.into()),
            ("prices", Value::Series(market.close_history.clone())),
        ]),
        NodeKind::Constant { value } => NodeResult::ports([("value", (*value).into())]),
        NodeKind::Rsi {
            period,
            oversold,
            overbought,
            zone,
        } => {
            let prices = price_series(&inputs, market);
            match indicator::rsi(prices, *period) {
                Some(rsi) => {
                    let is_oversold = rsi < *oversold;
                    let is_overbought = rsi > *overbought;
                    let signal = match zone {
                        Zone::Oversold => is_oversold,
                        Zone::Overbought => is_overbought,
                    };
                    NodeResult::ports([
                        ("value", rsi.into()),
                        ("rsi", rsi.into()),
                        ("signal", signal.into()),
                    ])
                    .with_event(ContextEvent::RsiZone {
                        oversold: is_oversold,
                        overbought: is_overbought,
                    })
                }
                None => undefined(&["value", "rsi"]),
            }
        }
        NodeKind::Ema { period, level } => {
            let prices = price_series(&inputs, market);
            let close = current(prices, market);
            match indicator::ema(prices, *period) {
                Some(ema) => NodeResult::ports([
                    ("value", ema.into()),
                    ("ema", ema.into()),
                    ("signal", beyond(close, ema, *level).into()),
                ])
                .with_event(ContextEvent::EmaTrend {
                    bullish: close > ema,
                    bearish: close < ema,
                }),
                None => undefined(&["value", "ema"]),
            }
        }
        NodeKind::Sma { period, level } => {
            let prices = price_series(&inputs, market);
            let close = current(prices, market);
            match indicator::sma(prices, *period) {
                Some(sma) => NodeResult::ports([
                    ("value", sma.into()),
                    ("sma", sma.into()),
                    ("signal", beyond(close, sma, *level).into()),
                ]),
                None => undefined(&["value", "sma"]),
            }
        }
        NodeKind::Macd {
            fast,
            slow,
            signal,
            momentum,
        } => {
            let prices = price_series(&inputs, market);
            match indicator::macd(prices, *fast, *slow, *signal) {
                Some(m) => {
                    let fired = match momentum {
                        Momentum::Bullish => m.histogram > 0.0,
                        Momentum::Bearish => m.histogram < 0.0,
                    };
                    NodeResult::ports([
                        ("value", m.line.into()),
                        ("macd", m.line.into()),
                        ("signal_line", m.signal.into()),
                        ("histogram", m.histogram.into()),
                        ("signal", fired.into()),
                    ])
                    .with_event(ContextEvent::MacdMomentum {
                        histogram: m.histogram,
                    })
                }
                None => undefined(&["value", "macd", "signal_line", "histogram"]),
            }
        }
        NodeKind::Bollinger { period, k, band } => {
            let prices = price_series(&inputs, market);
            let close = current(prices, market);
            match indicator::bollinger(prices, *period, *k) {
                Some(bands) => {
                    let signal = match band {
                        Band::Lower => close <= bands.lower,
                        Band::Upper => close >= bands.upper,
                    };
                    NodeResult::ports([
                        ("value", bands.middle.into()),
                        ("upper", bands.upper.into()),
                        ("middle", bands.middle.into()),
                        ("lower", bands.lower.into()),
                        ("signal", signal.into()),
                    ])
                }
                None => undefined(&["value", "upper", "middle", "lower"]),
            }
        }
        NodeKind::Vwap { level } => {
            let prices = price_series(&inputs, market);
            let close = current(prices, market);
            match indicator::vwap(prices, &market.volume_history) {
                Some(vwap) => NodeResult::ports([
                    ("value", vwap.into()),
                    ("vwap", vwap.into()),
                    ("signal", beyond(close, vwap, *level).into()),
                ]),
                None => undefined(&["value", "vwap"]),
            }
        }
        NodeKind::Atr {
            period,
            threshold,
            level,
        } => match indicator::atr(
            &market.high_history,
            &market.low_history,
            &market.close_history,
            *period,
        ) {
            Some(atr) => NodeResult::ports([
                ("value", atr.into()),
                ("atr", atr.into()),
                ("signal", beyond(atr, *threshold, *level).into()),
            ]),
            None => undefined(&["value", "atr"]),
        },
        NodeKind::Obv { threshold, level } => {
            let closes = price_series(&inputs, market);
            match indicator::obv(closes, &market.volume_history) {
                Some(obv) => NodeResult::ports([
                    ("value", obv.into()),
                    ("obv", obv.into()),
                    ("signal", beyond(obv, *threshold, *level).into()),
                ]),
                None => undefined(&["value", "obv"]),
            }
        }
        NodeKind::Stochastic {
            k_period,
            d_period,
            oversold,
            overbought,
            zone,
        } => match indicator::stochastic(
            &market.high_history,
            &market.low_history,
            &market.close_history,
            *k_period,
            *d_period,
        ) {
            Some(stoch) => {
                let signal = match zone {
                    Zone::Oversold => stoch.k < *oversold,
                    Zone::Overbought => stoch.k > *overbought,
                };
                NodeResult::ports([
                    ("value", stoch.k.into()),
                    ("k", stoch.k.into()),
                    ("d", stoch.d.into()),
                    ("signal", signal.into()),
                ])
            }
            None => undefined(&["value", "k", "d"]),
        },
        NodeKind::VolumeSpike { period, multiplier } => {
            let spike = indicator::volume_spike(&market.volume_history, *period, *multiplier);
            NodeResult::ports([
                ("value", spike.ratio.into()),
                ("ratio", spike.ratio.into()),
                ("is_spike", spike.is_spike.into()),
                ("signal", spike.is_spike.into()),
            ])
        }
        NodeKind::And => logic_result(gate(&inputs, |a, b| a && b).is_true()),
        NodeKind::Or => logic_result(gate(&inputs, |a, b| a || b).is_true()),
        NodeKind::Not => {
            let negated = inputs
                .signal_of(&["input", "a"])
                .or(inputs.leading_signal())
                .negate();
            // nothing to negate reads as true
            logic_result(negated.or(Signal::True).is_true())
        }
        NodeKind::Compare { op, threshold } => logic_result(compare(&inputs, *op, *threshold)),
        NodeKind::Threshold { threshold, level } => {
            let passed = inputs
                .first_of(&["value", "input", "a"])
                .or_else(|| inputs.first())
                .and_then(Value::as_number)
                .is_some_and(|v| beyond(v, *threshold, *level));
            logic_result(passed)
        }
        NodeKind::Crossover { level } => {
            // Same-bar comparison only; the previous bar is never consulted.
            let fast = inputs.number(&["fast", "a"]);
            let slow = inputs.number(&["slow", "b"]);
            let crossed = match (fast, slow) {
                (Some(fast), Some(slow)) => beyond(fast, slow, *level),
                _ => false,
            };
            logic_result(crossed)
        }
        NodeKind::Signal { direction } => {
            let fired = inputs.leading_signal().is_true();
            let result = NodeResult::ports([("signal", fired.into())]);
            if fired {
                result.with_event(ContextEvent::SignalFired {
                    direction: *direction,
                })
            } else {
                result
            }
        }
        NodeKind::Output => logic_result(inputs.leading_signal().is_true()),
        NodeKind::Unknown(tag) => {
            tracing::debug!(node_type = %tag, "unknown node type, passing inputs through");
            NodeResult {
                outputs: inputs.into_port_map(),
                events: Vec::new(),
            }
        }
    }
}

/// Price history for a price indicator: a connected series wins over the
/// snapshot's close history.
fn price_series<'a>(inputs: &'a Inputs, market: &'a MarketData) -> &'a [f64] {
    inputs
        .first_of(&PRICE_PORTS)
        .and_then(Value::as_series)
        .unwrap_or(market.close_history.as_slice())
}

fn current(prices: &[f64], market: &MarketData) -> f64 {
    prices.last().copied().unwrap_or(market.close)
}

fn beyond(value: f64, reference: f64, level: Level) -> bool {
    match level {
        Level::Above => value > reference,
        Level::Below => value < reference,
    }
}

fn undefined(number_ports: &[&str]) -> NodeResult {
    let mut outputs: PortMap = number_ports
        .iter()
        .map(|port| (port.to_string(), Value::Null))
        .collect();
    outputs.insert("signal".to_string(), Value::Bool(false));
    NodeResult {
        outputs,
        events: Vec::new(),
    }
}

fn logic_result(result: bool) -> NodeResult {
    NodeResult::ports([("result", result.into())])
}

/// Binary gate over `a`/`b`, else the first two present inputs. An unset
/// side defers to the other, so a single input decides and none is `Unset`.
fn gate(inputs: &Inputs, op: fn(bool, bool) -> bool) -> Signal {
    let (a, b) = (inputs.signal("a"), inputs.signal("b"));
    if a.is_set() && b.is_set() {
        return a.combine(b, op);
    }
    let mut present = inputs.signals();
    let first = present.next().unwrap_or(Signal::Unset);
    let second = present.next().unwrap_or(Signal::Unset);
    first.combine(second, op)
}

fn compare(inputs: &Inputs, op: CompareOp, threshold: Option<f64>) -> bool {
    let left = inputs.first_of(&["a", "left"]).or_else(|| {
        inputs
            .iter()
            .find(|(port, _)| !matches!(*port, "b" | "right"))
            .map(|(_, value)| value)
    });
    let Some(a) = left.and_then(Value::as_number) else {
        return false;
    };
    let b = inputs
        .number(&["b", "right"])
        .or(threshold)
        .unwrap_or(0.0);

    match op {
        CompareOp::Gt => a > b,
        CompareOp::Ge => a >= b,
        CompareOp::Lt => a < b,
        CompareOp::Le => a <= b,
        CompareOp::Eq => (a - b).abs() < COMPARE_EPSILON,
        CompareOp::Ne => (a - b).abs() >= COMPARE_EPSILON,
    }
}
