//! Integration tests for graph evaluation and the backtest driver.
//!
//! Tests cover:
//! - Canonical scenarios: EMA crossover BUY, RSI oversold BUY
//! - Strict boolean coercion across logic gates
//! - Disconnected nodes, partial AND inputs, fail-safe signal nodes
//! - Cycle rejection through both the hard and the non-throwing entry points
//! - Direction inference priority driven by indicator context
//! - Connection dialect equivalence and determinism
//! - Backtest replay through a mock data port

mod common;

use common::*;
use serde_json::json;
use strategraph::domain::backtest::{run_backtest, BacktestConfig, Side};
use strategraph::domain::direction::{Direction, DirectionRules};
use strategraph::domain::engine::{run_strategy, StrategyGraph};
use strategraph::domain::error::StrategraphError;
use strategraph::domain::value::Value;
use strategraph::ports::data_port::DataPort;

mod canonical_scenarios {
    use super::*;

    #[test]
    fn ema_crossover_on_rising_prices_buys() {
        let graph = build(ema_cross_strategy(9, 21));
        let eval = graph.evaluate(&market(&rising(100, 100.0, 1.0)));

        assert_eq!(eval.signal, Some(Direction::Buy));
        let fast = eval.debug.node_outputs["ema_fast"]["value"].as_number().unwrap();
        let slow = eval.debug.node_outputs["ema_slow"]["value"].as_number().unwrap();
        assert!(fast > slow);
        assert_eq!(eval.debug.node_outputs["cmp"]["result"], Value::Bool(true));
        assert_eq!(eval.debug.decided_by.as_deref(), Some("buy"));
    }

    #[test]
    fn ema_crossover_on_falling_prices_stays_flat() {
        let graph = build(ema_cross_strategy(9, 21));
        let eval = graph.evaluate(&market(&rising(100, 300.0, -1.0)));
        assert_eq!(eval.signal, None);
        assert!(!eval.debug.final_condition);
    }

    #[test]
    fn rsi_oversold_on_falling_prices_buys() {
        let graph = build(rsi_strategy());
        let eval = graph.evaluate(&market(&rising(50, 200.0, -2.0)));

        let rsi = eval.debug.node_outputs["rsi"]["rsi"].as_number().unwrap();
        assert!(rsi < 30.0);
        assert_eq!(eval.debug.node_outputs["sig"]["signal"], Value::Bool(true));
        assert!(eval.debug.context.rsi_oversold);
        assert_eq!(eval.signal, Some(Direction::Buy));
    }

    #[test]
    fn rsi_without_enough_history_is_null_and_silent() {
        let graph = build(rsi_strategy());
        let eval = graph.evaluate(&market(&rising(10, 200.0, -2.0)));
        assert_eq!(eval.debug.node_outputs["rsi"]["rsi"], Value::Null);
        assert_eq!(eval.signal, None);
    }
}

mod strict_boolean_gates {
    use super::*;

    #[test]
    fn rsi_magnitude_is_false_in_and_gate() {
        let graph = build(json!({
            "nodes": [
                {"id": "rsi", "type": "rsi"},
                {"id": "one", "type": "constant", "params": {"value": 1}},
                {"id": "and", "type": "and"},
                {"id": "out", "type": "output"}
            ],
            "connections": [
                {"source": "rsi", "target": "and", "sourcePort": "value", "targetPort": "a"},
                {"source": "one", "target": "and", "targetPort": "b"},
                {"source": "and", "target": "out", "sourcePort": "result"}
            ]
        }));
        let eval = graph.evaluate(&market(&rising(40, 100.0, 0.5)));

        assert_eq!(eval.debug.node_outputs["rsi"]["value"], Value::Number(100.0));
        assert_eq!(eval.debug.node_outputs["and"]["result"], Value::Bool(false));
        assert_eq!(eval.signal, None);
    }

    #[test]
    fn integer_and_float_one_are_true() {
        for value in [json!(1), json!(1.0), json!("1")] {
            let graph = build(json!({
                "nodes": [
                    {"id": 1, "type": "constant", "params": {"value": value}},
                    {"id": 2, "type": "output"}
                ],
                "connections": [{"sourceNode": 1, "targetNode": 2}]
            }));
            let eval = graph.evaluate(&MarketData::default());
            assert_eq!(eval.signal, Some(Direction::Buy));
        }
    }

    #[test]
    fn zero_is_false() {
        let graph = build(json!({
            "nodes": [
                {"id": 1, "type": "constant", "params": {"value": 0}},
                {"id": 2, "type": "output"}
            ],
            "connections": [{"sourceNode": 1, "targetNode": 2}]
        }));
        assert_eq!(graph.evaluate(&MarketData::default()).signal, None);
    }
}

mod graph_shape {
    use super::*;

    #[test]
    fn disconnected_nodes_all_execute() {
        let graph = build(json!({
            "nodes": [
                {"id": "px", "type": "price"},
                {"id": "zero", "type": "constant", "params": {"value": 0}},
                {"id": "rsi", "type": "rsi"},
                {"id": "out", "type": "output"}
            ],
            "connections": []
        }));
        let eval = graph.evaluate(&market(&rising(30, 100.0, 1.0)));

        assert_eq!(eval.debug.node_outputs.len(), 4);
        for label in ["px", "zero", "rsi", "out"] {
            assert!(eval.debug.node_outputs.contains_key(label), "missing {}", label);
        }
        assert_eq!(eval.debug.execution_order, vec!["px", "zero", "rsi", "out"]);
        assert_eq!(eval.debug.node_outputs["out"]["result"], Value::Bool(false));
        assert_eq!(eval.signal, None);
    }

    #[test]
    fn partial_and_never_fails() {
        let graph = build(json!({
            "nodes": [
                {"id": "one", "type": "constant", "params": {"value": 1}},
                {"id": "and", "type": "and"},
                {"id": "lonely", "type": "and"},
                {"id": "out", "type": "output"}
            ],
            "connections": [
                {"source": "one", "target": "and", "targetPort": "a"},
                {"source": "and", "target": "out", "sourcePort": "result"}
            ]
        }));
        let eval = graph.evaluate(&MarketData::default());
        assert_eq!(eval.debug.node_outputs["and"]["result"], Value::Bool(true));
        assert_eq!(eval.debug.node_outputs["lonely"]["result"], Value::Bool(false));
        assert_eq!(eval.signal, Some(Direction::Buy));
    }

    #[test]
    fn signal_node_without_resolvable_input_is_fail_safe() {
        let graph = build(json!({
            "nodes": [
                {"id": "mystery", "type": "ichimoku"},
                {"id": "buy", "type": "signal", "params": {"signal_type": "BUY"}}
            ],
            "connections": [
                {"source": "mystery", "target": "buy", "sourcePort": "cloud"}
            ]
        }));
        let eval = graph.evaluate(&market(&rising(30, 100.0, 1.0)));
        assert!(eval.debug.node_outputs["mystery"].is_empty());
        assert_eq!(eval.debug.node_outputs["buy"]["signal"], Value::Bool(false));
        assert_eq!(eval.signal, None);
    }

    #[test]
    fn ring_is_rejected() {
        let def = definition(json!({
            "nodes": [
                {"id": 1, "type": "and"},
                {"id": 2, "type": "or"},
                {"id": 3, "type": "not"}
            ],
            "connections": [
                {"sourceNode": 1, "targetNode": 2},
                {"sourceNode": 2, "targetNode": 3},
                {"sourceNode": 3, "targetNode": 1}
            ]
        }));
        match StrategyGraph::build(&def) {
            Err(StrategraphError::CycleDetected { nodes }) => {
                assert_eq!(nodes, ["1", "2", "3"]);
            }
            other => panic!("expected cycle, got {:?}", other.map(|_| ())),
        }

        let (signal, debug) = run_strategy(&def, &MarketData::default(), &DirectionRules::default());
        assert_eq!(signal, None);
        assert!(debug.node_outputs.is_empty());
        assert_eq!(
            debug.error.as_deref(),
            Some("cycle detected among nodes [1, 2, 3]")
        );
    }

    #[test]
    fn malformed_connections_are_dropped() {
        let graph = build(json!({
            "nodes": [
                {"id": 1, "type": "constant", "params": {"value": 1}},
                {"id": 2, "type": "output"}
            ],
            "connections": [
                {"sourceNode": 1, "targetNode": 2},
                {"sourceNode": 1, "targetNode": 99},
                {"weird": true},
                "not even an object"
            ]
        }));
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.evaluate(&MarketData::default()).signal, Some(Direction::Buy));
    }

    #[test]
    fn connection_dialects_are_equivalent() {
        let nodes = json!([
            {"id": "px", "type": "price"},
            {"id": "sma", "type": "sma", "params": {"period": 5}},
            {"id": "out", "type": "output"}
        ]);
        let dialects = [
            json!([
                {"from": {"nodeId": "px", "port": "prices"}, "to": {"nodeId": "sma", "port": "prices"}},
                {"from": {"nodeId": "sma", "port": "signal"}, "to": {"nodeId": "out", "port": "input"}}
            ]),
            json!([
                {"source": "px", "target": "sma", "sourceHandle": "prices", "targetHandle": "prices"},
                {"source": "sma", "target": "out", "sourceHandle": "signal"}
            ]),
            json!([
                {"sourceNode": "px", "targetNode": "sma", "sourcePort": "prices", "targetPort": "prices"},
                {"sourceNode": "sma", "targetNode": "out", "sourcePort": "signal", "targetPort": "input"}
            ]),
        ];

        let md = market(&rising(20, 50.0, 1.0));
        let results: Vec<String> = dialects
            .iter()
            .map(|connections| {
                let graph = build(json!({"nodes": nodes, "connections": connections}));
                serde_json::to_string(&graph.evaluate(&md).debug).unwrap()
            })
            .collect();

        assert_eq!(results[0], results[1]);
        assert_eq!(results[1], results[2]);
    }
}

mod direction_inference {
    use super::*;

    fn untyped_with(indicators: serde_json::Value) -> serde_json::Value {
        let mut nodes = indicators.as_array().cloned().unwrap();
        nodes.push(json!({"id": "one", "type": "constant", "params": {"value": 1}}));
        nodes.push(json!({"id": "sig", "type": "signal"}));
        json!({
            "nodes": nodes,
            "connections": [{"source": "one", "target": "sig"}]
        })
    }

    #[test]
    fn ema_bearish_infers_sell() {
        let graph = build(untyped_with(json!([{"id": "ema", "type": "ema", "params": {"period": 9}}])));
        let eval = graph.evaluate(&market(&rising(40, 200.0, -1.0)));
        assert!(eval.debug.context.ema_bearish);
        assert_eq!(eval.signal, Some(Direction::Sell));
    }

    #[test]
    fn rsi_oversold_outranks_ema_bearish() {
        let graph = build(untyped_with(json!([
            {"id": "ema", "type": "ema", "params": {"period": 9}},
            {"id": "rsi", "type": "rsi"}
        ])));
        let eval = graph.evaluate(&market(&rising(40, 200.0, -1.0)));
        assert!(eval.debug.context.rsi_oversold);
        assert!(eval.debug.context.ema_bearish);
        assert_eq!(eval.signal, Some(Direction::Buy));
    }

    #[test]
    fn macd_bearish_infers_sell() {
        let graph = build(untyped_with(json!([{"id": "macd", "type": "macd"}])));
        let closes: Vec<f64> = rising(60, 100.0, 1.0)
            .into_iter()
            .chain(rising(20, 159.0, -3.0))
            .collect();
        let eval = graph.evaluate(&market(&closes));
        assert!(eval.debug.context.macd_bearish);
        assert_eq!(eval.signal, Some(Direction::Sell));
    }

    #[test]
    fn typed_signal_ignores_context() {
        let graph = build(json!({
            "nodes": [
                {"id": "rsi", "type": "rsi"},
                {"id": "sell", "type": "signal", "params": {"signal_type": "SELL"}}
            ],
            "connections": [{"source": "rsi", "target": "sell", "sourcePort": "signal"}]
        }));
        let eval = graph.evaluate(&market(&rising(50, 200.0, -2.0)));
        assert!(eval.debug.context.rsi_oversold);
        assert_eq!(eval.signal, Some(Direction::Sell));
    }
}

mod determinism {
    use super::*;

    #[test]
    fn repeated_evaluation_is_byte_identical() {
        let graph = build(ema_cross_strategy(5, 13));
        let md = market(&rising(60, 10.0, 0.25));

        let first = serde_json::to_string(&graph.evaluate(&md).debug).unwrap();
        for _ in 0..50 {
            let again = serde_json::to_string(&graph.evaluate(&md).debug).unwrap();
            assert_eq!(first, again);
        }

        let rebuilt = build(ema_cross_strategy(5, 13));
        assert_eq!(first, serde_json::to_string(&rebuilt.evaluate(&md).debug).unwrap());
    }
}

mod backtest_replay {
    use super::*;

    #[test]
    fn crossover_fires_on_every_bar_fast_is_above() {
        // Same-bar comparison: a persistent trend keeps firing rather than
        // signalling once at the actual cross.
        let graph = build(json!({
            "nodes": [
                {"id": "f", "type": "ema", "params": {"period": 9}},
                {"id": "s", "type": "ema", "params": {"period": 21}},
                {"id": "x", "type": "crossover", "params": {"direction": "above"}},
                {"id": "buy", "type": "signal", "params": {"signal_type": "BUY"}}
            ],
            "connections": [
                {"source": "f", "target": "x", "targetPort": "fast"},
                {"source": "s", "target": "x", "targetPort": "slow"},
                {"source": "x", "target": "buy", "sourcePort": "result"}
            ]
        }));
        let bars = bars_from_closes(&rising(100, 100.0, 1.0));
        let result = run_backtest(&graph, &bars, &BacktestConfig::default(), None).unwrap();

        assert_eq!(result.events.len(), 80);
        assert!(result.events.iter().all(|e| e.direction == Direction::Buy));
        assert_eq!(result.events[0].date, bars[20].date);
        assert!(result.trades.is_empty());
        assert_eq!(
            result.open_position.as_ref().map(|p| p.side),
            Some(Side::Long)
        );
    }

    #[test]
    fn pipeline_through_data_port() {
        let closes: Vec<f64> = rising(40, 100.0, 1.0)
            .into_iter()
            .chain(rising(40, 139.0, -1.0))
            .collect();
        let port = MockDataPort::new(bars_from_closes(&closes));
        let bars = port.fetch_ohlcv(None, None).unwrap();

        let graph = build(json!({
            "nodes": [
                {"id": "fast", "type": "sma", "params": {"period": 5}},
                {"id": "slow", "type": "sma", "params": {"period": 20}},
                {"id": "up", "type": "compare", "params": {"operator": ">"}},
                {"id": "down", "type": "compare", "params": {"operator": "<"}},
                {"id": "buy", "type": "signal", "params": {"signal_type": "BUY"}},
                {"id": "sell", "type": "signal", "params": {"signal_type": "SELL"}}
            ],
            "connections": [
                {"source": "fast", "target": "up", "sourcePort": "sma", "targetPort": "a"},
                {"source": "slow", "target": "up", "sourcePort": "sma", "targetPort": "b"},
                {"source": "fast", "target": "down", "sourcePort": "sma", "targetPort": "a"},
                {"source": "slow", "target": "down", "sourcePort": "sma", "targetPort": "b"},
                {"source": "up", "target": "buy", "sourcePort": "result"},
                {"source": "down", "target": "sell", "sourcePort": "result"}
            ]
        }));
        let config = BacktestConfig {
            warmup_bars: 19,
            ..BacktestConfig::default()
        };
        let result = run_backtest(&graph, &bars, &config, None).unwrap();

        assert_eq!(result.bars_evaluated, 61);
        assert_eq!(result.trades.len(), 1);
        let trade = &result.trades[0];
        assert_eq!(trade.side, Side::Long);
        assert_eq!(trade.entry_date, bars[19].date);
        assert!(trade.exit_date > trade.entry_date);
    }

    #[test]
    fn data_port_errors_propagate() {
        let port = MockDataPort::new(vec![]).with_error("feed offline");
        let err = port.fetch_ohlcv(None, None).unwrap_err();
        assert_eq!(err.to_string(), "market data error: feed offline");
    }

    #[test]
    fn data_port_date_filter() {
        let port = MockDataPort::new(vec![
            make_bar("2024-01-01", 10.0),
            make_bar("2024-01-02", 11.0),
            make_bar("2024-01-03", 12.0),
        ]);
        let bars = port
            .fetch_ohlcv(Some(date(2024, 1, 2)), Some(date(2024, 1, 2)))
            .unwrap();
        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].close, 11.0);
    }
}
