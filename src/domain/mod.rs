//! Core domain types and logic.

pub mod backtest;
pub mod config_validation;
pub mod connection;
pub mod context;
pub mod direction;
pub mod engine;
pub mod error;
pub mod executor;
pub mod graph;
pub mod indicator;
pub mod inputs;
pub mod market;
pub mod node;
pub mod ohlcv;
pub mod resolver;
pub mod value;
