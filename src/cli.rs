//! CLI definition and dispatch.
//!
//! Command results go to stdout as JSON; progress, summaries and errors go
//! to stderr. Exit codes follow [`StrategraphError`]'s mapping.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::json_archive_adapter::JsonArchiveAdapter;
use crate::domain::backtest::{run_backtest, BacktestConfig};
use crate::domain::config_validation::{
    build_backtest_config, build_direction_rules, log_level, validate_config, DEFAULT_LOG_LEVEL,
};
use crate::domain::direction::{Direction, DirectionRules};
use crate::domain::engine::{DebugInfo, StrategyDefinition, StrategyGraph};
use crate::domain::error::StrategraphError;
use crate::domain::market::MarketData;
use crate::logging::init_logging;
use crate::ports::archive_port::ArchivePort;
use crate::ports::data_port::DataPort;

#[derive(Parser, Debug)]
#[command(name = "strategraph", about = "Trading strategy graph evaluator")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Evaluate a strategy against one market snapshot
    Evaluate {
        #[arg(short, long)]
        strategy: PathBuf,
        #[arg(short, long)]
        market: PathBuf,
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Check that a strategy graph builds and print its execution order
    Validate {
        #[arg(short, long)]
        strategy: PathBuf,
    },
    /// Replay a strategy over an OHLCV CSV file
    Backtest {
        #[arg(short, long)]
        strategy: PathBuf,
        #[arg(short, long)]
        data: PathBuf,
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Append per-bar debug info to this JSON-lines file
        #[arg(long)]
        archive: Option<PathBuf>,
        /// First bar date (YYYY-MM-DD)
        #[arg(long)]
        from: Option<NaiveDate>,
        /// Last bar date (YYYY-MM-DD)
        #[arg(long)]
        to: Option<NaiveDate>,
    },
}

/// Settings read from the optional INI file.
struct Settings {
    rules: DirectionRules,
    backtest: BacktestConfig,
}

#[derive(Serialize)]
struct EvaluateOutput<'a> {
    signal: Option<Direction>,
    debug_info: &'a DebugInfo,
}

#[derive(Serialize)]
struct ValidateOutput {
    nodes: usize,
    connections: usize,
    execution_order: Vec<String>,
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Evaluate {
            strategy,
            market,
            config,
        } => load_settings(config.as_deref())
            .and_then(|settings| run_evaluate(&strategy, &market, &settings)),
        Command::Validate { strategy } => {
            init_logging(DEFAULT_LOG_LEVEL);
            run_validate(&strategy)
        }
        Command::Backtest {
            strategy,
            data,
            config,
            archive,
            from,
            to,
        } => load_settings(config.as_deref()).and_then(|settings| {
            run_backtest_command(&strategy, &data, archive.as_deref(), from, to, &settings)
        }),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

/// Reads and validates the config file, then initialises logging from it.
fn load_settings(path: Option<&Path>) -> Result<Settings, StrategraphError> {
    let Some(path) = path else {
        init_logging(DEFAULT_LOG_LEVEL);
        return Ok(Settings {
            rules: DirectionRules::default(),
            backtest: BacktestConfig::default(),
        });
    };

    let adapter = FileConfigAdapter::from_file(path)?;
    validate_config(&adapter)?;
    init_logging(&log_level(&adapter)?);
    tracing::debug!(path = %path.display(), "config loaded");

    Ok(Settings {
        rules: build_direction_rules(&adapter)?,
        backtest: build_backtest_config(&adapter)?,
    })
}

pub fn load_strategy(path: &Path) -> Result<StrategyDefinition, StrategraphError> {
    let raw = fs::read_to_string(path)?;
    StrategyDefinition::from_json(&raw)
}

pub fn load_market(path: &Path) -> Result<MarketData, StrategraphError> {
    let raw = fs::read_to_string(path)?;
    serde_json::from_str(&raw).map_err(|e| StrategraphError::Data {
        reason: format!("invalid market snapshot {}: {}", path.display(), e),
    })
}

fn print_json<T: Serialize>(value: &T) -> Result<(), StrategraphError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn run_evaluate(strategy: &Path, market: &Path, settings: &Settings) -> Result<(), StrategraphError> {
    let def = load_strategy(strategy)?;
    let market = load_market(market)?;
    let graph = StrategyGraph::build(&def)?.with_direction_rules(settings.rules.clone());

    let eval = graph.evaluate(&market);
    print_json(&EvaluateOutput {
        signal: eval.signal,
        debug_info: &eval.debug,
    })
}

fn run_validate(strategy: &Path) -> Result<(), StrategraphError> {
    let def = load_strategy(strategy)?;
    let graph = StrategyGraph::build(&def)?;

    let dropped = def.connections.len().saturating_sub(graph.edge_count());
    if dropped > 0 {
        eprintln!("warning: {} connection(s) dropped", dropped);
    }
    print_json(&ValidateOutput {
        nodes: graph.node_count(),
        connections: graph.edge_count(),
        execution_order: graph.execution_order(),
    })
}

fn run_backtest_command(
    strategy: &Path,
    data: &Path,
    archive_path: Option<&Path>,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    settings: &Settings,
) -> Result<(), StrategraphError> {
    let def = load_strategy(strategy)?;
    let graph = StrategyGraph::build(&def)?.with_direction_rules(settings.rules.clone());

    eprintln!("Loading bars from {}", data.display());
    let bars = CsvAdapter::new(data.to_path_buf()).fetch_ohlcv(from, to)?;

    let mut archive = archive_path.map(JsonArchiveAdapter::open).transpose()?;
    eprintln!("Running backtest over {} bars", bars.len());
    let result = run_backtest(
        &graph,
        &bars,
        &settings.backtest,
        archive.as_mut().map(|a| a as &mut dyn ArchivePort),
    )?;

    eprintln!("\n=== Backtest Summary ===");
    eprintln!("Bars evaluated:   {}", result.bars_evaluated);
    eprintln!("Signals:          {}", result.events.len());
    eprintln!("Closed trades:    {}", result.trades.len());
    eprintln!("Raw P&L:          {:.4}", result.total_pnl());
    if let Some(path) = archive_path {
        eprintln!("Archive written to: {}", path.display());
    }

    print_json(&result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_backtest_arguments() {
        let cli = Cli::try_parse_from([
            "strategraph",
            "backtest",
            "--strategy",
            "s.json",
            "--data",
            "bars.csv",
            "--from",
            "2024-01-02",
        ])
        .unwrap();
        match cli.command {
            Command::Backtest {
                strategy,
                from,
                to,
                archive,
                ..
            } => {
                assert_eq!(strategy, PathBuf::from("s.json"));
                assert_eq!(from, NaiveDate::from_ymd_opt(2024, 1, 2));
                assert_eq!(to, None);
                assert_eq!(archive, None);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn evaluate_requires_market() {
        assert!(Cli::try_parse_from(["strategraph", "evaluate", "--strategy", "s.json"]).is_err());
    }

    #[test]
    fn rejects_bad_date() {
        assert!(Cli::try_parse_from([
            "strategraph",
            "backtest",
            "-s",
            "s.json",
            "-d",
            "bars.csv",
            "--to",
            "yesterday",
        ])
        .is_err());
    }
}
