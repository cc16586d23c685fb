//! Configuration validation.
//!
//! Validates the `[engine]`, `[backtest]` and `[direction]` sections and
//! builds the typed settings the engine and backtest driver consume. Missing
//! keys fall back to defaults; present but malformed keys are errors.

use crate::domain::backtest::BacktestConfig;
use crate::domain::direction::{Cue, Direction, DirectionRules};
use crate::domain::error::StrategraphError;
use crate::ports::config_port::ConfigPort;

pub const DEFAULT_LOG_LEVEL: &str = "info";

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

pub fn validate_config(config: &dyn ConfigPort) -> Result<(), StrategraphError> {
    validate_log_level(config)?;
    build_backtest_config(config)?;
    build_direction_rules(config)?;
    Ok(())
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> StrategraphError {
    StrategraphError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

fn validate_log_level(config: &dyn ConfigPort) -> Result<(), StrategraphError> {
    log_level(config).map(|_| ())
}

/// `[engine] log_level`, lowercased.
pub fn log_level(config: &dyn ConfigPort) -> Result<String, StrategraphError> {
    match config.get_string("engine", "log_level") {
        None => Ok(DEFAULT_LOG_LEVEL.to_string()),
        Some(raw) => {
            let level = raw.trim().to_ascii_lowercase();
            if LOG_LEVELS.contains(&level.as_str()) {
                Ok(level)
            } else {
                Err(invalid(
                    "engine",
                    "log_level",
                    format!("expected one of {}", LOG_LEVELS.join(", ")),
                ))
            }
        }
    }
}

fn non_negative(config: &dyn ConfigPort, section: &str, key: &str) -> Result<usize, StrategraphError> {
    match config.get_string(section, key) {
        None => Ok(0),
        Some(raw) => match raw.trim().parse::<i64>() {
            Ok(v) if v >= 0 => Ok(v as usize),
            Ok(_) => Err(invalid(section, key, format!("{} must be non-negative", key))),
            Err(_) => Err(invalid(section, key, format!("{} must be an integer", key))),
        },
    }
}

pub fn build_backtest_config(config: &dyn ConfigPort) -> Result<BacktestConfig, StrategraphError> {
    Ok(BacktestConfig {
        warmup_bars: non_negative(config, "backtest", "warmup_bars")?,
        history_window: non_negative(config, "backtest", "history_window")?,
        allow_short: config.get_bool("backtest", "allow_short", false),
    })
}

/// `[direction] priority` and `default`. Either key may be omitted.
pub fn build_direction_rules(config: &dyn ConfigPort) -> Result<DirectionRules, StrategraphError> {
    let fallback = match config.get_string("direction", "default") {
        None => Direction::Buy,
        Some(raw) => raw
            .parse::<Direction>()
            .map_err(|reason| invalid("direction", "default", reason))?,
    };

    let cues = match config.get_list("direction", "priority") {
        None => Cue::ALL.to_vec(),
        Some(names) => {
            let mut cues: Vec<Cue> = Vec::with_capacity(names.len());
            for name in &names {
                let cue = name
                    .parse::<Cue>()
                    .map_err(|reason| invalid("direction", "priority", reason))?;
                if cues.contains(&cue) {
                    return Err(invalid(
                        "direction",
                        "priority",
                        format!("duplicate cue '{}'", cue.name()),
                    ));
                }
                cues.push(cue);
            }
            cues
        }
    };

    Ok(DirectionRules::from_cues(&cues, fallback))
}
