//! Domain error types.

/// Top-level error type for strategraph.
///
/// Routine "not enough data yet" conditions never surface here; indicators
/// return `None` for those and the run carries on.
#[derive(Debug, thiserror::Error)]
pub enum StrategraphError {
    /// `nodes` holds the labels the strategy document used.
    #[error("cycle detected among nodes [{}]", .nodes.join(", "))]
    CycleDetected { nodes: Vec<String> },

    #[error("invalid strategy graph: {reason}")]
    GraphParse { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("no market data in {origin}")]
    NoData { origin: String },

    #[error("market data error: {reason}")]
    Data { reason: String },

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&StrategraphError> for std::process::ExitCode {
    fn from(err: &StrategraphError) -> Self {
        let code: u8 = match err {
            StrategraphError::Io(_) => 1,
            StrategraphError::ConfigParse { .. }
            | StrategraphError::ConfigInvalid { .. } => 2,
            StrategraphError::NoData { .. } | StrategraphError::Data { .. } => 3,
            StrategraphError::CycleDetected { .. }
            | StrategraphError::GraphParse { .. }
            | StrategraphError::Json(_) => 4,
        };
        std::process::ExitCode::from(code)
    }
}
