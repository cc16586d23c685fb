//! Evaluation archive port.
//!
//! Archived debug info is an audit trail; nothing in the engine reads it back.

use crate::domain::engine::DebugInfo;
use crate::domain::error::StrategraphError;
use chrono::NaiveDate;

pub trait ArchivePort {
    fn record(&mut self, date: NaiveDate, debug: &DebugInfo) -> Result<(), StrategraphError>;

    fn flush(&mut self) -> Result<(), StrategraphError> {
        Ok(())
    }
}
