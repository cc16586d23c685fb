//! JSON-lines archive adapter.
//!
//! Appends one object per evaluation: `{"date": ..., "debug": {...}}`.

use crate::domain::engine::DebugInfo;
use crate::domain::error::StrategraphError;
use crate::ports::archive_port::ArchivePort;
use chrono::NaiveDate;
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

#[derive(Serialize)]
struct ArchiveRecord<'a> {
    date: NaiveDate,
    debug: &'a DebugInfo,
}

pub struct JsonArchiveAdapter {
    writer: BufWriter<File>,
}

impl JsonArchiveAdapter {
    /// Opens `path` for appending, creating it if needed.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StrategraphError> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            writer: BufWriter::new(file),
        })
    }
}

impl ArchivePort for JsonArchiveAdapter {
    fn record(&mut self, date: NaiveDate, debug: &DebugInfo) -> Result<(), StrategraphError> {
        serde_json::to_writer(&mut self.writer, &ArchiveRecord { date, debug })?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), StrategraphError> {
        self.writer.flush()?;
        Ok(())
    }
}
