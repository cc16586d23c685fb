//! CSV file data adapter.
//!
//! Expects a header row followed by `date,open,high,low,close,volume`
//! records, dates as `YYYY-MM-DD`. Rows may be in any order; bars are
//! returned sorted by date.

use crate::domain::error::StrategraphError;
use crate::domain::ohlcv::OhlcvBar;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use csv::StringRecord;
use std::fs;
use std::path::PathBuf;

pub struct CsvAdapter {
    path: PathBuf,
}

impl CsvAdapter {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

fn column<'r>(record: &'r StringRecord, index: usize, name: &str) -> Result<&'r str, StrategraphError> {
    record
        .get(index)
        .map(str::trim)
        .ok_or_else(|| StrategraphError::Data {
            reason: format!("missing {} column", name),
        })
}

fn number(record: &StringRecord, index: usize, name: &str) -> Result<f64, StrategraphError> {
    let raw = column(record, index, name)?;
    let value: f64 = raw.parse().map_err(|e| StrategraphError::Data {
        reason: format!("invalid {} value '{}': {}", name, raw, e),
    })?;
    if !value.is_finite() {
        return Err(StrategraphError::Data {
            reason: format!("non-finite {} value '{}'", name, raw),
        });
    }
    Ok(value)
}

impl DataPort for CsvAdapter {
    fn fetch_ohlcv(
        &self,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<OhlcvBar>, StrategraphError> {
        let content = fs::read_to_string(&self.path)?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut bars = Vec::new();

        for result in rdr.records() {
            let record = result.map_err(|e| StrategraphError::Data {
                reason: format!("CSV parse error: {}", e),
            })?;

            let date_str = column(&record, 0, "date")?;
            let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d").map_err(|e| {
                StrategraphError::Data {
                    reason: format!("invalid date '{}': {}", date_str, e),
                }
            })?;

            if start_date.is_some_and(|start| date < start)
                || end_date.is_some_and(|end| date > end)
            {
                continue;
            }

            bars.push(OhlcvBar {
                date,
                open: number(&record, 1, "open")?,
                high: number(&record, 2, "high")?,
                low: number(&record, 3, "low")?,
                close: number(&record, 4, "close")?,
                volume: number(&record, 5, "volume")?,
            });
        }

        if bars.is_empty() {
            return Err(StrategraphError::NoData {
                origin: self.path.display().to_string(),
            });
        }

        bars.sort_by_key(|b| b.date);
        tracing::debug!(path = %self.path.display(), bars = bars.len(), "loaded bars");
        Ok(bars)
    }
}
