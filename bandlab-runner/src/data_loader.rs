//! Bar loading from CSV.
//!
//! Expects a header row naming `timestamp,open,high,low,close,volume`; extra
//! columns are ignored. Timestamps are `YYYY-MM-DD` or `YYYY-MM-DD HH:MM:SS`.
//! Loaded bars are validated before they are returned, so everything that
//! reaches the engine has already passed ingestion checks.

use std::io::Read;
use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;
use thiserror::Error;

use bandlab_core::domain::{validate_bars, Bar, DataError};

/// Errors from the data loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot open {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: csv::Error,
    },

    #[error("row {row}: {source}")]
    Row {
        row: usize,
        #[source]
        source: csv::Error,
    },

    #[error("row {row}: unparsable timestamp '{value}'")]
    Timestamp { row: usize, value: String },

    #[error("data error: {0}")]
    Data(#[from] DataError),
}

#[derive(Debug, Deserialize)]
struct CsvBar {
    timestamp: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

/// Load and validate bars from a CSV file.
pub fn load_bars_csv(path: &Path) -> Result<Vec<Bar>, LoadError> {
    let reader = csv::Reader::from_path(path).map_err(|source| LoadError::Open {
        path: path.display().to_string(),
        source,
    })?;
    let bars = collect_bars(reader)?;
    tracing::debug!(path = %path.display(), bars = bars.len(), "loaded bars");
    Ok(bars)
}

/// Load and validate bars from any CSV source.
pub fn read_bars_csv<R: Read>(source: R) -> Result<Vec<Bar>, LoadError> {
    collect_bars(csv::Reader::from_reader(source))
}

fn collect_bars<R: Read>(mut reader: csv::Reader<R>) -> Result<Vec<Bar>, LoadError> {
    let mut bars = Vec::new();
    for (i, record) in reader.deserialize::<CsvBar>().enumerate() {
        // 1-based, counting the header as row 1
        let row = i + 2;
        let raw = record.map_err(|source| LoadError::Row { row, source })?;
        let timestamp = parse_timestamp(&raw.timestamp).ok_or_else(|| LoadError::Timestamp {
            row,
            value: raw.timestamp.clone(),
        })?;
        bars.push(Bar {
            timestamp,
            open: raw.open,
            high: raw.high,
            low: raw.low,
            close: raw.close,
            volume: raw.volume,
        });
    }
    validate_bars(&bars)?;
    Ok(bars)
}

/// Parse `YYYY-MM-DD HH:MM:SS`, or `YYYY-MM-DD` as midnight.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S")
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}
