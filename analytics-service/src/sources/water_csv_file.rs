use std::{fs, path::Path, path::PathBuf};

use once_cell::sync::Lazy;
use time::{format_description::BorrowedFormatItem, macros::format_description, Date, PrimitiveDateTime, Time};

use crate::{pipeline::PipelineError, transform::RawRow};

/// CSV source for the raw water-meter export.
///
/// Expected layout:
/// - a fixed number of preamble rows to skip,
/// - then rows of `date, time, <one reading per building column>`.
///
/// The export is a single-byte Latin-1 file, so the bytes are decoded
/// tolerantly before parsing. Rows with a malformed date or time are dropped
/// entirely (counted, never coerced); unparseable numeric cells become NaN
/// and are filled by interpolation downstream.
pub struct WaterCsvFileSource {
    path: PathBuf,
    skip_rows: usize,
    columns: usize,
}

static DATE_FORMATS: Lazy<[&'static [BorrowedFormatItem<'static>]; 2]> = Lazy::new(|| {
    [
        format_description!("[day]/[month]/[year]"),
        format_description!("[year]-[month]-[day]"),
    ]
});

static TIME_FORMATS: Lazy<[&'static [BorrowedFormatItem<'static>]; 2]> = Lazy::new(|| {
    [
        format_description!("[hour]:[minute]:[second]"),
        format_description!("[hour]:[minute]"),
    ]
});

impl WaterCsvFileSource {
    pub fn new<P: Into<PathBuf>>(path: P, skip_rows: usize, columns: usize) -> Self {
        Self {
            path: path.into(),
            skip_rows,
            columns,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Vec<RawRow>, PipelineError> {
        let bytes = fs::read(&self.path).map_err(|e| {
            PipelineError::Source(format!("failed to read {}: {e}", self.path.display()))
        })?;
        parse_records(&bytes, self.skip_rows, self.columns)
    }
}

/// Decodes Latin-1 bytes. Every byte maps to the Unicode code point of the
/// same value, so this cannot fail on arbitrary input.
fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

pub(crate) fn parse_records(
    bytes: &[u8],
    skip_rows: usize,
    columns: usize,
) -> Result<Vec<RawRow>, PipelineError> {
    let text = decode_latin1(bytes);
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut rows = Vec::new();
    let mut dropped = 0u64;
    for (idx, result) in rdr.records().enumerate() {
        let record =
            result.map_err(|e| PipelineError::Source(format!("failed to read CSV record: {e}")))?;
        if idx < skip_rows {
            continue;
        }
        match record_to_row(&record, columns) {
            Some(row) => rows.push(row),
            None => {
                dropped += 1;
                tracing::debug!(row = idx, "dropped row with malformed timestamp");
            }
        }
    }

    if dropped > 0 {
        metrics::counter!("water_csv_rows_dropped_total").increment(dropped);
        tracing::info!(dropped, "dropped rows with malformed timestamps");
    }

    Ok(rows)
}

fn parse_date(s: &str) -> Option<Date> {
    let s = s.trim();
    DATE_FORMATS.iter().find_map(|f| Date::parse(s, f).ok())
}

fn parse_time(s: &str) -> Option<Time> {
    let s = s.trim();
    TIME_FORMATS.iter().find_map(|f| Time::parse(s, f).ok())
}

fn record_to_row(record: &csv::StringRecord, columns: usize) -> Option<RawRow> {
    let date = parse_date(record.get(0)?)?;
    let time = parse_time(record.get(1)?)?;

    let mut values = Vec::with_capacity(columns);
    for j in 0..columns {
        let value = record
            .get(j + 2)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .and_then(|s| s.parse::<f64>().ok())
            .unwrap_or(f64::NAN);
        values.push(value);
    }

    Some(RawRow {
        ts: PrimitiveDateTime::new(date, time),
        values,
    })
}
