//! Series CSV ingest.
//!
//! Instrument exports usually carry a block of run metadata above the real
//! column header, so the first `header_row - 1` lines are skipped before CSV
//! parsing starts. Only the Ct column is read; every record becomes a
//! `RawRow` in file order, and the sequence is cut to the configured layout
//! length.
//!
//! Line numbers are counted on `\n`, so LF and CRLF files report the same lines.
//!
//! Nothing is parsed as a number here: a bad Ct value is reported by the
//! averaging stage, and only if that row is actually consumed.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::StringRecord;

use crate::domain::{ExperimentConfig, RawRow, SeriesRows};
use crate::error::QuantError;

/// Read one series file and return its rows, truncated to `expected_row_count`.
pub fn read_series(path: &Path, config: &ExperimentConfig) -> Result<SeriesRows, QuantError> {
    let file = File::open(path).map_err(|e| {
        QuantError::SourceUnavailable(format!("Failed to open '{}': {e}", path.display()))
    })?;
    let rows = read_series_from(file, config)?;

    let expected = config.expected_row_count();
    if rows.len() < expected {
        log::warn!(
            "'{}' has {} data rows; the layout needs {expected}",
            path.display(),
            rows.len()
        );
    }
    Ok(rows)
}

/// Parse series rows from any reader (see `read_series`).
pub fn read_series_from<R: Read>(
    mut reader: R,
    config: &ExperimentConfig,
) -> Result<SeriesRows, QuantError> {
    let mut data = Vec::new();
    reader
        .read_to_end(&mut data)
        .map_err(|e| QuantError::SourceUnavailable(format!("Failed to read series: {e}")))?;

    let (skipped, start) = preamble_end(&data, config.header_row.saturating_sub(1));
    let body = &data[start..];
    let newlines: Vec<usize> = body
        .iter()
        .enumerate()
        .filter(|(_, b)| **b == b'\n')
        .map(|(i, _)| i)
        .collect();

    let mut csv_reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(body);

    let headers = csv_reader
        .headers()
        .map_err(|e| QuantError::SourceUnavailable(format!("Failed to read CSV header: {e}")))?
        .clone();

    let ct_idx = find_column(&headers, &config.ct_column);
    if ct_idx.is_none() {
        log::warn!(
            "no `{}` column in header {:?}; every consumed row will be malformed",
            config.ct_column,
            headers.iter().collect::<Vec<_>>()
        );
    }

    let expected = config.expected_row_count();
    let mut rows = Vec::with_capacity(expected);
    let mut dropped = 0usize;

    for result in csv_reader.records() {
        let record = result
            .map_err(|e| QuantError::SourceUnavailable(format!("CSV parse error: {e}")))?;
        let start = first_content(body, record.position().map_or(0, |p| p.byte() as usize));
        let line = skipped + 1 + newlines.partition_point(|&nl| nl < start);

        if rows.len() == expected {
            dropped += 1;
            continue;
        }

        let ct = ct_idx
            .and_then(|i| record.get(i))
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        rows.push(RawRow { line, ct });
    }

    if dropped > 0 {
        log::debug!("dropped {dropped} rows past the expected {expected}");
    }

    Ok(rows)
}

/// Skip `n` physical lines: returns how many were skipped and where the rest starts.
fn preamble_end(data: &[u8], n: usize) -> (usize, usize) {
    let mut start = 0;
    for skipped in 0..n {
        match data[start..].iter().position(|&b| b == b'\n') {
            Some(i) => start += i + 1,
            None => return (skipped, data.len()),
        }
    }
    (n, start)
}

/// A record's position may still point at the previous terminator (`\n` of a
/// CRLF pair, or blank lines); step over those to the record's first byte.
fn first_content(body: &[u8], byte: usize) -> usize {
    let rest = body.get(byte..).unwrap_or_default();
    byte + rest.iter().take_while(|&&b| b == b'\r' || b == b'\n').count()
}

fn find_column(headers: &StringRecord, name: &str) -> Option<usize> {
    let wanted = normalize_header_name(name);
    headers
        .iter()
        .position(|h| normalize_header_name(h) == wanted)
}

fn normalize_header_name(name: &str) -> String {
    // Excel-style UTF-8 exports put a BOM on the first header.
    let name = name.trim_start_matches('\u{feff}').trim();
    name.to_ascii_lowercase()
}

/// Read a whole series from an in-memory string. Handy for tests and tools.
pub fn read_series_str(text: &str, config: &ExperimentConfig) -> Result<SeriesRows, QuantError> {
    read_series_from(text.as_bytes(), config)
}
