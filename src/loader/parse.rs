//! Raw CSV reading and header detection.

use std::path::Path;

use csv::{ReaderBuilder, Trim};

use crate::errors::LoaderError;

/// One record as read from disk, before any typing.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRow {
    /// 1-based line number in the source file, for diagnostics.
    pub line: u64,
    pub values: Vec<String>,
}

/// A file's records paired with the column names they were read under.
#[derive(Debug, Clone, PartialEq)]
pub struct RawFrame {
    pub columns: Vec<String>,
    pub rows: Vec<RawRow>,
}

impl RawFrame {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }
}

/// Returns true when every value is empty after trimming.
pub fn is_blank(values: &[String]) -> bool {
    values.iter().all(|v| v.trim().is_empty())
}

/// A row is a header when its lower-cased values contain every expected name.
pub fn has_header_row(values: &[String], expected: &[String]) -> bool {
    let lowered: Vec<String> = values.iter().map(|v| v.trim().to_lowercase()).collect();
    expected.iter().all(|name| lowered.contains(name))
}

/// Reads `path` and names its columns.
///
/// The first non-blank record decides the layout: if it carries every name in
/// `raw_columns` it becomes the header (lower-cased) and is consumed;
/// otherwise `raw_columns` are assigned positionally and the record is kept
/// as data. Rows wider than the column set are rejected unless the extra
/// fields are empty.
pub fn read_raw_file(path: &Path, raw_columns: &[String]) -> Result<RawFrame, LoaderError> {
    let csv_err = |source| LoaderError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_path(path)
        .map_err(csv_err)?;

    let mut records = Vec::new();
    for result in reader.records() {
        let record = result.map_err(csv_err)?;
        let line = record.position().map_or(0, |p| p.line());
        records.push(RawRow {
            line,
            values: record.iter().map(str::to_string).collect(),
        });
    }

    let first = records
        .iter()
        .position(|r| !is_blank(&r.values))
        .ok_or_else(|| LoaderError::EmptyFile(path.to_path_buf()))?;

    let (columns, rows) = if has_header_row(&records[first].values, raw_columns) {
        let columns: Vec<String> = records[first]
            .values
            .iter()
            .map(|v| v.to_lowercase())
            .collect();
        (columns, records.split_off(first + 1))
    } else {
        (raw_columns.to_vec(), records.split_off(first))
    };

    for row in &rows {
        let extra = row.values.get(columns.len()..).unwrap_or_default();
        if !is_blank(extra) {
            return Err(LoaderError::MalformedRow {
                path: path.to_path_buf(),
                row: row.line as usize,
                expected: columns.len(),
                found: row.values.len(),
            });
        }
    }

    Ok(RawFrame { columns, rows })
}
