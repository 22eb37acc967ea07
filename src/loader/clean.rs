//! Row cleaning, typing and the output column contract.

use std::collections::HashSet;
use std::path::Path;

use chrono::NaiveDateTime;

use super::parse::{RawFrame, RawRow, is_blank};
use crate::errors::LoaderError;
use crate::table::{Table, Value};

pub const EVENT_TIMESTAMP: &str = "event_timestamp";
pub const VEHICLE_ID: &str = "vehicle_id";

const DATE: &str = "date";
const TIME: &str = "time";
const DWELL_TIME: &str = "dwell time";

/// How a raw text column is typed in the unified table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    Count,
    Coordinate,
    Text,
}

fn column_kind(name: &str) -> ColumnKind {
    match name {
        "ons" | "offs" => ColumnKind::Count,
        "latitude" | "longitude" => ColumnKind::Coordinate,
        _ => ColumnKind::Text,
    }
}

/// Lower-cased, non-empty names of a row, ignoring their order.
fn name_set<'a>(names: impl IntoIterator<Item = &'a String>) -> HashSet<String> {
    names
        .into_iter()
        .map(|n| n.trim().to_lowercase())
        .filter(|n| !n.is_empty())
        .collect()
}

/// A row is a repeated header when its names are exactly the column names,
/// in any order. Concatenated exports may order their headers differently.
fn is_repeated_header(values: &[String], header: &HashSet<String>) -> bool {
    name_set(values) == *header
}

/// Drops fully blank rows and header rows repeated anywhere in the file.
pub fn drop_noise_rows(frame: RawFrame) -> RawFrame {
    let RawFrame { columns, rows } = frame;
    let header = name_set(&columns);
    let rows = rows
        .into_iter()
        .filter(|row| !is_blank(&row.values) && !is_repeated_header(&row.values, &header))
        .collect();
    RawFrame { columns, rows }
}

/// Joins a date and a time with `T` and parses the result as ISO-8601.
pub fn parse_event_timestamp(date: &str, time: &str) -> Option<NaiveDateTime> {
    let joined = format!("{}T{}", date.trim(), time.trim());
    joined
        .parse::<NaiveDateTime>()
        .or_else(|_| NaiveDateTime::parse_from_str(&joined, "%Y-%m-%dT%H:%M"))
        .ok()
}

fn parse_count(raw: &str) -> Option<i64> {
    raw.parse::<i64>().ok().or_else(|| {
        let f = raw.parse::<f64>().ok()?;
        (f.is_finite() && f.fract() == 0.0).then_some(f as i64)
    })
}

fn coerce(
    path: &Path,
    row: &RawRow,
    column: &str,
    raw: &str,
) -> Result<Value, LoaderError> {
    if raw.is_empty() {
        return Ok(Value::Null);
    }
    let parsed = match column_kind(column) {
        ColumnKind::Count => parse_count(raw).map(Value::Integer),
        ColumnKind::Coordinate => raw
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .map(Value::Float),
        ColumnKind::Text => Some(Value::Text(raw.to_string())),
    };
    parsed.ok_or_else(|| LoaderError::InvalidValue {
        path: path.to_path_buf(),
        row: row.line as usize,
        column: column.to_string(),
        value: raw.to_string(),
    })
}

/// Types a cleaned frame into a table.
///
/// `date` and `time` are combined into `event_timestamp` (first column);
/// `date`, `time` and `dwell time` are dropped; counts and coordinates are
/// parsed; every other column is kept as text.
pub fn build_table(frame: RawFrame, path: &Path) -> Result<Table, LoaderError> {
    let missing = |column: &str| LoaderError::MissingColumn {
        path: path.to_path_buf(),
        column: column.to_string(),
    };
    let date_idx = frame.column_index(DATE).ok_or_else(|| missing(DATE))?;
    let time_idx = frame.column_index(TIME).ok_or_else(|| missing(TIME))?;

    let kept: Vec<(usize, &String)> = frame
        .columns
        .iter()
        .enumerate()
        .filter(|(_, name)| ![DATE, TIME, DWELL_TIME].contains(&name.as_str()))
        .collect();

    let mut table = Table::new(
        std::iter::once(EVENT_TIMESTAMP.to_string()).chain(kept.iter().map(|(_, n)| (*n).clone())),
    );

    for row in &frame.rows {
        let cell = |idx: usize| row.values.get(idx).map(String::as_str).unwrap_or("");
        let (date, time) = (cell(date_idx), cell(time_idx));

        let timestamp = parse_event_timestamp(date, time).ok_or_else(|| {
            LoaderError::InvalidTimestamp {
                path: path.to_path_buf(),
                row: row.line as usize,
                value: format!("{date}T{time}"),
            }
        })?;

        let mut values = Vec::with_capacity(kept.len() + 1);
        values.push(Value::Timestamp(timestamp));
        for (idx, name) in &kept {
            values.push(coerce(path, row, name, cell(*idx))?);
        }
        table.push_row(values);
    }

    Ok(table)
}

/// Selects exactly `output_columns`, in order, inserting nulls for any the
/// table lacks and dropping everything else.
pub fn enforce_output_columns(table: Table, output_columns: &[String]) -> Table {
    let mut enforced = Table::new(output_columns.iter().cloned());
    enforced.append(table);
    enforced
}
