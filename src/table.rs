//! In-memory row store shared by the loader and the processor.

use std::fmt;

use chrono::{NaiveDateTime, Timelike};

/// A single cell of the unified table.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Integer(i64),
    Float(f64),
    /// Timezone-naive local instant.
    Timestamp(NaiveDateTime),
    Text(String),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Name of the variant, used in type-mismatch errors.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::Timestamp(_) => "timestamp",
            Value::Text(_) => "text",
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }
}

/// Formats a timestamp as ISO-8601, with fractional seconds only when present.
pub fn format_timestamp(ts: &NaiveDateTime) -> String {
    if ts.nanosecond() == 0 {
        ts.format("%Y-%m-%dT%H:%M:%S").to_string()
    } else {
        ts.format("%Y-%m-%dT%H:%M:%S%.f").to_string()
    }
}

/// Nulls render as empty strings, matching an empty CSV field.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Integer(i) => write!(f, "{i}"),
            // Integral floats keep a ".0" so coordinates never read as integers.
            Value::Float(v) if v.is_finite() && v.fract() == 0.0 => write!(f, "{v:.1}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Timestamp(ts) => write!(f, "{}", format_timestamp(ts)),
            Value::Text(s) => write!(f, "{s}"),
        }
    }
}

/// Named columns over a vector of rows. Every row has one cell per column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    /// Creates an empty table with the given column names.
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Appends a row, padding with nulls or truncating to the column count.
    pub fn push_row(&mut self, mut row: Vec<Value>) {
        row.resize(self.columns.len(), Value::Null);
        self.rows.push(row);
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Iterates the cells of one column, or `None` if the column is absent.
    pub fn column(&self, name: &str) -> Option<impl Iterator<Item = &Value>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(move |row| &row[idx]))
    }

    /// Returns the cell at `row` in column `name`.
    pub fn get(&self, row: usize, name: &str) -> Option<&Value> {
        let idx = self.column_index(name)?;
        self.rows.get(row).map(|r| &r[idx])
    }

    /// Sets every cell of column `name` to `value`, adding the column if absent.
    pub fn fill_column(&mut self, name: &str, value: Value) {
        let idx = match self.column_index(name) {
            Some(idx) => idx,
            None => {
                self.columns.push(name.to_string());
                for row in &mut self.rows {
                    row.push(Value::Null);
                }
                self.columns.len() - 1
            }
        };
        for row in &mut self.rows {
            row[idx] = value.clone();
        }
    }

    /// Appends every row of `other`, aligning cells by column name.
    /// Columns `other` lacks are filled with nulls; extra columns are ignored.
    pub fn append(&mut self, other: Table) {
        if other.columns == self.columns {
            self.rows.extend(other.rows);
            return;
        }
        let mapping: Vec<Option<usize>> = self
            .columns
            .iter()
            .map(|c| other.column_index(c))
            .collect();
        for row in other.rows {
            let aligned = mapping
                .iter()
                .map(|idx| idx.map_or(Value::Null, |i| row[i].clone()))
                .collect();
            self.rows.push(aligned);
        }
    }

    /// Returns a new table restricted to rows where `keep` is true.
    /// Rows past the end of `keep` are dropped.
    pub fn select(&self, keep: &[bool]) -> Table {
        let rows = self
            .rows
            .iter()
            .zip(keep)
            .filter(|(_, keep)| **keep)
            .map(|(row, _)| row.clone())
            .collect();
        Table {
            columns: self.columns.clone(),
            rows,
        }
    }
}
