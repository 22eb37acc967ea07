//! Persistence of the filtered extract.

use std::path::Path;

use anyhow::{Context, Result};
use csv::WriterBuilder;
use tracing::{debug, info};

use crate::table::Table;

/// Logs the first rows of a table using Rust's debug pretty-print format.
pub fn print_preview(table: &Table, rows: usize) {
    for row in table.rows().iter().take(rows) {
        debug!("{:#?}", row);
    }
}

/// Writes `table` to `path` as CSV: one header row with the column names,
/// then one line per row. Nulls become empty fields; no index column.
///
/// Overwrites any existing file.
pub fn write_table(path: &Path, table: &Table) -> Result<()> {
    debug!(path = %path.display(), rows = table.len(), "Writing CSV extract");

    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;

    writer.write_record(table.columns())?;
    for row in table.rows() {
        writer.write_record(row.iter().map(|value| value.to_string()))?;
    }
    writer.flush()?;

    info!(path = %path.display(), rows = table.len(), "Extract written");
    Ok(())
}
