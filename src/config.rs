//! Loader configuration: the raw column layout, the output column contract
//! and the file-name patterns used for discovery.

use anyhow::{Context, Result};
use serde::Deserialize;

/// Raw columns an APC export may carry, in positional order for headerless files.
pub const RAW_COLUMNS: [&str; 7] = [
    "date",
    "time",
    "ons",
    "offs",
    "longitude",
    "latitude",
    "dwell time",
];

/// The canonical record layout written to the extract.
pub const OUTPUT_COLUMNS: [&str; 6] = [
    "event_timestamp",
    "vehicle_id",
    "ons",
    "offs",
    "longitude",
    "latitude",
];

pub const DEFAULT_FILE_PATTERN: &str = "ridership-data-*.csv";

/// Describes the layout of the source files and the shape of the unified table.
///
/// Can be stored as a JSON object on disk:
/// ```json
/// {
///   "raw_columns": ["date", "time", "ons", "offs", "longitude", "latitude", "dwell time"],
///   "output_columns": ["event_timestamp", "vehicle_id", "ons", "offs", "longitude", "latitude"],
///   "file_patterns": ["ridership-data-*.csv"]
/// }
/// ```
/// Missing keys fall back to the APC defaults.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    pub raw_columns: Vec<String>,
    pub output_columns: Vec<String>,
    pub file_patterns: Vec<String>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            raw_columns: RAW_COLUMNS.iter().map(|c| c.to_string()).collect(),
            output_columns: OUTPUT_COLUMNS.iter().map(|c| c.to_string()).collect(),
            file_patterns: vec![DEFAULT_FILE_PATTERN.to_string()],
        }
    }
}

impl LoaderConfig {
    /// Loads the config from a JSON file at `path`.
    pub fn load(path: &str) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).with_context(|| format!("reading config {path}"))?;
        let config: LoaderConfig =
            serde_json::from_str(&content).with_context(|| format!("parsing config {path}"))?;
        Ok(config.normalized())
    }

    /// Replaces the file patterns, keeping the column layout.
    pub fn with_patterns<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.file_patterns = patterns.into_iter().map(Into::into).collect();
        self
    }

    /// Column names are matched case-insensitively, so they are kept lower-case.
    fn normalized(mut self) -> Self {
        for name in self
            .raw_columns
            .iter_mut()
            .chain(self.output_columns.iter_mut())
        {
            *name = name.trim().to_lowercase();
        }
        self
    }
}
