//! Error types for the loading and filtering stages.

use std::path::PathBuf;

use thiserror::Error;

/// Failures raised while discovering, parsing or merging ridership files.
///
/// Per-file variants (`Csv`, `MalformedRow`, `MissingColumn`, ...) are caught
/// inside the loader's file loop and only logged; `NoFilesFound`,
/// `NoValidData` and `InvalidPattern` abort the load.
#[derive(Debug, Error)]
pub enum LoaderError {
    #[error("No files found matching pattern: {pattern} in {}", .folder.display())]
    NoFilesFound { folder: PathBuf, pattern: String },
    #[error("No valid data files were processed")]
    NoValidData,
    #[error("No data has been loaded")]
    NoData,
    #[error("Folder path does not exist: {}", .0.display())]
    FolderNotFound(PathBuf),
    #[error("invalid file pattern '{pattern}'")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },
    #[error("failed to read {}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("{} is empty", .0.display())]
    EmptyFile(PathBuf),
    #[error("{}: row {row} has {found} fields, expected at most {expected}", .path.display())]
    MalformedRow {
        path: PathBuf,
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("{}: missing required column '{column}'", .path.display())]
    MissingColumn { path: PathBuf, column: String },
    #[error("{}: row {row}: '{value}' is not an ISO-8601 timestamp", .path.display())]
    InvalidTimestamp {
        path: PathBuf,
        row: usize,
        value: String,
    },
    #[error("{}: row {row}: '{value}' is not a valid {column}", .path.display())]
    InvalidValue {
        path: PathBuf,
        row: usize,
        column: String,
        value: String,
    },
    #[error("cannot derive a vehicle id from file name {}", .0.display())]
    InvalidVehicleId(PathBuf),
}

/// Precondition violations in the mask-based filters.
#[derive(Debug, Error, PartialEq)]
pub enum FilterError {
    #[error("table missing required '{0}' column")]
    MissingColumn(String),
    #[error("column '{column}' holds {found} values, expected {expected}")]
    TypeMismatch {
        column: String,
        expected: &'static str,
        found: &'static str,
    },
    #[error("filter mask length {found} does not match table length {expected}")]
    LengthMismatch { expected: usize, found: usize },
}

/// Failures raised by the processor stage.
#[derive(Debug, Error, PartialEq)]
pub enum ProcessorError {
    #[error("error applying filter")]
    Filter(#[from] FilterError),
}
