//! Ingestion, normalization and filtered export of APC ridership records.

pub mod config;
pub mod errors;
pub mod loader;
pub mod output;
pub mod pipeline;
pub mod processor;
pub mod table;

pub use config::LoaderConfig;
pub use errors::{FilterError, LoaderError, ProcessorError};
pub use loader::ApcDataLoader;
pub use pipeline::{process_apc_data, process_apc_data_with};
pub use processor::{ApcDataProcessor, Mask};
pub use table::{Table, Value};
