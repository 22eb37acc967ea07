//! CLI entry point for the APC ridership extract.
//!
//! Loads every `ridership-data-*.csv` file in a folder, keeps the records in
//! an inclusive time window (optionally for a subset of vehicles) and writes
//! them as a canonical CSV ready for upload.

use anyhow::Result;
use apc_extract::config::LoaderConfig;
use apc_extract::pipeline::{parse_instant, process_apc_data_with};
use chrono::NaiveDateTime;
use clap::Parser;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "apc_extract")]
#[command(about = "Parse APC ridership data for upload", long_about = None)]
struct Cli {
    /// The folder path to the APC data
    #[arg(value_name = "FOLDER_PATH")]
    folder_path: PathBuf,

    /// The first instant to upload, in YYYY-MM-DDTHH:MM:SS format
    #[arg(value_parser = parse_instant_arg)]
    start_date: NaiveDateTime,

    /// The last instant to upload (inclusive), in YYYY-MM-DDTHH:MM:SS format
    #[arg(value_parser = parse_instant_arg)]
    end_date: NaiveDateTime,

    /// Output file name
    #[arg(short, long, default_value = "results.csv")]
    output: PathBuf,

    /// Optional list of vehicle IDs to keep
    #[arg(short = 'v', long, num_args = 0..)]
    vehicle_ids: Vec<i64>,

    /// File name patterns to load (repeatable); overrides the config file
    #[arg(short, long)]
    pattern: Vec<String>,

    /// JSON file describing the raw and output column layout
    #[arg(short, long)]
    config: Option<String>,
}

fn parse_instant_arg(s: &str) -> std::result::Result<NaiveDateTime, String> {
    parse_instant(s).map_err(|e| e.to_string())
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/apc_extract.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("apc_extract.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => LoaderConfig::load(path)?,
        None => LoaderConfig::default(),
    };
    if !cli.pattern.is_empty() {
        config = config.with_patterns(cli.pattern);
    }

    info!(
        folder = %cli.folder_path.display(),
        start = %cli.start_date,
        end = %cli.end_date,
        vehicles = cli.vehicle_ids.len(),
        "Starting extract"
    );

    let output = process_apc_data_with(
        &config,
        &cli.folder_path,
        cli.start_date,
        cli.end_date,
        &cli.output,
        &cli.vehicle_ids,
    )?;

    println!("{}", output.display());
    Ok(())
}
