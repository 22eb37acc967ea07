//! End-to-end extract: load a folder, filter by window and vehicles, write CSV.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use tracing::{error, info};

use crate::config::LoaderConfig;
use crate::errors::{LoaderError, ProcessorError};
use crate::loader::ApcDataLoader;
use crate::output::{print_preview, write_table};
use crate::processor::ApcDataProcessor;

/// Parses an instant given as `YYYY-MM-DDTHH:MM:SS` (fractional seconds
/// allowed) or as a bare `YYYY-MM-DD`, which means midnight.
pub fn parse_instant(s: &str) -> Result<NaiveDateTime> {
    let s = s.trim();
    if let Ok(ts) = s.parse::<NaiveDateTime>() {
        return Ok(ts);
    }
    let date = s
        .parse::<NaiveDate>()
        .with_context(|| format!("'{s}' is not in YYYY-MM-DDTHH:MM:SS format"))?;
    Ok(date.and_time(NaiveTime::default()))
}

/// Builds the extract for `folder_path` with the default APC layout.
///
/// See [`process_apc_data_with`].
pub fn process_apc_data(
    folder_path: impl AsRef<Path>,
    start: NaiveDateTime,
    end: NaiveDateTime,
    output_file: impl AsRef<Path>,
    vehicle_ids: &[i64],
) -> Result<PathBuf> {
    process_apc_data_with(
        &LoaderConfig::default(),
        folder_path,
        start,
        end,
        output_file,
        vehicle_ids,
    )
}

/// Loads every matching file in `folder_path`, keeps rows in `[start, end]`
/// (and, if `vehicle_ids` is non-empty, only those vehicles) and writes them
/// to `output_file`. Returns the output path.
///
/// Failures are logged before they propagate. Loader and processor failures
/// keep their typed error, reachable with `downcast_ref`.
#[tracing::instrument(
    skip_all,
    fields(folder = %folder_path.as_ref().display(), %start, %end)
)]
pub fn process_apc_data_with(
    config: &LoaderConfig,
    folder_path: impl AsRef<Path>,
    start: NaiveDateTime,
    end: NaiveDateTime,
    output_file: impl AsRef<Path>,
    vehicle_ids: &[i64],
) -> Result<PathBuf> {
    let result = run(
        config,
        folder_path.as_ref(),
        start,
        end,
        output_file.as_ref(),
        vehicle_ids,
    );

    if let Err(e) = &result {
        if e.downcast_ref::<LoaderError>().is_some() || e.downcast_ref::<ProcessorError>().is_some()
        {
            error!(error = %format!("{e:#}"), "Error processing APC data");
        } else {
            error!(error = %format!("{e:#}"), "Unexpected error");
        }
    }
    result
}

fn run(
    config: &LoaderConfig,
    folder_path: &Path,
    start: NaiveDateTime,
    end: NaiveDateTime,
    output_file: &Path,
    vehicle_ids: &[i64],
) -> Result<PathBuf> {
    if start > end {
        bail!("start_date cannot be later than end_date ({start} > {end})");
    }

    let loader = ApcDataLoader::new([folder_path], config.clone())?;
    let mut processor = ApcDataProcessor::new(loader.into_data()?);

    processor.filter_by_date_and_time(start, end)?;
    let allow: HashSet<i64> = vehicle_ids.iter().copied().collect();
    processor.filter_by_vehicle(Some(&allow))?;

    let result = processor.process()?;
    print_preview(&result, 5);
    info!(
        total = processor.table().len(),
        selected = result.len(),
        "Filters applied"
    );

    write_table(output_file, &result)?;
    Ok(output_file.to_path_buf())
}
