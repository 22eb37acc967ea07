//! Discovery and ingestion of per-vehicle APC ridership files.
//!
//! Each matched file is read, its header detected, noise rows dropped, its
//! rows typed and tagged with the vehicle id from the file name, and finally
//! projected onto the output column contract. Per-file failures are logged
//! and skipped; the load only fails when a pattern matches nothing or when no
//! file at all could be processed.

pub mod clean;
pub mod parse;
pub mod vehicle;

use std::path::{Path, PathBuf};

use glob::{Pattern, glob};
use tracing::{debug, info, warn};

use crate::config::LoaderConfig;
use crate::errors::LoaderError;
use crate::table::{Table, Value};

pub use clean::{EVENT_TIMESTAMP, VEHICLE_ID};

/// Loads ridership files from a set of folders into one unified table.
#[derive(Debug)]
pub struct ApcDataLoader {
    folder_paths: Vec<PathBuf>,
    config: LoaderConfig,
    data: Option<Table>,
}

impl ApcDataLoader {
    /// Creates a loader and eagerly loads every folder.
    pub fn new<I, P>(folder_paths: I, config: LoaderConfig) -> Result<Self, LoaderError>
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let mut loader = Self {
            folder_paths: Vec::new(),
            config,
            data: None,
        };
        for folder in folder_paths {
            let folder = folder.into();
            if !loader.folder_paths.contains(&folder) {
                loader.folder_paths.push(folder);
            }
        }
        loader.reload()?;
        Ok(loader)
    }

    /// Re-reads every registered folder, replacing any loaded data.
    pub fn reload(&mut self) -> Result<&Table, LoaderError> {
        self.data = None;
        let table = load_folders(&self.folder_paths, &self.config)?;
        Ok(self.data.insert(table))
    }

    /// The unified table, or [`LoaderError::NoData`] if nothing is loaded.
    pub fn data(&self) -> Result<&Table, LoaderError> {
        self.data.as_ref().ok_or(LoaderError::NoData)
    }

    /// Hands the unified table over to the caller.
    pub fn into_data(self) -> Result<Table, LoaderError> {
        self.data.ok_or(LoaderError::NoData)
    }

    pub fn folder_paths(&self) -> &[PathBuf] {
        &self.folder_paths
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Registers another folder and appends its rows to the loaded data.
    ///
    /// If the data was discarded by a removal, every registered folder is
    /// reloaded so the table never covers only part of them.
    pub fn add_folder_path(&mut self, folder: impl Into<PathBuf>) -> Result<(), LoaderError> {
        let folder = folder.into();
        if !folder.exists() {
            return Err(LoaderError::FolderNotFound(folder));
        }
        if self.folder_paths.contains(&folder) {
            debug!(folder = %folder.display(), "Folder already registered");
            return Ok(());
        }

        if self.data.is_none() {
            self.folder_paths.push(folder);
            self.reload()?;
            return Ok(());
        }

        let table = load_folders(std::slice::from_ref(&folder), &self.config)?;
        self.folder_paths.push(folder);
        if let Some(data) = &mut self.data {
            data.append(table);
        }
        Ok(())
    }

    /// Unregisters a folder. Loaded data is discarded until [`Self::reload`].
    pub fn remove_folder_path(&mut self, folder: &Path) -> bool {
        let before = self.folder_paths.len();
        self.folder_paths.retain(|f| f != folder);
        let removed = self.folder_paths.len() != before;
        if removed {
            self.data = None;
        }
        removed
    }

    /// Unregisters every folder and discards loaded data.
    pub fn clear_folder_paths(&mut self) {
        self.folder_paths.clear();
        self.data = None;
    }
}

/// Lists files under `folder` matching `pattern`, sorted by path.
pub fn discover(folder: &Path, pattern: &str) -> Result<Vec<PathBuf>, LoaderError> {
    let escaped = Pattern::escape(&folder.to_string_lossy());
    let full = Path::new(&escaped).join(pattern);
    let full = full.to_string_lossy();

    let entries = glob(&full).map_err(|source| LoaderError::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    })?;

    let mut files = Vec::new();
    for entry in entries {
        match entry {
            Ok(path) if path.is_file() => files.push(path),
            Ok(_) => {}
            Err(e) => warn!(error = %e, "Unreadable path during discovery"),
        }
    }

    if files.is_empty() {
        return Err(LoaderError::NoFilesFound {
            folder: folder.to_path_buf(),
            pattern: pattern.to_string(),
        });
    }
    Ok(files)
}

/// Reads one ridership file into a table shaped by `config.output_columns`.
#[tracing::instrument(skip_all, fields(file = %path.display()))]
pub fn load_file(path: &Path, config: &LoaderConfig) -> Result<Table, LoaderError> {
    let vehicle_id = vehicle::vehicle_id_from_path(path)?;

    let frame = parse::read_raw_file(path, &config.raw_columns)?;
    let read_rows = frame.rows.len();
    let frame = clean::drop_noise_rows(frame);
    let mut table = clean::build_table(frame, path)?;
    table.fill_column(VEHICLE_ID, Value::Integer(vehicle_id));

    debug!(
        vehicle_id,
        read_rows,
        kept_rows = table.len(),
        "File cleaned"
    );
    Ok(clean::enforce_output_columns(table, &config.output_columns))
}

/// Loads and merges every (folder, pattern) pair in discovery order.
#[tracing::instrument(skip_all, fields(folders = folders.len()))]
fn load_folders(folders: &[PathBuf], config: &LoaderConfig) -> Result<Table, LoaderError> {
    let mut unified = Table::new(config.output_columns.iter().cloned());
    let mut processed = 0usize;
    let mut skipped = 0usize;

    for folder in folders {
        for pattern in &config.file_patterns {
            for file in discover(folder, pattern)? {
                match load_file(&file, config) {
                    Ok(table) => {
                        processed += 1;
                        unified.append(table);
                    }
                    Err(e) => {
                        skipped += 1;
                        warn!(file = %file.display(), error = %e, "Skipping file");
                    }
                }
            }
        }
    }

    if processed == 0 {
        return Err(LoaderError::NoValidData);
    }

    info!(processed, skipped, rows = unified.len(), "Ridership data loaded");
    Ok(unified)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const HEADER: &str = "date,time,ons,offs,latitude,longitude,dwell time\n";

    fn write(dir: &Path, name: &str, content: &str) {
        fs::write(dir.join(name), content).unwrap();
    }

    fn vehicle_ids(table: &Table) -> Vec<i64> {
        table
            .column(VEHICLE_ID)
            .unwrap()
            .filter_map(Value::as_integer)
            .collect()
    }

    #[test]
    fn test_discover_sorts_matches() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "ridership-data-2.csv", HEADER);
        write(dir.path(), "ridership-data-1.csv", HEADER);
        write(dir.path(), "notes.txt", "");

        let files = discover(dir.path(), "ridership-data-*.csv").unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|f| f.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["ridership-data-1.csv", "ridership-data-2.csv"]);
    }

    #[test]
    fn test_discover_no_match_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = discover(dir.path(), "ridership-data-*.csv").unwrap_err();
        assert!(matches!(err, LoaderError::NoFilesFound { .. }));
    }

    #[test]
    fn test_discover_escapes_folder_metacharacters() {
        let dir = tempfile::tempdir().unwrap();
        let folder = dir.path().join("apc[2024]");
        fs::create_dir(&folder).unwrap();
        write(&folder, "ridership-data-5.csv", HEADER);

        assert_eq!(discover(&folder, "ridership-data-*.csv").unwrap().len(), 1);
    }

    #[test]
    fn test_load_file_tags_vehicle_from_name() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "ridership-data-160.csv",
            "date,time,ons,offs,latitude,longitude,dwell time,vehicle_id\n\
             2024-04-01,10:00:00,5,3,40.7128,-74.0060,20,999\n",
        );

        let table =
            load_file(&dir.path().join("ridership-data-160.csv"), &LoaderConfig::default())
                .unwrap();
        assert_eq!(vehicle_ids(&table), vec![160]);
        assert_eq!(table.columns(), LoaderConfig::default().output_columns.as_slice());
    }

    #[test]
    fn test_loader_skips_bad_file_and_keeps_good_one() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "ridership-data-1.csv",
            &format!("{HEADER}2024-04-01,10:00:00,5,3,40.7,-74.0,20\n"),
        );
        write(
            dir.path(),
            "ridership-data-2.csv",
            &format!("{HEADER}2024-04-01,10:00:00,5,3,not-a-lat,-74.0,20\n"),
        );

        let loader = ApcDataLoader::new([dir.path()], LoaderConfig::default()).unwrap();
        assert_eq!(vehicle_ids(loader.data().unwrap()), vec![1]);
    }

    #[test]
    fn test_loader_all_files_failing_is_no_valid_data() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "ridership-data-161.csv", "");

        let err = ApcDataLoader::new([dir.path()], LoaderConfig::default()).unwrap_err();
        assert!(matches!(err, LoaderError::NoValidData));
        assert!(err.to_string().contains("No valid data files were processed"));
    }

    #[test]
    fn test_loader_merges_in_discovery_order() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "ridership-data-20.csv",
            "2024-04-01,09:00:00,1,1,,,\n2024-04-01,08:00:00,2,2,,,\n",
        );
        write(
            dir.path(),
            "ridership-data-10.csv",
            "2024-04-01,12:00:00,3,3,,,\n",
        );

        let loader = ApcDataLoader::new([dir.path()], LoaderConfig::default()).unwrap();
        assert_eq!(vehicle_ids(loader.data().unwrap()), vec![10, 20, 20]);
    }

    #[test]
    fn test_add_folder_path_appends() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        write(first.path(), "ridership-data-1.csv", "2024-04-01,10:00:00,1,1,,,\n");
        write(second.path(), "ridership-data-2.csv", "2024-04-01,10:00:00,1,1,,,\n");

        let mut loader = ApcDataLoader::new([first.path()], LoaderConfig::default()).unwrap();
        loader.add_folder_path(second.path()).unwrap();

        assert_eq!(loader.folder_paths().len(), 2);
        assert_eq!(vehicle_ids(loader.data().unwrap()), vec![1, 2]);
    }

    #[test]
    fn test_add_missing_folder_fails() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "ridership-data-1.csv", "2024-04-01,10:00:00,1,1,,,\n");

        let mut loader = ApcDataLoader::new([dir.path()], LoaderConfig::default()).unwrap();
        let err = loader
            .add_folder_path(dir.path().join("missing"))
            .unwrap_err();
        assert!(matches!(err, LoaderError::FolderNotFound(_)));
    }

    #[test]
    fn test_remove_folder_discards_data_until_reload() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        write(first.path(), "ridership-data-1.csv", "2024-04-01,10:00:00,1,1,,,\n");
        write(second.path(), "ridership-data-2.csv", "2024-04-01,10:00:00,1,1,,,\n");

        let mut loader =
            ApcDataLoader::new([first.path(), second.path()], LoaderConfig::default()).unwrap();
        assert!(loader.remove_folder_path(first.path()));
        assert!(matches!(loader.data(), Err(LoaderError::NoData)));

        let table = loader.reload().unwrap();
        assert_eq!(vehicle_ids(table), vec![2]);
    }

    #[test]
    fn test_add_after_remove_reloads_every_folder() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        let third = tempfile::tempdir().unwrap();
        write(first.path(), "ridership-data-1.csv", "2024-04-01,10:00:00,1,1,,,\n");
        write(second.path(), "ridership-data-2.csv", "2024-04-01,10:00:00,1,1,,,\n");
        write(third.path(), "ridership-data-3.csv", "2024-04-01,10:00:00,1,1,,,\n");

        let mut loader =
            ApcDataLoader::new([first.path(), second.path()], LoaderConfig::default()).unwrap();
        assert!(loader.remove_folder_path(second.path()));
        loader.add_folder_path(third.path()).unwrap();

        assert_eq!(vehicle_ids(loader.data().unwrap()), vec![1, 3]);
    }

    #[test]
    fn test_add_after_clear_loads_new_folder() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        write(first.path(), "ridership-data-1.csv", "2024-04-01,10:00:00,1,1,,,\n");
        write(second.path(), "ridership-data-2.csv", "2024-04-01,10:00:00,1,1,,,\n");

        let mut loader = ApcDataLoader::new([first.path()], LoaderConfig::default()).unwrap();
        loader.clear_folder_paths();
        loader.add_folder_path(second.path()).unwrap();

        assert_eq!(vehicle_ids(loader.data().unwrap()), vec![2]);
    }

    #[test]
    fn test_clear_folder_paths() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "ridership-data-1.csv", "2024-04-01,10:00:00,1,1,,,\n");

        let mut loader = ApcDataLoader::new([dir.path()], LoaderConfig::default()).unwrap();
        loader.clear_folder_paths();
        assert!(loader.folder_paths().is_empty());
        assert!(loader.into_data().is_err());
    }
}
