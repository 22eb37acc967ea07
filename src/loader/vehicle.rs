use std::path::Path;

use crate::errors::LoaderError;

/// Parses the vehicle id from a file name such as `ridership-data-160.csv`:
/// the integer after the last `-`, with the `.csv` suffix removed.
pub fn vehicle_id_from_path(path: &Path) -> Result<i64, LoaderError> {
    let invalid = || LoaderError::InvalidVehicleId(path.to_path_buf());

    let name = path.file_name().and_then(|n| n.to_str()).ok_or_else(invalid)?;
    let stem = name.strip_suffix(".csv").unwrap_or(name);
    let (_, id) = stem.rsplit_once('-').ok_or_else(invalid)?;

    id.trim().parse().map_err(|_| invalid())
}
