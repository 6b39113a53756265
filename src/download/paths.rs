use std::ffi::OsString;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use crate::state::types::format_day;
use crate::types::Format;

/// Build the artifact path for one format on one day:
/// `<format_dir>/<dd Month yyyy>.<FORMAT>`.
///
/// One file per format per day; a second run on the same day replaces it.
pub fn artifact_path(format_dir: &Path, day: NaiveDate, format: Format) -> PathBuf {
    format_dir.join(format!("{}.{}", format_day(day), format.as_str()))
}

/// Temp path the download is written to before being renamed into place.
pub fn part_path(artifact_path: &Path) -> PathBuf {
    let mut name: OsString = artifact_path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".part");
    artifact_path.with_file_name(name)
}
