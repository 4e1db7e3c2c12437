//! Latest log file lookup
//!
//! Validator status logs live under `<base>/<date>/<file>`. The newest date
//! directory is the lexicographic maximum of the directory names; inside it
//! the newest file is chosen with [`compare_file_names`].

use crate::utils::AppError;
use std::cmp::Ordering;
use std::ffi::{OsStr, OsString};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

/// Log locator result type
pub type LocatorResult<T> = Result<T, AppError>;

/// Resolve the log file currently being written
pub fn find_latest_log_file(base_path: &Path) -> LocatorResult<PathBuf> {
    let latest_dir = find_latest_dir(base_path)?;
    let latest_file = find_latest_file(&latest_dir)?;

    info!(log_file = %latest_file.display(), "Resolved latest log file");
    Ok(latest_file)
}

/// Pick the subdirectory of `base_path` with the greatest name
pub fn find_latest_dir(base_path: &Path) -> LocatorResult<PathBuf> {
    let dirs = list_entry_names(base_path, true)?;

    let latest = dirs
        .into_iter()
        .max()
        .ok_or_else(|| AppError::NoDirectoriesFound(base_path.to_path_buf()))?;

    debug!(dir = %latest.to_string_lossy(), "Selected latest log directory");
    Ok(base_path.join(latest))
}

/// Pick the newest file inside `dir_path`
pub fn find_latest_file(dir_path: &Path) -> LocatorResult<PathBuf> {
    let mut files = list_entry_names(dir_path, false)?;

    // read_dir order is unspecified; start from a fixed order so the pick is
    // reproducible even when the comparator is not transitive.
    files.sort();

    let latest = files
        .into_iter()
        .reduce(|latest, candidate| match compare_os_names(&candidate, &latest) {
            Ordering::Less => latest,
            _ => candidate,
        })
        .ok_or_else(|| AppError::NoFilesFound(dir_path.to_path_buf()))?;

    debug!(file = %latest.to_string_lossy(), "Selected latest log file");
    Ok(dir_path.join(latest))
}

/// Order two file names: numerically when both are integers, otherwise by
/// plain string comparison.
///
/// This is a single pairwise rule applied to the whole list. With mixed names
/// it is not guaranteed to be transitive (`9 < 10` numerically, `"10" < "5a"`
/// and `"5a" < "9"` as strings).
pub fn compare_file_names(a: &str, b: &str) -> Ordering {
    match (a.parse::<i64>(), b.parse::<i64>()) {
        (Ok(a_num), Ok(b_num)) => a_num.cmp(&b_num),
        _ => a.cmp(b),
    }
}

/// [`compare_file_names`] on raw entry names; a non-UTF-8 name falls back to
/// a byte-wise comparison.
fn compare_os_names(a: &OsStr, b: &OsStr) -> Ordering {
    match (a.to_str(), b.to_str()) {
        (Some(a), Some(b)) => compare_file_names(a, b),
        _ => a.as_encoded_bytes().cmp(b.as_encoded_bytes()),
    }
}

fn list_entry_names(path: &Path, want_dirs: bool) -> LocatorResult<Vec<OsString>> {
    let entries = fs::read_dir(path).map_err(|e| {
        error!(error = %e, path = %path.display(), "Failed to read directory");
        AppError::io(path, e)
    })?;

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| AppError::io(path, e))?;
        let is_dir = entry
            .file_type()
            .map_err(|e| AppError::io(entry.path(), e))?
            .is_dir();

        if is_dir == want_dirs {
            names.push(entry.file_name());
        }
    }

    Ok(names)
}
