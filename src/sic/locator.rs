use chrono::Month;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

use super::SicError;

/// `seaice_conc_monthly_nh_{year}{month:02}_`
pub fn name_prefix(year: i32, month: Month) -> String {
    format!(
        "seaice_conc_monthly_nh_{}{:02}_",
        year,
        month.number_from_month()
    )
}

/// Returns the only entry of `directory` whose name starts with `prefix`.
///
/// Zero or several matches is an error carrying every matched name.
pub fn find_single_file(directory: &Path, prefix: &str) -> Result<PathBuf, SicError> {
    debug!(directory = %directory.display(), prefix, "searching for file");

    let mut matches = Vec::new();
    for entry in WalkDir::new(directory)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|source| SicError::ListDirectory {
            directory: directory.to_path_buf(),
            source,
        })?;

        // Compare raw bytes so names that are not valid UTF-8 still count.
        if entry
            .file_name()
            .as_encoded_bytes()
            .starts_with(prefix.as_bytes())
        {
            matches.push(entry.into_path());
        }
    }

    for file in &matches {
        debug!(file = %file.display(), "found");
    }

    if matches.len() == 1 {
        return Ok(matches.remove(0));
    }

    Err(SicError::AmbiguousOrMissingFile {
        prefix: prefix.to_string(),
        directory: directory.to_path_buf(),
        count: matches.len(),
        files: matches
            .iter()
            .filter_map(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .collect(),
    })
}
