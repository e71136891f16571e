//! Persistence sink for scan records.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::debug;

use crate::error::{ReconError, ReconResult};
use crate::report::Reporter;

/// Write a scan record to `path`, choosing the encoding by extension.
///
/// `.json` and `.txt` (case-insensitive) both serialize as indented JSON at
/// the requested path. Any other suffix is unsupported; the record is written
/// to `{path}.json` instead and a notice is emitted. Write failures are
/// reported here and never raised past this boundary.
pub fn save_results<T: Serialize>(path: &Path, record: &T, reporter: &dyn Reporter) {
    match try_save(path, record, reporter) {
        Ok(dest) => reporter.announce(&format!("Results saved to {}", dest.display())),
        Err(e) => reporter.fail("output", &e),
    }
}

fn try_save<T: Serialize>(
    path: &Path,
    record: &T,
    reporter: &dyn Reporter,
) -> ReconResult<PathBuf> {
    let dest = destination_for(path);
    if dest != path {
        reporter.announce(&format!(
            "Unsupported output format for {}. Saving as JSON to {} instead.",
            path.display(),
            dest.display()
        ));
    }

    if let Some(parent) = dest.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| ReconError::Persistence {
                path: dest.clone(),
                message: e.to_string(),
            })?;
        }
    }

    let encoded = serde_json::to_string_pretty(record).map_err(|e| ReconError::Persistence {
        path: dest.clone(),
        message: e.to_string(),
    })?;

    fs::write(&dest, encoded).map_err(|e| ReconError::Persistence {
        path: dest.clone(),
        message: e.to_string(),
    })?;

    debug!("Wrote results to {}", dest.display());
    Ok(dest)
}

/// `.json`/`.txt` are written where asked; everything else falls back to a
/// `.json`-suffixed sibling of the requested path.
fn destination_for(path: &Path) -> PathBuf {
    let supported = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            ext == "json" || ext == "txt"
        })
        .unwrap_or(false);

    if supported {
        path.to_path_buf()
    } else {
        PathBuf::from(format!("{}.json", path.display()))
    }
}
