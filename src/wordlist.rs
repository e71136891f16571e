use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::{ReconError, ReconResult};

/// Read a wordlist file into memory before a sweep starts.
///
/// Entries are trimmed of surrounding whitespace and blank lines are dropped.
/// File order (and any duplicates) is preserved, which keeps sweep order and
/// tie-breaks deterministic across reruns.
pub fn load(path: &Path) -> ReconResult<Vec<String>> {
    let content = fs::read_to_string(path).map_err(|_| ReconError::WordlistNotFound {
        path: path.to_path_buf(),
    })?;

    let entries: Vec<String> = content
        .lines()
        .map(|line| line.trim().to_string())
        .filter(|line| !line.is_empty())
        .collect();

    debug!("Loaded {} entries from {}", entries.len(), path.display());
    Ok(entries)
}
