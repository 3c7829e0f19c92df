//! Filesystem discovery of mission targets.
//!
//! # Design
//! - Walk depth-first in file-name order so repeated scans of an unchanged tree agree.
//! - Any traversal error fails the whole scan; nothing is returned from a partial walk.
//! - Symlinks are reported by their own name and never followed.

use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use crate::error::{MissionError, MissionResult};

/// Collect every entry under `root` whose extension equals `extension`.
///
/// The extension is the final file-name component from its last `.`, compared
/// byte for byte, so `.caldera` matches `notes.caldera` and `.caldera` but not
/// `notes.CALDERA` or `notes.caldera.bak`. Directories are matched the same way
/// as files.
///
/// # Errors
///
/// Returns [`MissionError::Scan`] for the first entry that cannot be read,
/// including unreadable subdirectories and a missing `root`.
pub fn scan(root: &Path, extension: &str) -> MissionResult<Vec<PathBuf>> {
    let mut matches = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|err| MissionError::scan(root, err))?;
        if has_extension(entry.path(), extension) {
            matches.push(entry.into_path());
        }
    }
    debug!(root = %root.display(), extension, matches = matches.len(), "scan complete");
    Ok(matches)
}

/// Whether the final component of `path` ends in exactly `extension`.
#[must_use]
pub fn has_extension(path: &Path, extension: &str) -> bool {
    let Some(name) = path.file_name() else {
        return false;
    };
    let name = name.as_encoded_bytes();
    name.iter()
        .rposition(|byte| *byte == b'.')
        .is_some_and(|dot| &name[dot..] == extension.as_bytes())
}
