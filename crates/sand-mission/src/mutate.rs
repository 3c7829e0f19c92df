//! Appending the mission marker to claimed targets.
//!
//! # Design
//! - Each target is opened, written, and closed before the next one is touched.
//! - Per-target failures are logged and excluded; they never stop the batch.
//! - A failed append truncates the target back to its prior length.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::error::{MissionError, MissionResult};

#[cfg(unix)]
const CREATE_MODE: u32 = 0o644;

/// Result of marking a single target.
#[derive(Debug)]
pub enum MutationOutcome {
    /// The marker was appended.
    Applied(PathBuf),
    /// The target could not be opened or written.
    Failed {
        /// Target that was left untouched.
        path: PathBuf,
        /// Why the append failed.
        error: MissionError,
    },
}

impl MutationOutcome {
    /// The target this outcome refers to.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Applied(path) | Self::Failed { path, .. } => path,
        }
    }

    /// Whether the marker was appended.
    #[must_use]
    pub const fn is_applied(&self) -> bool {
        matches!(self, Self::Applied(_))
    }
}

/// Append `marker` to every path and return the ones that succeeded, in order.
pub fn apply(paths: Vec<PathBuf>, marker: &str) -> Vec<PathBuf> {
    paths
        .into_iter()
        .map(|path| mark(path, marker))
        .filter_map(|outcome| match outcome {
            MutationOutcome::Applied(path) => Some(path),
            MutationOutcome::Failed { path, error } => {
                warn!(path = %path.display(), error = ?error, "failed to mark target");
                None
            }
        })
        .collect()
}

/// Append `marker` to a single target, creating it when absent.
#[must_use]
pub fn mark(path: PathBuf, marker: &str) -> MutationOutcome {
    match append(&path, marker) {
        Ok(()) => MutationOutcome::Applied(path),
        Err(error) => MutationOutcome::Failed { path, error },
    }
}

fn append(path: &Path, marker: &str) -> MissionResult<()> {
    let mut options = OpenOptions::new();
    options.append(true).create(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(CREATE_MODE);
    }
    let mut file = options
        .open(path)
        .map_err(|err| MissionError::io("open", path, err))?;
    let original_len = file
        .metadata()
        .map_err(|err| MissionError::io("stat", path, err))?
        .len();
    write_or_restore(&mut file, marker.as_bytes(), |file| file.set_len(original_len))
        .map_err(|err| MissionError::io("append", path, err))
}

fn write_or_restore<W: Write>(
    writer: &mut W,
    bytes: &[u8],
    restore: impl FnOnce(&mut W) -> io::Result<()>,
) -> io::Result<()> {
    let Err(err) = writer.write_all(bytes) else {
        return Ok(());
    };
    if let Err(restore_err) = restore(writer) {
        warn!(error = %restore_err, "partial marker could not be removed");
    }
    Err(err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn apply_appends_marker_after_existing_content() -> Result<(), Box<dyn Error>> {
        let temp = TempDir::new()?;
        let target = temp.path().join("a.caldera");
        fs::write(&target, "original\n")?;

        let applied = apply(vec![target.clone()], "X");
        assert_eq!(applied, vec![target.clone()]);
        assert_eq!(fs::read_to_string(&target)?, "original\nX");
        Ok(())
    }

    #[test]
    fn apply_creates_missing_targets() -> Result<(), Box<dyn Error>> {
        let temp = TempDir::new()?;
        let target = temp.path().join("fresh.caldera");

        let applied = apply(vec![target.clone()], "caldera wuz here\n");
        assert_eq!(applied, vec![target.clone()]);
        assert_eq!(fs::read_to_string(&target)?, "caldera wuz here\n");
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn created_targets_use_standard_file_mode() -> Result<(), Box<dyn Error>> {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new()?;
        let target = temp.path().join("mode.caldera");
        assert!(mark(target.clone(), "X").is_applied());
        let mode = fs::metadata(&target)?.permissions().mode() & 0o777;
        assert_eq!(mode & !CREATE_MODE, 0, "mode {mode:o} exceeds 0644");
        Ok(())
    }

    #[test]
    fn failures_are_excluded_and_batch_continues() -> Result<(), Box<dyn Error>> {
        let temp = TempDir::new()?;
        let directory = temp.path().join("dir.caldera");
        fs::create_dir(&directory)?;
        let orphan = temp.path().join("missing-parent/x.caldera");
        let good = temp.path().join("good.caldera");
        fs::write(&good, "")?;

        let applied = apply(vec![directory.clone(), orphan.clone(), good.clone()], "X");
        assert_eq!(applied, vec![good.clone()]);
        assert!(directory.is_dir());
        assert!(!orphan.exists());
        assert_eq!(fs::read_to_string(&good)?, "X");
        Ok(())
    }

    #[test]
    fn mark_reports_failure_without_touching_target() -> Result<(), Box<dyn Error>> {
        let temp = TempDir::new()?;
        let directory = temp.path().join("dir.caldera");
        fs::create_dir(&directory)?;

        let outcome = mark(directory.clone(), "X");
        assert!(!outcome.is_applied());
        assert_eq!(outcome.path(), directory.as_path());
        assert!(matches!(
            outcome,
            MutationOutcome::Failed {
                error: MissionError::Io {
                    operation: "open",
                    ..
                },
                ..
            }
        ));
        Ok(())
    }

    struct ShortWriter {
        written: Vec<u8>,
        capacity: usize,
    }

    impl Write for ShortWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            let room = self.capacity.saturating_sub(self.written.len());
            if room == 0 {
                return Err(io::Error::other("device full"));
            }
            let accepted = room.min(buf.len());
            self.written.extend_from_slice(&buf[..accepted]);
            Ok(accepted)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn partial_append_is_rolled_back() {
        let mut writer = ShortWriter {
            written: b"seed".to_vec(),
            capacity: 6,
        };
        let result = write_or_restore(&mut writer, b"XYZ", |writer| {
            writer.written.truncate(4);
            Ok(())
        });
        assert!(result.is_err());
        assert_eq!(writer.written, b"seed");
    }

    #[test]
    fn complete_append_skips_restore() {
        let mut writer = ShortWriter {
            written: b"seed".to_vec(),
            capacity: 16,
        };
        let result = write_or_restore(&mut writer, b"XYZ", |_| {
            Err(io::Error::other("restore must not run"))
        });
        assert!(result.is_ok());
        assert_eq!(writer.written, b"seedXYZ");
    }

    #[test]
    fn repeated_apply_appends_again() -> Result<(), Box<dyn Error>> {
        let temp = TempDir::new()?;
        let target = temp.path().join("again.caldera");
        apply(vec![target.clone()], "X");
        apply(vec![target.clone()], "X");
        assert_eq!(fs::read_to_string(&target)?, "XX");
        Ok(())
    }
}
