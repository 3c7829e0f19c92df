//! Filesystem fixtures for mission tests.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tempfile::TempDir;

#[cfg(target_os = "linux")]
const CHAIN_SEGMENT_LEN: usize = 200;
#[cfg(target_os = "linux")]
const CHAIN_DEPTH: usize = 16;

/// Temporary directory tree seeded with mission targets.
pub struct TargetTree {
    dir: TempDir,
}

impl TargetTree {
    /// Create an empty tree under the system temp directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the temporary directory cannot be created.
    pub fn new() -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix("sand-mission-")
            .tempdir()
            .context("failed to create target tree")?;
        Ok(Self { dir })
    }

    /// Root of the tree.
    #[must_use]
    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Absolute path for a tree-relative name.
    #[must_use]
    pub fn path(&self, relative: &str) -> PathBuf {
        self.dir.path().join(relative)
    }

    /// Write `contents` to `relative`, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error if the file or its parents cannot be written.
    pub fn file(&self, relative: &str, contents: &str) -> Result<PathBuf> {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        fs::write(&path, contents).with_context(|| format!("failed to write {}", path.display()))?;
        Ok(path)
    }

    /// Create a directory (and parents) at `relative`.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn dir(&self, relative: &str) -> Result<PathBuf> {
        let path = self.path(relative);
        fs::create_dir_all(&path).with_context(|| format!("failed to create {}", path.display()))?;
        Ok(path)
    }

    /// Create a directory chain under `relative` whose full path runs past
    /// `PATH_MAX`, so descending into it fails even for privileged users.
    ///
    /// Each half is built with short paths and then renamed into place.
    ///
    /// # Errors
    ///
    /// Returns an error if either half cannot be created or moved.
    #[cfg(target_os = "linux")]
    pub fn unreachable_subtree(&self, relative: &str) -> Result<PathBuf> {
        let outer = self.path(relative);
        let staged = self.path(".staged-chain");
        let outer_tail = nested_chain(&outer);
        fs::create_dir_all(&outer_tail).context("failed to create outer chain")?;
        fs::create_dir_all(nested_chain(&staged)).context("failed to create staged chain")?;
        fs::rename(&staged, outer_tail.join("inner"))
            .context("failed to move staged chain into place")?;
        Ok(outer)
    }

    /// Read a tree-relative file as UTF-8.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    pub fn read(&self, relative: &str) -> Result<String> {
        let path = self.path(relative);
        fs::read_to_string(&path).with_context(|| format!("failed to read {}", path.display()))
    }
}

#[cfg(target_os = "linux")]
fn nested_chain(base: &Path) -> PathBuf {
    let segment = "d".repeat(CHAIN_SEGMENT_LEN);
    let mut path = base.to_path_buf();
    for _ in 0..CHAIN_DEPTH {
        path.push(&segment);
    }
    path
}

/// Strip every permission bit from `path` so non-privileged walks fail on it.
///
/// Returns `false` when the current user can still list the directory (for
/// example when tests run as root); callers should skip permission assertions then.
///
/// # Errors
///
/// Returns an error if the permissions cannot be changed.
#[cfg(unix)]
pub fn lock_directory(path: &Path) -> Result<bool> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, fs::Permissions::from_mode(0o000))
        .with_context(|| format!("failed to lock {}", path.display()))?;
    Ok(fs::read_dir(path).is_err())
}

/// Restore owner permissions on a directory locked by [`lock_directory`] so it can be cleaned up.
///
/// # Errors
///
/// Returns an error if the permissions cannot be changed.
#[cfg(unix)]
pub fn unlock_directory(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, fs::Permissions::from_mode(0o755))
        .with_context(|| format!("failed to unlock {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_tree_writes_nested_files() -> Result<()> {
        let tree = TargetTree::new()?;
        let path = tree.file("nested/a.caldera", "seed")?;
        assert_eq!(path, tree.path("nested/a.caldera"));
        assert_eq!(tree.read("nested/a.caldera")?, "seed");
        assert!(tree.dir("empty")?.is_dir());
        Ok(())
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn unreachable_subtree_cannot_be_listed_at_depth() -> Result<()> {
        let tree = TargetTree::new()?;
        let outer = tree.unreachable_subtree("deep")?;
        assert!(outer.is_dir());
        assert!(!tree.path(".staged-chain").exists());

        let deepest = nested_chain(&nested_chain(&outer).join("inner"));
        assert!(deepest.as_os_str().len() > 4096);
        assert!(fs::read_dir(&deepest).is_err());
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn lock_and_unlock_round_trip() -> Result<()> {
        let tree = TargetTree::new()?;
        let locked = tree.dir("locked")?;
        let _enforced = lock_directory(&locked)?;
        unlock_directory(&locked)?;
        assert!(fs::read_dir(&locked).is_ok());
        Ok(())
    }
}
