//! Deduplication of targets across repeated scans.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Paths already handed to the mutator during this process lifetime.
///
/// The set only grows, and only through [`ProcessedSet::claim_new`]. It is not
/// persisted, so a restarted agent will claim (and mark) every target again.
#[derive(Debug, Default)]
pub struct ProcessedSet {
    claimed: HashSet<PathBuf>,
}

impl ProcessedSet {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim every candidate not seen before, preserving candidate order.
    ///
    /// Membership test and insertion happen in a single step per candidate, so
    /// a path listed twice in the same batch is only returned once.
    pub fn claim_new(&mut self, candidates: Vec<PathBuf>) -> Vec<PathBuf> {
        candidates
            .into_iter()
            .filter(|candidate| self.claimed.insert(candidate.clone()))
            .collect()
    }

    /// Whether `path` has already been claimed.
    #[must_use]
    pub fn contains(&self, path: &Path) -> bool {
        self.claimed.contains(path)
    }

    /// Number of paths claimed so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.claimed.len()
    }

    /// Whether nothing has been claimed yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.claimed.is_empty()
    }
}
