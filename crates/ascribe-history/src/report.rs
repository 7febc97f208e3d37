//! Paths of files changed during a run.

use std::path::{Path, PathBuf};

use parking_lot::Mutex;

/// Append-only list of modified files, shared across workers.
#[derive(Debug, Default)]
pub struct ModifiedReport {
    paths: Mutex<Vec<PathBuf>>,
}

impl ModifiedReport {
    /// Empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a modified file. Repeats are ignored.
    pub fn add(&self, path: &Path) {
        let mut paths = self.paths.lock();
        if !paths.iter().any(|p| p == path) {
            paths.push(path.to_path_buf());
        }
    }

    /// Paths recorded so far, in the order first seen.
    pub fn paths(&self) -> Vec<PathBuf> {
        self.paths.lock().clone()
    }

    /// Number of distinct paths.
    pub fn len(&self) -> usize {
        self.paths.lock().len()
    }

    /// Whether nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.paths.lock().is_empty()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
