//! Scoped working directories.
//!
//! Every temporary directory the tools create (pdftoppm staging, LaTeX build
//! directories, patched HTML copies, ingest work areas) is a [`ScopedDir`]:
//! it is removed when dropped, on success and error paths alike. Removal
//! failures are logged and otherwise ignored.

use crate::error::DocToolsError;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, warn};

/// A temporary directory removed on drop unless [`ScopedDir::keep`] is called.
#[derive(Debug)]
pub struct ScopedDir {
    dir: Option<TempDir>,
    path: PathBuf,
}

impl ScopedDir {
    /// Create a fresh directory under the system temp dir.
    pub fn new(prefix: &str) -> Result<Self, DocToolsError> {
        let dir = tempfile::Builder::new()
            .prefix(prefix)
            .tempdir()
            .map_err(|e| DocToolsError::io(std::env::temp_dir(), e))?;
        Ok(Self::wrap(dir))
    }

    /// Create a fresh directory inside `parent`.
    pub fn new_in(parent: &Path, prefix: &str) -> Result<Self, DocToolsError> {
        let dir = tempfile::Builder::new()
            .prefix(prefix)
            .tempdir_in(parent)
            .map_err(|e| DocToolsError::io(parent, e))?;
        Ok(Self::wrap(dir))
    }

    fn wrap(dir: TempDir) -> Self {
        let path = dir.path().to_path_buf();
        debug!("Created temp dir {}", path.display());
        Self {
            dir: Some(dir),
            path,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Disarm cleanup and return the path; the directory outlives the process.
    pub fn keep(mut self) -> PathBuf {
        if let Some(dir) = self.dir.take() {
            let _ = dir.keep();
        }
        self.path.clone()
    }
}

impl Drop for ScopedDir {
    fn drop(&mut self) {
        if let Some(dir) = self.dir.take() {
            if let Err(e) = dir.close() {
                warn!("Failed to remove temp dir {}: {}", self.path.display(), e);
            }
        }
    }
}
