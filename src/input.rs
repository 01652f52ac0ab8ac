//! Input resolution: normalise user-supplied paths before any tool runs.
//!
//! Paths go through `~` expansion and are made absolute so that the paths
//! we print, log, and hand to external tools do not depend on the working
//! directory a tool is started in.

use crate::error::DocToolsError;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Expand a leading `~` to the user's home directory.
pub fn expand_home(path: &Path) -> PathBuf {
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };
    match dirs::home_dir() {
        Some(home) => home.join(rest),
        None => path.to_path_buf(),
    }
}

/// Expand `~` and make `path` absolute without requiring it to exist.
pub fn absolute(path: &Path) -> Result<PathBuf, DocToolsError> {
    let expanded = expand_home(path);
    std::path::absolute(&expanded).map_err(|e| DocToolsError::io(expanded, e))
}

/// Resolve a path that must exist, returning its canonical form.
pub fn resolve_existing(path: &Path) -> Result<PathBuf, DocToolsError> {
    let expanded = expand_home(path);
    if !expanded.exists() {
        return Err(DocToolsError::FileNotFound { path: expanded });
    }
    std::fs::canonicalize(&expanded).map_err(|e| DocToolsError::io(expanded, e))
}

/// Lower-cased extension of `path`, without the dot (`""` when absent).
pub fn extension_lower(path: &Path) -> String {
    path.extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

/// Resolve an input that must be an existing `.pdf` file.
pub fn resolve_pdf(path: &Path) -> Result<PathBuf, DocToolsError> {
    let resolved = resolve_existing(path)?;
    if extension_lower(&resolved) != "pdf" {
        return Err(DocToolsError::NotAPdf { path: resolved });
    }
    debug!("Resolved input PDF: {}", resolved.display());
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expand_home_leaves_plain_paths() {
        assert_eq!(expand_home(Path::new("/tmp/a.pdf")), PathBuf::from("/tmp/a.pdf"));
        assert_eq!(expand_home(Path::new("a/~b")), PathBuf::from("a/~b"));
    }

    #[test]
    fn expand_home_replaces_tilde() {
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_home(Path::new("~/doc.pdf")), home.join("doc.pdf"));
        }
    }

    #[test]
    fn absolute_is_absolute() {
        assert!(absolute(Path::new("out/pages")).unwrap().is_absolute());
    }

    #[test]
    fn missing_file_is_reported() {
        let err = resolve_pdf(Path::new("/definitely/not/here.pdf")).unwrap_err();
        assert!(matches!(err, DocToolsError::FileNotFound { .. }));
    }

    #[test]
    fn wrong_extension_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("resume.docx");
        std::fs::write(&p, b"PK").unwrap();
        let err = resolve_pdf(&p).unwrap_err();
        assert!(matches!(err, DocToolsError::NotAPdf { .. }));
    }

    #[test]
    fn extension_is_case_insensitive() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("SCAN.PDF");
        std::fs::write(&p, b"%PDF-1.4").unwrap();
        assert!(resolve_pdf(&p).is_ok());
        assert_eq!(extension_lower(&p), "pdf");
    }
}
