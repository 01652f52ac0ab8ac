//! # pdfium-locate
//!
//! Find a [PDFium](https://pdfium.googlesource.com/pdfium/) shared library
//! that is already present on this machine and bind `pdfium-render` to it.
//!
//! Nothing is downloaded. Candidate locations are tried in order:
//!
//! 1. `PDFIUM_LIB_PATH` — explicit path to `libpdfium.{so,dylib}` / `pdfium.dll`,
//!    or to the directory holding it.
//! 2. The pdfium cache shared with the `pdf2md` tooling,
//!    `{cache_dir}/pdf2md/pdfium-{VERSION}/` (override the base with
//!    `PDFIUM_AUTO_CACHE_DIR`).
//! 3. The system library search path (`LD_LIBRARY_PATH`, `DYLD_LIBRARY_PATH`,
//!    `PATH` on Windows, plus the loader defaults).
//!
//! ```rust,no_run
//! use pdfium_locate::locate_and_bind;
//!
//! let (location, pdfium) = locate_and_bind().expect("PDFium unavailable");
//! eprintln!("bound PDFium from {location}");
//! # drop(pdfium);
//! ```

use std::fmt;
use std::path::{Path, PathBuf};

use pdfium_render::prelude::Pdfium;
use thiserror::Error;

/// The pdfium-binaries release tag whose cache directory is consulted.
pub const PDFIUM_VERSION: &str = "7690";

/// Environment variable naming an explicit library file.
pub const LIB_PATH_ENV: &str = "PDFIUM_LIB_PATH";

/// Environment variable overriding the cache base directory.
pub const CACHE_DIR_ENV: &str = "PDFIUM_AUTO_CACHE_DIR";

/// Errors returned while locating or binding PDFium.
#[derive(Error, Debug)]
pub enum PdfiumLocateError {
    /// A candidate library exists but could not be loaded.
    #[error("Failed to bind PDFium from {location}: {reason}")]
    Bind { location: String, reason: String },

    /// Every candidate location failed.
    #[error("No usable PDFium library found (tried: {})", tried.join("; "))]
    NotFound { tried: Vec<String> },
}

/// Where a PDFium library was (or may be) found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PdfiumLocation {
    /// Named by `PDFIUM_LIB_PATH`.
    Explicit(PathBuf),
    /// Present in the shared pdfium cache directory.
    Cached(PathBuf),
    /// Resolved by the platform loader.
    System,
}

impl PdfiumLocation {
    /// The library file, when the location is a concrete path.
    pub fn path(&self) -> Option<&Path> {
        match self {
            PdfiumLocation::Explicit(p) | PdfiumLocation::Cached(p) => Some(p),
            PdfiumLocation::System => None,
        }
    }
}

impl fmt::Display for PdfiumLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PdfiumLocation::Explicit(p) => write!(f, "{} ({LIB_PATH_ENV})", p.display()),
            PdfiumLocation::Cached(p) => write!(f, "{} (cache)", p.display()),
            PdfiumLocation::System => f.write_str("system library path"),
        }
    }
}

/// File name of the PDFium shared library on this platform.
pub fn platform_library_name() -> &'static str {
    if cfg!(target_os = "windows") {
        "pdfium.dll"
    } else if cfg!(target_os = "macos") {
        "libpdfium.dylib"
    } else {
        "libpdfium.so"
    }
}

/// Per-version cache directory shared with the pdf2md tooling.
///
/// - **macOS**: `~/Library/Caches/pdf2md/pdfium-{VERSION}/`
/// - **Linux**: `~/.cache/pdf2md/pdfium-{VERSION}/`
/// - **Windows**: `%LOCALAPPDATA%\pdf2md\pdfium-{VERSION}\`
pub fn pdfium_cache_dir() -> PathBuf {
    if let Ok(override_dir) = std::env::var(CACHE_DIR_ENV) {
        return PathBuf::from(override_dir).join(format!("pdfium-{PDFIUM_VERSION}"));
    }

    let base = dirs::cache_dir()
        .or_else(|| dirs::home_dir().map(|h| h.join(".cache")))
        .unwrap_or_else(std::env::temp_dir);

    base.join("pdf2md").join(format!("pdfium-{PDFIUM_VERSION}"))
}

/// Candidate locations in priority order. Path candidates are only listed
/// when the file exists; [`PdfiumLocation::System`] is always last.
pub fn candidate_locations() -> Vec<PdfiumLocation> {
    let mut out = Vec::with_capacity(3);

    if let Ok(p) = std::env::var(LIB_PATH_ENV) {
        let mut p = PathBuf::from(p);
        if p.is_dir() {
            p.push(platform_library_name());
        }
        if p.is_file() {
            out.push(PdfiumLocation::Explicit(p));
        }
    }

    let cached = pdfium_cache_dir().join(platform_library_name());
    if cached.is_file() {
        out.push(PdfiumLocation::Cached(cached));
    }

    out.push(PdfiumLocation::System);
    out
}

/// Bind to the library at `location`.
pub fn bind(location: &PdfiumLocation) -> Result<Pdfium, PdfiumLocateError> {
    let bindings = match location.path() {
        Some(path) => Pdfium::bind_to_library(path),
        None => Pdfium::bind_to_system_library(),
    };

    bindings.map(Pdfium::new).map_err(|e| PdfiumLocateError::Bind {
        location: location.to_string(),
        reason: format!("{e:?}"),
    })
}

/// Try every candidate in order and return the first that binds.
pub fn locate_and_bind() -> Result<(PdfiumLocation, Pdfium), PdfiumLocateError> {
    let mut tried = Vec::new();

    for location in candidate_locations() {
        match bind(&location) {
            Ok(pdfium) => return Ok((location, pdfium)),
            Err(e) => tried.push(e.to_string()),
        }
    }

    Err(PdfiumLocateError::NotFound { tried })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_dir_is_deterministic() {
        let d1 = pdfium_cache_dir();
        let d2 = pdfium_cache_dir();
        assert_eq!(d1, d2);
        assert!(d1.to_string_lossy().contains(PDFIUM_VERSION));
    }

    #[test]
    fn system_location_is_always_last() {
        let candidates = candidate_locations();
        assert_eq!(candidates.last(), Some(&PdfiumLocation::System));
    }

    #[test]
    fn location_display_names_the_source() {
        let explicit = PdfiumLocation::Explicit(PathBuf::from("/opt/libpdfium.so"));
        assert!(explicit.to_string().contains(LIB_PATH_ENV));
        assert!(PdfiumLocation::Cached(PathBuf::from("/c/libpdfium.so"))
            .to_string()
            .contains("cache"));
        assert_eq!(PdfiumLocation::System.path(), None);
    }

    #[test]
    fn library_name_matches_platform() {
        let name = platform_library_name();
        assert!(name.contains("pdfium"));
    }

    #[test]
    fn not_found_lists_every_attempt() {
        let e = PdfiumLocateError::NotFound {
            tried: vec!["a".into(), "b".into()],
        };
        assert!(e.to_string().contains("a; b"));
    }
}
