//! Error type for the edgequake-doctools library.
//!
//! Every failure is fatal for the invocation: there is no retry and no
//! partial success. Variants are grouped by kind so the binaries can print a
//! message that tells the user what to fix:
//!
//! * **input** — the file or an argument value is wrong;
//! * **environment** — a required engine is not installed;
//! * **execution** — an external tool or the PDF library failed;
//! * **selection** — no pages to work on, detected before rendering starts.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the edgequake-doctools library.
#[derive(Debug, Error)]
pub enum DocToolsError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("File not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Input does not carry a `.pdf` extension.
    #[error("Input must be a .pdf file: '{path}'")]
    NotAPdf { path: PathBuf },

    /// Input extension is not handled by this tool.
    #[error("Unsupported input '{path}': {reason}")]
    UnsupportedInput { path: PathBuf, reason: String },

    /// `--format` is neither png nor jpg.
    #[error("Unsupported format '{0}'. Use png or jpg.")]
    InvalidFormat(String),

    /// `--dpi` is zero.
    #[error("DPI must be > 0, got {0}")]
    InvalidDpi(u32),

    /// `--jpg-quality` is outside 1..=100.
    #[error("JPEG quality must be in 1..100, got {0}")]
    InvalidQuality(u32),

    /// A `--pages` token could not be parsed.
    #[error("Invalid page selection '{token}': {reason}")]
    InvalidPageSpec { token: String, reason: String },

    /// A value does not name a known engine or option.
    #[error("Unknown {what} '{value}'")]
    UnknownChoice { what: &'static str, value: String },

    /// A directory scan found nothing to work on.
    #[error("No PDF files matched: '{path}'")]
    NoInputsMatched { path: PathBuf },

    // ── Environment errors ────────────────────────────────────────────────
    /// Auto-detection found no usable rendering engine.
    #[error(
        "No rendering engine found.\n\
- Recommended: install PDFium and set PDFIUM_LIB_PATH=/path/to/libpdfium\n\
- Or install Poppler (pdftoppm) / ImageMagick (magick) and ensure it's on PATH."
    )]
    NoEngineAvailable,

    /// An explicitly requested engine or tool is not installed.
    #[error("{engine} is not available.\n{hint}")]
    EngineUnavailable { engine: String, hint: String },

    // ── Execution errors ──────────────────────────────────────────────────
    /// An external command exited unsuccessfully.
    #[error("Command failed ({}): {command}\n\n{output}", exit_label(.code))]
    CommandFailed {
        command: String,
        code: Option<i32>,
        output: String,
    },

    /// An external command could not be started.
    #[error("Failed to start '{program}': {source}")]
    CommandSpawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// pdfium rejected the document or a page.
    #[error("PDFium failed on '{path}': {detail}")]
    PdfiumFailed { path: PathBuf, detail: String },

    /// A tool succeeded but its output did not contain what we need.
    #[error("Unable to parse {what} from output for '{path}'")]
    UnparsableOutput { what: &'static str, path: PathBuf },

    /// A tool succeeded but did not produce the expected file.
    #[error("{tool} finished but output not found: '{path}'")]
    MissingProduct { tool: String, path: PathBuf },

    /// Encoding or writing a page image failed.
    #[error("Failed to write image '{path}': {source}")]
    ImageWrite {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// Filesystem operation failed.
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Selection errors ──────────────────────────────────────────────────
    /// Nothing left to render once the selection met the document.
    #[error("No pages selected to render ({detail})")]
    NoPagesSelected { detail: String },

    /// The engine cannot discover the page count itself.
    #[error(
        "{engine} engine requires explicit --pages.\n\
Install PDFium or use pdftoppm for full-document export."
    )]
    PagesRequired { engine: String },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

fn exit_label(code: &Option<i32>) -> String {
    code.map_or_else(|| "signal".to_string(), |c| c.to_string())
}

impl DocToolsError {
    /// Wrap an I/O error together with the path it concerns.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        DocToolsError::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_failed_display_includes_output() {
        let e = DocToolsError::CommandFailed {
            command: "pdftoppm -r 200".into(),
            code: Some(99),
            output: "Syntax Error: broken xref".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("(99)"), "got: {msg}");
        assert!(msg.contains("pdftoppm -r 200"));
        assert!(msg.contains("broken xref"));
    }

    #[test]
    fn command_failed_without_code() {
        let e = DocToolsError::CommandFailed {
            command: "magick".into(),
            code: None,
            output: String::new(),
        };
        assert!(e.to_string().contains("signal"));
    }

    #[test]
    fn pages_required_display() {
        let e = DocToolsError::PagesRequired {
            engine: "magick".into(),
        };
        assert!(e.to_string().contains("magick engine requires explicit --pages"));
    }

    #[test]
    fn no_engine_mentions_alternatives() {
        let msg = DocToolsError::NoEngineAvailable.to_string();
        assert!(msg.contains("pdftoppm"));
        assert!(msg.contains("magick"));
        assert!(msg.contains("PDFIUM_LIB_PATH"));
    }

    #[test]
    fn invalid_quality_display() {
        assert!(DocToolsError::InvalidQuality(150).to_string().contains("150"));
    }
}
