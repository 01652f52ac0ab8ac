//! # edgequake-doctools
//!
//! Document conversion utilities built on proven external tools: split a PDF
//! into page images, count pages, compile HTML / Typst / LaTeX to PDF, and
//! extract plain text from a resume-like document.
//!
//! ## Why wrap tools instead of parsing documents?
//!
//! pdfium, Poppler, ImageMagick, Chrome, typst, and latexmk already render
//! these formats faithfully. This crate picks whichever is installed, drives
//! it with the right arguments, normalises page selections and output file
//! names, and turns failures into typed errors carrying the tool's output.
//!
//! ## Page rendering
//!
//! ```text
//! RenderRequest::builder(...).build()   validate input, format, dpi, quality, pages
//!  │
//!  ├─ select_engine   pdfium → pdftoppm → magick (first available wins)
//!  ├─ render          one image per selected page, <prefix><NN>.<ext>
//!  └─ RenderOutput    engine used + (page, path) list
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_doctools::{render_pages, RenderRequest};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let request = RenderRequest::builder("resume.pdf", "out/pages")
//!         .format("jpg")
//!         .pages_spec("1-2,4")
//!         .build()?;
//!     let output = render_pages(&request).await?;
//!     for page in &output.pages {
//!         println!("{} → {}", page.page, page.path.display());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf2img`, `pdfpages`, `doc2pdf`, `docingest` binaries |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! edgequake-doctools = { version = "0.1", default-features = false }
//! ```
//!
//! ## Engines
//!
//! | Engine | Needs | Notes |
//! |--------|-------|-------|
//! | `pdfium`   | libpdfium (`PDFIUM_LIB_PATH`, cache dir, or system) | in-process, knows the page count |
//! | `pdftoppm` | Poppler on `PATH` | one call per contiguous page run |
//! | `magick`   | ImageMagick on `PATH` | explicit `--pages` required |

// ── Modules ──────────────────────────────────────────────────────────────

#[cfg(feature = "cli")]
pub mod cli;
pub mod compile;
pub mod config;
pub mod engine;
pub mod error;
pub mod ingest;
pub mod input;
pub mod output;
pub mod page_count;
pub mod pages;
pub mod process;
pub mod progress;
pub mod render;
pub mod workdir;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use compile::{compile, CompileEngine, CompileRequest, Paper};
pub use config::{EngineChoice, ImageFormat, RenderRequest, RenderRequestBuilder};
pub use engine::{detect_engine, select_engine, Engine};
pub use error::DocToolsError;
pub use ingest::{ingest, IngestOutput, IngestRequest};
pub use output::{RenderOutput, RenderedPage};
pub use page_count::{count_pages, PageCount, PageCountEngine, PageCountReport, PageCountRequest};
pub use pages::PageSelection;
pub use progress::{NoopProgressCallback, ProgressCallback, RenderProgressCallback};
pub use render::{render_pages, render_pages_sync};
