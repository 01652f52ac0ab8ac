//! Rendering engines and their selection.
//!
//! Three interchangeable engines turn PDF pages into images:
//!
//! | Engine | Backed by | Sparse pages | "All pages" |
//! |--------|-----------|--------------|-------------|
//! | [`pdfium`]   | pdfium library via `pdfium-render` | yes | yes |
//! | [`pdftoppm`] | Poppler CLI | contiguous runs only | yes |
//! | [`magick`]   | ImageMagick CLI | one page per call | no — explicit pages required |
//!
//! ## Selection
//!
//! [`EngineChoice::Auto`] walks [`AUTO_PRIORITY`] and takes the first probe
//! that returns a handle. Probing happens on every call; nothing is cached
//! between runs. An explicit choice probes only that engine.

pub mod magick;
pub mod pdfium;
pub mod pdftoppm;

use crate::config::{EngineChoice, RenderRequest};
use crate::error::DocToolsError;
use crate::output::RenderedPage;
use tracing::debug;

pub use magick::MagickEngine;
pub use pdfium::PdfiumEngine;
pub use pdftoppm::PdftoppmEngine;

/// An availability check returning a ready engine handle, or `None`.
pub type Probe = fn() -> Option<Engine>;

/// Probe order used by [`EngineChoice::Auto`].
pub const AUTO_PRIORITY: [(EngineChoice, Probe); 3] = [
    (EngineChoice::Pdfium, probe_pdfium),
    (EngineChoice::Pdftoppm, probe_pdftoppm),
    (EngineChoice::Magick, probe_magick),
];

fn probe_pdfium() -> Option<Engine> {
    PdfiumEngine::probe().map(Engine::Pdfium)
}

fn probe_pdftoppm() -> Option<Engine> {
    PdftoppmEngine::probe().map(Engine::Pdftoppm)
}

fn probe_magick() -> Option<Engine> {
    MagickEngine::probe().map(Engine::Magick)
}

/// A probed, available engine.
#[derive(Debug, Clone)]
pub enum Engine {
    Pdfium(PdfiumEngine),
    Pdftoppm(PdftoppmEngine),
    Magick(MagickEngine),
}

impl Engine {
    pub fn kind(&self) -> EngineChoice {
        match self {
            Engine::Pdfium(_) => EngineChoice::Pdfium,
            Engine::Pdftoppm(_) => EngineChoice::Pdftoppm,
            Engine::Magick(_) => EngineChoice::Magick,
        }
    }

    /// Whether the engine needs an explicit page list.
    pub fn requires_explicit_pages(&self) -> bool {
        matches!(self, Engine::Magick(_))
    }

    /// Render the request's pages into its output directory.
    ///
    /// Selection errors are raised before the output directory is touched.
    pub async fn render(&self, request: &RenderRequest) -> Result<Vec<RenderedPage>, DocToolsError> {
        if self.requires_explicit_pages() && request.pages.is_all() {
            return Err(DocToolsError::PagesRequired {
                engine: self.kind().to_string(),
            });
        }

        tokio::fs::create_dir_all(&request.out_dir)
            .await
            .map_err(|e| DocToolsError::io(&request.out_dir, e))?;

        match self {
            Engine::Pdfium(e) => e.render(request).await,
            Engine::Pdftoppm(e) => e.render(request).await,
            Engine::Magick(e) => e.render(request).await,
        }
    }
}

/// First available engine in [`AUTO_PRIORITY`] order.
pub fn detect_engine() -> Option<Engine> {
    AUTO_PRIORITY.iter().find_map(|(kind, probe)| {
        let found = probe();
        debug!("Probe {}: {}", kind, if found.is_some() { "available" } else { "missing" });
        found
    })
}

/// Resolve a user choice to an available engine.
pub fn select_engine(choice: EngineChoice) -> Result<Engine, DocToolsError> {
    let unavailable = |hint: &str| DocToolsError::EngineUnavailable {
        engine: choice.to_string(),
        hint: hint.to_string(),
    };

    match choice {
        EngineChoice::Auto => detect_engine().ok_or(DocToolsError::NoEngineAvailable),
        EngineChoice::Pdfium => probe_pdfium().ok_or_else(|| {
            unavailable("Install PDFium and set PDFIUM_LIB_PATH=/path/to/libpdfium, or put it on the library path.")
        }),
        EngineChoice::Pdftoppm => probe_pdftoppm()
            .ok_or_else(|| unavailable("pdftoppm not found on PATH. Install Poppler (poppler-utils).")),
        EngineChoice::Magick => probe_magick()
            .ok_or_else(|| unavailable("ImageMagick `magick` not found on PATH.")),
    }
}
