//! Configuration types for page rendering.
//!
//! A [`RenderRequest`] is built once per invocation through
//! [`RenderRequestBuilder`], which validates every argument before any engine
//! is probed or invoked: a bad `--format`, `--dpi 0`, or `--jpg-quality 150`
//! fails here, never half-way through a render.

use crate::error::DocToolsError;
use crate::input;
use crate::pages::PageSelection;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// A validated request to split a PDF into page images.
///
/// # Example
/// ```rust,no_run
/// use edgequake_doctools::{EngineChoice, RenderRequest};
///
/// let request = RenderRequest::builder("resume.pdf", "out/pages")
///     .format("jpg")
///     .dpi(150)
///     .pages_spec("1-2,4")
///     .engine(EngineChoice::Auto)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct RenderRequest {
    /// Canonical path of the input PDF.
    pub input: PathBuf,

    /// Absolute output directory; created by the renderer if absent.
    pub out_dir: PathBuf,

    /// Output image format. Default: PNG.
    pub format: ImageFormat,

    /// Rendering resolution. Default: 200.
    pub dpi: u32,

    /// JPEG quality, 1–100. Default: 85. Ignored for PNG.
    pub jpg_quality: u8,

    /// Output filename prefix. Default: `page_`.
    pub prefix: String,

    /// Pages to render. Default: all.
    pub pages: PageSelection,

    /// Engine to use. Default: [`EngineChoice::Auto`].
    pub engine: EngineChoice,

    /// Optional per-page progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl fmt::Debug for RenderRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderRequest")
            .field("input", &self.input)
            .field("out_dir", &self.out_dir)
            .field("format", &self.format)
            .field("dpi", &self.dpi)
            .field("jpg_quality", &self.jpg_quality)
            .field("prefix", &self.prefix)
            .field("pages", &self.pages)
            .field("engine", &self.engine)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn RenderProgressCallback>"),
            )
            .finish()
    }
}

impl RenderRequest {
    pub const DEFAULT_DPI: u32 = 200;
    pub const DEFAULT_JPG_QUALITY: u32 = 85;
    pub const DEFAULT_PREFIX: &'static str = "page_";

    /// Create a builder for the given input PDF and output directory.
    pub fn builder(input: impl AsRef<Path>, out_dir: impl AsRef<Path>) -> RenderRequestBuilder {
        RenderRequestBuilder {
            input: input.as_ref().to_path_buf(),
            out_dir: out_dir.as_ref().to_path_buf(),
            format: ImageFormat::Png.extension().to_string(),
            dpi: Self::DEFAULT_DPI,
            jpg_quality: Self::DEFAULT_JPG_QUALITY,
            prefix: Self::DEFAULT_PREFIX.to_string(),
            pages: PagesArg::Selection(PageSelection::all()),
            engine: EngineChoice::Auto,
            progress_callback: None,
        }
    }
}

enum PagesArg {
    Spec(String),
    Selection(PageSelection),
}

/// Builder for [`RenderRequest`]. Values are stored raw and checked in
/// [`RenderRequestBuilder::build`].
pub struct RenderRequestBuilder {
    input: PathBuf,
    out_dir: PathBuf,
    format: String,
    dpi: u32,
    jpg_quality: u32,
    prefix: String,
    pages: PagesArg,
    engine: EngineChoice,
    progress_callback: Option<ProgressCallback>,
}

impl RenderRequestBuilder {
    /// Format name as typed by the user: `png`, `jpg`, `jpeg`, `.PNG`, …
    pub fn format(mut self, name: impl Into<String>) -> Self {
        self.format = name.into();
        self
    }

    pub fn image_format(mut self, format: ImageFormat) -> Self {
        self.format = format.extension().to_string();
        self
    }

    pub fn dpi(mut self, dpi: u32) -> Self {
        self.dpi = dpi;
        self
    }

    pub fn jpg_quality(mut self, quality: u32) -> Self {
        self.jpg_quality = quality;
        self
    }

    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Textual selection such as `"1-3,5"`; empty means all pages.
    pub fn pages_spec(mut self, spec: impl Into<String>) -> Self {
        self.pages = PagesArg::Spec(spec.into());
        self
    }

    pub fn pages(mut self, selection: PageSelection) -> Self {
        self.pages = PagesArg::Selection(selection);
        self
    }

    pub fn engine(mut self, engine: EngineChoice) -> Self {
        self.engine = engine;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.progress_callback = Some(cb);
        self
    }

    /// Validate every field and produce the request.
    ///
    /// Checks run in this order: input exists, input is a `.pdf`, format,
    /// DPI, JPEG quality, page selection.
    pub fn build(self) -> Result<RenderRequest, DocToolsError> {
        let input = input::resolve_pdf(&self.input)?;
        let out_dir = input::absolute(&self.out_dir)?;
        let format = ImageFormat::from_str(&self.format)?;

        if self.dpi == 0 {
            return Err(DocToolsError::InvalidDpi(self.dpi));
        }
        if !(1..=100).contains(&self.jpg_quality) {
            return Err(DocToolsError::InvalidQuality(self.jpg_quality));
        }

        let pages = match self.pages {
            PagesArg::Spec(spec) => PageSelection::parse(&spec)?,
            PagesArg::Selection(sel) => sel,
        };

        Ok(RenderRequest {
            input,
            out_dir,
            format,
            dpi: self.dpi,
            jpg_quality: self.jpg_quality as u8,
            prefix: self.prefix,
            pages,
            engine: self.engine,
            progress_callback: self.progress_callback,
        })
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Raster format of the page images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    #[default]
    Png,
    Jpg,
}

impl ImageFormat {
    /// File extension, also the canonical name.
    pub fn extension(self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpg => "jpg",
        }
    }
}

impl FromStr for ImageFormat {
    type Err = DocToolsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().trim_start_matches('.').to_lowercase().as_str() {
            "png" => Ok(ImageFormat::Png),
            "jpg" | "jpeg" => Ok(ImageFormat::Jpg),
            _ => Err(DocToolsError::InvalidFormat(s.to_string())),
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Which rendering engine to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineChoice {
    /// Probe pdfium, then pdftoppm, then magick.
    #[default]
    Auto,
    /// The pdfium library via pdfium-render.
    Pdfium,
    /// Poppler's `pdftoppm` rasterizer.
    Pdftoppm,
    /// ImageMagick's `magick`.
    Magick,
}

impl FromStr for EngineChoice {
    type Err = DocToolsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "auto" => Ok(EngineChoice::Auto),
            "pdfium" => Ok(EngineChoice::Pdfium),
            "pdftoppm" => Ok(EngineChoice::Pdftoppm),
            "magick" => Ok(EngineChoice::Magick),
            _ => Err(DocToolsError::UnknownChoice {
                what: "engine",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for EngineChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EngineChoice::Auto => "auto",
            EngineChoice::Pdfium => "pdfium",
            EngineChoice::Pdftoppm => "pdftoppm",
            EngineChoice::Magick => "magick",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_pdf() -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let pdf = dir.path().join("in.pdf");
        std::fs::write(&pdf, b"%PDF-1.4\n").unwrap();
        (dir, pdf)
    }

    #[test]
    fn format_aliases() {
        assert_eq!("PNG".parse::<ImageFormat>().unwrap(), ImageFormat::Png);
        assert_eq!(".jpeg".parse::<ImageFormat>().unwrap(), ImageFormat::Jpg);
        assert_eq!("Jpg".parse::<ImageFormat>().unwrap(), ImageFormat::Jpg);
        assert!("gif".parse::<ImageFormat>().is_err());
    }

    #[test]
    fn engine_names() {
        assert_eq!("PDFTOPPM".parse::<EngineChoice>().unwrap(), EngineChoice::Pdftoppm);
        assert!("pymupdf".parse::<EngineChoice>().is_err());
        assert_eq!(EngineChoice::Magick.to_string(), "magick");
    }

    #[test]
    fn defaults() {
        let (_dir, pdf) = sample_pdf();
        let req = RenderRequest::builder(&pdf, "out").build().unwrap();
        assert_eq!(req.format, ImageFormat::Png);
        assert_eq!(req.dpi, 200);
        assert_eq!(req.jpg_quality, 85);
        assert_eq!(req.prefix, "page_");
        assert!(req.pages.is_all());
        assert_eq!(req.engine, EngineChoice::Auto);
        assert!(req.out_dir.is_absolute());
    }

    #[test]
    fn invalid_format_fails() {
        let (_dir, pdf) = sample_pdf();
        let err = RenderRequest::builder(&pdf, "out").format("gif").build().unwrap_err();
        assert!(matches!(err, DocToolsError::InvalidFormat(_)));
    }

    #[test]
    fn zero_dpi_fails() {
        let (_dir, pdf) = sample_pdf();
        let err = RenderRequest::builder(&pdf, "out").dpi(0).build().unwrap_err();
        assert!(matches!(err, DocToolsError::InvalidDpi(0)));
    }

    #[test]
    fn quality_out_of_range_fails() {
        let (_dir, pdf) = sample_pdf();
        for q in [0, 101, 150] {
            let err = RenderRequest::builder(&pdf, "out")
                .jpg_quality(q)
                .build()
                .unwrap_err();
            assert!(matches!(err, DocToolsError::InvalidQuality(_)), "quality {q}");
        }
    }

    #[test]
    fn bad_page_spec_fails() {
        let (_dir, pdf) = sample_pdf();
        let err = RenderRequest::builder(&pdf, "out")
            .pages_spec("0-2")
            .build()
            .unwrap_err();
        assert!(matches!(err, DocToolsError::InvalidPageSpec { .. }));
    }

    #[test]
    fn missing_input_is_checked_first() {
        let err = RenderRequest::builder("/no/such/file.pdf", "out")
            .format("gif")
            .build()
            .unwrap_err();
        assert!(matches!(err, DocToolsError::FileNotFound { .. }));
    }

    #[test]
    fn debug_hides_callback() {
        let (_dir, pdf) = sample_pdf();
        let req = RenderRequest::builder(&pdf, "out")
            .progress_callback(std::sync::Arc::new(crate::progress::NoopProgressCallback))
            .build()
            .unwrap();
        assert!(format!("{req:?}").contains("<dyn RenderProgressCallback>"));
    }
}
