//! pdfium engine: rasterise pages in-process via `pdfium-render`.
//!
//! ## Why spawn_blocking?
//!
//! pdfium is a C++ library with thread-local state and CPU-bound rendering.
//! The whole open → render → encode loop runs on Tokio's blocking pool so the
//! runtime thread never stalls on it.
//!
//! This is the only engine that knows the document's page count, so it is
//! the only one that expands "all pages" itself and quietly drops requested
//! pages past the end of the document.

use crate::config::{ImageFormat, RenderRequest};
use crate::error::DocToolsError;
use crate::output::RenderedPage;
use crate::pages::{page_file_name, pad_width};
use image::codecs::jpeg::JpegEncoder;
use image::DynamicImage;
use pdfium_locate::PdfiumLocation;
use pdfium_render::prelude::*;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::{debug, info, warn};

/// PDF points per inch; pdfium page sizes are in points.
const POINTS_PER_INCH: f32 = 72.0;

/// Handle to a pdfium library that bound successfully during probing.
#[derive(Debug, Clone)]
pub struct PdfiumEngine {
    location: PdfiumLocation,
}

impl PdfiumEngine {
    /// Bind once to prove the library loads; the binding itself is dropped.
    pub fn probe() -> Option<Self> {
        match pdfium_locate::locate_and_bind() {
            Ok((location, _pdfium)) => {
                debug!("PDFium available at {}", location);
                Some(Self { location })
            }
            Err(e) => {
                debug!("PDFium unavailable: {}", e);
                None
            }
        }
    }

    pub fn location(&self) -> &PdfiumLocation {
        &self.location
    }

    pub async fn render(&self, request: &RenderRequest) -> Result<Vec<RenderedPage>, DocToolsError> {
        let location = self.location.clone();
        let request = request.clone();

        tokio::task::spawn_blocking(move || render_blocking(&location, &request))
            .await
            .map_err(|e| DocToolsError::Internal(format!("Render task panicked: {e}")))?
    }

    /// Number of pages in `pdf_path`.
    pub async fn page_count(&self, pdf_path: &Path) -> Result<usize, DocToolsError> {
        let location = self.location.clone();
        let path = pdf_path.to_path_buf();

        tokio::task::spawn_blocking(move || -> Result<usize, DocToolsError> {
            let pdfium = bind(&location)?;
            let document = open(&pdfium, &path)?;
            Ok(document.pages().len() as usize)
        })
        .await
        .map_err(|e| DocToolsError::Internal(format!("Page-count task panicked: {e}")))?
    }
}

fn bind(location: &PdfiumLocation) -> Result<Pdfium, DocToolsError> {
    pdfium_locate::bind(location).map_err(|e| DocToolsError::EngineUnavailable {
        engine: "pdfium".into(),
        hint: e.to_string(),
    })
}

fn open<'a>(pdfium: &'a Pdfium, path: &Path) -> Result<PdfDocument<'a>, DocToolsError> {
    pdfium
        .load_pdf_from_file(path, None)
        .map_err(|e| DocToolsError::PdfiumFailed {
            path: path.to_path_buf(),
            detail: format!("{e:?}"),
        })
}

/// Blocking implementation of page rendering.
fn render_blocking(
    location: &PdfiumLocation,
    request: &RenderRequest,
) -> Result<Vec<RenderedPage>, DocToolsError> {
    let pdfium = bind(location)?;
    let document = open(&pdfium, &request.input)?;

    let pages = document.pages();
    let total_pages = pages.len() as u32;
    info!("PDF loaded: {} pages", total_pages);

    let selected = request.pages.resolve(total_pages);
    for dropped in request.pages.iter().filter(|&p| p > total_pages) {
        warn!("Skipping page {} (out of range, total={})", dropped, total_pages);
    }
    if selected.is_empty() {
        return Err(DocToolsError::NoPagesSelected {
            detail: format!("document has {total_pages} pages"),
        });
    }

    if let Some(ref cb) = request.progress_callback {
        cb.on_render_start(Some(selected.len()));
    }

    let render_config =
        PdfRenderConfig::new().scale_page_by_factor(request.dpi as f32 / POINTS_PER_INCH);
    let width = pad_width(total_pages);
    let ext = request.format.extension();

    let mut results = Vec::with_capacity(selected.len());

    for page_no in selected {
        let rasterisation_failed = |e: PdfiumError| DocToolsError::PdfiumFailed {
            path: request.input.clone(),
            detail: format!("page {page_no}: {e:?}"),
        };

        let page = pages
            .get((page_no - 1) as u16)
            .map_err(rasterisation_failed)?;
        let bitmap = page
            .render_with_config(&render_config)
            .map_err(rasterisation_failed)?;

        let image = bitmap.as_image();
        let out_path = request
            .out_dir
            .join(page_file_name(&request.prefix, page_no, width, ext));

        save_image(&image, &out_path, request.format, request.jpg_quality)?;
        debug!(
            "Rendered page {} → {}x{} px → {}",
            page_no,
            image.width(),
            image.height(),
            out_path.display()
        );

        if let Some(ref cb) = request.progress_callback {
            cb.on_page_rendered(page_no, &out_path);
        }
        results.push(RenderedPage {
            page: page_no,
            path: out_path,
        });
    }

    Ok(results)
}

/// Encode `image` to `path`. JPEG drops the alpha channel and honours
/// `quality`; PNG ignores it.
pub fn save_image(
    image: &DynamicImage,
    path: &Path,
    format: ImageFormat,
    quality: u8,
) -> Result<(), DocToolsError> {
    let write_failed = |source: image::ImageError| DocToolsError::ImageWrite {
        path: path.to_path_buf(),
        source,
    };

    match format {
        ImageFormat::Png => image
            .save_with_format(path, image::ImageFormat::Png)
            .map_err(write_failed),
        ImageFormat::Jpg => {
            let file = std::fs::File::create(path)
                .map_err(|e| write_failed(image::ImageError::IoError(e)))?;
            let mut writer = BufWriter::new(file);
            let encoder = JpegEncoder::new_with_quality(&mut writer, quality);
            image.to_rgb8().write_with_encoder(encoder).map_err(write_failed)?;
            writer
                .flush()
                .map_err(|e| write_failed(image::ImageError::IoError(e)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn red_square() -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(10, 10, Rgba([255, 0, 0, 255])))
    }

    #[test]
    fn save_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page_01.png");
        save_image(&red_square(), &path, ImageFormat::Png, 85).unwrap();
        let back = image::open(&path).unwrap();
        assert_eq!((back.width(), back.height()), (10, 10));
    }

    #[test]
    fn save_jpeg_with_quality() {
        let dir = tempfile::tempdir().unwrap();
        let low = dir.path().join("low.jpg");
        let high = dir.path().join("high.jpg");
        save_image(&red_square(), &low, ImageFormat::Jpg, 5).unwrap();
        save_image(&red_square(), &high, ImageFormat::Jpg, 100).unwrap();

        let bytes = std::fs::read(&high).unwrap();
        assert_eq!(&bytes[..2], &[0xFF, 0xD8], "JPEG SOI marker");
        assert!(std::fs::metadata(&low).unwrap().len() <= bytes.len() as u64);
    }

    #[test]
    fn save_into_missing_dir_fails() {
        let err = save_image(
            &red_square(),
            Path::new("/definitely/missing/dir/p.jpg"),
            ImageFormat::Jpg,
            85,
        )
        .unwrap_err();
        assert!(matches!(err, DocToolsError::ImageWrite { .. }));
    }
}
