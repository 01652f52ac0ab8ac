//! ImageMagick engine.
//!
//! `magick` reads a single page with the `file.pdf[index]` syntax (zero-based)
//! and cannot report the document length, so it needs an explicit page list
//! and is invoked once per page.

use crate::config::{ImageFormat, RenderRequest};
use crate::error::DocToolsError;
use crate::output::RenderedPage;
use crate::pages::{page_file_name, pad_width};
use crate::process::{find_executable, ExternalCommand};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct MagickEngine {
    exe: PathBuf,
}

impl MagickEngine {
    pub const EXECUTABLE: &'static str = "magick";

    pub fn probe() -> Option<Self> {
        find_executable(Self::EXECUTABLE).map(Self::with_executable)
    }

    /// Use a specific binary instead of searching `PATH`.
    pub fn with_executable(exe: PathBuf) -> Self {
        Self { exe }
    }

    /// Command line rendering 1-indexed `page` to `out_path`.
    pub fn command(&self, request: &RenderRequest, page: u32, out_path: &Path) -> ExternalCommand {
        let mut source = OsString::from(request.input.as_os_str());
        source.push(format!("[{}]", page - 1));

        let cmd = ExternalCommand::new(&self.exe)
            .arg("-density")
            .arg(request.dpi.to_string())
            .arg(source);

        let cmd = match request.format {
            ImageFormat::Jpg => cmd.arg("-quality").arg(request.jpg_quality.to_string()),
            ImageFormat::Png => cmd,
        };

        cmd.arg(out_path)
    }

    pub async fn render(&self, request: &RenderRequest) -> Result<Vec<RenderedPage>, DocToolsError> {
        let Some(largest) = request.pages.max() else {
            return Err(DocToolsError::PagesRequired {
                engine: Self::EXECUTABLE.into(),
            });
        };
        let width = pad_width(largest);
        let ext = request.format.extension();

        if let Some(ref cb) = request.progress_callback {
            cb.on_render_start(Some(request.pages.len()));
        }

        let mut results = Vec::with_capacity(request.pages.len());
        for page in request.pages.iter() {
            let out_path = request
                .out_dir
                .join(page_file_name(&request.prefix, page, width, ext));

            self.command(request, page, &out_path).run().await?;
            debug!("Rendered page {} → {}", page, out_path.display());

            if let Some(ref cb) = request.progress_callback {
                cb.on_page_rendered(page, &out_path);
            }
            results.push(RenderedPage {
                page,
                path: out_path,
            });
        }

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(format: &str, pages: &str) -> (tempfile::TempDir, RenderRequest) {
        let dir = tempfile::tempdir().unwrap();
        let pdf = dir.path().join("in.pdf");
        std::fs::write(&pdf, b"%PDF-1.4\n").unwrap();
        let req = RenderRequest::builder(&pdf, dir.path().join("out"))
            .format(format)
            .dpi(300)
            .jpg_quality(60)
            .pages_spec(pages)
            .build()
            .unwrap();
        (dir, req)
    }

    fn args(cmd: &ExternalCommand) -> Vec<String> {
        cmd.get_args()
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn uses_zero_based_index() {
        let (_dir, req) = request("png", "4");
        let engine = MagickEngine::with_executable(PathBuf::from("magick"));
        let a = args(&engine.command(&req, 4, Path::new("out/page_04.png")));
        assert_eq!(&a[..2], &["-density", "300"]);
        assert!(a[2].ends_with("in.pdf[3]"), "got {}", a[2]);
        assert!(!a.contains(&"-quality".to_string()));
        assert_eq!(a.last().unwrap(), "out/page_04.png");
    }

    #[test]
    fn jpeg_sets_quality() {
        let (_dir, req) = request("jpg", "1");
        let engine = MagickEngine::with_executable(PathBuf::from("magick"));
        let a = args(&engine.command(&req, 1, Path::new("p.jpg")));
        let q = a.iter().position(|x| x == "-quality").unwrap();
        assert_eq!(a[q + 1], "60");
    }

    #[test]
    fn all_pages_is_rejected() {
        let (_dir, req) = request("png", "");
        let engine = MagickEngine::with_executable(PathBuf::from("/no/such/magick"));
        let err = tokio_test::block_on(engine.render(&req)).unwrap_err();
        assert!(matches!(err, DocToolsError::PagesRequired { .. }));
        assert!(!req.out_dir.exists());
    }
}
