//! Extract plain text from a document for downstream editing.
//!
//! | Input | Tool | Product |
//! |-------|------|---------|
//! | `.pdf` | `pdftotext -layout` | `content.txt` (+ `layout/` via `pdftohtml` on request) |
//! | `.docx` | `pandoc -t plain` | `content.txt` |
//! | `.html .htm .tex .typ .md .txt` | none | `content.txt` (copied, lossy UTF-8) |
//!
//! Everything lands in a work directory: the caller's, or a fresh temporary
//! one that is removed when the returned [`IngestOutput`] is dropped unless
//! it was asked to be kept.

use crate::error::DocToolsError;
use crate::input;
use crate::process::{self, ExternalCommand};
use crate::workdir::ScopedDir;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const CONTENT_FILE: &str = "content.txt";
pub const LAYOUT_DIR: &str = "layout";

/// Extensions copied verbatim as text.
pub const TEXT_EXTENSIONS: [&str; 6] = ["html", "htm", "tex", "typ", "md", "txt"];

/// What to ingest and where.
#[derive(Debug, Clone, Default)]
pub struct IngestRequest {
    pub input: PathBuf,
    /// PDF only: also produce a `pdftohtml` layout reference.
    pub with_layout: bool,
    /// Use this directory instead of a temporary one. Never removed.
    pub workdir: Option<PathBuf>,
    /// Keep the temporary work directory after the output is dropped.
    pub keep_workdir: bool,
}

impl IngestRequest {
    pub fn new(input: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            ..Default::default()
        }
    }

    pub fn with_layout(mut self, yes: bool) -> Self {
        self.with_layout = yes;
        self
    }

    pub fn workdir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.workdir = Some(dir.into());
        self
    }

    pub fn keep_workdir(mut self, yes: bool) -> Self {
        self.keep_workdir = yes;
        self
    }
}

/// How an input is turned into text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestKind {
    Pdf,
    Docx,
    Text,
}

impl IngestKind {
    pub fn for_input(path: &Path) -> Result<Self, DocToolsError> {
        let ext = input::extension_lower(path);
        match ext.as_str() {
            "pdf" => Ok(IngestKind::Pdf),
            "docx" => Ok(IngestKind::Docx),
            e if TEXT_EXTENSIONS.contains(&e) => Ok(IngestKind::Text),
            _ => Err(DocToolsError::UnsupportedInput {
                path: path.to_path_buf(),
                reason: format!("cannot ingest '.{ext}' files"),
            }),
        }
    }
}

/// Products of an ingest run.
#[derive(Debug, Serialize)]
pub struct IngestOutput {
    pub workdir: PathBuf,
    pub content_txt: PathBuf,
    /// First `layout*.html`, or the layout directory when none was produced.
    pub layout_ref: Option<PathBuf>,
    /// Temporary work directory, removed on drop.
    #[serde(skip)]
    scratch: Option<ScopedDir>,
}

impl IngestOutput {
    /// Whether the work directory goes away with this value.
    pub fn is_temporary(&self) -> bool {
        self.scratch.is_some()
    }

    /// `KEY=value` lines for shell consumption.
    pub fn to_env_lines(&self) -> String {
        let mut out = format!(
            "WORKDIR={}\nCONTENT_TXT={}\n",
            self.workdir.display(),
            self.content_txt.display()
        );
        if let Some(ref layout) = self.layout_ref {
            out.push_str(&format!("LAYOUT_REF={}\n", layout.display()));
        }
        out
    }
}

/// Run the ingest.
///
/// On error a temporary work directory is removed before returning, even
/// with `keep_workdir`.
pub async fn ingest(request: &IngestRequest) -> Result<IngestOutput, DocToolsError> {
    let input = input::resolve_existing(&request.input)?;
    let kind = IngestKind::for_input(&input)?;

    let (workdir, scratch) = match request.workdir {
        Some(ref dir) => {
            let dir = input::absolute(dir)?;
            tokio::fs::create_dir_all(&dir)
                .await
                .map_err(|e| DocToolsError::io(&dir, e))?;
            (dir, None)
        }
        None => {
            let scratch = ScopedDir::new("doctools_ingest_")?;
            (scratch.path().to_path_buf(), Some(scratch))
        }
    };
    info!("Ingesting {} into {}", input.display(), workdir.display());

    let content_txt = workdir.join(CONTENT_FILE);
    let mut layout_ref = None;

    match kind {
        IngestKind::Pdf => {
            pdf_to_text(&input, &content_txt).await?;
            if request.with_layout {
                layout_ref = Some(pdf_to_html(&input, &workdir.join(LAYOUT_DIR)).await?);
            }
        }
        IngestKind::Docx => docx_to_text(&input, &content_txt).await?,
        IngestKind::Text => copy_as_text(&input, &content_txt).await?,
    }

    let scratch = match scratch {
        Some(s) if request.keep_workdir => {
            debug!("Keeping work directory {}", s.path().display());
            s.keep();
            None
        }
        other => other,
    };

    Ok(IngestOutput {
        workdir,
        content_txt,
        layout_ref,
        scratch,
    })
}

async fn pdf_to_text(pdf: &Path, out: &Path) -> Result<(), DocToolsError> {
    let tool = process::require("pdftotext", "pdftotext not found on PATH (poppler).")?;
    ExternalCommand::new(tool)
        .arg("-layout")
        .arg(pdf)
        .arg(out)
        .run()
        .await?;
    Ok(())
}

async fn pdf_to_html(pdf: &Path, out_dir: &Path) -> Result<PathBuf, DocToolsError> {
    let tool = process::require("pdftohtml", "pdftohtml not found on PATH (poppler).")?;
    tokio::fs::create_dir_all(out_dir)
        .await
        .map_err(|e| DocToolsError::io(out_dir, e))?;

    ExternalCommand::new(tool)
        .args(["-noframes", "-hidden", "-enc", "UTF-8"])
        .arg(pdf)
        .arg(out_dir.join("layout"))
        .run()
        .await?;

    Ok(first_layout_html(out_dir)?.unwrap_or_else(|| out_dir.to_path_buf()))
}

/// Alphabetically first `layout*.html` in `dir`.
fn first_layout_html(dir: &Path) -> Result<Option<PathBuf>, DocToolsError> {
    let mut found: Vec<PathBuf> = std::fs::read_dir(dir)
        .map_err(|e| DocToolsError::io(dir, e))?
        .filter_map(Result::ok)
        .map(|e| e.path())
        .filter(|p| {
            p.file_name()
                .map(|n| n.to_string_lossy())
                .is_some_and(|n| n.starts_with("layout") && n.ends_with(".html"))
        })
        .collect();
    found.sort();
    Ok(found.into_iter().next())
}

async fn docx_to_text(docx: &Path, out: &Path) -> Result<(), DocToolsError> {
    let tool = process::require("pandoc", "pandoc not found on PATH.")?;
    ExternalCommand::new(tool)
        .arg(docx)
        .args(["-t", "plain", "-o"])
        .arg(out)
        .run()
        .await?;
    Ok(())
}

async fn copy_as_text(src: &Path, out: &Path) -> Result<(), DocToolsError> {
    let bytes = tokio::fs::read(src)
        .await
        .map_err(|e| DocToolsError::io(src, e))?;
    tokio::fs::write(out, String::from_utf8_lossy(&bytes).as_bytes())
        .await
        .map_err(|e| DocToolsError::io(out, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_by_extension() {
        assert_eq!(IngestKind::for_input(Path::new("cv.PDF")).unwrap(), IngestKind::Pdf);
        assert_eq!(IngestKind::for_input(Path::new("cv.docx")).unwrap(), IngestKind::Docx);
        for ext in TEXT_EXTENSIONS {
            let p = PathBuf::from(format!("cv.{ext}"));
            assert_eq!(IngestKind::for_input(&p).unwrap(), IngestKind::Text, "{ext}");
        }
        assert!(matches!(
            IngestKind::for_input(Path::new("cv.odt")),
            Err(DocToolsError::UnsupportedInput { .. })
        ));
    }

    #[tokio::test]
    async fn text_into_temp_workdir_is_removed_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("cv.md");
        std::fs::write(&src, b"# Jane Doe\n\xff\n").unwrap();

        let out = ingest(&IngestRequest::new(&src)).await.unwrap();
        assert!(out.is_temporary());
        let text = std::fs::read_to_string(&out.content_txt).unwrap();
        assert!(text.starts_with("# Jane Doe"));
        assert!(text.contains('\u{FFFD}'));

        let workdir = out.workdir.clone();
        drop(out);
        assert!(!workdir.exists());
    }

    #[tokio::test]
    async fn keep_workdir_survives_drop() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("cv.txt");
        std::fs::write(&src, "text").unwrap();

        let out = ingest(&IngestRequest::new(&src).keep_workdir(true)).await.unwrap();
        assert!(!out.is_temporary());
        let workdir = out.workdir.clone();
        drop(out);
        assert!(workdir.join(CONTENT_FILE).exists());
        std::fs::remove_dir_all(workdir).unwrap();
    }

    #[tokio::test]
    async fn explicit_workdir_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("cv.tex");
        std::fs::write(&src, "\\section{x}").unwrap();
        let work = dir.path().join("nested/work");

        let out = ingest(&IngestRequest::new(&src).workdir(&work)).await.unwrap();
        assert!(!out.is_temporary());
        assert_eq!(out.content_txt, std::path::absolute(&work).unwrap().join(CONTENT_FILE));
        assert!(out.to_env_lines().starts_with("WORKDIR="));
        assert!(!out.to_env_lines().contains("LAYOUT_REF"));
    }

    #[test]
    fn picks_first_layout_file() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["layout-2.html", "layout.html", "layout.png", "other.html"] {
            std::fs::write(dir.path().join(name), "").unwrap();
        }
        let first = first_layout_html(dir.path()).unwrap().unwrap();
        assert!(first.ends_with("layout-2.html"));
    }
}
