//! pdftoppm engine: Poppler's command-line rasterizer.
//!
//! `pdftoppm` only understands one contiguous `-f first -l last` range per
//! call and names its files `<stem>-<page>.<ext>` with its own padding. We
//! split a sparse selection into gap-free runs and call it once per run, so
//! `"1,3,5"` costs three single-page calls instead of rendering 1–5 and
//! throwing two pages away.
//!
//! pdftoppm clamps `-l` to the page count but rejects a `-f` past the end.
//! Runs are ascending, so the first run rejected that way marks the end of
//! the document and the remaining runs are skipped.
//!
//! Output goes to a hidden staging directory inside the output directory and
//! is then renamed to the common `<prefix><page>.<ext>` scheme. The staging
//! directory is removed on every exit path.

use crate::config::{ImageFormat, RenderRequest};
use crate::error::DocToolsError;
use crate::output::RenderedPage;
use crate::pages::{page_file_name, pad_width};
use crate::process::{find_executable, ExternalCommand};
use crate::workdir::ScopedDir;
use once_cell::sync::Lazy;
use regex::Regex;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const STAGING_STEM: &str = "page";

/// pdftoppm's complaint when `-f` lies beyond the last page.
const PAST_END_MESSAGE: &str = "Wrong page range given";

static STAGED_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^page-(\d+)\.(png|jpg)$").unwrap());

#[derive(Debug, Clone)]
pub struct PdftoppmEngine {
    exe: PathBuf,
}

impl PdftoppmEngine {
    pub const EXECUTABLE: &'static str = "pdftoppm";

    pub fn probe() -> Option<Self> {
        find_executable(Self::EXECUTABLE).map(Self::with_executable)
    }

    /// Use a specific binary instead of searching `PATH`.
    pub fn with_executable(exe: PathBuf) -> Self {
        Self { exe }
    }

    /// Command line for one run (or the whole document when `run` is `None`).
    pub fn command(
        &self,
        request: &RenderRequest,
        run: Option<&RangeInclusive<u32>>,
        stem: &Path,
    ) -> ExternalCommand {
        let mut cmd = ExternalCommand::new(&self.exe)
            .arg("-r")
            .arg(request.dpi.to_string());

        cmd = match request.format {
            ImageFormat::Png => cmd.arg("-png"),
            ImageFormat::Jpg => cmd
                .arg("-jpeg")
                .arg("-jpegopt")
                .arg(format!("quality={}", request.jpg_quality)),
        };

        if let Some(run) = run {
            cmd = cmd
                .arg("-f")
                .arg(run.start().to_string())
                .arg("-l")
                .arg(run.end().to_string());
        }

        cmd.arg(&request.input).arg(stem)
    }

    pub async fn render(&self, request: &RenderRequest) -> Result<Vec<RenderedPage>, DocToolsError> {
        let staging = ScopedDir::new_in(&request.out_dir, ".pdf2img-")?;
        let stem = staging.path().join(STAGING_STEM);

        let runs: Vec<Option<RangeInclusive<u32>>> = if request.pages.is_all() {
            vec![None]
        } else {
            request.pages.runs().into_iter().map(Some).collect()
        };

        if let Some(ref cb) = request.progress_callback {
            let total = (!request.pages.is_all()).then(|| request.pages.len());
            cb.on_render_start(total);
        }

        for run in &runs {
            match self.command(request, run.as_ref(), &stem).run().await {
                Ok(_) => {}
                Err(err) if is_past_end(&err) => {
                    debug!("Run {:?} starts past the last page; stopping", run);
                    break;
                }
                Err(err) => return Err(err),
            }
        }

        let mut staged = collect_staged(staging.path())?;
        staged.retain(|(page, path)| {
            let keep = request.pages.is_all() || request.pages.contains(*page);
            if !keep {
                debug!("Discarding unrequested page {} ({})", page, path.display());
            }
            keep
        });
        staged.sort_by_key(|(page, _)| *page);

        let missing: Vec<u32> = request
            .pages
            .iter()
            .filter(|p| staged.binary_search_by_key(p, |(page, _)| *page).is_err())
            .collect();
        if !missing.is_empty() {
            warn!("Skipping pages past the end of the document: {:?}", missing);
        }

        let Some(&(largest, _)) = staged.last() else {
            return Err(DocToolsError::NoPagesSelected {
                detail: format!("pdftoppm produced none of the requested pages ({})", request.pages),
            });
        };
        let width = pad_width(largest);
        let ext = request.format.extension();

        let mut results = Vec::with_capacity(staged.len());
        for (page, from) in staged {
            let to = request
                .out_dir
                .join(page_file_name(&request.prefix, page, width, ext));
            tokio::fs::rename(&from, &to)
                .await
                .map_err(|e| DocToolsError::io(&to, e))?;
            debug!("Rendered page {} → {}", page, to.display());

            if let Some(ref cb) = request.progress_callback {
                cb.on_page_rendered(page, &to);
            }
            results.push(RenderedPage { page, path: to });
        }

        Ok(results)
    }
}

fn is_past_end(err: &DocToolsError) -> bool {
    matches!(err, DocToolsError::CommandFailed { output, .. } if output.contains(PAST_END_MESSAGE))
}

/// Page files pdftoppm left in `dir`, keyed by page number.
fn collect_staged(dir: &Path) -> Result<Vec<(u32, PathBuf)>, DocToolsError> {
    let entries = std::fs::read_dir(dir).map_err(|e| DocToolsError::io(dir, e))?;

    let mut out = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| DocToolsError::io(dir, e))?;
        let name = entry.file_name();
        let name = name.to_string_lossy();
        let Some(caps) = STAGED_NAME.captures(&name) else {
            continue;
        };
        if let Ok(page) = caps[1].parse::<u32>() {
            out.push((page, entry.path()));
        }
    }
    Ok(out)
}
