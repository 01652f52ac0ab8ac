//! Page rendering entry points.
//!
//! Flow: validate (done by [`RenderRequest::builder`]) → select engine →
//! render → report. There is no retry and no partial success; the first
//! engine error ends the run.

use crate::config::RenderRequest;
use crate::engine::{self, Engine};
use crate::error::DocToolsError;
use crate::output::RenderOutput;
use std::time::Instant;
use tracing::info;

/// Split the request's PDF into page images.
///
/// # Errors
/// * [`DocToolsError::NoEngineAvailable`] / [`DocToolsError::EngineUnavailable`]
///   when the chosen engine cannot be found;
/// * [`DocToolsError::PagesRequired`] when `magick` gets no page list;
/// * [`DocToolsError::NoPagesSelected`] when the selection is empty after
///   filtering against the document;
/// * execution errors from the engine itself.
pub async fn render_pages(request: &RenderRequest) -> Result<RenderOutput, DocToolsError> {
    let start = Instant::now();
    info!(
        "Rendering {} → {} ({} @ {} dpi, pages: {})",
        request.input.display(),
        request.out_dir.display(),
        request.format,
        request.dpi,
        request.pages
    );

    let engine = engine::select_engine(request.engine)?;
    info!("Using engine: {}", engine.kind());

    render_with(&engine, request, start).await
}

/// Render with an already selected engine.
pub async fn render_with_engine(
    engine: &Engine,
    request: &RenderRequest,
) -> Result<RenderOutput, DocToolsError> {
    render_with(engine, request, Instant::now()).await
}

async fn render_with(
    engine: &Engine,
    request: &RenderRequest,
    start: Instant,
) -> Result<RenderOutput, DocToolsError> {
    let pages = engine.render(request).await?;

    let duration_ms = start.elapsed().as_millis() as u64;
    info!("Rendered {} pages in {}ms", pages.len(), duration_ms);

    if let Some(ref cb) = request.progress_callback {
        cb.on_render_complete(pages.len());
    }

    Ok(RenderOutput {
        out_dir: request.out_dir.clone(),
        engine: engine.kind(),
        format: request.format,
        pages,
        duration_ms,
    })
}

/// Synchronous wrapper around [`render_pages`].
///
/// Creates a temporary current-thread tokio runtime internally.
pub fn render_pages_sync(request: &RenderRequest) -> Result<RenderOutput, DocToolsError> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| DocToolsError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(render_pages(request))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::MagickEngine;
    use crate::progress::RenderProgressCallback;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[derive(Default)]
    struct Flags {
        started: AtomicBool,
        completed: AtomicBool,
    }

    impl RenderProgressCallback for Flags {
        fn on_render_start(&self, _total: Option<usize>) {
            self.started.store(true, Ordering::SeqCst);
        }
        fn on_render_complete(&self, _count: usize) {
            self.completed.store(true, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn selection_error_fires_no_callbacks() {
        let dir = tempfile::tempdir().unwrap();
        let pdf = dir.path().join("in.pdf");
        std::fs::write(&pdf, b"%PDF-1.4\n").unwrap();

        let flags = Arc::new(Flags::default());
        let request = RenderRequest::builder(&pdf, dir.path().join("out"))
            .progress_callback(flags.clone())
            .build()
            .unwrap();

        let engine = Engine::Magick(MagickEngine::with_executable(PathBuf::from("/no/such/magick")));
        let err = render_with_engine(&engine, &request).await.unwrap_err();

        assert!(matches!(err, DocToolsError::PagesRequired { .. }));
        assert!(!flags.started.load(Ordering::SeqCst));
        assert!(!flags.completed.load(Ordering::SeqCst));
    }
}
