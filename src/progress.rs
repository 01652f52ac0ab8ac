//! Progress-callback trait for per-page render events.
//!
//! Inject an [`Arc<dyn RenderProgressCallback>`] via
//! [`crate::config::RenderRequestBuilder::progress_callback`] to be told
//! when rendering starts, as each page file lands on disk, and when the run
//! is complete. The `pdf2img` binary uses it to drive a terminal progress bar.
//!
//! # Example
//!
//! ```rust
//! use edgequake_doctools::RenderProgressCallback;
//! use std::path::Path;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! struct Counter(AtomicUsize);
//!
//! impl RenderProgressCallback for Counter {
//!     fn on_page_rendered(&self, page: u32, path: &Path) {
//!         self.0.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("page {page} → {}", path.display());
//!     }
//! }
//! ```

use std::path::Path;
use std::sync::Arc;

/// Called by the renderer as it works through the selected pages.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Engines that render a whole run of pages in one
/// external invocation report those pages once the invocation returns.
pub trait RenderProgressCallback: Send + Sync {
    /// Called once before the first page is rendered.
    ///
    /// `total_pages` is `None` when the engine cannot know it in advance
    /// (pdftoppm rendering the whole document).
    fn on_render_start(&self, total_pages: Option<usize>) {
        let _ = total_pages;
    }

    /// Called when a page image has been written to its final path.
    fn on_page_rendered(&self, page: u32, path: &Path) {
        let _ = (page, path);
    }

    /// Called once after the last page has been written.
    fn on_render_complete(&self, rendered: usize) {
        let _ = rendered;
    }
}

/// A no-op implementation; the default when no callback is configured.
pub struct NoopProgressCallback;

impl RenderProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::RenderRequest`].
pub type ProgressCallback = Arc<dyn RenderProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct TrackingCallback {
        started: Mutex<Option<Option<usize>>>,
        pages: Mutex<Vec<u32>>,
        completed: AtomicUsize,
    }

    impl RenderProgressCallback for TrackingCallback {
        fn on_render_start(&self, total_pages: Option<usize>) {
            *self.started.lock().unwrap() = Some(total_pages);
        }

        fn on_page_rendered(&self, page: u32, _path: &Path) {
            self.pages.lock().unwrap().push(page);
        }

        fn on_render_complete(&self, rendered: usize) {
            self.completed.store(rendered, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_render_start(Some(5));
        cb.on_page_rendered(1, Path::new("page_01.png"));
        cb.on_render_complete(1);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback::default();

        tracker.on_render_start(Some(3));
        tracker.on_page_rendered(1, Path::new("a"));
        tracker.on_page_rendered(3, Path::new("b"));
        tracker.on_render_complete(2);

        assert_eq!(*tracker.started.lock().unwrap(), Some(Some(3)));
        assert_eq!(*tracker.pages.lock().unwrap(), vec![1, 3]);
        assert_eq!(tracker.completed.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: ProgressCallback = Arc::new(NoopProgressCallback);
        cb.on_render_start(None);
        cb.on_render_complete(0);
    }
}
