//! Result types reported back to callers.

use crate::config::{EngineChoice, ImageFormat};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One page image written to disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedPage {
    /// 1-indexed page number.
    pub page: u32,
    /// Final path of the image.
    pub path: PathBuf,
}

/// Outcome of a successful render.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderOutput {
    /// Absolute output directory.
    pub out_dir: PathBuf,
    /// Engine that did the work (never [`EngineChoice::Auto`]).
    pub engine: EngineChoice,
    pub format: ImageFormat,
    /// Rendered pages, ascending by page number.
    pub pages: Vec<RenderedPage>,
    /// Wall-clock time for the render, in milliseconds.
    pub duration_ms: u64,
}

impl RenderOutput {
    pub fn page_numbers(&self) -> Vec<u32> {
        self.pages.iter().map(|p| p.page).collect()
    }
}
