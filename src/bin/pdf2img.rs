//! CLI binary: split a PDF into per-page images.
//!
//! A thin shim over the library crate that maps CLI flags to a
//! `RenderRequest` and prints the output directory.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_doctools::cli;
use edgequake_doctools::{
    render_pages, EngineChoice, ProgressCallback, RenderProgressCallback, RenderRequest,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Spinner until the page count is known, then a bar; one line per page.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(TICKS),
        );
        bar.set_prefix("Rendering");
        bar.set_message("Opening PDF…");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }

    /// Drop the bar without a summary, e.g. before an error line.
    fn clear(&self) {
        self.bar.finish_and_clear();
    }
}

impl RenderProgressCallback for CliProgressCallback {
    fn on_render_start(&self, total_pages: Option<usize>) {
        let Some(total) = total_pages else {
            self.bar.set_message("whole document…");
            return;
        };
        self.bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.cyan} {prefix:.bold}  \
                 [{bar:42.green/238}] {pos:>3}/{len} pages  ⏱ {elapsed_precise}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▉▊▋▌▍▎▏  ")
            .tick_strings(TICKS),
        );
        self.bar.set_length(total as u64);
        self.bar.reset_eta();
    }

    fn on_page_rendered(&self, page: u32, path: &Path) {
        self.bar.println(format!(
            "  {} Page {:>3}  {}",
            green("✓"),
            page,
            dim(&path.display().to_string())
        ));
        self.bar.inc(1);
    }

    fn on_render_complete(&self, rendered: usize) {
        self.bar.finish_and_clear();
        eprintln!("{} {} pages rendered", green("✔"), bold(&rendered.to_string()));
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Every page as PNG at 200 DPI
  pdf2img --in resume.pdf --outdir out/pages

  # Selected pages as JPEG
  pdf2img --in resume.pdf --outdir out --format jpg --jpg-quality 90 --pages "1-2,4"

  # Force a backend
  pdf2img --in resume.pdf --outdir out --engine pdftoppm

ENGINES (auto tries them in this order):
  pdfium     libpdfium via PDFIUM_LIB_PATH, the pdfium cache dir, or the system
  pdftoppm   Poppler, on PATH
  magick     ImageMagick, on PATH; needs explicit --pages

ENVIRONMENT VARIABLES:
  PDFIUM_LIB_PATH         Path to libpdfium (file or directory)
  PDFIUM_AUTO_CACHE_DIR   Override the pdfium cache directory
  PDF2IMG_*               Default for any flag, e.g. PDF2IMG_DPI=300
  RUST_LOG                Log filter, e.g. RUST_LOG=edgequake_doctools=debug
"#;

/// Split a PDF into per-page PNG/JPEG images.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2img",
    version,
    about = "Split a PDF into per-page PNG/JPEG images",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Input PDF.
    #[arg(long = "in", value_name = "PDF", env = "PDF2IMG_IN")]
    input: PathBuf,

    /// Output directory (created if missing).
    #[arg(long, value_name = "DIR", env = "PDF2IMG_OUTDIR")]
    outdir: PathBuf,

    /// Image format: png or jpg.
    #[arg(long, env = "PDF2IMG_FORMAT", default_value = "png")]
    format: String,

    /// Rendering resolution.
    #[arg(long, env = "PDF2IMG_DPI", default_value_t = RenderRequest::DEFAULT_DPI)]
    dpi: u32,

    /// Pages: "1-3,5 7". Empty means all pages.
    #[arg(long, env = "PDF2IMG_PAGES", default_value = "")]
    pages: String,

    /// Output filename prefix.
    #[arg(long, env = "PDF2IMG_PREFIX", default_value = RenderRequest::DEFAULT_PREFIX)]
    prefix: String,

    /// Rendering backend.
    #[arg(long, env = "PDF2IMG_ENGINE", value_enum, default_value = "auto")]
    engine: EngineArg,

    /// JPEG quality, 1–100.
    #[arg(long, env = "PDF2IMG_JPG_QUALITY", default_value_t = RenderRequest::DEFAULT_JPG_QUALITY)]
    jpg_quality: u32,

    /// Print the render report as JSON instead of the output directory.
    #[arg(long, env = "PDF2IMG_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "PDF2IMG_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDF2IMG_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDF2IMG_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum EngineArg {
    Auto,
    Pdfium,
    Pdftoppm,
    Magick,
}

impl From<EngineArg> for EngineChoice {
    fn from(v: EngineArg) -> Self {
        match v {
            EngineArg::Auto => EngineChoice::Auto,
            EngineArg::Pdfium => EngineChoice::Pdfium,
            EngineArg::Pdftoppm => EngineChoice::Pdftoppm,
            EngineArg::Magick => EngineChoice::Magick,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    cli::init_tracing(cli.verbose, cli.quiet, show_progress);
    cli::finish("pdf2img", run(cli, show_progress))
}

#[tokio::main(flavor = "current_thread")]
async fn run(cli: Cli, show_progress: bool) -> Result<()> {
    let mut request = RenderRequest::builder(&cli.input, &cli.outdir)
        .format(cli.format.as_str())
        .dpi(cli.dpi)
        .jpg_quality(cli.jpg_quality)
        .prefix(cli.prefix.as_str())
        .pages_spec(cli.pages.as_str())
        .engine(cli.engine.into())
        .build()
        .context("Invalid arguments")?;

    // Started only once the arguments are valid; cleared if rendering fails.
    let progress = show_progress.then(CliProgressCallback::new);
    if let Some(ref bar) = progress {
        let cb: ProgressCallback = bar.clone();
        request.progress_callback = Some(cb);
    }

    let rendered = render_pages(&request).await;
    if let (Err(_), Some(bar)) = (&rendered, &progress) {
        bar.clear();
    }
    let output = rendered.context("Rendering failed")?;

    if cli.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        println!("{json}");
    } else {
        println!("{}", output.out_dir.display());
    }

    Ok(())
}
