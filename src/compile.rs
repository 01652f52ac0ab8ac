//! Compile HTML, Typst, or LaTeX sources to PDF.
//!
//! | Input | Engine | Invocation |
//! |-------|--------|------------|
//! | `.html` `.htm` | headless Chrome | `--print-to-pdf` of a `file://` URL |
//! | `.typ` | typst | `typst compile <in> <out>` |
//! | `.tex` | latexmk | XeLaTeX into a scratch build dir, result copied out |
//!
//! HTML without an `@page { size: … }` rule is printed from a patched copy
//! carrying a default page size and margin, so Chrome does not fall back to
//! its own paper default. The original file is never modified.

use crate::error::DocToolsError;
use crate::input;
use crate::process::{self, find_executable, ExternalCommand};
use crate::workdir::ScopedDir;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info};

/// `@page` rule that already sets a size.
static PAGE_SIZE_RULE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)@page[^{]*\{[^}]*\bsize\s*:").unwrap());

/// Executable names tried on `PATH` when no Chrome path is given.
const CHROME_NAMES: [&str; 4] = ["chrome", "chrome.exe", "google-chrome", "chromium"];

// ── Options ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Paper {
    #[default]
    A4,
    Letter,
}

impl FromStr for Paper {
    type Err = DocToolsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "A4" => Ok(Paper::A4),
            "LETTER" => Ok(Paper::Letter),
            _ => Err(DocToolsError::UnknownChoice {
                what: "paper size",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for Paper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Paper::A4 => "A4",
            Paper::Letter => "Letter",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompileEngine {
    /// Pick by input extension.
    #[default]
    Auto,
    Chrome,
    Typst,
    Latexmk,
}

impl CompileEngine {
    /// Engine `auto` resolves to for `input`.
    pub fn for_input(input: &Path) -> Result<Self, DocToolsError> {
        match input::extension_lower(input).as_str() {
            "html" | "htm" => Ok(CompileEngine::Chrome),
            "typ" => Ok(CompileEngine::Typst),
            "tex" => Ok(CompileEngine::Latexmk),
            other => Err(DocToolsError::UnsupportedInput {
                path: input.to_path_buf(),
                reason: format!("no compile engine for extension '.{other}'"),
            }),
        }
    }
}

impl FromStr for CompileEngine {
    type Err = DocToolsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "auto" => Ok(CompileEngine::Auto),
            "chrome" => Ok(CompileEngine::Chrome),
            "typst" => Ok(CompileEngine::Typst),
            "latexmk" => Ok(CompileEngine::Latexmk),
            _ => Err(DocToolsError::UnknownChoice {
                what: "compile engine",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for CompileEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CompileEngine::Auto => "auto",
            CompileEngine::Chrome => "chrome",
            CompileEngine::Typst => "typst",
            CompileEngine::Latexmk => "latexmk",
        })
    }
}

/// A document to compile.
#[derive(Debug, Clone)]
pub struct CompileRequest {
    pub input: PathBuf,
    pub output: PathBuf,
    pub paper: Paper,
    pub engine: CompileEngine,
    /// Explicit Chrome binary; skips discovery.
    pub chrome: Option<PathBuf>,
}

impl CompileRequest {
    pub fn new(input: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            paper: Paper::default(),
            engine: CompileEngine::default(),
            chrome: None,
        }
    }

    pub fn paper(mut self, paper: Paper) -> Self {
        self.paper = paper;
        self
    }

    pub fn engine(mut self, engine: CompileEngine) -> Self {
        self.engine = engine;
        self
    }

    pub fn chrome(mut self, chrome: impl Into<PathBuf>) -> Self {
        self.chrome = Some(chrome.into());
        self
    }
}

// ── Entry point ──────────────────────────────────────────────────────────

/// Compile the request's input and return the absolute output path.
pub async fn compile(request: &CompileRequest) -> Result<PathBuf, DocToolsError> {
    let input = input::resolve_existing(&request.input)?;
    let output = input::absolute(&request.output)?;

    let engine = match request.engine {
        CompileEngine::Auto => CompileEngine::for_input(&input)?,
        explicit => explicit,
    };
    info!("Compiling {} → {} with {}", input.display(), output.display(), engine);

    if let Some(parent) = output.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| DocToolsError::io(parent, e))?;
    }

    match engine {
        CompileEngine::Chrome => {
            html_to_pdf(&input, &output, request.paper, request.chrome.as_deref()).await?
        }
        CompileEngine::Typst => typst_to_pdf(&input, &output).await?,
        CompileEngine::Latexmk => latex_to_pdf(&input, &output).await?,
        CompileEngine::Auto => {
            return Err(DocToolsError::Internal("compile engine left unresolved".into()))
        }
    }

    Ok(output)
}

// ── Chrome ───────────────────────────────────────────────────────────────

/// Locate a Chrome binary: the explicit path if given, then the standard
/// Windows install locations, then `PATH`.
pub fn find_chrome(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        let path = input::expand_home(path);
        return path.exists().then_some(path);
    }

    let installed = ["ProgramFiles", "ProgramFiles(x86)"]
        .iter()
        .filter_map(|var| std::env::var_os(var))
        .map(|root| PathBuf::from(root).join("Google/Chrome/Application/chrome.exe"))
        .find(|candidate| candidate.exists());

    installed.or_else(|| CHROME_NAMES.iter().find_map(|name| find_executable(name)))
}

async fn html_to_pdf(
    input: &Path,
    output: &Path,
    paper: Paper,
    chrome: Option<&Path>,
) -> Result<(), DocToolsError> {
    let chrome = find_chrome(chrome).ok_or_else(|| DocToolsError::EngineUnavailable {
        engine: "chrome".into(),
        hint: "Chrome not found. Install Google Chrome or pass --chrome /path/to/chrome.".into(),
    })?;

    // Keeps the patched copy alive until Chrome has finished.
    let (page, _scratch) = prepare_html(input, paper).await?;

    let url = url::Url::from_file_path(&page).map_err(|()| DocToolsError::UnsupportedInput {
        path: page.clone(),
        reason: "cannot be expressed as a file:// URL".into(),
    })?;

    let mut print_to = std::ffi::OsString::from("--print-to-pdf=");
    print_to.push(output.as_os_str());

    ExternalCommand::new(chrome)
        .args([
            "--headless=new",
            "--disable-gpu",
            "--no-first-run",
            "--no-default-browser-check",
            "--disable-extensions",
        ])
        .arg(print_to)
        .arg("--print-to-pdf-no-header")
        .arg(url.as_str())
        .run()
        .await?;

    ensure_product("chrome", output)
}

/// The HTML file Chrome should print, with the scratch directory holding a
/// patched copy when one was needed.
async fn prepare_html(input: &Path, paper: Paper) -> Result<(PathBuf, Option<ScopedDir>), DocToolsError> {
    let bytes = tokio::fs::read(input)
        .await
        .map_err(|e| DocToolsError::io(input, e))?;
    let html = String::from_utf8_lossy(&bytes);

    if has_page_size_rule(&html) {
        return Ok((input.to_path_buf(), None));
    }

    let scratch = ScopedDir::new("doctools_html_")?;
    let file_name = input.file_name().unwrap_or_else(|| std::ffi::OsStr::new("index.html"));
    let patched = scratch.path().join(file_name);
    tokio::fs::write(&patched, inject_page_css(&html, paper))
        .await
        .map_err(|e| DocToolsError::io(&patched, e))?;
    debug!("Injected @page size {} into {}", paper, patched.display());

    Ok((patched, Some(scratch)))
}

/// Whether `html` already declares a page size.
pub fn has_page_size_rule(html: &str) -> bool {
    PAGE_SIZE_RULE.is_match(html)
}

fn paper_css(paper: Paper) -> String {
    format!(
        "<style>\n  @page {{ size: {paper}; margin: 12mm; }}\n  \
html, body {{ -webkit-print-color-adjust: exact; print-color-adjust: exact; }}\n</style>\n"
    )
}

/// Insert the default page style just before `</head>`, or at the very top
/// when the document has no complete head.
pub fn inject_page_css(html: &str, paper: Paper) -> String {
    let css = paper_css(paper);
    let lower = html.to_ascii_lowercase();

    let head_close = lower
        .find("<head")
        .and_then(|open| lower[open..].find("</head>").map(|rel| open + rel));

    match head_close {
        Some(at) => format!("{}{}{}", &html[..at], css, &html[at..]),
        None => format!("{css}{html}"),
    }
}

// ── typst / latexmk ──────────────────────────────────────────────────────

async fn typst_to_pdf(input: &Path, output: &Path) -> Result<(), DocToolsError> {
    let typst = process::require("typst", "typst not found on PATH.")?;
    ExternalCommand::new(typst)
        .arg("compile")
        .arg(input)
        .arg(output)
        .run()
        .await?;
    ensure_product("typst", output)
}

async fn latex_to_pdf(input: &Path, output: &Path) -> Result<(), DocToolsError> {
    let latexmk = process::require(
        "latexmk",
        "latexmk not found on PATH. Install a TeX distribution.",
    )?;
    let build = ScopedDir::new("doctools_latex_")?;

    let mut outdir = std::ffi::OsString::from("-outdir=");
    outdir.push(build.path().as_os_str());

    ExternalCommand::new(latexmk)
        .args(["-xelatex", "-interaction=nonstopmode", "-halt-on-error"])
        .arg(outdir)
        .arg(input)
        .run()
        .await?;

    let mut name = input.file_stem().unwrap_or_default().to_os_string();
    name.push(".pdf");
    let produced = build.path().join(name);
    ensure_product("latexmk", &produced)?;

    tokio::fs::copy(&produced, output)
        .await
        .map_err(|e| DocToolsError::io(output, e))?;
    Ok(())
}

fn ensure_product(tool: &str, path: &Path) -> Result<(), DocToolsError> {
    if path.is_file() {
        Ok(())
    } else {
        Err(DocToolsError::MissingProduct {
            tool: tool.to_string(),
            path: path.to_path_buf(),
        })
    }
}
