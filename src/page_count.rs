//! Page counting for one PDF or a directory of PDFs.
//!
//! Two backends:
//!
//! * **pdfinfo** (Poppler) — the `Pages:` line of its report;
//! * **pdfium** — the page count of the loaded document.
//!
//! `auto` prefers pdfinfo when it is on `PATH` and falls back to pdfium.
//!
//! Directory inputs are scanned with a shell-style pattern (`*`, `?`,
//! `[...]`, `[!...]`), optionally recursively. Only regular files with a
//! `.pdf` extension count, whatever the pattern says.

use crate::engine::PdfiumEngine;
use crate::error::DocToolsError;
use crate::input;
use crate::process::{find_executable, ExternalCommand};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info};

pub const DEFAULT_PATTERN: &str = "*.pdf";

static PDFINFO_PAGES: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^Pages:\s+(\d+)\s*$").unwrap());

// ── Request / report ─────────────────────────────────────────────────────

/// What to count and how.
#[derive(Debug, Clone)]
pub struct PageCountRequest {
    /// A PDF file or a directory to scan.
    pub input: PathBuf,
    /// Shell-style pattern used when `input` is a directory.
    pub pattern: String,
    /// Descend into sub-directories.
    pub recursive: bool,
    pub engine: PageCountEngine,
}

impl PageCountRequest {
    pub fn new(input: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            pattern: DEFAULT_PATTERN.to_string(),
            recursive: false,
            engine: PageCountEngine::Auto,
        }
    }

    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = pattern.into();
        self
    }

    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    pub fn engine(mut self, engine: PageCountEngine) -> Self {
        self.engine = engine;
        self
    }
}

/// Page count of a single file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageCount {
    pub path: PathBuf,
    pub pages: usize,
}

/// Counts for every matched file, sorted by path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageCountReport {
    pub files: Vec<PageCount>,
    pub total: usize,
}

impl PageCountReport {
    /// `path<TAB>pages` lines, plus `TOTAL<TAB>n` when asked.
    pub fn to_tsv(&self, with_total: bool) -> String {
        let mut out = String::new();
        for f in &self.files {
            out.push_str(&format!("{}\t{}\n", f.path.display(), f.pages));
        }
        if with_total {
            out.push_str(&format!("TOTAL\t{}\n", self.total));
        }
        out
    }
}

// ── Engines ──────────────────────────────────────────────────────────────

/// Which page-count backend to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageCountEngine {
    /// pdfinfo when on `PATH`, else pdfium.
    #[default]
    Auto,
    Pdfinfo,
    Pdfium,
}

impl FromStr for PageCountEngine {
    type Err = DocToolsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "auto" => Ok(PageCountEngine::Auto),
            "pdfinfo" => Ok(PageCountEngine::Pdfinfo),
            "pdfium" => Ok(PageCountEngine::Pdfium),
            _ => Err(DocToolsError::UnknownChoice {
                what: "page-count engine",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for PageCountEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PageCountEngine::Auto => "auto",
            PageCountEngine::Pdfinfo => "pdfinfo",
            PageCountEngine::Pdfium => "pdfium",
        })
    }
}

/// A resolved, available page counter.
#[derive(Debug, Clone)]
pub enum PageCounter {
    Pdfinfo(PathBuf),
    Pdfium(PdfiumEngine),
}

impl PageCounter {
    pub fn select(engine: PageCountEngine) -> Result<Self, DocToolsError> {
        let pdfinfo = || find_executable("pdfinfo").map(PageCounter::Pdfinfo);
        let pdfium = || PdfiumEngine::probe().map(PageCounter::Pdfium);

        match engine {
            PageCountEngine::Pdfinfo => pdfinfo().ok_or_else(|| DocToolsError::EngineUnavailable {
                engine: "pdfinfo".into(),
                hint: "pdfinfo not found on PATH. Install Poppler (poppler-utils).".into(),
            }),
            PageCountEngine::Pdfium => pdfium().ok_or_else(|| DocToolsError::EngineUnavailable {
                engine: "pdfium".into(),
                hint: "Install PDFium and set PDFIUM_LIB_PATH=/path/to/libpdfium.".into(),
            }),
            PageCountEngine::Auto => {
                pdfinfo()
                    .or_else(pdfium)
                    .ok_or_else(|| DocToolsError::EngineUnavailable {
                        engine: "page counter".into(),
                        hint: "Install Poppler (pdfinfo) or PDFium (PDFIUM_LIB_PATH).".into(),
                    })
            }
        }
    }

    pub fn kind(&self) -> PageCountEngine {
        match self {
            PageCounter::Pdfinfo(_) => PageCountEngine::Pdfinfo,
            PageCounter::Pdfium(_) => PageCountEngine::Pdfium,
        }
    }

    pub async fn count(&self, pdf: &Path) -> Result<usize, DocToolsError> {
        match self {
            PageCounter::Pdfinfo(exe) => {
                let output = ExternalCommand::new(exe).arg(pdf).run().await?;
                parse_pdfinfo_pages(&output, pdf)
            }
            PageCounter::Pdfium(engine) => engine.page_count(pdf).await,
        }
    }
}

/// Extract the page count from `pdfinfo` output.
pub fn parse_pdfinfo_pages(output: &str, pdf: &Path) -> Result<usize, DocToolsError> {
    PDFINFO_PAGES
        .captures(output)
        .and_then(|c| c[1].parse().ok())
        .ok_or_else(|| DocToolsError::UnparsableOutput {
            what: "page count",
            path: pdf.to_path_buf(),
        })
}

// ── Entry points ─────────────────────────────────────────────────────────

/// Count pages of every PDF the request matches.
pub async fn count_pages(request: &PageCountRequest) -> Result<PageCountReport, DocToolsError> {
    let counter = PageCounter::select(request.engine)?;
    count_pages_with(&counter, request).await
}

/// Same as [`count_pages`] with an already selected counter.
pub async fn count_pages_with(
    counter: &PageCounter,
    request: &PageCountRequest,
) -> Result<PageCountReport, DocToolsError> {
    let pdfs = collect_pdfs(&request.input, &request.pattern, request.recursive)?;
    info!("Counting pages of {} file(s) with {}", pdfs.len(), counter.kind());

    let mut files = Vec::with_capacity(pdfs.len());
    for path in pdfs {
        let pages = counter.count(&path).await?;
        debug!("{}: {} pages", path.display(), pages);
        files.push(PageCount { path, pages });
    }

    let total = files.iter().map(|f| f.pages).sum();
    Ok(PageCountReport { files, total })
}

// ── Input collection ─────────────────────────────────────────────────────

/// Resolve `input` to a sorted list of PDF files.
///
/// A file must carry a `.pdf` extension; a directory is scanned with
/// `pattern` and must yield at least one PDF.
pub fn collect_pdfs(input: &Path, pattern: &str, recursive: bool) -> Result<Vec<PathBuf>, DocToolsError> {
    let resolved = input::resolve_existing(input)?;

    if resolved.is_file() {
        if input::extension_lower(&resolved) != "pdf" {
            return Err(DocToolsError::NotAPdf { path: resolved });
        }
        return Ok(vec![resolved]);
    }

    let glob = GlobPattern::new(pattern)?;
    let mut found = Vec::new();
    walk(&resolved, &resolved, &glob, recursive, &mut found)?;
    found.sort();

    if found.is_empty() {
        return Err(DocToolsError::NoInputsMatched { path: resolved });
    }
    Ok(found)
}

/// Without `recursive`, descends only as deep as the pattern has directory
/// components and matches the whole relative path; with it, descends fully
/// and matches the path's tail.
fn walk(
    root: &Path,
    dir: &Path,
    glob: &GlobPattern,
    recursive: bool,
    found: &mut Vec<PathBuf>,
) -> Result<(), DocToolsError> {
    let entries = std::fs::read_dir(dir).map_err(|e| DocToolsError::io(dir, e))?;

    for entry in entries {
        let entry = entry.map_err(|e| DocToolsError::io(dir, e))?;
        let path = entry.path();
        let file_type = entry.file_type().map_err(|e| DocToolsError::io(&path, e))?;
        let Ok(relative) = path.strip_prefix(root) else {
            continue;
        };
        let depth = relative.components().count();

        if file_type.is_dir() {
            if recursive || depth < glob.components() {
                walk(root, &path, glob, recursive, found)?;
            }
            continue;
        }

        if !recursive && depth != glob.components() {
            continue;
        }
        if path.is_file() && input::extension_lower(&path) == "pdf" && glob.matches(relative) {
            found.push(path);
        }
    }
    Ok(())
}

/// A shell-style filename pattern.
///
/// `*` and `?` never cross a `/`. A pattern with `n` components is matched
/// against the last `n` components of a path relative to the scan root.
#[derive(Debug, Clone)]
pub struct GlobPattern {
    regex: Regex,
    components: usize,
}

impl GlobPattern {
    pub fn new(pattern: &str) -> Result<Self, DocToolsError> {
        let pattern = pattern.trim_start_matches("./");
        let regex = Regex::new(&glob_to_regex(pattern)).map_err(|e| DocToolsError::UnknownChoice {
            what: "glob pattern",
            value: format!("{pattern} ({e})"),
        })?;
        Ok(Self {
            regex,
            components: pattern.split('/').filter(|c| !c.is_empty()).count().max(1),
        })
    }

    /// Number of `/`-separated components in the pattern.
    pub fn components(&self) -> usize {
        self.components
    }

    pub fn matches(&self, relative: &Path) -> bool {
        let parts: Vec<String> = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        if parts.len() < self.components {
            return false;
        }
        let tail = parts[parts.len() - self.components..].join("/");
        self.regex.is_match(&tail)
    }
}

fn glob_to_regex(pattern: &str) -> String {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::from("^");
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        i += 1;
        match c {
            '*' => out.push_str("[^/]*"),
            '?' => out.push_str("[^/]"),
            '[' => {
                let mut j = i;
                if j < chars.len() && chars[j] == '!' {
                    j += 1;
                }
                if j < chars.len() && chars[j] == ']' {
                    j += 1;
                }
                while j < chars.len() && chars[j] != ']' {
                    j += 1;
                }
                if j >= chars.len() {
                    // Unterminated: a literal bracket.
                    out.push_str(r"\[");
                    continue;
                }

                let body: String = chars[i..j].iter().collect();
                i = j + 1;

                let mut class = String::from("[");
                let body = match body.strip_prefix('!') {
                    Some(rest) => {
                        class.push('^');
                        rest.to_string()
                    }
                    None => body,
                };
                for b in body.chars() {
                    match b {
                        '\\' | '[' | ']' | '^' | '&' | '~' => {
                            class.push('\\');
                            class.push(b);
                        }
                        _ => class.push(b),
                    }
                }
                class.push(']');
                out.push_str(&class);
            }
            other => out.push_str(&regex::escape(&other.to_string())),
        }
    }

    out.push('$');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn glob(p: &str) -> GlobPattern {
        GlobPattern::new(p).unwrap()
    }

    #[test]
    fn parses_pdfinfo_output() {
        let out = "Title:          Resume\nProducer:       Skia/PDF\nPages:          3\nEncrypted:      no\n";
        assert_eq!(parse_pdfinfo_pages(out, Path::new("a.pdf")).unwrap(), 3);
    }

    #[test]
    fn pdfinfo_without_pages_line_fails() {
        let err = parse_pdfinfo_pages("Syntax Warning: nothing here\n", Path::new("a.pdf")).unwrap_err();
        assert!(matches!(err, DocToolsError::UnparsableOutput { .. }));
    }

    #[test]
    fn glob_star_and_question() {
        assert!(glob("*.pdf").matches(Path::new("cv.pdf")));
        assert!(!glob("*.pdf").matches(Path::new("cv.txt")));
        assert!(glob("cv_?.pdf").matches(Path::new("cv_1.pdf")));
        assert!(!glob("cv_?.pdf").matches(Path::new("cv_10.pdf")));
    }

    #[test]
    fn glob_brackets() {
        assert!(glob("v[12].pdf").matches(Path::new("v2.pdf")));
        assert!(!glob("v[!12].pdf").matches(Path::new("v2.pdf")));
        assert!(glob("v[!12].pdf").matches(Path::new("v3.pdf")));
        assert!(glob("a[.pdf").matches(Path::new("a[.pdf")));
    }

    #[test]
    fn glob_matches_tail_components() {
        assert!(glob("*.pdf").matches(Path::new("nested/deep/cv.pdf")));
        assert!(glob("2024/*.pdf").matches(Path::new("archive/2024/cv.pdf")));
        assert!(!glob("2024/*.pdf").matches(Path::new("cv.pdf")));
    }

    #[test]
    fn glob_escapes_regex_metacharacters() {
        assert!(glob("cv (final).pdf").matches(Path::new("cv (final).pdf")));
        assert!(!glob("a.pdf").matches(Path::new("abpdf")));
    }

    #[test]
    fn collects_sorted_pdfs_only() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.pdf", "a.PDF", "notes.txt", "c.pdf.bak"] {
            std::fs::write(dir.path().join(name), b"%PDF").unwrap();
        }
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("sub/d.pdf"), b"%PDF").unwrap();

        let flat = collect_pdfs(dir.path(), "*", false).unwrap();
        let names: Vec<_> = flat
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.PDF", "b.pdf"]);

        let deep = collect_pdfs(dir.path(), "*", true).unwrap();
        assert_eq!(deep.len(), 3);
        assert!(deep.last().unwrap().ends_with("sub/d.pdf"));
    }

    #[test]
    fn multi_component_pattern_flat_and_recursive() {
        let dir = tempfile::tempdir().unwrap();
        for rel in [
            "2024/cv.pdf",
            "2024/cv.txt",
            "2023/cv.pdf",
            "old/2024/letter.pdf",
            "old/2024/deeper/x.pdf",
            "top.pdf",
        ] {
            let path = dir.path().join(rel);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, b"%PDF").unwrap();
        }
        let rel = |found: Vec<PathBuf>| -> Vec<String> {
            found
                .iter()
                .map(|p| p.strip_prefix(dir.path()).unwrap().to_string_lossy().into_owned())
                .collect()
        };

        let flat = collect_pdfs(dir.path(), "2024/*.pdf", false).unwrap();
        assert_eq!(rel(flat), vec!["2024/cv.pdf"]);

        let deep = collect_pdfs(dir.path(), "2024/*.pdf", true).unwrap();
        assert_eq!(rel(deep), vec!["2024/cv.pdf", "old/2024/letter.pdf"]);

        let not_2024 = collect_pdfs(dir.path(), "202[!4]/*.pdf", true).unwrap();
        assert_eq!(rel(not_2024), vec!["2023/cv.pdf"]);

        let none = collect_pdfs(dir.path(), "old/*.pdf", false).unwrap_err();
        assert!(matches!(none, DocToolsError::NoInputsMatched { .. }));
    }

    #[test]
    fn empty_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = collect_pdfs(dir.path(), DEFAULT_PATTERN, false).unwrap_err();
        assert!(matches!(err, DocToolsError::NoInputsMatched { .. }));
    }

    #[test]
    fn non_pdf_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let txt = dir.path().join("cv.txt");
        std::fs::write(&txt, "x").unwrap();
        let err = collect_pdfs(&txt, DEFAULT_PATTERN, false).unwrap_err();
        assert!(matches!(err, DocToolsError::NotAPdf { .. }));
    }

    #[test]
    fn report_tsv() {
        let report = PageCountReport {
            files: vec![
                PageCount { path: "/a.pdf".into(), pages: 2 },
                PageCount { path: "/b.pdf".into(), pages: 3 },
            ],
            total: 5,
        };
        assert_eq!(report.to_tsv(false), "/a.pdf\t2\n/b.pdf\t3\n");
        assert!(report.to_tsv(true).ends_with("TOTAL\t5\n"));
    }

    #[test]
    fn engine_names() {
        assert_eq!("PDFINFO".parse::<PageCountEngine>().unwrap(), PageCountEngine::Pdfinfo);
        assert!("pypdf".parse::<PageCountEngine>().is_err());
    }
}
