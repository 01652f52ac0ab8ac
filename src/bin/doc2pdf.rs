//! CLI binary: compile HTML / Typst / LaTeX to PDF.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_doctools::cli;
use edgequake_doctools::{compile, CompileEngine, CompileRequest, Paper};
use std::path::PathBuf;
use std::process::ExitCode;

const AFTER_HELP: &str = r#"EXAMPLES:
  doc2pdf --in resume.html --out out/resume.pdf --paper Letter
  doc2pdf --in resume.typ --out out/resume.pdf
  doc2pdf --in resume.tex --out out/resume.pdf
  doc2pdf --in resume.html --out resume.pdf --chrome "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome"

ENGINES (auto picks by extension):
  chrome    .html .htm   headless Chrome --print-to-pdf
  typst     .typ         typst compile
  latexmk   .tex         latexmk -xelatex
"#;

/// Compile an HTML, Typst, or LaTeX document to PDF.
#[derive(Parser, Debug)]
#[command(
    name = "doc2pdf",
    version,
    about = "Compile HTML/Typst/LaTeX to PDF",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Input .html, .htm, .typ, or .tex file.
    #[arg(long = "in", value_name = "FILE", env = "DOC2PDF_IN")]
    input: PathBuf,

    /// Output PDF path.
    #[arg(long, value_name = "PDF", env = "DOC2PDF_OUT")]
    out: PathBuf,

    /// Paper size used when the HTML does not set one.
    #[arg(long, env = "DOC2PDF_PAPER", value_enum, default_value = "A4", ignore_case = true)]
    paper: PaperArg,

    /// Compilation engine.
    #[arg(long, env = "DOC2PDF_ENGINE", value_enum, default_value = "auto")]
    engine: EngineArg,

    /// Explicit path to the Chrome binary.
    #[arg(long, value_name = "PATH", env = "DOC2PDF_CHROME")]
    chrome: Option<PathBuf>,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "DOC2PDF_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "DOC2PDF_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum PaperArg {
    #[value(name = "A4")]
    A4,
    #[value(name = "Letter")]
    Letter,
}

impl From<PaperArg> for Paper {
    fn from(v: PaperArg) -> Self {
        match v {
            PaperArg::A4 => Paper::A4,
            PaperArg::Letter => Paper::Letter,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum EngineArg {
    Auto,
    Chrome,
    Typst,
    Latexmk,
}

impl From<EngineArg> for CompileEngine {
    fn from(v: EngineArg) -> Self {
        match v {
            EngineArg::Auto => CompileEngine::Auto,
            EngineArg::Chrome => CompileEngine::Chrome,
            EngineArg::Typst => CompileEngine::Typst,
            EngineArg::Latexmk => CompileEngine::Latexmk,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    cli::init_tracing(cli.verbose, cli.quiet, false);
    cli::finish("doc2pdf", run(cli))
}

#[tokio::main(flavor = "current_thread")]
async fn run(cli: Cli) -> Result<()> {
    let mut request = CompileRequest::new(&cli.input, &cli.out)
        .paper(cli.paper.into())
        .engine(cli.engine.into());
    if let Some(chrome) = cli.chrome {
        request = request.chrome(chrome);
    }

    let pdf = compile(&request).await.context("Compilation failed")?;
    println!("{}", pdf.display());
    Ok(())
}
