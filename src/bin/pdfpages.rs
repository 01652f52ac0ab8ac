//! CLI binary: report page counts of one PDF or a directory of PDFs.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_doctools::cli;
use edgequake_doctools::page_count::DEFAULT_PATTERN;
use edgequake_doctools::{count_pages, PageCountEngine, PageCountRequest};
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

const AFTER_HELP: &str = r#"EXAMPLES:
  pdfpages --in resume.pdf
  pdfpages --in exports/ --recursive --total
  pdfpages --in exports/ --glob "cv_*.pdf" --json

OUTPUT:
  One "<path><TAB><pages>" line per file, then "TOTAL<TAB><n>" with --total.
"#;

/// Get PDF page counts.
#[derive(Parser, Debug)]
#[command(
    name = "pdfpages",
    version,
    about = "Get PDF page counts",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Input PDF file or directory.
    #[arg(long = "in", value_name = "PATH", env = "PDFPAGES_IN")]
    input: PathBuf,

    /// File pattern used when --in is a directory.
    #[arg(long = "glob", env = "PDFPAGES_GLOB", default_value = DEFAULT_PATTERN)]
    pattern: String,

    /// Search the directory recursively.
    #[arg(long, env = "PDFPAGES_RECURSIVE")]
    recursive: bool,

    /// Page count backend.
    #[arg(long, env = "PDFPAGES_ENGINE", value_enum, default_value = "auto")]
    engine: EngineArg,

    /// Print a TOTAL line.
    #[arg(long, env = "PDFPAGES_TOTAL")]
    total: bool,

    /// Print the report as JSON.
    #[arg(long, env = "PDFPAGES_JSON")]
    json: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDFPAGES_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDFPAGES_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum EngineArg {
    Auto,
    Pdfinfo,
    Pdfium,
}

impl From<EngineArg> for PageCountEngine {
    fn from(v: EngineArg) -> Self {
        match v {
            EngineArg::Auto => PageCountEngine::Auto,
            EngineArg::Pdfinfo => PageCountEngine::Pdfinfo,
            EngineArg::Pdfium => PageCountEngine::Pdfium,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    // Results go to stdout; keep library chatter at warn unless asked.
    cli::init_tracing(cli.verbose, cli.quiet, true);
    cli::finish("pdfpages", run(cli))
}

#[tokio::main(flavor = "current_thread")]
async fn run(cli: Cli) -> Result<()> {
    let request = PageCountRequest::new(&cli.input)
        .pattern(cli.pattern.as_str())
        .recursive(cli.recursive)
        .engine(cli.engine.into());

    let report = count_pages(&request).await.context("Page count failed")?;

    let mut stdout = io::stdout().lock();
    if cli.json {
        let json = serde_json::to_string_pretty(&report).context("Failed to serialise report")?;
        writeln!(stdout, "{json}").context("Failed to write to stdout")?;
    } else {
        stdout
            .write_all(report.to_tsv(cli.total).as_bytes())
            .context("Failed to write to stdout")?;
    }

    Ok(())
}
