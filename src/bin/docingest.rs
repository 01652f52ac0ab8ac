//! CLI binary: extract a document's text into a work directory.
//!
//! Prints `KEY=value` lines (`WORKDIR`, `CONTENT_TXT`, optional `LAYOUT_REF`)
//! so shell scripts can `eval` the result.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_doctools::cli;
use edgequake_doctools::{ingest, IngestRequest};
use std::path::PathBuf;
use std::process::ExitCode;

const AFTER_HELP: &str = r#"EXAMPLES:
  docingest --in old_resume.pdf --with-layout --keep-workdir
  docingest --in old_resume.docx --workdir work/
  docingest --in notes.md --json

SUPPORTED INPUTS:
  .pdf                             pdftotext -layout (+ pdftohtml with --with-layout)
  .docx                            pandoc -t plain
  .html .htm .tex .typ .md .txt    copied as text

A temporary work directory is deleted on exit unless --keep-workdir is given;
a --workdir directory is never deleted.
"#;

/// Ingest a document to plain text for editing.
#[derive(Parser, Debug)]
#[command(
    name = "docingest",
    version,
    about = "Extract a document's text into a work directory",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Input document.
    #[arg(long = "in", value_name = "FILE", env = "DOCINGEST_IN")]
    input: PathBuf,

    /// PDF only: also run pdftohtml for a layout reference.
    #[arg(long, env = "DOCINGEST_WITH_LAYOUT")]
    with_layout: bool,

    /// Work directory (default: a temporary directory).
    #[arg(long, value_name = "DIR", env = "DOCINGEST_WORKDIR")]
    workdir: Option<PathBuf>,

    /// Keep the temporary work directory.
    #[arg(long, env = "DOCINGEST_KEEP_WORKDIR")]
    keep_workdir: bool,

    /// Print the result as JSON.
    #[arg(long, env = "DOCINGEST_JSON")]
    json: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "DOCINGEST_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "DOCINGEST_QUIET")]
    quiet: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    cli::init_tracing(cli.verbose, cli.quiet, false);
    cli::finish("docingest", run(cli))
}

#[tokio::main(flavor = "current_thread")]
async fn run(cli: Cli) -> Result<()> {
    let mut request = IngestRequest::new(&cli.input)
        .with_layout(cli.with_layout)
        .keep_workdir(cli.keep_workdir);
    if let Some(dir) = cli.workdir {
        request = request.workdir(dir);
    }

    // A temporary work directory is removed when `output` drops.
    let output = ingest(&request).await.context("Ingest failed")?;

    if cli.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        println!("{json}");
    } else {
        print!("{}", output.to_env_lines());
    }

    Ok(())
}
