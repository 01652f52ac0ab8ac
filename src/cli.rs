//! Plumbing shared by the command-line binaries.
//!
//! Every binary logs to stderr through `tracing-subscriber`, keeps stdout for
//! its result, and on failure prints `[<bin>] ERROR: <message chain>` and
//! exits with status 1.

use std::io;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Default log level for a run.
///
/// `RUST_LOG` overrides it when set.
pub fn log_filter(verbose: bool, quiet: bool, progress_active: bool) -> &'static str {
    if verbose {
        "debug"
    } else if quiet {
        "error"
    } else if progress_active {
        // The bar already tells the user what is happening.
        "warn"
    } else {
        "info"
    }
}

/// Install the stderr subscriber.
pub fn init_tracing(verbose: bool, quiet: bool, progress_active: bool) {
    let filter = log_filter(verbose, quiet, progress_active);
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(io::stderr)
        .init();
}

/// Map the outcome of a binary's `run` to its exit code.
pub fn finish(bin: &str, result: anyhow::Result<()>) -> ExitCode {
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", error_line(bin, &e));
            ExitCode::FAILURE
        }
    }
}

/// `[<bin>] ERROR: <outer>: <inner>: …`
pub fn error_line(bin: &str, error: &anyhow::Error) -> String {
    format!("[{bin}] ERROR: {error:#}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn filter_precedence() {
        assert_eq!(log_filter(true, true, true), "debug");
        assert_eq!(log_filter(false, true, false), "error");
        assert_eq!(log_filter(false, false, true), "warn");
        assert_eq!(log_filter(false, false, false), "info");
    }

    #[test]
    fn error_line_includes_chain() {
        let err = Err::<(), _>(crate::DocToolsError::InvalidDpi(0))
            .context("Invalid arguments")
            .unwrap_err();
        assert_eq!(
            error_line("pdf2img", &err),
            "[pdf2img] ERROR: Invalid arguments: DPI must be > 0, got 0"
        );
    }
}
