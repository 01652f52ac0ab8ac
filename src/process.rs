//! External process plumbing shared by every engine.
//!
//! Two primitives:
//!
//! * [`find_executable`] — a plain `PATH` lookup (plus `PATHEXT` on Windows);
//! * [`ExternalCommand::run`] — run a tool to completion, capture its stdout
//!   and stderr as one text blob, and turn a non-zero exit into
//!   [`DocToolsError::CommandFailed`] carrying the command line and output.

use crate::error::DocToolsError;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tracing::debug;

/// Locate `name` on `PATH`. A name containing a path separator is checked
/// as-is.
pub fn find_executable(name: &str) -> Option<PathBuf> {
    let direct = Path::new(name);
    if direct.components().count() > 1 {
        return is_executable(direct).then(|| direct.to_path_buf());
    }

    let path_var = std::env::var_os("PATH")?;
    std::env::split_paths(&path_var)
        .flat_map(|dir| candidate_names(name).into_iter().map(move |n| dir.join(n)))
        .find(|candidate| is_executable(candidate))
}

/// [`find_executable`], or [`DocToolsError::EngineUnavailable`] with `hint`.
pub fn require(tool: &str, hint: &str) -> Result<PathBuf, DocToolsError> {
    find_executable(tool).ok_or_else(|| DocToolsError::EngineUnavailable {
        engine: tool.to_string(),
        hint: hint.to_string(),
    })
}

#[cfg(windows)]
fn candidate_names(name: &str) -> Vec<String> {
    if Path::new(name).extension().is_some() {
        return vec![name.to_string()];
    }
    let exts = std::env::var("PATHEXT").unwrap_or_else(|_| ".EXE;.CMD;.BAT;.COM".into());
    std::iter::once(name.to_string())
        .chain(exts.split(';').filter(|e| !e.is_empty()).map(|e| format!("{name}{e}")))
        .collect()
}

#[cfg(not(windows))]
fn candidate_names(name: &str) -> Vec<String> {
    vec![name.to_string()]
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

/// A command line to run to completion.
#[derive(Debug, Clone)]
pub struct ExternalCommand {
    program: PathBuf,
    args: Vec<OsString>,
    cwd: Option<PathBuf>,
}

impl ExternalCommand {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn get_args(&self) -> &[OsString] {
        &self.args
    }

    /// Human-readable command line, quoting arguments that contain spaces.
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_os_str())
            .chain(self.args.iter().map(OsString::as_os_str))
            .map(|a| {
                let s = a.to_string_lossy();
                if s.is_empty() || s.contains(char::is_whitespace) {
                    format!("\"{s}\"")
                } else {
                    s.into_owned()
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Run to completion and return the combined stdout + stderr text.
    pub async fn run(&self) -> Result<String, DocToolsError> {
        debug!("Running: {}", self.display());

        let mut cmd = tokio::process::Command::new(&self.program);
        cmd.args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(ref dir) = self.cwd {
            cmd.current_dir(dir);
        }

        let output = cmd
            .output()
            .await
            .map_err(|source| DocToolsError::CommandSpawn {
                program: self.program.display().to_string(),
                source,
            })?;

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));

        if !output.status.success() {
            return Err(DocToolsError::CommandFailed {
                command: self.display(),
                code: output.status.code(),
                output: combined,
            });
        }

        Ok(combined)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_quotes_spaces() {
        let cmd = ExternalCommand::new("magick")
            .args(["-density", "200"])
            .arg("/tmp/my file.pdf[0]");
        assert_eq!(cmd.display(), "magick -density 200 \"/tmp/my file.pdf[0]\"");
    }

    #[test]
    fn missing_executable_is_none() {
        assert!(find_executable("definitely-not-a-real-tool-4242").is_none());
    }

    #[test]
    fn require_names_the_missing_tool() {
        match require("definitely-not-a-real-tool-4242", "install it") {
            Err(DocToolsError::EngineUnavailable { engine, hint }) => {
                assert_eq!(engine, "definitely-not-a-real-tool-4242");
                assert_eq!(hint, "install it");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn require_returns_the_resolved_path() {
        assert!(require("sh", "").unwrap().exists());
    }

    #[cfg(unix)]
    #[test]
    fn finds_sh_on_path() {
        assert!(find_executable("sh").is_some());
        assert!(find_executable("/bin/sh").is_some());
    }

    #[cfg(unix)]
    #[test]
    fn run_captures_combined_output() {
        let out = tokio_test::block_on(
            ExternalCommand::new("sh")
                .args(["-c", "echo out; echo err 1>&2"])
                .run(),
        )
        .unwrap();
        assert!(out.contains("out"));
        assert!(out.contains("err"));
    }

    #[cfg(unix)]
    #[test]
    fn non_zero_exit_is_command_failed() {
        let err = tokio_test::block_on(
            ExternalCommand::new("sh")
                .args(["-c", "echo broken xref 1>&2; exit 3"])
                .run(),
        )
        .unwrap_err();
        match err {
            DocToolsError::CommandFailed { code, output, command } => {
                assert_eq!(code, Some(3));
                assert!(output.contains("broken xref"));
                assert!(command.starts_with("sh -c"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn spawn_failure_is_reported() {
        let err = tokio_test::block_on(ExternalCommand::new("/no/such/tool").run()).unwrap_err();
        assert!(matches!(err, DocToolsError::CommandSpawn { .. }));
    }
}
