//! External process execution under a deadline.
//!
//! Every conversion step that touches untrusted pixels runs in a separate
//! process: GraphicsMagick, tesseract, pdfunite and ps2pdf. [`ToolRunner`]
//! is the seam between the pipeline and process supervision, so tests can
//! swap in a recording fake and embedders can route commands through their
//! own sandbox.
//!
//! [`ProcessRunner`] is the production implementation. It races the child
//! against a timer; when the timer wins the child is killed (via
//! `kill_on_drop`) and whatever it printed is discarded.

use async_trait::async_trait;
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

/// A single external program invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    program: String,
    args: Vec<OsString>,
    produces: PathBuf,
}

impl ToolCommand {
    /// Start a command whose successful run must leave `produces` on disk.
    pub fn new(program: impl Into<String>, produces: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            produces: produces.into(),
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    /// Append `prefix` immediately followed by `path`, e.g. `rgb:/tmp/page-1.rgb`.
    pub fn prefixed_path(mut self, prefix: &str, path: &Path) -> Self {
        let mut s = OsString::from(prefix);
        s.push(path.as_os_str());
        self.args.push(s);
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[OsString] {
        &self.args
    }

    /// The file this command is expected to create.
    pub fn produces(&self) -> &Path {
        &self.produces
    }

    /// True when any argument contains `needle` (lossy comparison).
    pub fn mentions(&self, needle: &str) -> bool {
        self.args
            .iter()
            .any(|a| a.to_string_lossy().contains(needle))
    }
}

impl fmt::Display for ToolCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

/// Captured result of a finished process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    /// Whether the process exited with a success status.
    pub success: bool,
    /// Exit code, if the process exited normally.
    pub code: Option<i32>,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl ToolOutput {
    /// A successful run with no output, handy for fakes.
    pub fn ok() -> Self {
        Self {
            success: true,
            code: Some(0),
            ..Default::default()
        }
    }

    /// A failed run with the given exit code and stderr.
    pub fn failed(code: i32, stderr: impl Into<Vec<u8>>) -> Self {
        Self {
            success: false,
            code: Some(code),
            stdout: Vec::new(),
            stderr: stderr.into(),
        }
    }

    /// Short description of the exit status for error details.
    pub fn status_text(&self) -> String {
        match self.code {
            Some(code) => format!("exit status {}", code),
            None => "terminated by signal".to_string(),
        }
    }
}

/// Why a command produced no [`ToolOutput`].
#[derive(Debug, Error)]
pub enum ToolRunError {
    /// The deadline passed before the process exited.
    #[error("deadline of {0:?} exceeded")]
    TimedOut(Duration),

    /// The program could not be started.
    #[error("failed to spawn: {0}")]
    Spawn(#[source] std::io::Error),

    /// Waiting on the process or reading its pipes failed.
    #[error("i/o error while waiting: {0}")]
    Io(#[source] std::io::Error),
}

/// Runs one external command to completion or until `timeout` elapses.
#[async_trait]
pub trait ToolRunner: Send + Sync {
    async fn run(&self, command: &ToolCommand, timeout: Duration) -> Result<ToolOutput, ToolRunError>;
}

/// Spawns real child processes with `tokio::process`.
#[derive(Debug, Default, Clone)]
pub struct ProcessRunner;

#[async_trait]
impl ToolRunner for ProcessRunner {
    async fn run(&self, command: &ToolCommand, timeout: Duration) -> Result<ToolOutput, ToolRunError> {
        debug!(timeout = ?timeout, "Running: {}", command);

        let child = Command::new(command.program())
            .args(command.args())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(ToolRunError::Spawn)?;

        // Dropping the wait future on timeout drops the child, which kills it.
        match tokio::time::timeout(timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => Ok(ToolOutput {
                success: output.status.success(),
                code: output.status.code(),
                stdout: output.stdout,
                stderr: output.stderr,
            }),
            Ok(Err(e)) => Err(ToolRunError::Io(e)),
            Err(_) => Err(ToolRunError::TimedOut(timeout)),
        }
    }
}
