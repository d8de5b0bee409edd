//! Mutable per-job context threaded through every pipeline step.
//!
//! [`JobContext`] owns the [`ProgressTracker`], the [`Diagnostics`] buffer
//! and the [`ToolRunner`] for exactly one job. Steps borrow it mutably, so
//! two jobs in one process never share counters or captured output.

use crate::error::Pixels2PdfError;
use crate::progress::{ProgressCallback, ProgressTracker};
use crate::runner::{ToolCommand, ToolOutput, ToolRunError, ToolRunner};
use crate::timeout::display_secs;
use std::borrow::Cow;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// One external step: what to run, how long to allow, and how to word a failure.
#[derive(Debug, Clone)]
pub struct Step {
    pub command: ToolCommand,
    pub timeout: Duration,
    /// Message used when the tool fails, e.g. `Page 2/3 OCR failed`.
    pub error_message: String,
    /// Prefix of the timeout message; the deadline is appended.
    pub timeout_context: String,
}

/// Output of every external step, concatenated in invocation order.
#[derive(Debug, Default, Clone)]
pub struct Diagnostics {
    buf: Vec<u8>,
}

impl Diagnostics {
    /// Append a finished invocation: command line, then stdout, then stderr.
    pub fn record(&mut self, command: &ToolCommand, output: &ToolOutput) {
        self.header(&command.to_string());
        self.push_block(&output.stdout);
        self.push_block(&output.stderr);
    }

    /// Append a free-form line, e.g. for in-process steps or killed tools.
    pub fn note(&mut self, line: &str) {
        self.push_block(line.as_bytes());
    }

    fn header(&mut self, command_line: &str) {
        self.buf.extend_from_slice(b"$ ");
        self.push_block(command_line.as_bytes());
    }

    fn push_block(&mut self, bytes: &[u8]) {
        if bytes.is_empty() {
            return;
        }
        self.buf.extend_from_slice(bytes);
        if !bytes.ends_with(b"\n") {
            self.buf.push(b'\n');
        }
    }

    pub fn to_string_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.buf)
    }

    /// Write the buffer to `path` atomically (temp file in the same dir + rename).
    pub fn write_to(&self, path: &Path) -> std::io::Result<()> {
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir)?;
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(&self.buf)?;
        tmp.flush()?;
        tmp.persist(path).map_err(|e| e.error)?;
        Ok(())
    }
}

/// Explicit mutable state of one reconstruction job.
pub struct JobContext {
    pub progress: ProgressTracker,
    pub diagnostics: Diagnostics,
    runner: Arc<dyn ToolRunner>,
    invocations: usize,
}

impl JobContext {
    pub fn new(runner: Arc<dyn ToolRunner>, callback: ProgressCallback) -> Self {
        Self {
            progress: ProgressTracker::new(callback),
            diagnostics: Diagnostics::default(),
            runner,
            invocations: 0,
        }
    }

    /// Number of external steps issued so far.
    pub fn invocations(&self) -> usize {
        self.invocations
    }

    /// Run one external step, capturing its output into the diagnostics.
    ///
    /// A non-success status, a missing output file, a spawn failure or an
    /// expired deadline all become a fatal [`Pixels2PdfError`].
    pub async fn run_step(&mut self, step: Step) -> Result<ToolOutput, Pixels2PdfError> {
        self.invocations += 1;
        debug!(
            timeout_secs = display_secs(step.timeout),
            "Step {}: {}", self.invocations, step.command
        );

        match self.runner.run(&step.command, step.timeout).await {
            Ok(output) => {
                self.diagnostics.record(&step.command, &output);
                if !output.success {
                    return Err(Pixels2PdfError::ToolFailed {
                        message: step.error_message,
                        detail: output.status_text(),
                    });
                }
                let produced = tokio::fs::try_exists(step.command.produces())
                    .await
                    .unwrap_or(false);
                if !produced {
                    return Err(Pixels2PdfError::ToolFailed {
                        message: step.error_message,
                        detail: format!(
                            "{} was not created",
                            step.command.produces().display()
                        ),
                    });
                }
                Ok(output)
            }
            Err(ToolRunError::TimedOut(_)) => {
                let secs = display_secs(step.timeout);
                self.diagnostics.header(&step.command.to_string());
                self.diagnostics
                    .note(&format!("[killed after {} second deadline]", secs));
                Err(Pixels2PdfError::ToolTimeout {
                    context: step.timeout_context,
                    secs,
                })
            }
            Err(ToolRunError::Spawn(e)) => {
                self.diagnostics.header(&step.command.to_string());
                self.diagnostics.note(&format!("[spawn failed: {}]", e));
                Err(Pixels2PdfError::ToolNotFound {
                    message: step.error_message,
                    program: step.command.program().to_string(),
                    detail: e.to_string(),
                })
            }
            Err(ToolRunError::Io(e)) => {
                self.diagnostics.header(&step.command.to_string());
                self.diagnostics.note(&format!("[wait failed: {}]", e));
                Err(Pixels2PdfError::ToolFailed {
                    message: step.error_message,
                    detail: e.to_string(),
                })
            }
        }
    }
}
