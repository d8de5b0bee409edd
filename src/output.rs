//! Result types of a reconstruction job.

use crate::error::Pixels2PdfError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Final locations of the two candidate outputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalArtifacts {
    /// Merged, uncompressed PDF.
    pub merged: PathBuf,
    /// Size-reduced variant of `merged`.
    pub compressed: PathBuf,
}

/// Summary numbers for a successful job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionStats {
    pub total_pages: usize,
    /// Whether the OCR branch produced the pages.
    pub ocr: bool,
    /// Sum of all page input sizes, in MiB.
    pub total_input_mb: f64,
    /// External tool invocations issued.
    pub tool_invocations: usize,
    pub total_duration_ms: u64,
}

/// Everything a successful job produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionOutput {
    pub artifacts: FinalArtifacts,
    pub stats: ConversionStats,
}

/// Outcome of [`crate::convert::run_job`], successful or not.
#[derive(Debug)]
pub struct JobReport {
    pub result: Result<ConversionOutput, Pixels2PdfError>,
    /// Last percentage reported on the progress channel.
    pub final_percentage: f64,
    /// Last progress message (the failure cause when `result` is an error).
    pub final_message: String,
    /// All captured external-tool output, in invocation order.
    pub diagnostics: String,
    /// Where the diagnostic log was written, if it was.
    pub log_path: Option<PathBuf>,
}

impl JobReport {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    /// 0 on success, 1 on any failure.
    pub fn exit_code(&self) -> i32 {
        match &self.result {
            Ok(_) => 0,
            Err(e) => e.exit_code(),
        }
    }
}
