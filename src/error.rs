//! Error types for the edgequake-pixels2pdf library.
//!
//! Every error here is **fatal** to the job: a single failing page aborts the
//! whole reconstruction. Nothing is retried and nothing is recovered locally.
//! The driver surfaces the error as one terminal progress message with the
//! error flag set and maps it to exit code 1.
//!
//! The variants fall into three families:
//!
//! * external tool failures: a conversion, merge or compress step exited
//!   unsuccessfully, produced nothing, or could not be spawned;
//! * external tool timeouts: a step exceeded its size-derived deadline;
//! * input metadata errors: page count, declared dimensions or pixel data
//!   that cannot be read or do not add up.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the edgequake-pixels2pdf library.
#[derive(Debug, Error)]
pub enum Pixels2PdfError {
    // ── External tool errors ──────────────────────────────────────────────
    /// An external step returned a non-success status or produced no output.
    #[error("{message}")]
    ToolFailed { message: String, detail: String },

    /// An external step exceeded its computed deadline and was killed.
    #[error("{context} timed out after {secs} seconds")]
    ToolTimeout { context: String, secs: u64 },

    /// The external program could not be started at all.
    #[error("{message}: could not run '{program}': {detail}")]
    ToolNotFound {
        message: String,
        program: String,
        detail: String,
    },

    // ── Input metadata errors ─────────────────────────────────────────────
    /// A per-page metadata file is missing or unparseable.
    #[error("Invalid page metadata in '{path}': {detail}")]
    InvalidMetadata { path: PathBuf, detail: String },

    /// No page inputs were found and no page count was supplied.
    #[error("No pages found in '{dir}'")]
    NoPages { dir: PathBuf },

    /// More pages than a document may have.
    #[error("Number of pages {count} exceeds maximum of {max}")]
    TooManyPages { count: usize, max: usize },

    /// Declared page dimensions are outside the accepted range.
    #[error("Page {page} has invalid dimensions {width}x{height}")]
    PageDimensions { page: usize, width: u32, height: u32 },

    /// The pixel buffer length disagrees with the declared dimensions.
    #[error("Page {page} pixel data is {actual} bytes, expected {expected}")]
    PixelDataMismatch {
        page: usize,
        expected: u64,
        actual: u64,
    },

    // ── Output errors ─────────────────────────────────────────────────────
    /// Could not move an artifact or write the diagnostic log.
    #[error("Failed to publish '{path}': {source}")]
    PublishFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Pixels2PdfError {
    /// Process exit code for this failure. Success is always 0.
    pub fn exit_code(&self) -> i32 {
        1
    }

    /// True for the input-metadata family of errors.
    pub fn is_metadata_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidMetadata { .. }
                | Self::NoPages { .. }
                | Self::TooManyPages { .. }
                | Self::PageDimensions { .. }
                | Self::PixelDataMismatch { .. }
        )
    }
}
