//! # edgequake-pixels2pdf
//!
//! Rebuild sanitized page pixels into a single safe PDF.
//!
//! ## Why this crate?
//!
//! A document that cannot be trusted is first flattened to raw pixels inside
//! a sandbox: no fonts, no scripts, no embedded objects survive. This crate
//! is the second half of that round trip. It turns the per-page pixel dumps
//! back into a PDF, optionally with an OCR text layer so the result stays
//! searchable, and does it under strict per-step deadlines so a hostile
//! input cannot stall the sandbox.
//!
//! ## Pipeline Overview
//!
//! ```text
//! page-{i}.rgb + .width + .height
//!  │
//!  ├─ 1. Assets    count pages, validate dimensions and buffer length
//!  ├─ 2. Encode    pixels → PNG (gm, or in-process via `png`)
//!  ├─ 3. Render    PNG → page PDF (gm), or PNG → searchable PDF (tesseract)
//!  ├─ 4. Merge     page PDFs → safe-output.pdf (pdfunite)
//!  ├─ 5. Compress  safe-output.pdf → safe-output-compressed.pdf (ps2pdf)
//!  └─ 6. Publish   move both into the trusted zone, write captured_output.txt
//! ```
//!
//! Progress starts at 50 % (rasterisation already happened), advances by
//! `45/N` per page and 2 after the merge, and ends at 100 %.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_pixels2pdf::{run_job, ConversionConfig, JsonProgressCallback};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = ConversionConfig::builder()
//!         .ocr_language("eng")
//!         .progress_callback(Arc::new(JsonProgressCallback))
//!         .build()
//!         .unwrap();
//!     let report = run_job(&config).await;
//!     std::process::exit(report.exit_code());
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pixels2pdf` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod context;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod runner;
pub mod timeout;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{
    ConversionConfig, ConversionConfigBuilder, DeliveryMode, PageInputMode, PixelEncoder,
    Toolchain, WorkLayout,
};
pub use context::{Diagnostics, JobContext, Step};
pub use convert::{convert, run_job, run_job_sync};
pub use error::Pixels2PdfError;
pub use output::{ConversionOutput, ConversionStats, FinalArtifacts, JobReport};
pub use pipeline::page::PageRenderer;
pub use progress::{
    ConversionProgressCallback, JsonProgressCallback, NoopProgressCallback, ProgressCallback,
    ProgressTracker, ProgressUpdate,
};
pub use runner::{ProcessRunner, ToolCommand, ToolOutput, ToolRunError, ToolRunner};
pub use timeout::TimeoutPolicy;
