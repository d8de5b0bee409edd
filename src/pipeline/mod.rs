//! Pipeline stages for pixels-to-PDF reconstruction.
//!
//! Each submodule implements exactly one stage, so each can be tested on
//! its own with a fake [`crate::runner::ToolRunner`].
//!
//! ## Data Flow
//!
//! ```text
//! assets ──▶ page ──▶ finalize ──▶ publish
//! (inputs)   (per page) (merge, compress) (deliver)
//! ```
//!
//! 1. [`assets`]  : count pages, read and validate per-page inputs
//! 2. [`page`]    : pixels → PNG → page PDF, plain or OCR
//! 3. [`finalize`]: merge page PDFs in order, then compress
//! 4. [`publish`] : move artifacts to the trusted zone, write the log

pub mod assets;
pub mod finalize;
pub mod page;
pub mod publish;
