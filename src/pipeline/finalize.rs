//! Whole-document steps: merge the page PDFs, then compress the result.
//!
//! Both steps share one deadline sized from the sum of all page inputs and
//! the page count, since their cost scales with the whole document rather
//! than any single page.

use crate::config::{Toolchain, WorkLayout};
use crate::context::{JobContext, Step};
use crate::error::Pixels2PdfError;
use crate::runner::ToolCommand;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Merge `pages` (already in ordinal order) into the merged PDF.
pub async fn merge_pages(
    ctx: &mut JobContext,
    layout: &WorkLayout,
    tools: &Toolchain,
    pages: &[PathBuf],
    timeout: Duration,
) -> Result<PathBuf, Pixels2PdfError> {
    let merged = layout.merged_pdf();
    ctx.progress
        .advance(format!("Merging {} pages into a single PDF", pages.len()));
    ctx.run_step(merge_step(tools, pages, &merged, timeout)).await?;
    Ok(merged)
}

/// Compress `merged` into the compressed PDF; `merged` is kept.
pub async fn compress(
    ctx: &mut JobContext,
    layout: &WorkLayout,
    tools: &Toolchain,
    merged: &Path,
    timeout: Duration,
) -> Result<PathBuf, Pixels2PdfError> {
    let compressed = layout.compressed_pdf();
    ctx.progress.advance("Compressing PDF");
    ctx.run_step(compress_step(tools, merged, &compressed, timeout))
        .await?;
    Ok(compressed)
}

/// `pdfunite page-1.pdf … page-N.pdf safe-output.pdf`; no reordering, no dedup.
pub fn merge_step(tools: &Toolchain, pages: &[PathBuf], merged: &Path, timeout: Duration) -> Step {
    let command = pages
        .iter()
        .fold(ToolCommand::new(&tools.pdfunite, merged), |cmd, page| {
            cmd.arg(page)
        })
        .arg(merged);
    Step {
        command,
        timeout,
        error_message: "Merging pages into a single PDF failed".into(),
        timeout_context: "Error merging pages into a single PDF, pdfunite".into(),
    }
}

pub fn compress_step(tools: &Toolchain, merged: &Path, compressed: &Path, timeout: Duration) -> Step {
    Step {
        command: ToolCommand::new(&tools.ps2pdf, compressed)
            .arg(merged)
            .arg(compressed),
        timeout,
        error_message: "Compressing PDF failed".into(),
        timeout_context: "Error compressing PDF, ps2pdf".into(),
    }
}
