//! Job driver: pages → merged PDF → compressed PDF → published artifacts.
//!
//! [`run_job`] is the process-level entry point. It never returns an error:
//! failures are reported once on the progress channel with the error flag
//! set, the diagnostic log is written regardless of outcome, and the
//! [`JobReport`] carries the exit code. [`convert`] is the library-level
//! shortcut that only returns the result.

use crate::config::{ConversionConfig, PageInputMode};
use crate::context::JobContext;
use crate::error::Pixels2PdfError;
use crate::output::{ConversionOutput, ConversionStats, JobReport};
use crate::pipeline::{assets, finalize, page::PageConverter, publish};
use crate::progress::{
    NoopProgressCallback, ProgressCallback, DONE_PERCENTAGE, MERGE_PERCENTAGE, START_PERCENTAGE,
};
use crate::runner::{ProcessRunner, ToolRunner};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Run one reconstruction job and return only its result.
///
/// Progress and the diagnostic log are still produced exactly as by
/// [`run_job`].
pub async fn convert(config: &ConversionConfig) -> Result<ConversionOutput, Pixels2PdfError> {
    run_job(config).await.result
}

/// Run one reconstruction job end to end.
///
/// Sequence:
/// 1. resolve the page count (configured, or counted on disk);
/// 2. convert pages strictly in order, `45/N` percent each;
/// 3. merge and compress under a whole-document deadline;
/// 4. publish artifacts, report 100 %;
/// 5. on any error, report it as the terminal progress message;
/// 6. always write the diagnostic log.
pub async fn run_job(config: &ConversionConfig) -> JobReport {
    let start = Instant::now();
    let runner: Arc<dyn ToolRunner> = config
        .runner
        .clone()
        .unwrap_or_else(|| Arc::new(ProcessRunner));
    let callback: ProgressCallback = config
        .progress_callback
        .clone()
        .unwrap_or_else(|| Arc::new(NoopProgressCallback));

    let mut ctx = JobContext::new(runner, callback.clone());
    ctx.progress.set_percentage(START_PERCENTAGE);

    let mut total_pages = 0;
    let result = match resolve_page_count(config).await {
        Ok(total) => {
            total_pages = total;
            info!(
                "Rebuilding {} pages ({})",
                total,
                if config.ocr_language.is_some() { "OCR" } else { "no OCR" }
            );
            callback.on_conversion_start(total);
            execute(&mut ctx, config, total, start).await
        }
        Err(e) => Err(e),
    };

    if let Err(ref e) = result {
        error!("Conversion failed: {}", e);
        ctx.progress.fail(e.to_string());
    }

    let path = publish::diagnostics_log_path(&config.layout, config.delivery);
    let log_path = match publish::write_diagnostics(&ctx.diagnostics, &path).await {
        Ok(()) => {
            debug!("Diagnostic log written to {}", path.display());
            Some(path)
        }
        Err(e) => {
            warn!("Could not write diagnostic log: {}", e);
            None
        }
    };

    callback.on_conversion_complete(total_pages, result.is_ok());

    JobReport {
        final_percentage: ctx.progress.percentage(),
        final_message: ctx.progress.message().to_string(),
        diagnostics: ctx.diagnostics.to_string_lossy().into_owned(),
        log_path,
        result,
    }
}

/// Synchronous wrapper around [`run_job`].
///
/// Creates a temporary tokio runtime internally.
pub fn run_job_sync(config: &ConversionConfig) -> JobReport {
    match tokio::runtime::Runtime::new() {
        Ok(rt) => rt.block_on(run_job(config)),
        Err(e) => JobReport {
            result: Err(Pixels2PdfError::Internal(format!(
                "Failed to create tokio runtime: {}",
                e
            ))),
            final_percentage: 0.0,
            final_message: String::new(),
            diagnostics: String::new(),
            log_path: None,
        },
    }
}

async fn resolve_page_count(config: &ConversionConfig) -> Result<usize, Pixels2PdfError> {
    match config.num_pages {
        Some(0) => Err(Pixels2PdfError::InvalidConfig("Page count must be ≥ 1".into())),
        Some(n) => assets::validate_page_count(n),
        None => assets::count_pages(&config.layout, config.input_mode).await,
    }
}

async fn execute(
    ctx: &mut JobContext,
    config: &ConversionConfig,
    total: usize,
    start: Instant,
) -> Result<ConversionOutput, Pixels2PdfError> {
    let layout = &config.layout;
    let converter = PageConverter::new(config, total);

    // ── Per-page conversion ──────────────────────────────────────────────
    let mut page_pdfs = Vec::with_capacity(total);
    let mut total_size_mb = 0.0;
    for page in 1..=total {
        let page_assets = assets::read_page(layout, config.input_mode, page).await?;
        total_size_mb += page_assets.size_mb;
        page_pdfs.push(converter.convert(ctx, &page_assets).await?);
    }

    // ── Whole-document steps ─────────────────────────────────────────────
    let timeout = config.timeouts.estimate(total_size_mb, total);
    let merged =
        finalize::merge_pages(ctx, layout, &config.toolchain, &page_pdfs, timeout).await?;
    ctx.progress.add_percentage(MERGE_PERCENTAGE);

    let compressed = finalize::compress(ctx, layout, &config.toolchain, &merged, timeout).await?;

    if config.cleanup_intermediates {
        remove_intermediates(config, total).await;
    }

    // ── Delivery ─────────────────────────────────────────────────────────
    let artifacts =
        publish::publish_artifacts(layout, config.delivery, &merged, &compressed).await?;

    ctx.progress.set_percentage(DONE_PERCENTAGE);
    ctx.progress.advance("Safe PDF created");

    let stats = ConversionStats {
        total_pages: total,
        ocr: converter.renderer().is_ocr(),
        total_input_mb: total_size_mb,
        tool_invocations: ctx.invocations(),
        total_duration_ms: start.elapsed().as_millis() as u64,
    };
    info!(
        "Conversion complete: {} pages, {} tool runs, {}ms",
        stats.total_pages, stats.tool_invocations, stats.total_duration_ms
    );

    Ok(ConversionOutput { artifacts, stats })
}

/// Best-effort removal of per-page PNGs and PDFs. Rendered-mode PNGs are
/// inputs, not intermediates, and are left alone.
async fn remove_intermediates(config: &ConversionConfig, total: usize) {
    let layout = &config.layout;
    for page in 1..=total {
        let mut paths = vec![layout.page_pdf(page)];
        if config.input_mode == PageInputMode::Pixels {
            paths.push(layout.png(page));
        }
        for path in paths {
            if let Err(e) = tokio::fs::remove_file(&path).await {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!("Could not remove {}: {}", path.display(), e);
                }
            }
        }
    }
}
