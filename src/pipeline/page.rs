//! Per-page conversion: pixels → PNG → page PDF.
//!
//! Each page walks a small state machine:
//!
//! ```text
//! PixelsOrImageReady ──(encode, pixel input only)──▶ ImageReady
//! ImageReady ──PageRenderer::Ocr──▶ PagePdfReady   (tesseract, text layer)
//! ImageReady ──PageRenderer::Plain─▶ PagePdfReady  (gm, image only)
//! ```
//!
//! Exactly one renderer runs per page. Every step's deadline is sized from
//! that page's own input size, and any failure aborts the job before the
//! next page starts.

use crate::config::{ConversionConfig, PixelEncoder, Toolchain, WorkLayout};
use crate::context::{JobContext, Step};
use crate::error::Pixels2PdfError;
use crate::pipeline::assets::{PageAssets, PageSource};
use crate::progress::PAGES_PERCENTAGE;
use crate::runner::ToolCommand;
use crate::timeout::display_secs;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// How an intermediate PNG becomes a page PDF.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageRenderer {
    /// Image-only PDF, no text layer.
    Plain,
    /// Searchable PDF with recognised text embedded.
    Ocr { language: String, dpi: u32 },
}

impl PageRenderer {
    pub fn from_config(config: &ConversionConfig) -> Self {
        match &config.ocr_language {
            Some(language) => PageRenderer::Ocr {
                language: language.clone(),
                dpi: config.ocr_dpi,
            },
            None => PageRenderer::Plain,
        }
    }

    pub fn is_ocr(&self) -> bool {
        matches!(self, PageRenderer::Ocr { .. })
    }

    pub fn progress_message(&self, page: usize, total: usize) -> String {
        match self {
            PageRenderer::Plain => format!("Converting page {}/{} from pixels to PDF", page, total),
            PageRenderer::Ocr { .. } => {
                format!("Converting page {}/{} from pixels to searchable PDF", page, total)
            }
        }
    }

    /// The external step turning `png` into the page PDF.
    pub fn step(
        &self,
        layout: &WorkLayout,
        tools: &Toolchain,
        png: &Path,
        page: usize,
        total: usize,
        timeout: Duration,
    ) -> Step {
        let pdf = layout.page_pdf(page);
        match self {
            PageRenderer::Plain => Step {
                command: ToolCommand::new(&tools.graphicsmagick, &pdf)
                    .arg("convert")
                    .prefixed_path("png:", png)
                    .prefixed_path("pdf:", &pdf),
                timeout,
                error_message: format!("Page {}/{} conversion to PDF failed", page, total),
                timeout_context: "Error converting PNG to PDF, convert".into(),
            },
            PageRenderer::Ocr { language, dpi } => Step {
                // tesseract appends ".pdf" to the output base itself.
                command: ToolCommand::new(&tools.tesseract, &pdf)
                    .arg(png)
                    .arg(layout.ocr_base(page))
                    .arg("-l")
                    .arg(language)
                    .arg("--dpi")
                    .arg(dpi.to_string())
                    .arg("pdf"),
                timeout,
                error_message: format!("Page {}/{} OCR failed", page, total),
                timeout_context: "Error converting PNG to searchable PDF, tesseract".into(),
            },
        }
    }
}

/// Drives one page at a time through encode + render.
pub struct PageConverter<'a> {
    config: &'a ConversionConfig,
    renderer: PageRenderer,
    total: usize,
}

impl<'a> PageConverter<'a> {
    pub fn new(config: &'a ConversionConfig, total: usize) -> Self {
        Self {
            config,
            renderer: PageRenderer::from_config(config),
            total,
        }
    }

    pub fn renderer(&self) -> &PageRenderer {
        &self.renderer
    }

    /// Convert one page and advance progress by its share.
    ///
    /// Returns the path of the page PDF.
    pub async fn convert(
        &self,
        ctx: &mut JobContext,
        assets: &PageAssets,
    ) -> Result<PathBuf, Pixels2PdfError> {
        let page = assets.page;
        let timeout = self.config.timeouts.estimate(assets.size_mb, 1);
        debug!(
            "Page {}/{}: {:.3} MiB, deadline {}s",
            page,
            self.total,
            assets.size_mb,
            display_secs(timeout)
        );

        let png = match &assets.source {
            PageSource::Pixels { rgb, width, height } => {
                ctx.progress.advance(format!(
                    "Converting page {}/{} from pixels to PNG",
                    page, self.total
                ));
                let png = self.config.layout.png(page);
                self.encode_pixels(ctx, rgb, *width, *height, &png, page, timeout)
                    .await?;
                png
            }
            PageSource::Rendered { png } => png.clone(),
        };

        ctx.progress
            .advance(self.renderer.progress_message(page, self.total));
        let step = self.renderer.step(
            &self.config.layout,
            &self.config.toolchain,
            &png,
            page,
            self.total,
            timeout,
        );
        ctx.run_step(step).await?;

        ctx.progress
            .add_percentage(PAGES_PERCENTAGE / self.total as f64);
        Ok(self.config.layout.page_pdf(page))
    }

    #[allow(clippy::too_many_arguments)]
    async fn encode_pixels(
        &self,
        ctx: &mut JobContext,
        rgb: &Path,
        width: u32,
        height: u32,
        png: &Path,
        page: usize,
        timeout: Duration,
    ) -> Result<(), Pixels2PdfError> {
        let error_message = format!("Page {}/{} conversion to PNG failed", page, self.total);
        let timeout_context = "Error converting pixels to PNG, convert".to_string();

        match self.config.pixel_encoder {
            PixelEncoder::External => {
                let step = Step {
                    command: ToolCommand::new(&self.config.toolchain.graphicsmagick, png)
                        .arg("convert")
                        .arg("-size")
                        .arg(format!("{}x{}", width, height))
                        .arg("-depth")
                        .arg("8")
                        .prefixed_path("rgb:", rgb)
                        .prefixed_path("png:", png),
                    timeout,
                    error_message,
                    timeout_context,
                };
                ctx.run_step(step).await.map(|_| ())
            }
            PixelEncoder::Native => {
                ctx.diagnostics.note(&format!(
                    "$ encode-png {} {}x{} {}",
                    rgb.display(),
                    width,
                    height,
                    png.display()
                ));
                let cancel = Arc::new(AtomicBool::new(false));
                let mut task = tokio::task::spawn_blocking({
                    let rgb = rgb.to_path_buf();
                    let png = png.to_path_buf();
                    let cancel = Arc::clone(&cancel);
                    move || encode_png_blocking(&rgb, width, height, &png, &cancel)
                });

                let joined = match tokio::time::timeout(timeout, &mut task).await {
                    Ok(joined) => joined,
                    Err(_) => {
                        // The encoder polls the flag once per row, so this join is short.
                        cancel.store(true, Ordering::Relaxed);
                        let _ = task.await;
                        discard_partial(png).await;
                        let secs = display_secs(timeout);
                        ctx.diagnostics
                            .note(&format!("[killed after {} second deadline]", secs));
                        return Err(Pixels2PdfError::ToolTimeout {
                            context: timeout_context,
                            secs,
                        });
                    }
                };

                match joined {
                    Ok(Ok(())) => Ok(()),
                    Ok(Err(detail)) => {
                        discard_partial(png).await;
                        ctx.diagnostics.note(&detail);
                        Err(Pixels2PdfError::ToolFailed {
                            message: error_message,
                            detail,
                        })
                    }
                    Err(e) => Err(Pixels2PdfError::Internal(format!(
                        "PNG encoder task panicked: {}",
                        e
                    ))),
                }
            }
        }
    }
}

async fn discard_partial(png: &Path) {
    if let Err(e) = tokio::fs::remove_file(png).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!("Could not remove partial {}: {}", png.display(), e);
        }
    }
}

/// Stream a raw 8-bit RGB buffer into a PNG, one row at a time.
///
/// `cancel` is checked before every row; once set, encoding stops and an
/// error is returned, leaving a truncated file for the caller to remove.
pub fn encode_png_blocking(
    rgb: &Path,
    width: u32,
    height: u32,
    dest: &Path,
    cancel: &AtomicBool,
) -> Result<(), String> {
    let mut input = BufReader::new(
        File::open(rgb).map_err(|e| format!("cannot read {}: {}", rgb.display(), e))?,
    );
    let output = File::create(dest).map_err(|e| write_error(dest, e))?;

    let mut encoder = png::Encoder::new(BufWriter::new(output), width, height);
    encoder.set_color(png::ColorType::Rgb);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header().map_err(|e| write_error(dest, e))?;
    let mut stream = writer.stream_writer().map_err(|e| write_error(dest, e))?;

    let mut row = vec![0u8; width as usize * 3];
    for y in 0..height {
        if cancel.load(Ordering::Relaxed) {
            return Err(format!("encoding {} cancelled at row {}", dest.display(), y));
        }
        input.read_exact(&mut row).map_err(|e| {
            format!(
                "pixel buffer of {} does not hold {}x{} RGB pixels: {}",
                rgb.display(),
                width,
                height,
                e
            )
        })?;
        stream.write_all(&row).map_err(|e| write_error(dest, e))?;
    }
    stream.finish().map_err(|e| write_error(dest, e))?;
    writer.finish().map_err(|e| write_error(dest, e))
}

fn write_error(dest: &Path, e: impl std::fmt::Display) -> String {
    format!("cannot write {}: {}", dest.display(), e)
}
