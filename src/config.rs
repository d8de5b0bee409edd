//! Configuration types for pixels-to-PDF reconstruction.
//!
//! All job behaviour is controlled through [`ConversionConfig`], built via
//! its [`ConversionConfigBuilder`] or loaded from the environment with
//! [`ConversionConfig::from_env`]. Collaborators (the process runner and the
//! progress callback) are injected here too, so one struct describes a whole
//! run and tests can substitute fakes without touching the driver.

use crate::error::Pixels2PdfError;
use crate::progress::ProgressCallback;
use crate::runner::ToolRunner;
use crate::timeout::TimeoutPolicy;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Marker file present only inside a single-zone (disposable VM) deployment.
pub const SINGLE_ZONE_MARKER: &str = "/usr/share/qubes/marker-vm";

/// File name of the merged, uncompressed PDF.
pub const MERGED_PDF_NAME: &str = "safe-output.pdf";
/// File name of the compressed PDF.
pub const COMPRESSED_PDF_NAME: &str = "safe-output-compressed.pdf";
/// File name of the diagnostic log.
pub const DIAGNOSTICS_LOG_NAME: &str = "captured_output.txt";

/// Configuration for one reconstruction job.
///
/// # Example
/// ```rust
/// use edgequake_pixels2pdf::{ConversionConfig, DeliveryMode};
///
/// let config = ConversionConfig::builder()
///     .input_dir("/tmp/dangerzone")
///     .ocr_language("eng")
///     .delivery(DeliveryMode::InPlace)
///     .build()
///     .unwrap();
/// assert_eq!(config.ocr_language.as_deref(), Some("eng"));
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// Where inputs, intermediates and outputs live.
    pub layout: WorkLayout,

    /// Page count. If None, derived by counting the page inputs on disk.
    pub num_pages: Option<usize>,

    /// OCR language (tesseract code, e.g. "eng"). None selects the plain branch.
    pub ocr_language: Option<String>,

    /// Rendering resolution handed to tesseract. Default: 70.
    ///
    /// Deliberately low: it only drives the text layer and page geometry of
    /// the OCR output, not print quality.
    pub ocr_dpi: u32,

    /// Whether pages arrive as raw pixel buffers or pre-rendered PNGs.
    pub input_mode: PageInputMode,

    /// How raw pixel buffers become PNGs.
    pub pixel_encoder: PixelEncoder,

    /// Whether final artifacts must be moved to the trusted output dir.
    pub delivery: DeliveryMode,

    /// Deadline policy for every external step.
    pub timeouts: TimeoutPolicy,

    /// Program names of the external tools.
    pub toolchain: Toolchain,

    /// Remove per-page intermediates after a successful run. Default: true.
    pub cleanup_intermediates: bool,

    /// Pre-constructed process runner. Defaults to [`crate::runner::ProcessRunner`].
    pub runner: Option<Arc<dyn ToolRunner>>,

    /// Optional progress callback. Defaults to no-op.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            layout: WorkLayout::default(),
            num_pages: None,
            ocr_language: None,
            ocr_dpi: 70,
            input_mode: PageInputMode::default(),
            pixel_encoder: PixelEncoder::default(),
            delivery: DeliveryMode::Relocate,
            timeouts: TimeoutPolicy::default(),
            toolchain: Toolchain::default(),
            cleanup_intermediates: true,
            runner: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("layout", &self.layout)
            .field("num_pages", &self.num_pages)
            .field("ocr_language", &self.ocr_language)
            .field("ocr_dpi", &self.ocr_dpi)
            .field("input_mode", &self.input_mode)
            .field("pixel_encoder", &self.pixel_encoder)
            .field("delivery", &self.delivery)
            .field("timeouts", &self.timeouts)
            .field("toolchain", &self.toolchain)
            .field("cleanup_intermediates", &self.cleanup_intermediates)
            .field("runner", &self.runner.as_ref().map(|_| "<dyn ToolRunner>"))
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ConversionProgressCallback>"),
            )
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }

    /// Defaults plus OCR settings from `OCR` / `OCR_LANGUAGE` and a delivery
    /// mode detected from the host.
    pub fn from_env() -> Result<Self, Pixels2PdfError> {
        let ocr = std::env::var("OCR").ok();
        let lang = std::env::var("OCR_LANGUAGE").ok();

        let mut builder = Self::builder().delivery(DeliveryMode::detect());
        if let Some(lang) = ocr_language_from(ocr.as_deref(), lang.as_deref()) {
            builder = builder.ocr_language(lang);
        }
        builder.build()
    }
}

/// Resolve the OCR language from the raw `OCR` / `OCR_LANGUAGE` values.
///
/// Without `OCR=1` the language is ignored and the plain branch runs.
pub fn ocr_language_from(ocr_flag: Option<&str>, language: Option<&str>) -> Option<String> {
    if ocr_flag.map(str::trim) != Some("1") {
        return None;
    }
    language
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
}

/// Builder for [`ConversionConfig`].
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl fmt::Debug for ConversionConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfigBuilder")
            .field("config", &self.config)
            .finish()
    }
}

impl ConversionConfigBuilder {
    pub fn layout(mut self, layout: WorkLayout) -> Self {
        self.config.layout = layout;
        self
    }

    pub fn input_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.layout.input_dir = dir.into();
        self
    }

    pub fn scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.layout.scratch_dir = dir.into();
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.layout.output_dir = dir.into();
        self
    }

    pub fn num_pages(mut self, n: usize) -> Self {
        self.config.num_pages = Some(n);
        self
    }

    /// Enable OCR with `lang`. Blank values disable OCR.
    pub fn ocr_language(mut self, lang: impl Into<String>) -> Self {
        let lang = lang.into();
        let lang = lang.trim();
        self.config.ocr_language = if lang.is_empty() {
            None
        } else {
            Some(lang.to_string())
        };
        self
    }

    pub fn ocr_dpi(mut self, dpi: u32) -> Self {
        self.config.ocr_dpi = dpi;
        self
    }

    pub fn input_mode(mut self, mode: PageInputMode) -> Self {
        self.config.input_mode = mode;
        self
    }

    pub fn pixel_encoder(mut self, encoder: PixelEncoder) -> Self {
        self.config.pixel_encoder = encoder;
        self
    }

    pub fn delivery(mut self, mode: DeliveryMode) -> Self {
        self.config.delivery = mode;
        self
    }

    pub fn timeouts(mut self, policy: TimeoutPolicy) -> Self {
        self.config.timeouts = policy;
        self
    }

    pub fn toolchain(mut self, toolchain: Toolchain) -> Self {
        self.config.toolchain = toolchain;
        self
    }

    pub fn cleanup_intermediates(mut self, v: bool) -> Self {
        self.config.cleanup_intermediates = v;
        self
    }

    pub fn runner(mut self, runner: Arc<dyn ToolRunner>) -> Self {
        self.config.runner = Some(runner);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, Pixels2PdfError> {
        let c = &self.config;
        if c.num_pages == Some(0) {
            return Err(Pixels2PdfError::InvalidConfig(
                "Page count must be ≥ 1".into(),
            ));
        }
        if c.ocr_dpi == 0 {
            return Err(Pixels2PdfError::InvalidConfig("OCR DPI must be ≥ 1".into()));
        }
        let t = &c.timeouts;
        if [t.per_mb_secs, t.per_unit_secs, t.minimum_secs]
            .iter()
            .any(|v| !v.is_finite() || *v < 0.0)
        {
            return Err(Pixels2PdfError::InvalidConfig(format!(
                "Timeout policy values must be finite and non-negative, got {:?}",
                t
            )));
        }
        Ok(self.config)
    }
}

// ── Layout ───────────────────────────────────────────────────────────────

/// Fixed-naming storage layout shared with the rasterisation stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkLayout {
    /// Holds `page-{i}.rgb`, `page-{i}.width`, `page-{i}.height`.
    pub input_dir: PathBuf,
    /// Holds PNG and PDF intermediates plus the final artifacts before publication.
    pub scratch_dir: PathBuf,
    /// Trusted output location.
    pub output_dir: PathBuf,
}

impl Default for WorkLayout {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("/tmp/dangerzone"),
            scratch_dir: PathBuf::from("/tmp"),
            output_dir: PathBuf::from("/safezone"),
        }
    }
}

impl WorkLayout {
    fn input(&self, page: usize, ext: &str) -> PathBuf {
        self.input_dir.join(format!("page-{}.{}", page, ext))
    }

    pub fn rgb(&self, page: usize) -> PathBuf {
        self.input(page, "rgb")
    }

    pub fn width(&self, page: usize) -> PathBuf {
        self.input(page, "width")
    }

    pub fn height(&self, page: usize) -> PathBuf {
        self.input(page, "height")
    }

    /// Intermediate PNG; also the input in [`PageInputMode::Rendered`].
    pub fn png(&self, page: usize) -> PathBuf {
        self.scratch_dir.join(format!("page-{}.png", page))
    }

    /// Basename tesseract writes to; it appends `.pdf` itself.
    pub fn ocr_base(&self, page: usize) -> PathBuf {
        self.scratch_dir.join(format!("page-{}", page))
    }

    pub fn page_pdf(&self, page: usize) -> PathBuf {
        self.scratch_dir.join(format!("page-{}.pdf", page))
    }

    pub fn merged_pdf(&self) -> PathBuf {
        self.scratch_dir.join(MERGED_PDF_NAME)
    }

    pub fn compressed_pdf(&self) -> PathBuf {
        self.scratch_dir.join(COMPRESSED_PDF_NAME)
    }

    /// Directory whose files hold the per-page inputs for `mode`.
    pub fn page_input_dir(&self, mode: PageInputMode) -> &Path {
        match mode {
            PageInputMode::Pixels => &self.input_dir,
            PageInputMode::Rendered => &self.scratch_dir,
        }
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Shape of the per-page input handed over by the rasteriser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PageInputMode {
    /// Raw RGB buffer plus `.width` / `.height` files (default).
    #[default]
    Pixels,
    /// Pre-rendered `page-{i}.png` in the scratch directory.
    Rendered,
}

impl PageInputMode {
    /// Extension of the file that marks a page as present.
    pub fn marker_extension(self) -> &'static str {
        match self {
            PageInputMode::Pixels => "rgb",
            PageInputMode::Rendered => "png",
        }
    }
}

/// How a raw RGB buffer is turned into a PNG.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PixelEncoder {
    /// GraphicsMagick in a separate process (default).
    #[default]
    External,
    /// Streaming `png` encoder on a blocking thread, under the same deadline.
    /// Cancelled between rows when the deadline expires.
    Native,
}

/// Whether artifacts must be relocated to the trusted output directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeliveryMode {
    /// Move artifacts and the diagnostic log into `output_dir`.
    Relocate,
    /// Single-zone deployment: leave everything where it was produced.
    InPlace,
}

impl DeliveryMode {
    /// `InPlace` when the single-zone marker exists, else `Relocate`.
    pub fn detect() -> Self {
        Self::detect_with_marker(Path::new(SINGLE_ZONE_MARKER))
    }

    pub fn detect_with_marker(marker: &Path) -> Self {
        if marker.exists() {
            DeliveryMode::InPlace
        } else {
            DeliveryMode::Relocate
        }
    }
}

/// Program names for the external tools.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Toolchain {
    /// GraphicsMagick, for pixels → PNG and PNG → PDF.
    pub graphicsmagick: String,
    /// Tesseract, for PNG → searchable PDF.
    pub tesseract: String,
    /// Poppler's pdfunite, for merging.
    pub pdfunite: String,
    /// Ghostscript's ps2pdf, for compression.
    pub ps2pdf: String,
}

impl Default for Toolchain {
    fn default() -> Self {
        Self {
            graphicsmagick: "gm".into(),
            tesseract: "tesseract".into(),
            pdfunite: "pdfunite".into(),
            ps2pdf: "ps2pdf".into(),
        }
    }
}
