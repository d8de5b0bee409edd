//! CLI binary for edgequake-pixels2pdf.
//!
//! A thin shim over the library crate that maps CLI flags and the sandbox
//! environment to `ConversionConfig`, runs one job and exits with its code.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_pixels2pdf::{
    run_job, ConversionConfig, ConversionProgressCallback, DeliveryMode, JsonProgressCallback,
    PageInputMode, PixelEncoder, ProgressCallback, ProgressUpdate,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a percentage bar whose message tracks the
/// current step.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(100);
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  [{bar:42.green/238}] {pos:>3}%  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(style);
        bar.set_prefix("Rebuilding");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_conversion_start(&self, total_pages: usize) {
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Rebuilding {total_pages} pages…"))
        ));
    }

    fn on_progress(&self, update: &ProgressUpdate) {
        self.bar.set_position(update.percentage.trunc() as u64);
        if update.error {
            self.bar.println(format!("  {} {}", red("✗"), red(&update.text)));
        } else {
            self.bar.set_message(update.text.clone());
        }
    }

    fn on_conversion_complete(&self, total_pages: usize, succeeded: bool) {
        self.bar.finish_and_clear();
        if succeeded {
            eprintln!(
                "{} {} pages rebuilt into a safe PDF",
                green("✔"),
                bold(&total_pages.to_string())
            );
        } else {
            eprintln!("{} conversion failed", red("✘"));
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Inside the sandbox: read /tmp/dangerzone, publish to /safezone
  pixels2pdf

  # Searchable output
  OCR=1 OCR_LANGUAGE=eng pixels2pdf

  # Explicit directories, human-friendly progress bar
  pixels2pdf --input-dir ./pages --scratch-dir ./work --output-dir ./out --progress bar

  # Pages already rendered as page-N.png in the scratch dir
  pixels2pdf --rendered-input --scratch-dir ./work

PROGRESS CHANNEL:
  With --progress json (default) every step is printed to stdout as
    {"error":false,"text":"Converting page 1/3 from pixels to PNG","percentage":50}
  Logs go to stderr so stdout stays machine-readable.

EXIT STATUS:
  0  safe PDF created
  1  a tool failed or timed out, or page metadata was malformed

EXTERNAL TOOLS:
  gm (GraphicsMagick), tesseract, pdfunite (poppler), ps2pdf (ghostscript)
"#;

/// Rebuild sanitized page pixels into a safe PDF.
#[derive(Parser, Debug)]
#[command(
    name = "pixels2pdf",
    version,
    about = "Rebuild sanitized page pixels into a safe, optionally searchable PDF",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Directory holding page-N.rgb / .width / .height.
    #[arg(long, env = "PIXELS2PDF_INPUT_DIR", default_value = "/tmp/dangerzone")]
    input_dir: PathBuf,

    /// Directory for intermediates (page-N.png, page-N.pdf, merged outputs).
    #[arg(long, env = "PIXELS2PDF_SCRATCH_DIR", default_value = "/tmp")]
    scratch_dir: PathBuf,

    /// Trusted output directory.
    #[arg(long, env = "PIXELS2PDF_OUTPUT_DIR", default_value = "/safezone")]
    output_dir: PathBuf,

    /// Number of pages. Counted from the inputs when omitted.
    #[arg(long, env = "PIXELS2PDF_PAGES",
          value_parser = clap::value_parser!(u32).range(1..))]
    pages: Option<u32>,

    /// Enable OCR. Without it the OCR language is ignored.
    #[arg(long, env = "OCR", value_parser = clap::builder::FalseyValueParser::new())]
    ocr: bool,

    /// Tesseract language code, e.g. eng, deu, fra.
    #[arg(long, env = "OCR_LANGUAGE")]
    ocr_language: Option<String>,

    /// Pages arrive as pre-rendered page-N.png in the scratch dir.
    #[arg(long)]
    rendered_input: bool,

    /// Encode pixels to PNG in-process instead of with GraphicsMagick.
    #[arg(long)]
    native_encoder: bool,

    /// Where artifacts end up: auto, relocate, in-place.
    #[arg(long, value_enum, default_value = "auto")]
    delivery: DeliveryArg,

    /// Keep per-page PNG and PDF intermediates.
    #[arg(long)]
    keep_intermediates: bool,

    /// Progress rendering: json (stdout), bar, none.
    #[arg(long, value_enum, default_value = "json")]
    progress: ProgressArg,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PIXELS2PDF_VERBOSE")]
    verbose: bool,

    /// Suppress all logs except errors.
    #[arg(short, long, env = "PIXELS2PDF_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum DeliveryArg {
    Auto,
    Relocate,
    InPlace,
}

impl From<DeliveryArg> for DeliveryMode {
    fn from(v: DeliveryArg) -> Self {
        match v {
            DeliveryArg::Auto => DeliveryMode::detect(),
            DeliveryArg::Relocate => DeliveryMode::Relocate,
            DeliveryArg::InPlace => DeliveryMode::InPlace,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum ProgressArg {
    Json,
    Bar,
    None,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // stdout belongs to the progress channel; logs always go to stderr.
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || cli.progress == ProgressArg::Bar {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let progress: Option<ProgressCallback> = match cli.progress {
        ProgressArg::Json => Some(Arc::new(JsonProgressCallback)),
        ProgressArg::Bar => Some(CliProgressCallback::new() as Arc<dyn ConversionProgressCallback>),
        ProgressArg::None => None,
    };

    let config = build_config(&cli, progress)?;

    // ── Run conversion ───────────────────────────────────────────────────
    let report = run_job(&config).await;
    if let Some(ref log) = report.log_path {
        tracing::debug!("Captured tool output: {}", log.display());
    }
    Ok(ExitCode::from(report.exit_code() as u8))
}

/// Map CLI args to `ConversionConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ConversionConfig> {
    let mut builder = ConversionConfig::builder()
        .input_dir(&cli.input_dir)
        .scratch_dir(&cli.scratch_dir)
        .output_dir(&cli.output_dir)
        .input_mode(if cli.rendered_input {
            PageInputMode::Rendered
        } else {
            PageInputMode::Pixels
        })
        .pixel_encoder(if cli.native_encoder {
            PixelEncoder::Native
        } else {
            PixelEncoder::External
        })
        .delivery(cli.delivery.into())
        .cleanup_intermediates(!cli.keep_intermediates);

    if let Some(n) = cli.pages {
        builder = builder.num_pages(n as usize);
    }
    // Absence of the enable flag forces the plain branch.
    if cli.ocr {
        if let Some(ref lang) = cli.ocr_language {
            builder = builder.ocr_language(lang);
        }
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
