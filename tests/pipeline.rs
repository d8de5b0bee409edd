//! Full-job tests driven by a recording fake `ToolRunner`.
//!
//! The fake never spawns anything: it records each command, writes the
//! file the command promises to produce, and can be told to fail or time
//! out on a matching invocation. That keeps every scenario hermetic while
//! exercising the real driver, progress accounting and publication code.

use async_trait::async_trait;
use edgequake_pixels2pdf::{
    convert, run_job, run_job_sync, ConversionConfig, ConversionProgressCallback, DeliveryMode,
    PageInputMode, PixelEncoder, Pixels2PdfError, ProgressUpdate, TimeoutPolicy, ToolCommand,
    ToolOutput, ToolRunError, ToolRunner, WorkLayout,
};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tempfile::TempDir;

// ── Test helpers ─────────────────────────────────────────────────────────────

#[derive(Clone, Copy)]
enum Fault {
    Fail,
    Timeout,
}

struct FaultRule {
    program: Option<String>,
    needle: String,
    kind: Fault,
}

impl FaultRule {
    fn matches(&self, command: &ToolCommand) -> bool {
        self.program.as_deref().map_or(true, |p| command.program() == p)
            && command.mentions(&self.needle)
    }
}

/// Records commands and fakes their outputs.
#[derive(Default)]
struct FakeRunner {
    calls: Mutex<Vec<(ToolCommand, Duration)>>,
    fault: Option<FaultRule>,
}

impl FakeRunner {
    /// Inject `fault` into every command whose args mention `needle`.
    fn with_fault(needle: &str, fault: Fault) -> Self {
        Self {
            fault: Some(FaultRule {
                program: None,
                needle: needle.to_string(),
                kind: fault,
            }),
            ..Self::default()
        }
    }

    /// Like [`FakeRunner::with_fault`], restricted to one program.
    fn with_program_fault(program: &str, needle: &str, fault: Fault) -> Self {
        Self {
            fault: Some(FaultRule {
                program: Some(program.to_string()),
                needle: needle.to_string(),
                kind: fault,
            }),
            ..Self::default()
        }
    }

    fn calls(&self) -> Vec<ToolCommand> {
        self.calls.lock().unwrap().iter().map(|(c, _)| c.clone()).collect()
    }

    fn timeouts(&self) -> Vec<Duration> {
        self.calls.lock().unwrap().iter().map(|(_, t)| *t).collect()
    }

    fn count(&self, program: &str, needle: &str) -> usize {
        self.calls()
            .iter()
            .filter(|c| c.program() == program && c.mentions(needle))
            .count()
    }
}

#[async_trait]
impl ToolRunner for FakeRunner {
    async fn run(&self, command: &ToolCommand, timeout: Duration) -> Result<ToolOutput, ToolRunError> {
        self.calls.lock().unwrap().push((command.clone(), timeout));

        if let Some(rule) = self.fault.as_ref().filter(|r| r.matches(command)) {
            return match rule.kind {
                Fault::Fail => Ok(ToolOutput::failed(1, format!("{}: corrupt input\n", command.program()))),
                Fault::Timeout => Err(ToolRunError::TimedOut(timeout)),
            };
        }

        std::fs::write(command.produces(), b"%PDF-1.4 fake").map_err(ToolRunError::Io)?;
        Ok(ToolOutput {
            stdout: format!("{} ok: {}\n", command.program(), command.produces().display()).into_bytes(),
            ..ToolOutput::ok()
        })
    }
}

#[derive(Default)]
struct Recorder {
    updates: Mutex<Vec<ProgressUpdate>>,
    started: Mutex<Option<usize>>,
    completed: Mutex<Option<(usize, bool)>>,
}

impl ConversionProgressCallback for Recorder {
    fn on_conversion_start(&self, total_pages: usize) {
        *self.started.lock().unwrap() = Some(total_pages);
    }

    fn on_progress(&self, update: &ProgressUpdate) {
        self.updates.lock().unwrap().push(update.clone());
    }

    fn on_conversion_complete(&self, total_pages: usize, succeeded: bool) {
        *self.completed.lock().unwrap() = Some((total_pages, succeeded));
    }
}

impl Recorder {
    fn updates(&self) -> Vec<ProgressUpdate> {
        self.updates.lock().unwrap().clone()
    }

    fn texts(&self) -> Vec<String> {
        self.updates().into_iter().map(|u| u.text).collect()
    }
}

struct Sandbox {
    _root: TempDir,
    layout: WorkLayout,
}

impl Sandbox {
    fn new() -> Self {
        let root = tempfile::tempdir().expect("tempdir");
        let layout = WorkLayout {
            input_dir: root.path().join("dangerzone"),
            scratch_dir: root.path().join("tmp"),
            output_dir: root.path().join("safezone"),
        };
        std::fs::create_dir_all(&layout.input_dir).unwrap();
        std::fs::create_dir_all(&layout.scratch_dir).unwrap();
        Self { _root: root, layout }
    }

    /// Write `n` pixel pages of `w`x`h`.
    fn with_pixel_pages(self, n: usize, w: u32, h: u32) -> Self {
        for page in 1..=n {
            let bytes = (w * h * 3) as usize;
            std::fs::write(self.layout.rgb(page), vec![255u8; bytes]).unwrap();
            std::fs::write(self.layout.width(page), format!("{w}")).unwrap();
            std::fs::write(self.layout.height(page), format!("{h}\n")).unwrap();
        }
        self
    }

    fn config(&self, runner: Arc<FakeRunner>, recorder: Arc<Recorder>) -> edgequake_pixels2pdf::ConversionConfigBuilder {
        ConversionConfig::builder()
            .layout(self.layout.clone())
            .delivery(DeliveryMode::Relocate)
            .runner(runner)
            .progress_callback(recorder)
    }

    fn log(&self) -> String {
        std::fs::read_to_string(self.layout.output_dir.join("captured_output.txt")).unwrap_or_default()
    }
}

fn assert_non_decreasing(updates: &[ProgressUpdate]) {
    for pair in updates.windows(2) {
        assert!(
            pair[0].percentage <= pair[1].percentage,
            "percentage went from {} to {}",
            pair[0].percentage,
            pair[1].percentage
        );
    }
}

// ── Scenario A: one page, no OCR ─────────────────────────────────────────────

#[tokio::test]
async fn single_page_without_ocr() {
    let sb = Sandbox::new().with_pixel_pages(1, 4, 4);
    let runner = Arc::new(FakeRunner::default());
    let rec = Arc::new(Recorder::default());
    let config = sb.config(runner.clone(), rec.clone()).build().unwrap();

    let report = run_job(&config).await;
    assert_eq!(report.exit_code(), 0, "result: {:?}", report.result);

    let programs: Vec<String> = runner.calls().iter().map(|c| c.program().to_string()).collect();
    assert_eq!(programs, ["gm", "gm", "pdfunite", "ps2pdf"]);
    assert_eq!(runner.count("gm", "rgb:"), 1);
    assert_eq!(runner.count("gm", "pdf:"), 1);
    assert_eq!(runner.count("tesseract", ""), 0);

    let updates = rec.updates();
    assert_non_decreasing(&updates);
    let last = updates.last().unwrap();
    assert_eq!(last.percentage, 100.0);
    assert_eq!(last.text, "Safe PDF created");
    assert!(!last.error);
    assert_eq!(report.final_percentage, 100.0);

    let output = report.result.unwrap();
    assert_eq!(output.artifacts.merged, sb.layout.output_dir.join("safe-output.pdf"));
    assert!(output.artifacts.merged.exists());
    assert!(output.artifacts.compressed.exists());
    assert_eq!(output.stats.total_pages, 1);
    assert_eq!(output.stats.tool_invocations, 4);
    assert!(!output.stats.ocr);

    assert_eq!(*rec.started.lock().unwrap(), Some(1));
    assert_eq!(*rec.completed.lock().unwrap(), Some((1, true)));
}

// ── Scenario B: three pages with OCR ─────────────────────────────────────────

#[tokio::test]
async fn three_pages_with_ocr() {
    let sb = Sandbox::new().with_pixel_pages(3, 8, 6);
    let runner = Arc::new(FakeRunner::default());
    let rec = Arc::new(Recorder::default());
    let config = sb
        .config(runner.clone(), rec.clone())
        .ocr_language("eng")
        .build()
        .unwrap();

    let output = convert(&config).await.expect("conversion succeeds");
    assert!(output.stats.ocr);

    assert_eq!(runner.count("gm", "rgb:"), 3);
    assert_eq!(runner.count("tesseract", "eng"), 3);
    assert_eq!(runner.count("gm", "pdf:"), 0, "no plain PDF conversions on the OCR branch");
    for c in runner.calls().iter().filter(|c| c.program() == "tesseract") {
        assert!(c.mentions("70"), "OCR runs at low DPI: {c}");
    }

    let updates = rec.updates();
    assert_non_decreasing(&updates);
    let merging = updates
        .iter()
        .find(|u| u.text == "Merging 3 pages into a single PDF")
        .expect("merge message");
    assert!((merging.percentage - 95.0).abs() < 1e-9);
    let compressing = updates.iter().find(|u| u.text == "Compressing PDF").unwrap();
    assert!((compressing.percentage - 97.0).abs() < 1e-9);

    // Two messages per page, in page order.
    let texts = rec.texts();
    let page_msgs: Vec<&String> = texts.iter().filter(|t| t.starts_with("Converting page")).collect();
    assert_eq!(
        page_msgs,
        [
            "Converting page 1/3 from pixels to PNG",
            "Converting page 1/3 from pixels to searchable PDF",
            "Converting page 2/3 from pixels to PNG",
            "Converting page 2/3 from pixels to searchable PDF",
            "Converting page 3/3 from pixels to PNG",
            "Converting page 3/3 from pixels to searchable PDF",
        ]
    );
}

// ── Scenario C: page 2 of 3 fails ────────────────────────────────────────────

#[tokio::test]
async fn failure_on_page_two_aborts_job() {
    let sb = Sandbox::new().with_pixel_pages(3, 4, 4);
    let runner = Arc::new(FakeRunner::with_fault("page-2.rgb", Fault::Fail));
    let rec = Arc::new(Recorder::default());
    let config = sb.config(runner.clone(), rec.clone()).build().unwrap();

    let report = run_job(&config).await;
    assert_eq!(report.exit_code(), 1);
    assert!(report.final_percentage < 95.0);
    assert!((report.final_percentage - 65.0).abs() < 1e-9);

    // Nothing after page 2's image conversion ran.
    assert!(runner.calls().iter().all(|c| !c.mentions("page-3")));
    assert_eq!(runner.count("pdfunite", ""), 0);
    assert_eq!(runner.count("ps2pdf", ""), 0);

    let updates = rec.updates();
    let last = updates.last().unwrap();
    assert!(last.error);
    assert_eq!(last.text, "Page 2/3 conversion to PNG failed");
    assert_eq!(updates.iter().filter(|u| u.error).count(), 1);

    // Diagnostics persisted even though the job failed.
    let log = sb.log();
    assert!(log.contains("page-1.rgb"));
    assert!(log.contains("page-2.rgb"));
    assert!(log.contains("gm: corrupt input"));
    assert!(!log.contains("page-3"));
    assert_eq!(report.diagnostics, log);

    // No final artifacts were published.
    assert!(!sb.layout.output_dir.join("safe-output.pdf").exists());
    assert_eq!(*rec.completed.lock().unwrap(), Some((3, false)));
}

#[tokio::test]
async fn failure_on_each_page_stops_before_next() {
    for k in 1..=3usize {
        let sb = Sandbox::new().with_pixel_pages(3, 2, 2);
        let runner = Arc::new(FakeRunner::with_fault(&format!("page-{k}.png"), Fault::Fail));
        let rec = Arc::new(Recorder::default());
        let config = sb.config(runner.clone(), rec).build().unwrap();

        let report = run_job(&config).await;
        assert_eq!(report.exit_code(), 1, "page {k}");
        let next = format!("page-{}", k + 1);
        assert!(runner.calls().iter().all(|c| !c.mentions(&next)), "page {k}");
        assert_eq!(runner.count("pdfunite", ""), 0);
    }
}

// ── Whole-document steps ─────────────────────────────────────────────────────

#[tokio::test]
async fn merge_lists_pages_in_order() {
    let sb = Sandbox::new().with_pixel_pages(12, 2, 2);
    let runner = Arc::new(FakeRunner::default());
    let config = sb
        .config(runner.clone(), Arc::new(Recorder::default()))
        .build()
        .unwrap();

    convert(&config).await.expect("conversion succeeds");

    let merge = runner
        .calls()
        .into_iter()
        .find(|c| c.program() == "pdfunite")
        .unwrap();
    let expected: Vec<String> = (1..=12)
        .map(|p| sb.layout.page_pdf(p).display().to_string())
        .chain(std::iter::once(sb.layout.merged_pdf().display().to_string()))
        .collect();
    let actual: Vec<String> = merge
        .args()
        .iter()
        .map(|a| a.to_string_lossy().into_owned())
        .collect();
    assert_eq!(actual, expected);
}

#[tokio::test]
async fn whole_document_steps_share_one_deadline() {
    let sb = Sandbox::new().with_pixel_pages(3, 2, 2);
    let runner = Arc::new(FakeRunner::default());
    let config = sb
        .config(runner.clone(), Arc::new(Recorder::default()))
        .build()
        .unwrap();

    convert(&config).await.unwrap();

    let timeouts = runner.timeouts();
    let n = timeouts.len();
    // Tiny pages: per-page steps sit on the 60 s floor, N = 3 gives just over 90 s.
    assert!(timeouts[..n - 2].iter().all(|t| *t == Duration::from_secs(60)));
    assert_eq!(timeouts[n - 2], timeouts[n - 1]);
    assert!(timeouts[n - 1] >= Duration::from_secs(90));
    assert!(timeouts[n - 1] < Duration::from_secs(91));
}

#[tokio::test]
async fn compression_failure_publishes_nothing() {
    let sb = Sandbox::new().with_pixel_pages(2, 2, 2);
    let runner = Arc::new(FakeRunner::with_fault("safe-output-compressed.pdf", Fault::Fail));
    let rec = Arc::new(Recorder::default());
    let config = sb.config(runner.clone(), rec.clone()).build().unwrap();

    let report = run_job(&config).await;
    assert_eq!(report.exit_code(), 1);
    assert_eq!(report.final_message, "Compressing PDF failed");
    assert!((report.final_percentage - 97.0).abs() < 1e-9);
    assert!(!sb.layout.output_dir.join("safe-output.pdf").exists());
    assert!(sb.log().contains("ps2pdf"));
}

#[tokio::test]
async fn merge_timeout_reports_deadline() {
    let sb = Sandbox::new().with_pixel_pages(2, 2, 2);
    let runner = Arc::new(FakeRunner::with_fault("safe-output.pdf", Fault::Timeout));
    let config = sb
        .config(runner.clone(), Arc::new(Recorder::default()))
        .build()
        .unwrap();

    let err = convert(&config).await.unwrap_err();
    // Two tiny pages: 60 s plus a fraction, rounded up for display.
    assert!(matches!(err, Pixels2PdfError::ToolTimeout { secs: 61, .. }));
    assert_eq!(
        err.to_string(),
        "Error merging pages into a single PDF, pdfunite timed out after 61 seconds"
    );
    assert_eq!(runner.count("ps2pdf", ""), 0);
}

#[tokio::test]
async fn page_timeout_on_plain_branch_stops_the_job() {
    let sb = Sandbox::new().with_pixel_pages(3, 2, 2);
    let runner = Arc::new(FakeRunner::with_fault("page-2.png", Fault::Timeout));
    let rec = Arc::new(Recorder::default());
    let config = sb.config(runner.clone(), rec.clone()).build().unwrap();

    let report = run_job(&config).await;
    assert_eq!(report.exit_code(), 1);
    assert_eq!(
        report.final_message,
        "Error converting pixels to PNG, convert timed out after 60 seconds"
    );
    assert!((report.final_percentage - 65.0).abs() < 1e-9);
    assert!(runner.calls().iter().all(|c| !c.mentions("page-3")));
    assert_eq!(runner.count("pdfunite", ""), 0);
    assert_eq!(runner.count("ps2pdf", ""), 0);
    assert!(sb.log().contains("[killed after 60 second deadline]"));
    assert!(rec.updates().last().unwrap().error);
}

#[tokio::test]
async fn page_timeout_on_ocr_branch_stops_the_job() {
    let sb = Sandbox::new().with_pixel_pages(3, 2, 2);
    let runner = Arc::new(FakeRunner::with_program_fault("tesseract", "page-2", Fault::Timeout));
    let rec = Arc::new(Recorder::default());
    let config = sb
        .config(runner.clone(), rec.clone())
        .ocr_language("eng")
        .build()
        .unwrap();

    let report = run_job(&config).await;
    assert_eq!(report.exit_code(), 1);
    assert_eq!(
        report.final_message,
        "Error converting PNG to searchable PDF, tesseract timed out after 60 seconds"
    );
    // Page 2's PNG was made, its OCR timed out, page 3 never started.
    assert_eq!(runner.count("gm", "page-2.rgb"), 1);
    assert!(runner.calls().iter().all(|c| !c.mentions("page-3")));
    assert_eq!(runner.count("pdfunite", ""), 0);
    assert!((report.final_percentage - 65.0).abs() < 1e-9);
    assert!(sb.log().contains("[killed after 60 second deadline]"));
}

#[tokio::test]
async fn failed_publication_leaves_output_dir_empty() {
    let sb = Sandbox::new().with_pixel_pages(1, 2, 2);
    std::fs::create_dir_all(sb.layout.output_dir.join("safe-output-compressed.pdf/occupied")).unwrap();
    let runner = Arc::new(FakeRunner::default());
    let rec = Arc::new(Recorder::default());
    let config = sb.config(runner, rec.clone()).build().unwrap();

    let report = run_job(&config).await;
    assert_eq!(report.exit_code(), 1);
    assert!(matches!(report.result, Err(Pixels2PdfError::PublishFailed { .. })));
    assert!(!sb.layout.output_dir.join("safe-output.pdf").exists());
    assert!(report.final_percentage < 100.0);
    assert!(rec.updates().iter().all(|u| u.text != "Safe PDF created"));
}

#[tokio::test]
async fn page_count_above_cap_is_rejected() {
    let sb = Sandbox::new().with_pixel_pages(1, 2, 2);
    let runner = Arc::new(FakeRunner::default());
    let config = sb
        .config(runner.clone(), Arc::new(Recorder::default()))
        .num_pages(10_001)
        .build()
        .unwrap();

    let err = convert(&config).await.unwrap_err();
    assert!(matches!(err, Pixels2PdfError::TooManyPages { count: 10_001, max: 10_000 }));
    assert!(runner.calls().is_empty());
}

// ── Inputs and delivery ──────────────────────────────────────────────────────

#[tokio::test]
async fn malformed_height_is_fatal() {
    let sb = Sandbox::new().with_pixel_pages(2, 2, 2);
    std::fs::write(sb.layout.height(2), b"tall").unwrap();
    let runner = Arc::new(FakeRunner::default());
    let rec = Arc::new(Recorder::default());
    let config = sb.config(runner.clone(), rec.clone()).build().unwrap();

    let report = run_job(&config).await;
    assert_eq!(report.exit_code(), 1);
    let err = report.result.unwrap_err();
    assert!(err.is_metadata_error());
    assert!(runner.calls().iter().all(|c| !c.mentions("page-2")));
    assert!(rec.updates().last().unwrap().error);
}

#[tokio::test]
async fn empty_input_dir_fails_cleanly() {
    let sb = Sandbox::new();
    let runner = Arc::new(FakeRunner::default());
    let rec = Arc::new(Recorder::default());
    let config = sb.config(runner.clone(), rec.clone()).build().unwrap();

    let report = run_job(&config).await;
    assert_eq!(report.exit_code(), 1);
    assert!(matches!(report.result, Err(Pixels2PdfError::NoPages { .. })));
    assert!(runner.calls().is_empty());
    assert_eq!(report.final_percentage, 50.0);
    assert!(sb.layout.output_dir.join("captured_output.txt").exists());
}

#[tokio::test]
async fn explicit_page_count_overrides_discovery() {
    let sb = Sandbox::new().with_pixel_pages(3, 2, 2);
    let runner = Arc::new(FakeRunner::default());
    let config = sb
        .config(runner.clone(), Arc::new(Recorder::default()))
        .num_pages(2)
        .build()
        .unwrap();

    let output = convert(&config).await.unwrap();
    assert_eq!(output.stats.total_pages, 2);
    assert_eq!(runner.count("gm", "page-3"), 0);
}

#[tokio::test]
async fn in_place_delivery_leaves_artifacts_in_scratch() {
    let sb = Sandbox::new().with_pixel_pages(1, 2, 2);
    let runner = Arc::new(FakeRunner::default());
    let config = sb
        .config(runner, Arc::new(Recorder::default()))
        .delivery(DeliveryMode::InPlace)
        .build()
        .unwrap();

    let report = run_job(&config).await;
    let output = report.result.as_ref().unwrap();
    assert_eq!(output.artifacts.merged, sb.layout.merged_pdf());
    assert_eq!(output.artifacts.compressed, sb.layout.compressed_pdf());
    assert!(!sb.layout.output_dir.exists());
    assert_eq!(
        report.log_path.as_deref(),
        Some(sb.layout.scratch_dir.join("captured_output.txt").as_path())
    );
}

#[tokio::test]
async fn rendered_input_skips_pixel_encoding() {
    let sb = Sandbox::new();
    for page in 1..=2 {
        std::fs::write(sb.layout.png(page), vec![0u8; 1024]).unwrap();
    }
    let runner = Arc::new(FakeRunner::default());
    let rec = Arc::new(Recorder::default());
    let config = sb
        .config(runner.clone(), rec.clone())
        .input_mode(PageInputMode::Rendered)
        .build()
        .unwrap();

    let output = convert(&config).await.unwrap();
    assert_eq!(output.stats.total_pages, 2);
    assert_eq!(runner.count("gm", "rgb:"), 0);
    assert_eq!(runner.count("gm", "pdf:"), 2);
    assert!(rec.texts().iter().all(|t| !t.contains("to PNG")));
    // Rendered PNGs are inputs and survive cleanup.
    assert!(sb.layout.png(1).exists());
}

#[tokio::test]
async fn native_encoder_writes_png_without_gm() {
    let sb = Sandbox::new().with_pixel_pages(2, 5, 3);
    let runner = Arc::new(FakeRunner::default());
    let config = sb
        .config(runner.clone(), Arc::new(Recorder::default()))
        .pixel_encoder(PixelEncoder::Native)
        .cleanup_intermediates(false)
        .build()
        .unwrap();

    convert(&config).await.unwrap();
    assert_eq!(runner.count("gm", "rgb:"), 0);
    assert_eq!(runner.count("gm", "pdf:"), 2);
    let (w, h) = image::image_dimensions(sb.layout.png(1)).expect("valid png");
    assert_eq!((w, h), (5, 3));
    assert!(sb.log().contains("encode-png"));
}

#[test]
fn native_encoder_deadline_bounds_the_job() {
    let (w, h) = (4000u32, 4000u32);
    let sb = Sandbox::new();
    let pixels: Vec<u8> = (0..(w * h * 3) as usize)
        .map(|i| (i.wrapping_mul(31) ^ (i >> 9)) as u8)
        .collect();
    std::fs::write(sb.layout.rgb(1), pixels).unwrap();
    std::fs::write(sb.layout.width(1), w.to_string()).unwrap();
    std::fs::write(sb.layout.height(1), h.to_string()).unwrap();

    let runner = Arc::new(FakeRunner::default());
    let config = sb
        .config(runner.clone(), Arc::new(Recorder::default()))
        .pixel_encoder(PixelEncoder::Native)
        .timeouts(TimeoutPolicy {
            per_mb_secs: 0.0,
            per_unit_secs: 0.0,
            minimum_secs: 0.05,
        })
        .build()
        .unwrap();

    let started = Instant::now();
    let report = run_job_sync(&config);
    let elapsed = started.elapsed();

    assert!(matches!(report.result, Err(Pixels2PdfError::ToolTimeout { .. })));
    assert_eq!(
        report.final_message,
        "Error converting pixels to PNG, convert timed out after 1 seconds"
    );
    assert!(elapsed < Duration::from_secs(3), "job took {elapsed:?}");
    assert!(!sb.layout.png(1).exists(), "partial PNG left behind");
    assert!(runner.calls().is_empty());
    assert!(sb.log().contains("[killed after 1 second deadline]"));
}

#[tokio::test]
async fn intermediates_are_cleaned_after_success() {
    let sb = Sandbox::new().with_pixel_pages(2, 2, 2);
    let runner = Arc::new(FakeRunner::default());
    let config = sb
        .config(runner, Arc::new(Recorder::default()))
        .build()
        .unwrap();

    convert(&config).await.unwrap();
    for page in 1..=2 {
        assert!(!sb.layout.png(page).exists());
        assert!(!sb.layout.page_pdf(page).exists());
    }
}
