//! Progress reporting for the reconstruction job.
//!
//! The host watching the sandbox has no other liveness signal while a slow
//! external tool runs, so every progress step is pushed through a
//! [`ConversionProgressCallback`]. The default wire format is
//! [`JsonProgressCallback`]: one JSON object per line on stdout,
//!
//! ```text
//! {"error":false,"text":"Converting page 1/3 from pixels to PNG","percentage":50}
//! ```
//!
//! Percentages are driver-managed. Rasterisation already consumed the first
//! half of the bar, so reconstruction starts at 50, adds `45/N` per page,
//! 2 after the merge and finishes at exactly 100.
//!
//! # Example
//!
//! ```rust
//! use edgequake_pixels2pdf::{ConversionProgressCallback, ProgressUpdate};
//! use std::sync::{Arc, Mutex};
//!
//! #[derive(Default)]
//! struct Recorder {
//!     seen: Mutex<Vec<ProgressUpdate>>,
//! }
//!
//! impl ConversionProgressCallback for Recorder {
//!     fn on_progress(&self, update: &ProgressUpdate) {
//!         self.seen.lock().unwrap().push(update.clone());
//!     }
//! }
//!
//! let recorder = Arc::new(Recorder::default());
//! let cb: Arc<dyn ConversionProgressCallback> = recorder.clone();
//! cb.on_progress(&ProgressUpdate::new("Compressing PDF", 97.0));
//! assert_eq!(recorder.seen.lock().unwrap().len(), 1);
//! ```

use serde::{Deserialize, Serialize};
use std::io::Write;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Percentage at which reconstruction starts.
pub const START_PERCENTAGE: f64 = 50.0;
/// Share of the bar spread evenly across all pages.
pub const PAGES_PERCENTAGE: f64 = 45.0;
/// Bump applied once all pages are merged.
pub const MERGE_PERCENTAGE: f64 = 2.0;
/// Final value on full success.
pub const DONE_PERCENTAGE: f64 = 100.0;

/// One observable progress event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressUpdate {
    /// True for the terminal failure report.
    pub error: bool,
    /// Human-readable step description or failure cause.
    pub text: String,
    /// Job completion in `[0, 100]`.
    pub percentage: f64,
}

impl ProgressUpdate {
    pub fn new(text: impl Into<String>, percentage: f64) -> Self {
        Self {
            error: false,
            text: text.into(),
            percentage,
        }
    }

    pub fn failure(text: impl Into<String>, percentage: f64) -> Self {
        Self {
            error: true,
            text: text.into(),
            percentage,
        }
    }

    /// Render the update as the single-line JSON the host parses.
    ///
    /// The percentage is truncated to an integer on the wire.
    pub fn to_json_line(&self) -> String {
        serde_json::json!({
            "error": self.error,
            "text": self.text,
            "percentage": self.percentage.trunc() as u64,
        })
        .to_string()
    }
}

/// Called by the pipeline as the job moves through its steps.
///
/// All methods have default no-op implementations so callers only override
/// what they care about.
pub trait ConversionProgressCallback: Send + Sync {
    /// Called once before the first page is touched.
    fn on_conversion_start(&self, total_pages: usize) {
        let _ = total_pages;
    }

    /// Called for every progress message, including the terminal error.
    fn on_progress(&self, update: &ProgressUpdate) {
        let _ = update;
    }

    /// Called once when the job ends, successfully or not.
    fn on_conversion_complete(&self, total_pages: usize, succeeded: bool) {
        let _ = (total_pages, succeeded);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}

/// Prints each update as a JSON line on stdout and mirrors it to `tracing`.
pub struct JsonProgressCallback;

impl ConversionProgressCallback for JsonProgressCallback {
    fn on_progress(&self, update: &ProgressUpdate) {
        if update.error {
            error!("{}% {}", update.percentage.trunc(), update.text);
        } else {
            info!("{}% {}", update.percentage.trunc(), update.text);
        }
        let stdout = std::io::stdout();
        let mut handle = stdout.lock();
        // A closed stdout must not take the conversion down with it.
        let _ = writeln!(handle, "{}", update.to_json_line());
        let _ = handle.flush();
    }
}

/// Convenience alias matching the type stored in [`crate::config::ConversionConfig`].
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;

/// Job progress state: percentage, current message and the error flag.
///
/// The percentage never decreases and never leaves `[0, 100]`. Once
/// [`ProgressTracker::fail`] has been called the tracker is terminal and
/// further calls are ignored.
pub struct ProgressTracker {
    percentage: f64,
    message: String,
    failed: bool,
    callback: ProgressCallback,
}

impl ProgressTracker {
    pub fn new(callback: ProgressCallback) -> Self {
        Self {
            percentage: 0.0,
            message: String::new(),
            failed: false,
            callback,
        }
    }

    pub fn percentage(&self) -> f64 {
        self.percentage
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_failed(&self) -> bool {
        self.failed
    }

    /// Move the percentage to `value`, clamped to `[current, 100]`.
    pub fn set_percentage(&mut self, value: f64) {
        if self.failed {
            return;
        }
        if value.is_nan() {
            return;
        }
        self.percentage = value.clamp(self.percentage, DONE_PERCENTAGE);
    }

    /// Add `delta` to the percentage, clamped like [`Self::set_percentage`].
    pub fn add_percentage(&mut self, delta: f64) {
        self.set_percentage(self.percentage + delta);
    }

    /// Replace the current message and publish it.
    pub fn advance(&mut self, text: impl Into<String>) {
        let text = text.into();
        if self.failed {
            warn!("Ignoring progress after terminal error: {}", text);
            return;
        }
        self.message = text;
        self.callback
            .on_progress(&ProgressUpdate::new(self.message.clone(), self.percentage));
    }

    /// Publish the terminal error report. Only the first call has an effect.
    pub fn fail(&mut self, text: impl Into<String>) {
        let text = text.into();
        if self.failed {
            warn!("Ignoring second terminal error: {}", text);
            return;
        }
        self.failed = true;
        self.message = text;
        self.callback
            .on_progress(&ProgressUpdate::failure(self.message.clone(), self.percentage));
    }
}
