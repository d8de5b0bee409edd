//! Deadline estimation for external steps.
//!
//! A hostile document can make any of the conversion tools spin forever, so
//! every external step runs under a deadline. The deadline grows with the
//! amount of work: a fixed allowance per mebibyte of input plus a fixed
//! allowance per unit (page), never dropping below a floor that covers
//! process start-up on a slow machine.
//!
//! The same policy sizes both per-page steps (`size` = one page,
//! `units` = 1) and whole-document steps (`size` = sum of all pages,
//! `units` = N).

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Linear timeout policy: `max(minimum, per_mb * size + per_unit * units)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeoutPolicy {
    /// Seconds allowed per MiB of input. Default: 30.
    pub per_mb_secs: f64,
    /// Seconds allowed per page (or other unit). Default: 30.
    pub per_unit_secs: f64,
    /// Lower bound for any deadline, in seconds. Default: 60.
    pub minimum_secs: f64,
}

impl Default for TimeoutPolicy {
    fn default() -> Self {
        Self {
            per_mb_secs: 30.0,
            per_unit_secs: 30.0,
            minimum_secs: 60.0,
        }
    }
}

impl TimeoutPolicy {
    /// Deadline for a step processing `size_mb` MiB across `units` pages.
    ///
    /// Pure and total: negative or NaN sizes count as zero.
    pub fn estimate(&self, size_mb: f64, units: usize) -> Duration {
        let size = if size_mb.is_finite() && size_mb > 0.0 {
            size_mb
        } else {
            0.0
        };
        let secs = self.per_mb_secs * size + self.per_unit_secs * units as f64;
        Duration::try_from_secs_f64(secs.max(self.minimum_secs).max(0.0)).unwrap_or(Duration::MAX)
    }
}

/// Whole seconds for human-readable messages, rounded up.
pub(crate) fn display_secs(timeout: Duration) -> u64 {
    timeout.as_secs_f64().ceil() as u64
}
