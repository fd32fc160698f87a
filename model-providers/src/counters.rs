//! Request/success counters behind the stability metric.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counts every backend request and every success. Error count is the
/// difference. Plain atomics: the figure is advisory, not transactional.
#[derive(Debug, Default)]
pub struct ResponseCounters {
    total: AtomicU64,
    success: AtomicU64,
}

impl ResponseCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn note_request(&self) {
        self.total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn note_success(&self) {
        self.success.fetch_add(1, Ordering::Relaxed);
    }

    pub fn total(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }

    pub fn success(&self) -> u64 {
        self.success.load(Ordering::Relaxed)
    }

    /// `100 * success / total`, or `100.0` before any request has been made.
    pub fn stability_percentage(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 100.0;
        }
        (self.success() as f64 / total as f64) * 100.0
    }
}
