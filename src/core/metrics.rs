//! Pipeline metrics for observability
//!
//! Counters for the synchronous fan-out and for the broker forwarding path.
//! Drops are counted here because they are never reported to producers.

use std::sync::atomic::{AtomicU64, Ordering};

/// Shared counters for one pipeline instance
///
/// # Example
///
/// ```
/// use log_fanout::PipelineMetrics;
///
/// let metrics = PipelineMetrics::new();
/// metrics.record_enqueued();
/// metrics.record_dropped();
///
/// assert_eq!(metrics.enqueued_count(), 1);
/// assert_eq!(metrics.dropped_count(), 1);
/// assert_eq!(metrics.drop_rate(), 50.0);
/// ```
#[derive(Debug)]
pub struct PipelineMetrics {
    /// Records handed to the appenders
    total_logged: AtomicU64,

    /// Appender calls that failed or panicked
    appender_failures: AtomicU64,

    /// Payloads accepted into the broker buffer
    enqueued: AtomicU64,

    /// Payloads discarded because the broker buffer was full
    dropped: AtomicU64,

    /// Payloads handed to the broker session
    published: AtomicU64,

    /// Run-loop invocations that ended with an error
    failed_runs: AtomicU64,
}

impl PipelineMetrics {
    pub const fn new() -> Self {
        Self {
            total_logged: AtomicU64::new(0),
            appender_failures: AtomicU64::new(0),
            enqueued: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
            published: AtomicU64::new(0),
            failed_runs: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn total_logged(&self) -> u64 {
        self.total_logged.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn appender_failures(&self) -> u64 {
        self.appender_failures.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn enqueued_count(&self) -> u64 {
        self.enqueued.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn published_count(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn failed_runs(&self) -> u64 {
        self.failed_runs.load(Ordering::Relaxed)
    }

    /// Record a record handed to the appenders
    #[inline]
    pub fn record_logged(&self) -> u64 {
        self.total_logged.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_appender_failure(&self) -> u64 {
        self.appender_failures.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_enqueued(&self) -> u64 {
        self.enqueued.fetch_add(1, Ordering::Relaxed)
    }

    /// Record a dropped payload, returning the previous drop count
    #[inline]
    pub fn record_dropped(&self) -> u64 {
        self.dropped.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_published(&self) -> u64 {
        self.published.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_failed_run(&self) -> u64 {
        self.failed_runs.fetch_add(1, Ordering::Relaxed)
    }

    /// Share of broker payloads dropped, as a percentage (0.0 - 100.0)
    ///
    /// Returns 0.0 if nothing was offered to the buffer yet.
    pub fn drop_rate(&self) -> f64 {
        let dropped = self.dropped_count() as f64;
        let total = self.enqueued_count() as f64 + dropped;
        if total == 0.0 {
            0.0
        } else {
            (dropped / total) * 100.0
        }
    }

    /// Reset all metrics to zero
    pub fn reset(&self) {
        self.total_logged.store(0, Ordering::Relaxed);
        self.appender_failures.store(0, Ordering::Relaxed);
        self.enqueued.store(0, Ordering::Relaxed);
        self.dropped.store(0, Ordering::Relaxed);
        self.published.store(0, Ordering::Relaxed);
        self.failed_runs.store(0, Ordering::Relaxed);
    }
}

impl Default for PipelineMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for PipelineMetrics {
    /// Create a snapshot of the current metrics values
    fn clone(&self) -> Self {
        Self {
            total_logged: AtomicU64::new(self.total_logged()),
            appender_failures: AtomicU64::new(self.appender_failures()),
            enqueued: AtomicU64::new(self.enqueued_count()),
            dropped: AtomicU64::new(self.dropped_count()),
            published: AtomicU64::new(self.published_count()),
            failed_runs: AtomicU64::new(self.failed_runs()),
        }
    }
}
