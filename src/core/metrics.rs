//! Pipeline metrics for observability
//!
//! Provides counters for monitoring pipeline health: per-target delivery and
//! drop counts, and dispatcher-wide error reporting statistics.

use std::sync::atomic::{AtomicU64, Ordering};

/// Per-target counters
///
/// # Example
///
/// ```
/// use rust_logr::TargetMetrics;
///
/// let metrics = TargetMetrics::new();
/// metrics.record_accepted();
/// metrics.record_dropped();
///
/// assert_eq!(metrics.accepted(), 1);
/// assert_eq!(metrics.dropped(), 1);
/// ```
#[derive(Debug)]
pub struct TargetMetrics {
    /// Records placed on the queue
    accepted: AtomicU64,

    /// Records formatted and written successfully
    delivered: AtomicU64,

    /// Records dropped because the queue was full
    dropped: AtomicU64,

    /// Records lost to formatter or writer failures
    failed: AtomicU64,

    /// Records left in the queue at the shutdown deadline
    abandoned: AtomicU64,

    /// Offers turned down by the filter or after shutdown began
    rejected: AtomicU64,

    /// Number of times an offer found the queue full
    queue_full_events: AtomicU64,

    /// Number of times an offer waited for queue space
    block_events: AtomicU64,
}

macro_rules! counters {
    ($($field:ident => $record:ident),* $(,)?) => {
        $(
            #[inline]
            pub fn $field(&self) -> u64 {
                self.$field.load(Ordering::Relaxed)
            }

            /// Increment the counter, returning its previous value
            #[inline]
            pub fn $record(&self) -> u64 {
                self.$field.fetch_add(1, Ordering::Relaxed)
            }
        )*
    };
}

impl TargetMetrics {
    pub const fn new() -> Self {
        Self {
            accepted: AtomicU64::new(0),
            delivered: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            abandoned: AtomicU64::new(0),
            rejected: AtomicU64::new(0),
            queue_full_events: AtomicU64::new(0),
            block_events: AtomicU64::new(0),
        }
    }

    counters! {
        accepted => record_accepted,
        delivered => record_delivered,
        dropped => record_dropped,
        failed => record_failed,
        rejected => record_rejected,
        queue_full_events => record_queue_full,
        block_events => record_block,
    }

    #[inline]
    pub fn abandoned(&self) -> u64 {
        self.abandoned.load(Ordering::Relaxed)
    }

    pub fn record_abandoned(&self, count: u64) {
        self.abandoned.fetch_add(count, Ordering::Relaxed);
    }

    /// Get drop rate as a percentage (0.0 - 100.0)
    ///
    /// Returns 0.0 if nothing has been offered.
    pub fn drop_rate(&self) -> f64 {
        let dropped = self.dropped() as f64;
        let total = self.accepted() as f64 + dropped;
        if total == 0.0 {
            0.0
        } else {
            (dropped / total) * 100.0
        }
    }
}

impl Default for TargetMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for TargetMetrics {
    /// Create a snapshot of the current metrics values
    fn clone(&self) -> Self {
        Self {
            accepted: AtomicU64::new(self.accepted()),
            delivered: AtomicU64::new(self.delivered()),
            dropped: AtomicU64::new(self.dropped()),
            failed: AtomicU64::new(self.failed()),
            abandoned: AtomicU64::new(self.abandoned()),
            rejected: AtomicU64::new(self.rejected()),
            queue_full_events: AtomicU64::new(self.queue_full_events()),
            block_events: AtomicU64::new(self.block_events()),
        }
    }
}

/// Dispatcher-wide counters
#[derive(Debug)]
pub struct LogrMetrics {
    /// Records handed to `enqueue` while running
    records_enqueued: AtomicU64,

    /// Logging calls made after shutdown began
    rejected_after_shutdown: AtomicU64,

    /// Errors passed to the error reporter
    errors_reported: AtomicU64,

    /// Errors raised from inside the error hook and not delivered to it
    errors_suppressed: AtomicU64,
}

impl LogrMetrics {
    pub const fn new() -> Self {
        Self {
            records_enqueued: AtomicU64::new(0),
            rejected_after_shutdown: AtomicU64::new(0),
            errors_reported: AtomicU64::new(0),
            errors_suppressed: AtomicU64::new(0),
        }
    }

    counters! {
        records_enqueued => record_enqueued,
        rejected_after_shutdown => record_rejected_after_shutdown,
        errors_reported => record_error_reported,
        errors_suppressed => record_error_suppressed,
    }
}

impl Default for LogrMetrics {
    fn default() -> Self {
        Self::new()
    }
}
