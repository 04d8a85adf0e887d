//! Dispatch statistics and queue-size snapshots.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

use serde::{Deserialize, Serialize};

/// Point-in-time view of the loop's dispatch counters.
///
/// Counters are monotonic between [`reset`](StatsCollector::reset) calls and
/// frozen (not cleared) while collection is disabled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventLoopStats {
    /// Envelopes successfully admitted to the event queue
    pub published_events: u64,
    /// Envelopes drained from the queue and dispatched, matched or not
    pub processed_events: u64,
    /// Admissions rejected because the queue was at capacity
    pub dropped_events: u64,
    /// Handler and task invocations that reported a failure
    pub failed_events: u64,
    /// Current event queue length at snapshot time
    pub queued_events: usize,
    /// Highest observed event queue length since the last reset
    pub max_queue_size: usize,
}

/// Instantaneous sample of the two internal queues.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueSizes {
    /// Number of envelopes waiting in the event queue
    pub event_queue_size: usize,
    /// Number of live (non-cancelled) timer entries
    pub timer_heap_size: usize,
}

/// Counter storage shared between the dispatcher and external readers.
#[derive(Debug)]
pub(crate) struct StatsCollector {
    enabled: AtomicBool,
    published: AtomicU64,
    processed: AtomicU64,
    dropped: AtomicU64,
    failed: AtomicU64,
    queue_high_watermark: AtomicUsize,
}

impl StatsCollector {
    pub(crate) fn new(enabled: bool) -> Self {
        Self {
            enabled: AtomicBool::new(enabled),
            published: AtomicU64::new(0),
            processed: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            queue_high_watermark: AtomicUsize::new(0),
        }
    }

    pub(crate) fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }

    fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    pub(crate) fn record_published(&self) {
        if self.is_enabled() {
            self.published.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub(crate) fn record_processed(&self) {
        if self.is_enabled() {
            self.processed.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub(crate) fn record_dropped(&self) {
        if self.is_enabled() {
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub(crate) fn record_failed(&self) {
        if self.is_enabled() {
            self.failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub(crate) fn observe_queue_depth(&self, depth: usize) {
        if self.is_enabled() {
            self.queue_high_watermark.fetch_max(depth, Ordering::Relaxed);
        }
    }

    pub(crate) fn reset(&self) {
        self.published.store(0, Ordering::SeqCst);
        self.processed.store(0, Ordering::SeqCst);
        self.dropped.store(0, Ordering::SeqCst);
        self.failed.store(0, Ordering::SeqCst);
        self.queue_high_watermark.store(0, Ordering::SeqCst);
    }

    pub(crate) fn snapshot(&self, queued_events: usize) -> EventLoopStats {
        EventLoopStats {
            published_events: self.published.load(Ordering::Relaxed),
            processed_events: self.processed.load(Ordering::Relaxed),
            dropped_events: self.dropped.load(Ordering::Relaxed),
            failed_events: self.failed.load(Ordering::Relaxed),
            queued_events,
            max_queue_size: self.queue_high_watermark.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate_and_reset() {
        let stats = StatsCollector::new(true);
        stats.record_published();
        stats.record_published();
        stats.record_processed();
        stats.record_dropped();
        stats.record_failed();
        stats.observe_queue_depth(7);
        stats.observe_queue_depth(3);

        let snap = stats.snapshot(2);
        assert_eq!(snap.published_events, 2);
        assert_eq!(snap.processed_events, 1);
        assert_eq!(snap.dropped_events, 1);
        assert_eq!(snap.failed_events, 1);
        assert_eq!(snap.queued_events, 2);
        assert_eq!(snap.max_queue_size, 7);

        stats.reset();
        assert_eq!(stats.snapshot(0), EventLoopStats::default());
    }

    #[test]
    fn disabling_freezes_counters() {
        let stats = StatsCollector::new(true);
        stats.record_published();
        stats.set_enabled(false);
        stats.record_published();
        stats.record_dropped();
        let snap = stats.snapshot(0);
        assert_eq!(snap.published_events, 1);
        assert_eq!(snap.dropped_events, 0);

        // Re-enabling resumes from the frozen values.
        stats.set_enabled(true);
        stats.record_published();
        assert_eq!(stats.snapshot(0).published_events, 2);
    }
}
