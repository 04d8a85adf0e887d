//! Bounded multi-producer event queue.
//!
//! The queue is FIFO by admission order; priority never reorders queued
//! envelopes (the dispatch-side priority gate is the sole priority
//! mechanism). Admission is non-blocking: when the queue is at capacity the
//! envelope is rejected (tail-drop) and the caller accounts for the drop.

use std::any::Any;
use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::events::types::{EventPriority, EventType};

/// Type-erased event as it flows through the queue.
#[derive(Clone)]
pub(crate) struct EventEnvelope {
    pub event_type: EventType,
    pub payload: Arc<dyn Any + Send + Sync>,
    pub priority: EventPriority,
    pub sequence: u64,
}

struct QueueState {
    entries: VecDeque<EventEnvelope>,
    next_sequence: u64,
    // Kept inside the lock so admissions and capacity changes serialize.
    max_size: usize,
}

pub(crate) struct EventQueue {
    state: Mutex<QueueState>,
}

/// Outcome of an admission attempt. `Enqueued` carries the queue depth after
/// insertion so the caller can track the high watermark.
pub(crate) enum Admission {
    Enqueued(usize),
    Dropped,
}

impl EventQueue {
    pub(crate) fn new(max_size: usize) -> Self {
        Self {
            state: Mutex::new(QueueState {
                entries: VecDeque::new(),
                next_sequence: 0,
                max_size,
            }),
        }
    }

    /// Admit an envelope, assigning its sequence number, or reject it if the
    /// queue is at capacity. Never blocks.
    pub(crate) fn try_admit(
        &self,
        event_type: EventType,
        payload: Arc<dyn Any + Send + Sync>,
        priority: EventPriority,
    ) -> Admission {
        let mut state = self.state.lock();
        if state.entries.len() >= state.max_size {
            return Admission::Dropped;
        }
        let sequence = state.next_sequence;
        state.next_sequence += 1;
        state.entries.push_back(EventEnvelope {
            event_type,
            payload,
            priority,
            sequence,
        });
        Admission::Enqueued(state.entries.len())
    }

    pub(crate) fn pop(&self) -> Option<EventEnvelope> {
        self.state.lock().entries.pop_front()
    }

    pub(crate) fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    /// Adjust the capacity. Already-queued envelopes are never truncated;
    /// only subsequent admissions observe the new bound.
    pub(crate) fn set_max_size(&self, max_size: usize) {
        self.state.lock().max_size = max_size;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn admit(queue: &EventQueue, value: u32) -> Admission {
        queue.try_admit("test", Arc::new(value), EventPriority::Normal)
    }

    #[test]
    fn admissions_are_fifo_with_monotonic_sequences() {
        let queue = EventQueue::new(16);
        for value in 0..4u32 {
            assert!(matches!(admit(&queue, value), Admission::Enqueued(_)));
        }
        let mut last_sequence = None;
        for expected in 0..4u32 {
            let envelope = queue.pop().expect("envelope");
            assert_eq!(*envelope.payload.downcast_ref::<u32>().unwrap(), expected);
            if let Some(prev) = last_sequence {
                assert!(envelope.sequence > prev);
            }
            last_sequence = Some(envelope.sequence);
        }
        assert!(queue.pop().is_none());
    }

    #[test]
    fn tail_drop_at_capacity() {
        let queue = EventQueue::new(2);
        assert!(matches!(admit(&queue, 0), Admission::Enqueued(1)));
        assert!(matches!(admit(&queue, 1), Admission::Enqueued(2)));
        assert!(matches!(admit(&queue, 2), Admission::Dropped));
        assert_eq!(queue.len(), 2);

        // Draining one slot re-opens admission.
        queue.pop();
        assert!(matches!(admit(&queue, 3), Admission::Enqueued(2)));
    }

    #[test]
    fn shrinking_capacity_does_not_truncate() {
        let queue = EventQueue::new(4);
        for value in 0..4u32 {
            admit(&queue, value);
        }
        queue.set_max_size(1);
        assert_eq!(queue.len(), 4);
        assert!(matches!(admit(&queue, 4), Admission::Dropped));
        for _ in 0..4 {
            queue.pop();
        }
        assert!(matches!(admit(&queue, 5), Admission::Enqueued(1)));
    }
}
