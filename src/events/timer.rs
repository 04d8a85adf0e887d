//! Timer heap driving scheduled tasks and deferred publications.
//!
//! A min-heap keyed by due time, tie-broken by insertion order. The
//! dispatcher pops due entries on each iteration; producers insert from
//! arbitrary threads. Cancellation is a membership test against the live
//! set: entries removed from the set are discarded when they surface at the
//! top of the heap, so `cancel` never has to search the heap itself.

use std::any::Any;
use std::cmp::Ordering as CmpOrdering;
use std::collections::{BinaryHeap, HashSet};
use std::cmp::Reverse;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;

use crate::events::types::{EventPriority, EventResult, EventType, TaskId};

/// Erased callable for one-shot and repeating tasks.
pub(crate) type TaskFn = Box<dyn FnMut() -> EventResult<()> + Send>;

/// What a timer entry does when it fires.
pub(crate) enum TimerAction {
    RunOnce(TaskFn),
    RunRepeating { task: TaskFn, interval: Duration },
    PublishEvent {
        event_type: EventType,
        payload: Arc<dyn Any + Send + Sync>,
        priority: EventPriority,
    },
}

pub(crate) struct TimerEntry {
    pub task_id: TaskId,
    pub due: Instant,
    insertion: u64,
    pub action: TimerAction,
}

impl PartialEq for TimerEntry {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due && self.insertion == other.insertion
    }
}

impl Eq for TimerEntry {}

impl PartialOrd for TimerEntry {
    fn partial_cmp(&self, other: &Self) -> Option<CmpOrdering> {
        Some(self.cmp(other))
    }
}

impl Ord for TimerEntry {
    fn cmp(&self, other: &Self) -> CmpOrdering {
        self.due
            .cmp(&other.due)
            .then_with(|| self.insertion.cmp(&other.insertion))
    }
}

struct HeapState {
    heap: BinaryHeap<Reverse<TimerEntry>>,
    live: HashSet<TaskId>,
    next_insertion: u64,
}

pub(crate) struct TimerHeap {
    state: Mutex<HeapState>,
}

impl TimerHeap {
    pub(crate) fn new() -> Self {
        Self {
            state: Mutex::new(HeapState {
                heap: BinaryHeap::new(),
                live: HashSet::new(),
                next_insertion: 0,
            }),
        }
    }

    /// Insert a new entry and mark it live.
    pub(crate) fn insert(&self, task_id: TaskId, due: Instant, action: TimerAction) {
        let mut state = self.state.lock();
        let insertion = state.next_insertion;
        state.next_insertion += 1;
        state.live.insert(task_id);
        state.heap.push(Reverse(TimerEntry {
            task_id,
            due,
            insertion,
            action,
        }));
    }

    /// Re-insert a repeating entry after a firing. Returns `false` if the
    /// entry was cancelled while it was executing, in which case the action
    /// is discarded.
    pub(crate) fn reinsert(&self, task_id: TaskId, due: Instant, action: TimerAction) -> bool {
        let mut state = self.state.lock();
        if !state.live.contains(&task_id) {
            return false;
        }
        let insertion = state.next_insertion;
        state.next_insertion += 1;
        state.heap.push(Reverse(TimerEntry {
            task_id,
            due,
            insertion,
            action,
        }));
        true
    }

    /// Mark an entry cancelled. Returns `true` iff the entry was live: once
    /// this returns `true` the entry will not fire again.
    pub(crate) fn cancel(&self, task_id: TaskId) -> bool {
        let mut state = self.state.lock();
        state.live.remove(&task_id)
    }

    /// Pop the earliest entry that is due and still live, discarding any
    /// cancelled entries encountered on the way. One-shot and deferred-event
    /// entries leave the live set here, before the caller runs them, so a
    /// `cancel` racing with the firing observes them as already gone.
    pub(crate) fn pop_due(&self, now: Instant) -> Option<TimerEntry> {
        let mut state = self.state.lock();
        loop {
            let (task_id, due) = match state.heap.peek() {
                Some(front) => (front.0.task_id, front.0.due),
                None => return None,
            };
            if !state.live.contains(&task_id) {
                state.heap.pop();
                continue;
            }
            if due > now {
                return None;
            }
            let entry = state.heap.pop().map(|entry| entry.0)?;
            if !matches!(entry.action, TimerAction::RunRepeating { .. }) {
                state.live.remove(&task_id);
            }
            return Some(entry);
        }
    }

    /// Due time of the earliest live entry, if any.
    pub(crate) fn next_due(&self) -> Option<Instant> {
        let mut state = self.state.lock();
        loop {
            let (task_id, due) = match state.heap.peek() {
                Some(front) => (front.0.task_id, front.0.due),
                None => return None,
            };
            if state.live.contains(&task_id) {
                return Some(due);
            }
            state.heap.pop();
        }
    }

    /// Number of live entries.
    pub(crate) fn len(&self) -> usize {
        self.state.lock().live.len()
    }
}
