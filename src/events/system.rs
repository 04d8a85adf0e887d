//! The event loop: public API, dispatcher, and lifecycle.
//!
//! A single [`EventLoop`] instance owns the subscription registry, the
//! bounded event queue, the timer heap, and the statistics counters. Any
//! thread may publish, subscribe, or schedule work; exactly one caller at a
//! time drives [`EventLoop::run`], and every handler and task invocation
//! happens inline on that task. Producer-side operations never block on
//! capacity: when the queue is full the envelope is dropped and accounted
//! for, the caller returns immediately.

use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::Notify;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::events::config::EventLoopConfig;
use crate::events::filter::EventFilter;
use crate::events::queue::{Admission, EventEnvelope, EventQueue};
use crate::events::registry::SubscriptionRegistry;
use crate::events::stats::{EventLoopStats, QueueSizes, StatsCollector};
use crate::events::timer::{TimerAction, TimerHeap};
use crate::events::types::{
    Event, EventError, EventHandler, EventPriority, EventResult, SubscriptionId, TaskId,
};

const STOPPED: u8 = 0;
const RUNNING: u8 = 1;
const STOPPING: u8 = 2;

struct Inner {
    config: EventLoopConfig,
    registry: SubscriptionRegistry,
    queue: EventQueue,
    timers: TimerHeap,
    stats: StatsCollector,
    state: AtomicU8,
    next_subscription_id: AtomicU64,
    next_task_id: AtomicU64,
    work_available: Notify,
    cancel: Mutex<CancellationToken>,
}

/// Typed in-process event loop.
///
/// Cheap to clone; clones share the same underlying instance, so producers
/// on other threads can hold their own handle.
#[derive(Clone)]
pub struct EventLoop {
    inner: Arc<Inner>,
}

impl EventLoop {
    /// Create a new event loop with default configuration
    pub fn new() -> Self {
        Self::with_config(EventLoopConfig::default())
    }

    /// Create a new event loop with custom configuration
    pub fn with_config(config: EventLoopConfig) -> Self {
        EventLoop {
            inner: Arc::new(Inner {
                queue: EventQueue::new(config.max_queue_size),
                stats: StatsCollector::new(config.enable_statistics),
                config,
                registry: SubscriptionRegistry::new(),
                timers: TimerHeap::new(),
                state: AtomicU8::new(STOPPED),
                next_subscription_id: AtomicU64::new(1),
                next_task_id: AtomicU64::new(1),
                work_available: Notify::new(),
                cancel: Mutex::new(CancellationToken::new()),
            }),
        }
    }

    /// Get the configuration this loop was built with
    pub fn config(&self) -> &EventLoopConfig {
        &self.inner.config
    }

    /// Register a handler for events of type `E` with the default (`Normal`)
    /// minimum priority. Dispatch order is registration order.
    pub fn subscribe<E, H>(&self, handler: H) -> SubscriptionId
    where
        E: Event,
        H: EventHandler<E> + 'static,
    {
        self.subscribe_with_priority(handler, EventPriority::Normal)
    }

    /// Register a handler that only sees events whose priority is at least
    /// `min_priority`.
    pub fn subscribe_with_priority<E, H>(
        &self,
        handler: H,
        min_priority: EventPriority,
    ) -> SubscriptionId
    where
        E: Event,
        H: EventHandler<E> + 'static,
    {
        let id = self.inner.next_subscription_id.fetch_add(1, Ordering::Relaxed);
        self.inner.registry.insert::<E, H>(id, min_priority, handler);
        debug!("subscribed {} to event type {}", id, E::event_type());
        id
    }

    /// Remove a subscription. Returns `false` if the id is unknown under `E`.
    /// Once this returns `true`, the handler will not be invoked for any
    /// envelope whose dispatch starts afterwards.
    pub fn unsubscribe<E: Event>(&self, id: SubscriptionId) -> bool {
        let removed = self.inner.registry.remove(E::event_type(), id);
        if removed {
            debug!("unsubscribed {} from event type {}", id, E::event_type());
        }
        removed
    }

    /// Append a filter to a subscription's chain. Filters are evaluated in
    /// insertion order and short-circuit on the first `false`. Returns
    /// `false` if the id is unknown under `E`.
    pub fn add_filter<E, F>(&self, id: SubscriptionId, filter: F) -> bool
    where
        E: Event,
        F: EventFilter<E> + 'static,
    {
        self.inner.registry.add_filter::<E, F>(id, filter)
    }

    /// Publish an event with the priority declared by its type
    /// (`E::priority()`, `Normal` unless overridden).
    pub fn publish<E: Event>(&self, event: E) {
        self.publish_with_priority(event, E::priority());
    }

    /// Publish an event with an explicit priority. Never blocks: if the
    /// queue is at capacity the event is dropped and counted.
    pub fn publish_with_priority<E: Event>(&self, event: E, priority: EventPriority) {
        self.admit(E::event_type(), Arc::new(event), priority);
    }

    /// Publish an event after a delay, with the type's declared priority.
    /// The delay is measured from now; the event enters the queue (and is
    /// sequenced) when the timer fires.
    pub fn publish_after<E: Event>(&self, delay: Duration, event: E) -> TaskId {
        self.publish_after_with_priority(delay, event, E::priority())
    }

    /// Publish an event after a delay with an explicit priority
    pub fn publish_after_with_priority<E: Event>(
        &self,
        delay: Duration,
        event: E,
        priority: EventPriority,
    ) -> TaskId {
        let id = self.next_task_id();
        self.inner.timers.insert(
            id,
            Instant::now() + delay,
            TimerAction::PublishEvent {
                event_type: E::event_type(),
                payload: Arc::new(event),
                priority,
            },
        );
        self.inner.work_available.notify_one();
        id
    }

    /// Schedule a one-shot task to run on the dispatcher after `delay`
    pub fn schedule_task<F>(&self, delay: Duration, task: F) -> TaskId
    where
        F: FnMut() -> EventResult<()> + Send + 'static,
    {
        let id = self.next_task_id();
        self.inner
            .timers
            .insert(id, Instant::now() + delay, TimerAction::RunOnce(Box::new(task)));
        self.inner.work_available.notify_one();
        id
    }

    /// Schedule a repeating task. The first firing is at `now + interval`;
    /// subsequent firings follow the due-time schedule, with missed ticks
    /// coalesced rather than queued. Zero intervals are clamped to one
    /// millisecond so a repeating task cannot starve event dispatch.
    pub fn schedule_repeating<F>(&self, interval: Duration, task: F) -> TaskId
    where
        F: FnMut() -> EventResult<()> + Send + 'static,
    {
        let interval = interval.max(Duration::from_millis(1));
        let id = self.next_task_id();
        self.inner.timers.insert(
            id,
            Instant::now() + interval,
            TimerAction::RunRepeating {
                task: Box::new(task),
                interval,
            },
        );
        self.inner.work_available.notify_one();
        id
    }

    /// Cancel a scheduled task or deferred publication. A `true` return
    /// guarantees the entry will not execute (for repeating tasks, will not
    /// fire again). Returns `false` for unknown, completed, or
    /// already-cancelled ids.
    pub fn cancel_task(&self, id: TaskId) -> bool {
        let cancelled = self.inner.timers.cancel(id);
        if cancelled {
            debug!("cancelled timer entry {}", id);
        }
        cancelled
    }

    /// Adjust the event queue capacity. Already-queued envelopes are not
    /// truncated; subsequent admissions respect the new bound.
    pub fn set_max_queue_size(&self, max_queue_size: usize) {
        self.inner.queue.set_max_size(max_queue_size);
    }

    /// Instantaneous sample of the internal queue sizes
    pub fn queue_sizes(&self) -> QueueSizes {
        QueueSizes {
            event_queue_size: self.inner.queue.len(),
            timer_heap_size: self.inner.timers.len(),
        }
    }

    /// Toggle statistics collection. Disabling freezes the counters without
    /// clearing them.
    pub fn enable_statistics(&self, enabled: bool) {
        self.inner.stats.set_enabled(enabled);
    }

    /// Zero all statistics counters. Subscriptions and queued work are
    /// untouched.
    pub fn reset_statistics(&self) {
        self.inner.stats.reset();
    }

    /// Current statistics snapshot
    pub fn statistics(&self) -> EventLoopStats {
        self.inner.stats.snapshot(self.inner.queue.len())
    }

    /// Whether any subscription exists for events of type `E`
    pub fn has_subscribers<E: Event>(&self) -> bool {
        self.subscriber_count::<E>() > 0
    }

    /// Number of subscriptions for events of type `E`
    pub fn subscriber_count<E: Event>(&self) -> usize {
        self.inner.registry.count(E::event_type())
    }

    /// Whether a caller is currently driving the loop
    pub fn is_running(&self) -> bool {
        self.inner.state.load(Ordering::SeqCst) == RUNNING
    }

    /// Request the loop to stop. The dispatcher finishes the envelope it is
    /// currently dispatching, leaves the rest of the queue undrained, and
    /// returns from [`run`](Self::run). Safe to call from any thread,
    /// including from inside a handler; a no-op when the loop is not running.
    pub fn stop(&self) {
        if self
            .inner
            .state
            .compare_exchange(RUNNING, STOPPING, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            debug!("stop requested for {}", self.inner.config.name);
            self.inner.cancel.lock().cancel();
            self.inner.work_available.notify_one();
        }
    }

    /// Drive the loop until [`stop`](Self::stop) is called.
    ///
    /// At most one caller may run the loop at a time; a concurrent call is
    /// rejected with [`EventError::AlreadyRunning`]. After a clean stop the
    /// loop may be started again.
    pub async fn run(&self) -> EventResult<()> {
        self.inner
            .state
            .compare_exchange(STOPPED, RUNNING, Ordering::SeqCst, Ordering::SeqCst)
            .map_err(|_| EventError::AlreadyRunning)?;

        let cancel = CancellationToken::new();
        *self.inner.cancel.lock() = cancel.clone();

        debug!("event loop {} started", self.inner.config.name);

        while self.inner.state.load(Ordering::SeqCst) == RUNNING {
            self.fire_due_timers();

            let mut drained = 0;
            while drained < self.inner.config.dispatch_batch_size {
                if self.inner.state.load(Ordering::SeqCst) != RUNNING {
                    break;
                }
                let Some(envelope) = self.inner.queue.pop() else {
                    break;
                };
                self.dispatch_envelope(envelope).await;
                drained += 1;
            }

            if self.inner.state.load(Ordering::SeqCst) != RUNNING {
                break;
            }
            // A full batch or a non-empty queue means more work is ready now.
            if drained == self.inner.config.dispatch_batch_size || self.inner.queue.len() > 0 {
                continue;
            }

            match self.inner.timers.next_due() {
                Some(due) => {
                    tokio::select! {
                        _ = self.inner.work_available.notified() => {}
                        _ = cancel.cancelled() => {}
                        _ = tokio::time::sleep_until(due) => {}
                    }
                }
                None => {
                    tokio::select! {
                        _ = self.inner.work_available.notified() => {}
                        _ = cancel.cancelled() => {}
                    }
                }
            }
        }

        self.inner.state.store(STOPPED, Ordering::SeqCst);
        debug!("event loop {} stopped", self.inner.config.name);
        Ok(())
    }

    fn next_task_id(&self) -> TaskId {
        self.inner.next_task_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Central admission point for immediate and deferred publications.
    fn admit(
        &self,
        event_type: &'static str,
        payload: Arc<dyn std::any::Any + Send + Sync>,
        priority: EventPriority,
    ) {
        match self.inner.queue.try_admit(event_type, payload, priority) {
            Admission::Enqueued(depth) => {
                self.inner.stats.record_published();
                self.inner.stats.observe_queue_depth(depth);
                self.inner.work_available.notify_one();
            }
            Admission::Dropped => {
                self.inner.stats.record_dropped();
                debug!("event queue full, dropping {} event", event_type);
            }
        }
    }

    /// Run every due timer entry: tasks execute inline, deferred events are
    /// admitted to the queue under the same tail-drop rule as `publish`.
    fn fire_due_timers(&self) {
        loop {
            let now = Instant::now();
            let Some(entry) = self.inner.timers.pop_due(now) else {
                break;
            };
            match entry.action {
                TimerAction::RunOnce(mut task) => {
                    if let Err(err) = task() {
                        self.inner.stats.record_failed();
                        warn!("one-shot task {} failed: {}", entry.task_id, err);
                    }
                }
                TimerAction::RunRepeating { mut task, interval } => {
                    if let Err(err) = task() {
                        self.inner.stats.record_failed();
                        warn!("repeating task {} failed: {}", entry.task_id, err);
                    }
                    // Coalesce missed ticks: never schedule into the past.
                    let next_due = std::cmp::max(Instant::now(), entry.due + interval);
                    self.inner.timers.reinsert(
                        entry.task_id,
                        next_due,
                        TimerAction::RunRepeating { task, interval },
                    );
                }
                TimerAction::PublishEvent {
                    event_type,
                    payload,
                    priority,
                } => {
                    self.admit(event_type, payload, priority);
                }
            }
        }
    }

    /// Offer one envelope to every subscription of its category, in
    /// registration order, applying the priority gate and filter chain.
    /// Handler failures are isolated: counted, logged, and the remaining
    /// subscriptions still see the envelope.
    async fn dispatch_envelope(&self, envelope: EventEnvelope) {
        if let Some(subscriptions) = self.inner.registry.snapshot(envelope.event_type) {
            for subscription in &subscriptions {
                if envelope.priority < subscription.min_priority {
                    continue;
                }
                if !subscription
                    .filters
                    .iter()
                    .all(|filter| filter.should_process(envelope.payload.as_ref()))
                {
                    continue;
                }
                if let Err(err) = subscription.handler.handle(envelope.payload.as_ref()).await {
                    self.inner.stats.record_failed();
                    warn!(
                        "handler {} failed for {} event: {}",
                        subscription.id, envelope.event_type, err
                    );
                }
            }
        }
        self.inner.stats.record_processed();
    }
}

impl Default for EventLoop {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use std::any::Any;

    #[derive(Clone, Debug, Serialize, Deserialize)]
    struct Tick {
        n: u32,
    }

    impl Event for Tick {
        fn event_type() -> &'static str {
            "system_tick"
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    #[test]
    fn ids_are_positive_and_unique() {
        let event_loop = EventLoop::new();
        let a = event_loop.subscribe(|_: &Tick| Ok(()));
        let b = event_loop.subscribe(|_: &Tick| Ok(()));
        assert!(a > 0 && b > 0);
        assert_ne!(a, b);

        let t1 = event_loop.schedule_task(Duration::from_secs(60), || Ok(()));
        let t2 = event_loop.publish_after(Duration::from_secs(60), Tick { n: 0 });
        assert!(t1 > 0 && t2 > 0);
        assert_ne!(t1, t2);
    }

    #[test]
    fn publishing_without_a_consumer_queues_envelopes() {
        let event_loop = EventLoop::new();
        event_loop.publish(Tick { n: 1 });
        event_loop.publish_with_priority(Tick { n: 2 }, EventPriority::Critical);
        let sizes = event_loop.queue_sizes();
        assert_eq!(sizes.event_queue_size, 2);
        assert_eq!(sizes.timer_heap_size, 0);

        event_loop.schedule_task(Duration::from_secs(60), || Ok(()));
        assert_eq!(event_loop.queue_sizes().timer_heap_size, 1);
    }

    #[test]
    fn subscriber_introspection() {
        let event_loop = EventLoop::new();
        assert!(!event_loop.has_subscribers::<Tick>());
        let id = event_loop.subscribe(|_: &Tick| Ok(()));
        assert!(event_loop.has_subscribers::<Tick>());
        assert_eq!(event_loop.subscriber_count::<Tick>(), 1);
        assert!(event_loop.unsubscribe::<Tick>(id));
        assert!(!event_loop.has_subscribers::<Tick>());
    }

    #[test]
    fn cancel_unknown_task_returns_false() {
        let event_loop = EventLoop::new();
        assert!(!event_loop.cancel_task(123));
        let id = event_loop.schedule_task(Duration::from_secs(60), || Ok(()));
        assert!(event_loop.cancel_task(id));
        assert!(!event_loop.cancel_task(id));
    }

    #[tokio::test]
    async fn concurrent_run_is_rejected() {
        let event_loop = EventLoop::new();
        let runner = event_loop.clone();
        let handle = tokio::spawn(async move { runner.run().await });

        // Wait for the first caller to claim the loop.
        while !event_loop.is_running() {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        assert!(matches!(
            event_loop.run().await,
            Err(EventError::AlreadyRunning)
        ));

        event_loop.stop();
        handle.await.expect("join").expect("run");
        assert!(!event_loop.is_running());
    }

    #[tokio::test]
    async fn loop_can_be_restarted_after_stop() {
        let event_loop = EventLoop::new();
        for _ in 0..2 {
            let runner = event_loop.clone();
            let handle = tokio::spawn(async move { runner.run().await });
            while !event_loop.is_running() {
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
            event_loop.stop();
            handle.await.expect("join").expect("run");
            assert!(!event_loop.is_running());
        }
    }
}
