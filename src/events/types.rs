use std::any::Any;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Represents a category of events. Each category has its own subscription list.
pub type EventType = &'static str;

/// Identifier of an active subscription. Strictly positive, never reused.
pub type SubscriptionId = u64;

/// Identifier of a scheduled timer entry. Strictly positive, never reused.
pub type TaskId = u64;

/// Priority levels for events
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EventPriority {
    /// Low priority events
    Low = 0,
    /// Default priority events
    Normal = 1,
    /// High priority events
    High = 2,
    /// Critical events that must be processed immediately
    Critical = 3,
}

impl Default for EventPriority {
    fn default() -> Self {
        EventPriority::Normal
    }
}

/// Common trait for all events
pub trait Event: Clone + Send + Sync + Serialize + for<'de> Deserialize<'de> + 'static {
    /// Return the type identifier for this event
    fn event_type() -> EventType;

    /// Return the priority used when publishing without an explicit one
    fn priority() -> EventPriority {
        EventPriority::Normal
    }

    /// Convert to a typeless Any object (for internal use)
    fn as_any(&self) -> &dyn Any;
}

/// Handler trait for processing events.
///
/// Handlers are invoked inline on the dispatcher task, in subscription
/// registration order. An `Err` return is isolated at the dispatch boundary:
/// it is counted in `failed_events` and the remaining subscriptions still
/// receive the envelope.
#[async_trait]
pub trait EventHandler<E: Event>: Send + Sync {
    /// Process an event
    async fn handle(&self, event: &E) -> EventResult<()>;
}

/// Implementation of EventHandler for plain closures
#[async_trait]
impl<E, F> EventHandler<E> for F
where
    E: Event,
    F: Fn(&E) -> EventResult<()> + Send + Sync,
{
    async fn handle(&self, event: &E) -> EventResult<()> {
        (self)(event)
    }
}

/// General error type for event loop operations
#[derive(Debug, Error)]
pub enum EventError {
    /// `run` was called while another caller is already driving the loop
    #[error("event loop is already running")]
    AlreadyRunning,
    /// An event handler reported a failure
    #[error("handler failed: {0}")]
    HandlerFailed(String),
    /// A scheduled task reported a failure
    #[error("scheduled task failed: {0}")]
    TaskFailed(String),
    /// Other unspecified errors
    #[error("{0}")]
    Other(String),
}

/// Result type for event loop operations
pub type EventResult<T> = std::result::Result<T, EventError>;
