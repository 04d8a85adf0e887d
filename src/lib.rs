/*!
# eventcore

A typed in-process event loop that provides:

- Publish/subscribe dispatch over strongly-typed event categories
- Per-subscription filter chains and priority gating
- Timer-based task scheduling (one-shot and repeating) and deferred
  event publication
- Bounded event queues with tail-drop backpressure and drop accounting
- Dispatch statistics and lifecycle control

Producers on arbitrary threads publish events and schedule work without
ever blocking; a single consumer task drives [`EventLoop::run`], firing due
timers, draining the queue, and invoking handlers under failure isolation.
*/

pub mod error;
pub mod events;
pub mod logging;

/// Re-export commonly used types
pub use error::Error;
pub use events::builder::EventLoopBuilder;
pub use events::config::EventLoopConfig;
pub use events::filter::{filters, EventFilter};
pub use events::stats::{EventLoopStats, QueueSizes};
pub use events::system::EventLoop;
pub use events::types::{
    Event, EventError, EventHandler, EventPriority, EventResult, EventType, SubscriptionId, TaskId,
};
pub use logging::{setup_logging, LoggingConfig};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
