//! # Event Loop
//!
//! A typed, in-process event loop for publish-subscribe communication with
//! priority gating, per-subscription filtering, and timer-driven scheduling.
//!
//! Producers on any thread publish strongly-typed events or schedule delayed
//! work; a single dispatcher task drains the bounded event queue and the
//! timer heap, invoking handlers in subscription order under failure
//! isolation.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use eventcore::events::system::EventLoop;
//! use eventcore::events::types::Event;
//! use std::any::Any;
//! use std::time::Duration;
//! use serde::{Serialize, Deserialize};
//!
//! // 1. Define your event type
//! #[derive(Clone, Debug, Serialize, Deserialize)]
//! struct MyEvent {
//!     id: u32,
//!     message: String,
//! }
//!
//! // 2. Implement the Event trait
//! impl Event for MyEvent {
//!     fn event_type() -> &'static str {
//!         "my_event"
//!     }
//!
//!     fn as_any(&self) -> &dyn Any {
//!         self
//!     }
//! }
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     // 3. Create the loop and subscribe
//!     let event_loop = EventLoop::new();
//!     event_loop.subscribe(|event: &MyEvent| {
//!         println!("received: id={}, message={}", event.id, event.message);
//!         Ok(())
//!     });
//!
//!     // 4. Drive the loop from a background task
//!     let runner = event_loop.clone();
//!     let handle = tokio::spawn(async move { runner.run().await });
//!
//!     // 5. Publish events and schedule work from any thread
//!     event_loop.publish(MyEvent { id: 1, message: "Hello".into() });
//!     event_loop.publish_after(Duration::from_millis(50), MyEvent {
//!         id: 2,
//!         message: "Later".into(),
//!     });
//!     event_loop.schedule_task(Duration::from_millis(10), || {
//!         println!("tick");
//!         Ok(())
//!     });
//!
//!     // 6. Shut down when done
//!     event_loop.stop();
//!     handle.await??;
//!     Ok(())
//! }
//! ```

pub mod builder;
pub mod config;
pub mod filter;
pub mod stats;
pub mod system;
pub mod types;

pub(crate) mod queue;
pub(crate) mod registry;
pub(crate) mod timer;

// Re-export commonly used items
pub use builder::EventLoopBuilder;
pub use config::EventLoopConfig;
pub use filter::{filters, EventFilter};
pub use stats::{EventLoopStats, QueueSizes};
pub use system::EventLoop;
pub use types::{
    Event, EventError, EventHandler, EventPriority, EventResult, EventType, SubscriptionId, TaskId,
};
