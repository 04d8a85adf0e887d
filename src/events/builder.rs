//! Builder for configuring and creating an event loop.
//!
//! # Examples
//!
//! ```rust,no_run
//! use eventcore::events::builder::EventLoopBuilder;
//!
//! let event_loop = EventLoopBuilder::new()
//!     .max_queue_size(5_000)
//!     .dispatch_batch_size(32)
//!     .statistics(true)
//!     .name("worker-bus")
//!     .build();
//! ```

use crate::events::config::EventLoopConfig;
use crate::events::system::EventLoop;

/// Fluent construction path for [`EventLoop`].
#[derive(Debug, Clone, Default)]
pub struct EventLoopBuilder {
    config: EventLoopConfig,
}

impl EventLoopBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self {
            config: EventLoopConfig::default(),
        }
    }

    /// Set the event queue capacity
    pub fn max_queue_size(mut self, max_queue_size: usize) -> Self {
        self.config.max_queue_size = max_queue_size;
        self
    }

    /// Set how many envelopes are drained per dispatcher wakeup
    pub fn dispatch_batch_size(mut self, dispatch_batch_size: usize) -> Self {
        self.config.dispatch_batch_size = dispatch_batch_size;
        self
    }

    /// Enable or disable statistics collection at startup
    pub fn statistics(mut self, enabled: bool) -> Self {
        self.config.enable_statistics = enabled;
        self
    }

    /// Set the instance name used in log output
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.config.name = name.into();
        self
    }

    /// Build the configured event loop
    pub fn build(self) -> EventLoop {
        EventLoop::with_config(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_applies_settings() {
        let event_loop = EventLoopBuilder::new()
            .max_queue_size(3)
            .dispatch_batch_size(8)
            .statistics(false)
            .name("test-loop")
            .build();
        let config = event_loop.config();
        assert_eq!(config.max_queue_size, 3);
        assert_eq!(config.dispatch_batch_size, 8);
        assert!(!config.enable_statistics);
        assert_eq!(config.name, "test-loop");
    }
}
