use serde::{Deserialize, Serialize};

/// Configuration for the event loop
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventLoopConfig {
    /// Maximum number of envelopes held in the event queue. Admissions that
    /// would exceed the bound are tail-dropped.
    pub max_queue_size: usize,
    /// Maximum envelopes drained per dispatcher wakeup before due timers are
    /// re-checked.
    pub dispatch_batch_size: usize,
    /// Whether statistics collection starts enabled.
    pub enable_statistics: bool,
    /// Instance name used in log output.
    pub name: String,
}

impl Default for EventLoopConfig {
    fn default() -> Self {
        EventLoopConfig {
            max_queue_size: 10_000,
            dispatch_batch_size: 64,
            enable_statistics: true,
            name: "eventcore".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_round_trip_through_serde() {
        let config = EventLoopConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: EventLoopConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.max_queue_size, config.max_queue_size);
        assert_eq!(back.dispatch_batch_size, config.dispatch_batch_size);
        assert!(back.enable_statistics);
        assert_eq!(back.name, "eventcore");
    }
}
