//! Configuration for the event manager

use serde::Deserialize;

use crate::error::{EventError, Result};

/// Controls the per-channel worker threads
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EventManagerConfig {
    /// Records buffered per channel before ingestion blocks
    /// Default: 1024
    pub queue_capacity: usize,

    /// Worker threads are named `{prefix}-{channel}`
    /// Default: "eds-events"
    pub thread_name_prefix: String,
}

impl Default for EventManagerConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 1024,
            thread_name_prefix: "eds-events".to_string(),
        }
    }
}

impl EventManagerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Small queues so a slow handler pushes back on the device quickly
    pub fn low_latency() -> Self {
        Self {
            queue_capacity: 64,
            ..Default::default()
        }
    }

    /// Deep queues for burst shooting with many transfer requests
    pub fn high_throughput() -> Self {
        Self {
            queue_capacity: 8192,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.queue_capacity == 0 {
            return Err(EventError::InvalidConfig(
                "queue capacity must be greater than 0".to_string(),
            ));
        }

        if self.thread_name_prefix.trim().is_empty() {
            return Err(EventError::InvalidConfig(
                "thread name prefix must not be empty".to_string(),
            ));
        }

        Ok(())
    }

    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    pub fn with_thread_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.thread_name_prefix = prefix.into();
        self
    }
}
