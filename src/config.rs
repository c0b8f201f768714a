//! # Client Configuration
//!
//! Explicit configuration for queue addressing and consumer polling. A client
//! always has a queue named `default`; additional named queues are optional and
//! operations bind to them by name at registration time.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::errors::{Result, TaskError};
use crate::types::QueueConfiguration;

/// Default number of messages fetched per poll cycle
pub const DEFAULT_MAX_NUMBER_OF_MESSAGES: u32 = 5;

/// Default long-poll wait per cycle, in seconds
pub const DEFAULT_WAIT_TIME_SECONDS: u32 = 30;

/// Queue table configuration handed to a client at construction time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfiguration {
    /// The requisite default queue
    pub default_queue: QueueConfiguration,
    /// Additional named queues; an entry named `default` is overridden by
    /// `default_queue`
    pub queues: HashMap<String, QueueConfiguration>,
}

impl ClientConfiguration {
    pub fn new(default_queue: QueueConfiguration) -> Self {
        Self {
            default_queue,
            queues: HashMap::new(),
        }
    }

    /// Add a named queue
    pub fn with_queue(mut self, name: impl Into<String>, queue: QueueConfiguration) -> Self {
        self.queues.insert(name.into(), queue);
        self
    }
}

/// Polling parameters for a [`TaskConsumer`](crate::consumer::TaskConsumer)
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ConsumerConfig {
    /// Maximum number of messages to fetch per poll. Set this lower to process
    /// fewer messages per cycle (more distributed).
    pub max_messages: u32,
    /// Seconds to wait per poll cycle before returning; 0 means no long poll
    pub wait_seconds: u32,
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self {
            max_messages: DEFAULT_MAX_NUMBER_OF_MESSAGES,
            wait_seconds: DEFAULT_WAIT_TIME_SECONDS,
        }
    }
}

impl ConsumerConfig {
    /// Check the parameters are usable before a consumer is built
    pub fn validate(&self) -> Result<()> {
        if self.max_messages == 0 {
            return Err(TaskError::validation("max_messages must be at least 1"));
        }
        Ok(())
    }
}
