use crate::queue::broker::{DEFAULT_CAPACITY, DEFAULT_ENQUEUE_TIMEOUT};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct BrokerConfig {
    #[serde(default = "default_capacity")]
    pub capacity: usize,
    #[serde(default = "default_enqueue_timeout_secs")]
    pub enqueue_timeout_secs: u64,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
            enqueue_timeout_secs: default_enqueue_timeout_secs(),
        }
    }
}

impl BrokerConfig {
    /// Fixed deadline applied to every enqueue
    pub fn enqueue_timeout(&self) -> Duration {
        Duration::from_secs(self.enqueue_timeout_secs)
    }
}

fn default_capacity() -> usize {
    DEFAULT_CAPACITY
}

fn default_enqueue_timeout_secs() -> u64 {
    DEFAULT_ENQUEUE_TIMEOUT.as_secs()
}
