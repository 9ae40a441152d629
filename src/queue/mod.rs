//! Named bounded queues with long-poll reads and backpressured writes
//!
//! This module provides:
//! - One bounded FIFO per key, created lazily on first access
//! - Timed blocking inserts and removals that never leak a waiter
//! - The error taxonomy returned to the HTTP gateway

pub mod broker;
pub mod error;
pub mod key;
pub mod key_queue;

pub use broker::{parse_wait_secs, QueueBroker};
pub use error::{BrokerError, BrokerResult};
pub use key::QueueKey;
pub use key_queue::BoundedKeyQueue;

use crate::config::BrokerConfig;
use std::sync::Arc;

/// Shared broker instance handed to every request handler
pub type SharedQueueBroker = Arc<QueueBroker>;

/// Create a new shared broker from configuration
pub fn create_shared_broker(config: &BrokerConfig) -> SharedQueueBroker {
    Arc::new(QueueBroker::new(config.capacity))
}
