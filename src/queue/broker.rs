//! Queue broker owning one bounded queue per key

use super::error::{BrokerError, BrokerResult};
use super::key::QueueKey;
use super::key_queue::BoundedKeyQueue;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Capacity given to every queue unless configured otherwise
pub const DEFAULT_CAPACITY: usize = 1000;

/// Server-side deadline for producers waiting on a full queue
pub const DEFAULT_ENQUEUE_TIMEOUT: Duration = Duration::from_secs(10);

/// Resolves keys to queues, creating them on first touch.
///
/// The map lock only guards the find-or-create step and is never held
/// while a caller waits on a queue.
#[derive(Debug)]
pub struct QueueBroker {
    queues: RwLock<HashMap<QueueKey, Arc<BoundedKeyQueue>>>,
    capacity: usize,
}

impl Default for QueueBroker {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl QueueBroker {
    /// Create a broker whose queues all hold at most `capacity` payloads
    pub fn new(capacity: usize) -> Self {
        Self {
            queues: RwLock::new(HashMap::new()),
            capacity: capacity.max(1),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Get the queue for `key`, creating it if absent.
    ///
    /// Concurrent first touches of the same key all receive the same queue:
    /// the insert happens under the write lock via the map's entry API.
    pub async fn queue(&self, key: &QueueKey) -> Arc<BoundedKeyQueue> {
        if let Some(queue) = self.queues.read().await.get(key) {
            return queue.clone();
        }

        let mut queues = self.queues.write().await;
        queues
            .entry(key.clone())
            .or_insert_with(|| {
                info!("Creating queue: {}", key);
                Arc::new(BoundedKeyQueue::new(self.capacity))
            })
            .clone()
    }

    /// Append `value` to the queue for `key`, waiting up to `timeout` for room
    pub async fn enqueue(&self, key: &str, value: String, timeout: Duration) -> BrokerResult<()> {
        let key = QueueKey::parse(key)?;
        let queue = self.queue(&key).await;

        if queue.insert_wait(value, timeout).await {
            debug!("Enqueued item to {}", key);
            Ok(())
        } else {
            debug!("Queue {} stayed full for {:?}", key, timeout);
            Err(BrokerError::Timeout)
        }
    }

    /// Take the oldest payload for `key`.
    ///
    /// A zero `timeout` checks once and returns immediately; anything
    /// longer waits for a payload until the deadline.
    pub async fn dequeue(&self, key: &str, timeout: Duration) -> BrokerResult<String> {
        let key = QueueKey::parse(key)?;
        let queue = self.queue(&key).await;

        let item = if timeout.is_zero() {
            queue.try_remove()
        } else {
            queue.remove_wait(timeout).await
        };

        match item {
            Some(value) => {
                debug!("Dequeued item from {}", key);
                Ok(value)
            }
            None => Err(BrokerError::NotFound),
        }
    }

    /// Number of queues created so far
    pub async fn queue_count(&self) -> usize {
        self.queues.read().await.len()
    }

    /// Current length of the queue for `key`, without creating it
    pub async fn queue_len(&self, key: &str) -> Option<usize> {
        let key = QueueKey::parse(key).ok()?;
        let queue = self.queues.read().await.get(&key).cloned()?;
        Some(queue.len())
    }
}

/// Convert a caller-supplied wait in whole seconds, rejecting negatives
pub fn parse_wait_secs(secs: i64) -> BrokerResult<Duration> {
    u64::try_from(secs)
        .map(Duration::from_secs)
        .map_err(|_| BrokerError::BadArguments(format!("timeout must be non-negative, got {}", secs)))
}
