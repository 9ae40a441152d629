//! Bounded FIFO holding the payloads of a single key

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::Notify;
use tracing::trace;

/// Fixed-capacity FIFO with timed blocking on both ends.
///
/// The buffer has its own lock, so contention on one key never blocks
/// another. Producers park on `not_full`, consumers on `not_empty`; every
/// successful insert wakes one consumer and every removal wakes one producer.
///
/// The buffer lock is synchronous and never held across an await, so a
/// waiter that has been woken always re-checks the buffer before it can be
/// cancelled. A waiter dropped before it is polled again hands its wake-up
/// on to the next one.
#[derive(Debug)]
pub struct BoundedKeyQueue {
    items: Mutex<VecDeque<String>>,
    capacity: usize,
    not_empty: Notify,
    not_full: Notify,
}

impl BoundedKeyQueue {
    /// Create an empty queue; a zero capacity is raised to one
    pub fn new(capacity: usize) -> Self {
        Self {
            items: Mutex::new(VecDeque::new()),
            capacity: capacity.max(1),
            not_empty: Notify::new(),
            not_full: Notify::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of payloads currently buffered
    pub fn len(&self) -> usize {
        self.buffer().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Pop the oldest payload without waiting
    pub fn try_remove(&self) -> Option<String> {
        let item = self.buffer().pop_front();
        if item.is_some() {
            self.not_full.notify_one();
        }
        item
    }

    /// Pop the oldest payload, waiting up to `timeout` for one to arrive
    pub async fn remove_wait(&self, timeout: Duration) -> Option<String> {
        match tokio::time::timeout(timeout, self.next_item()).await {
            Ok(item) => Some(item),
            Err(_) => {
                trace!("remove_wait gave up after {:?}", timeout);
                None
            }
        }
    }

    /// Append `value`, waiting up to `timeout` for a free slot.
    ///
    /// Returns `false` without inserting if the queue stayed full.
    pub async fn insert_wait(&self, value: String, timeout: Duration) -> bool {
        match tokio::time::timeout(timeout, self.push_when_room(value)).await {
            Ok(()) => true,
            Err(_) => {
                trace!("insert_wait gave up after {:?}", timeout);
                false
            }
        }
    }

    // Critical sections never panic, so a poisoned lock still guards a consistent buffer.
    fn buffer(&self) -> MutexGuard<'_, VecDeque<String>> {
        self.items.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn try_push(&self, value: String) -> Result<(), String> {
        let mut items = self.buffer();
        if items.len() >= self.capacity {
            return Err(value);
        }
        items.push_back(value);
        drop(items);
        self.not_empty.notify_one();
        Ok(())
    }

    async fn next_item(&self) -> String {
        loop {
            // Register before checking so an insert landing in between still wakes us.
            let notified = self.not_empty.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if let Some(item) = self.try_remove() {
                return item;
            }
            notified.await;
        }
    }

    async fn push_when_room(&self, mut value: String) {
        loop {
            let notified = self.not_full.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            match self.try_push(value) {
                Ok(()) => return,
                Err(rejected) => value = rejected,
            }
            notified.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    const LONG: Duration = Duration::from_secs(5);

    #[tokio::test]
    async fn test_fifo_order() {
        let queue = BoundedKeyQueue::new(10);
        for value in ["1", "2", "3"] {
            assert!(queue.insert_wait(value.to_string(), LONG).await);
        }

        assert_eq!(queue.try_remove().as_deref(), Some("1"));
        assert_eq!(queue.try_remove().as_deref(), Some("2"));
        assert_eq!(queue.try_remove().as_deref(), Some("3"));
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn test_try_remove_on_empty_queue() {
        let queue = BoundedKeyQueue::new(10);

        assert_eq!(queue.try_remove(), None);
        assert_eq!(queue.len(), 0);
    }

    #[tokio::test]
    async fn test_zero_capacity_is_raised() {
        let queue = BoundedKeyQueue::new(0);
        assert_eq!(queue.capacity(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_remove_wait_times_out() {
        let queue = BoundedKeyQueue::new(10);
        let started = tokio::time::Instant::now();

        let result = queue.remove_wait(Duration::from_secs(2)).await;

        assert_eq!(result, None);
        assert!(started.elapsed() >= Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_insert_wait_times_out_when_full() {
        let queue = BoundedKeyQueue::new(2);
        assert!(queue.insert_wait("a".to_string(), LONG).await);
        assert!(queue.insert_wait("b".to_string(), LONG).await);

        let started = tokio::time::Instant::now();
        let inserted = queue.insert_wait("c".to_string(), Duration::from_secs(1)).await;

        assert!(!inserted);
        assert!(started.elapsed() >= Duration::from_secs(1));
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.try_remove().as_deref(), Some("a"));
        assert_eq!(queue.try_remove().as_deref(), Some("b"));
        assert_eq!(queue.try_remove(), None);
    }

    #[tokio::test]
    async fn test_removal_unblocks_waiting_producer() {
        let queue = Arc::new(BoundedKeyQueue::new(1));
        assert!(queue.insert_wait("first".to_string(), LONG).await);

        let producer = {
            let queue = queue.clone();
            tokio::spawn(async move { queue.insert_wait("second".to_string(), LONG).await })
        };

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(queue.try_remove().as_deref(), Some("first"));

        assert!(producer.await.unwrap());
        assert_eq!(queue.try_remove().as_deref(), Some("second"));
    }

    #[tokio::test]
    async fn test_insert_wakes_waiting_consumer() {
        let queue = Arc::new(BoundedKeyQueue::new(10));

        let consumer = {
            let queue = queue.clone();
            tokio::spawn(async move { queue.remove_wait(LONG).await })
        };

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(queue.insert_wait("late".to_string(), LONG).await);

        assert_eq!(consumer.await.unwrap().as_deref(), Some("late"));
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn test_woken_consumer_cancelled_before_recheck() {
        let queue = Arc::new(BoundedKeyQueue::new(10));

        let first = {
            let queue = queue.clone();
            tokio::spawn(async move { queue.remove_wait(LONG).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        let second = {
            let queue = queue.clone();
            tokio::spawn(async move { queue.remove_wait(LONG).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        // The insert wakes `first`; it is cancelled before it runs again.
        assert!(queue.insert_wait("x".to_string(), LONG).await);
        first.abort();

        assert!(first.await.unwrap_err().is_cancelled());
        let received = tokio::time::timeout(Duration::from_secs(1), second)
            .await
            .expect("wake-up was not handed on")
            .unwrap();
        assert_eq!(received.as_deref(), Some("x"));
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn test_woken_producer_cancelled_before_recheck() {
        let queue = Arc::new(BoundedKeyQueue::new(1));
        assert!(queue.insert_wait("a".to_string(), LONG).await);

        let first = {
            let queue = queue.clone();
            tokio::spawn(async move { queue.insert_wait("b".to_string(), LONG).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        let second = {
            let queue = queue.clone();
            tokio::spawn(async move { queue.insert_wait("c".to_string(), LONG).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        // The removal wakes `first`; it is cancelled before it runs again.
        assert_eq!(queue.try_remove().as_deref(), Some("a"));
        first.abort();

        assert!(first.await.unwrap_err().is_cancelled());
        let inserted = tokio::time::timeout(Duration::from_secs(1), second)
            .await
            .expect("wake-up was not handed on")
            .unwrap();
        assert!(inserted);
        assert_eq!(queue.try_remove().as_deref(), Some("c"));
        assert!(queue.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_short_lived_waiters_never_strand_items() {
        let queue = Arc::new(BoundedKeyQueue::new(100));
        let patient = {
            let queue = queue.clone();
            tokio::spawn(async move {
                let mut received = 0;
                while received < 50 {
                    if queue.remove_wait(LONG).await.is_some() {
                        received += 1;
                    }
                }
                received
            })
        };

        let mut impatient = Vec::new();
        for i in 0..50 {
            let waiter = queue.clone();
            impatient.push(tokio::spawn(async move {
                waiter.remove_wait(Duration::from_micros(50)).await
            }));
            assert!(queue.insert_wait(i.to_string(), LONG).await);
        }

        let mut taken_early = 0;
        for waiter in impatient {
            if waiter.await.unwrap().is_some() {
                taken_early += 1;
            }
        }
        for i in 0..taken_early {
            assert!(queue.insert_wait(format!("refill-{}", i), LONG).await);
        }

        let received = tokio::time::timeout(Duration::from_secs(5), patient)
            .await
            .expect("an item was left behind while a consumer waited")
            .unwrap();
        assert_eq!(received, 50);
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_producers_lose_nothing() {
        let queue = Arc::new(BoundedKeyQueue::new(8));
        let mut producers = Vec::new();
        for p in 0..4 {
            let queue = queue.clone();
            producers.push(tokio::spawn(async move {
                for i in 0..25 {
                    assert!(queue.insert_wait(format!("{}-{}", p, i), LONG).await);
                }
            }));
        }

        let mut received = Vec::new();
        while received.len() < 100 {
            let item = queue.remove_wait(LONG).await.expect("producers stalled");
            received.push(item);
        }
        for producer in producers {
            producer.await.unwrap();
        }

        received.sort();
        received.dedup();
        assert_eq!(received.len(), 100);
        assert!(queue.is_empty());
    }
}
